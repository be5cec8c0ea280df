//! Program analysis infrastructure for C#-style procedures.
//!
//! This module turns syntax trees into the two graph views consumed by dataflow and taint
//! engines. It builds upon the generic graph infrastructure in [`crate::utils::graph`].
//!
//! # Architecture
//!
//! The analysis module is organized into focused sub-modules:
//!
//! - [`cfg`] - Control Flow Graph construction, one graph per procedure, with a build-once
//!   cache
//! - [`ucfg`] - Lowering of a finished CFG into the UCFG instruction vocabulary
//! - [`batch`] - Processing of many procedures with per-procedure failure isolation
//!
//! # Usage
//!
//! ```rust
//! use flowscope::{
//!     analysis::{ControlFlowGraph, UcfgBuilder},
//!     semantic::MemorySemanticModel,
//!     syntax::SyntaxFactory,
//! };
//!
//! let mut f = SyntaxFactory::new();
//! let x = f.ident("x");
//! let ten = f.int(10);
//! let assign = f.assign(x, ten);
//! let body = vec![f.expr_stmt(assign)];
//! let procedure = f.method("C.M()", Vec::new(), body);
//! let semantic = MemorySemanticModel::new();
//!
//! let cfg = ControlFlowGraph::build(&procedure, &semantic)?;
//! let ucfg = UcfgBuilder::new(&semantic).build(&cfg);
//! assert_eq!(ucfg.blocks().len(), cfg.block_count());
//! assert_eq!(ucfg.instructions().next().map(ToString::to_string).as_deref(), Some("x := __id [ \"10\" ]"));
//! # Ok::<(), flowscope::Error>(())
//! ```

pub mod batch;
pub mod cfg;
pub mod ucfg;

// Re-export primary types at module level
pub use batch::{analyze_procedures, BatchOptions, ProcedureReport};
pub use cfg::{
    BasicBlock, BlockKind, BranchingConstruct, CfgBuilder, CfgCache, CfgEdgeKind, CfgNode,
    ControlFlowGraph, JumpKind, JumpNode,
};
pub use ucfg::{
    Expression, Instruction, PseudoOp, Terminator, Ucfg, UcfgBlock, UcfgBuilder, UcfgOptions,
};
