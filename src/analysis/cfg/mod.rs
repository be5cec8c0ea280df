//! Control Flow Graph (CFG) construction for syntax-level procedures.
//!
//! This module turns a [`crate::syntax::Procedure`] into a graph of basic blocks whose
//! instructions are the procedure's own syntax nodes, in execution order.
//!
//! # Architecture
//!
//! The CFG builds upon the generic [`crate::utils::graph::DirectedGraph`] infrastructure,
//! providing block and edge types for structured source code while leveraging the shared
//! traversal algorithms.
//!
//! Construction runs backwards: the exit block is created first and the body is visited from
//! the last statement to the first, so every forward jump target already exists when the jump
//! is seen. Loop heads, labels and switch sections are placeholders that are linked once their
//! targets are built. A post-pass bypasses empty blocks and renumbers the survivors.
//!
//! # Key Components
//!
//! - [`ControlFlowGraph`] - The finished graph
//! - [`BasicBlock`], [`BlockKind`], [`CfgNode`] - The block model
//! - [`CfgEdgeKind`] - Classification of edge types
//! - [`CfgBuilder`] - The backward builder
//! - [`CfgCache`] - Build-once sharing of graphs across threads
//!
//! # Block Kinds
//!
//! - **Simple**: falls through to one successor
//! - **Jump**: `return`, `throw`, `break`, `continue`, `goto`, `yield break`
//! - **BinaryBranch**: true and false successors; every leaf of a `&&`/`||` chain and every
//!   null test of `??`, `?.` and `??=` gets its own block
//! - **Branch**: end of a protected region or a `finally`, with a normal and an exceptional
//!   successor
//! - **ForInitializer**, **ForeachCollectionProducer**, **Lock**, **UsingEnd**: bracketing
//!   blocks of the corresponding statements
//! - **Exit**: the unique exit, with no instructions and no successors
//!
//! # Examples
//!
//! ```rust
//! use flowscope::{
//!     analysis::{BlockKind, ControlFlowGraph},
//!     semantic::MemorySemanticModel,
//!     syntax::SyntaxFactory,
//! };
//!
//! let mut f = SyntaxFactory::new();
//! let a = f.ident("a");
//! let b = f.ident("b");
//! let condition = f.and(a, b);
//! let then_branch = f.block(Vec::new());
//! let body = vec![f.if_stmt(condition, then_branch, None)];
//! let procedure = f.method("C.M()", Vec::new(), body);
//!
//! let cfg = ControlFlowGraph::build(&procedure, &MemorySemanticModel::new())?;
//! let branches = cfg
//!     .blocks()
//!     .filter(|block| matches!(block.kind, BlockKind::BinaryBranch { .. }))
//!     .count();
//! assert_eq!(branches, 2);
//! # Ok::<(), flowscope::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! [`ControlFlowGraph`] is [`Send`] and [`Sync`], enabling safe concurrent read
//! access after construction. [`CfgCache`] may be shared between threads.

mod block;
mod builder;
mod cache;
mod context;
mod edge;
mod graph;

pub use block::{BasicBlock, BlockKind, BranchingConstruct, CfgNode, JumpKind, JumpNode};
pub use builder::CfgBuilder;
pub use cache::CfgCache;
pub use edge::CfgEdgeKind;
pub use graph::ControlFlowGraph;
