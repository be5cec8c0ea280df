//! # flowscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the flowscope library. Import this module to get quick access to the essential
//! types for building and lowering control flow graphs.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all flowscope operations
pub use crate::Error;

/// The result type used throughout flowscope
pub use crate::Result;

// ================================================================================================
// Syntax
// ================================================================================================

/// Syntax tree nodes and the factory used to build them
pub use crate::syntax::{
    Argument, Expr, ExprKind, Pattern, Procedure, ProcedureBody, ProcedureKind, Stmt, StmtKind,
    SyntaxFactory, SyntaxId,
};

// ================================================================================================
// Semantic Model
// ================================================================================================

/// Resolver and classifier interfaces
pub use crate::semantic::{EntryPointClassifier, SemanticModel};

/// Symbols returned by a resolver
pub use crate::semantic::{
    FieldSymbol, LocalSymbol, MemberFlags, MethodSymbol, ParameterSymbol, PropertySymbol, Symbol,
    TypeSymbol,
};

/// Ready-made resolver and classifiers
pub use crate::semantic::{AttributeClassifier, MemorySemanticModel, NoEntryPoints};

// ================================================================================================
// Control Flow Graphs
// ================================================================================================

/// Graph, blocks and edges
pub use crate::analysis::{
    BasicBlock, BlockKind, CfgCache, CfgEdgeKind, CfgNode, ControlFlowGraph, JumpKind,
};

// ================================================================================================
// UCFG Lowering
// ================================================================================================

/// Lowering entry point and its output
pub use crate::analysis::{
    Expression, Instruction, PseudoOp, Terminator, Ucfg, UcfgBlock, UcfgBuilder, UcfgOptions,
};

// ================================================================================================
// Batch Processing
// ================================================================================================

/// Corpus processing
pub use crate::analysis::{analyze_procedures, BatchOptions, ProcedureReport};

// ================================================================================================
// Graph Infrastructure
// ================================================================================================

/// Node identifiers and traversal traits
pub use crate::utils::graph::{GraphBase, NodeId, Predecessors, RootedGraph, Successors};
