//! Universal control flow graph (UCFG) lowering.
//!
//! A UCFG keeps the block structure of a [`ControlFlowGraph`](crate::analysis::ControlFlowGraph)
//! but replaces the syntax nodes inside every block with a small three-address instruction
//! vocabulary suited to taint analysis:
//!
//! ```text
//! B0:
//!   %0 := __entrypoint [ query ]
//!   %1 := System.String.Trim() [ query ]
//!   name := System.String.ToLower() [ %1 ]
//!   %2 := __concat [ "Hello " name ]
//!   ret %2
//! ```
//!
//! # Key Components
//!
//! - [`UcfgBuilder`] / [`UcfgOptions`] - Lowers one graph, configurable string types and
//!   entry-point tracking
//! - [`Ucfg`], [`UcfgBlock`], [`Terminator`] - The lowered procedure
//! - [`Instruction`], [`Expression`], [`PseudoOp`] - The instruction vocabulary
//!
//! # Rules of Thumb
//!
//! - Calls and allocations produce temporaries (`%n`), numbered in emission order. When the
//!   call result is immediately stored into a local, the local is the call's target instead.
//! - Field reads are plain [`Expression::FieldAccess`] values; property reads are getter calls.
//! - Receivers come first in every call: `this`, a class name for static members, or the
//!   receiver object.
//! - Values the analysis does not track collapse to `const`.

mod builder;
mod function;
mod instruction;
mod lowering;
mod naming;

pub use builder::{UcfgBuilder, UcfgOptions};
pub use function::{Terminator, Ucfg, UcfgBlock};
pub use instruction::{Expression, Instruction, PseudoOp};
pub use naming::{accessor_id, method_id, Accessor};
