// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # flowscope
//!
//! Control flow graphs and taint-oriented lowering for C#-style procedure bodies.
//!
//! `flowscope` takes the syntax tree of a method, constructor, accessor, local function or
//! lambda, together with the semantic facts a compiler front end already knows about it, and
//! produces two views of the procedure:
//!
//! - a **control flow graph** whose basic blocks hold the procedure's own syntax nodes in
//!   execution order, with every short-circuit point, null test, loop, switch section,
//!   exception handler and jump modelled as its own edge
//! - a **UCFG**, the same block structure lowered into a small three-address vocabulary of
//!   calls, allocations and pseudo-operations, ready for dataflow and taint engines
//!
//! ## Features
//!
//! - **Backward construction** - every forward jump target exists before the jump is seen
//! - **Exact short-circuit modelling** - `&&`, `||`, `??`, `?.` and `??=` each get their own
//!   branch blocks
//! - **Structured exception flow** - `try`/`catch`/`finally` as explicit multi-target edges
//! - **Build-once cache** - concurrent requests for the same procedure share one build
//! - **Failure isolation** - batch runs report a broken procedure without losing the rest
//!
//! ## Quick Start
//!
//! ### Using the Prelude
//!
//! ```rust
//! use flowscope::prelude::*;
//!
//! let mut f = SyntaxFactory::new();
//! let condition = f.boolean(true);
//! let x = f.ident("x");
//! let ten = f.int(10);
//! let assign = f.assign(x, ten);
//! let then_branch = f.expr_stmt(assign);
//! let body = vec![f.if_stmt(condition, then_branch, None)];
//! let procedure = f.method("C.M()", Vec::new(), body);
//!
//! let semantic = MemorySemanticModel::new();
//! let cfg = ControlFlowGraph::build(&procedure, &semantic)?;
//! assert_eq!(cfg.block_count(), 3);
//!
//! let ucfg = UcfgBuilder::new(&semantic).build(&cfg);
//! println!("{ucfg}");
//! # Ok::<(), flowscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `flowscope` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`syntax`] - The input syntax tree and a factory for building it
//! - [`semantic`] - Symbol, type and entry-point queries the analyses consume
//! - [`analysis`] - CFG construction, UCFG lowering and batch processing
//! - [`utils`] - Generic graph storage, traversals and DOT rendering
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Error Handling
//!
//! Only graph construction can fail. Every failure names the procedure it occurred in:
//!
//! ```rust
//! use flowscope::{analysis::ControlFlowGraph, semantic::MemorySemanticModel, syntax::SyntaxFactory, Error};
//!
//! let mut f = SyntaxFactory::new();
//! let body = vec![f.break_stmt()];
//! let procedure = f.method("C.M()", Vec::new(), body);
//!
//! match ControlFlowGraph::build(&procedure, &MemorySemanticModel::new()) {
//!     Ok(_) => unreachable!(),
//!     Err(Error::Procedure { procedure, source }) => println!("{procedure}: {source}"),
//!     Err(e) => println!("Other error: {e}"),
//! }
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade: `debug` for every built
//! graph, `trace` for cache hits and `warn` for procedures a batch run had to skip. No logger
//! is installed by the library.

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use flowscope::prelude::*;
///
/// let mut f = SyntaxFactory::new();
/// let procedure = f.method("C.M()", Vec::new(), Vec::new());
/// let cfg = ControlFlowGraph::build(&procedure, &MemorySemanticModel::new())?;
/// assert_eq!(cfg.block_count(), 1);
/// # Ok::<(), flowscope::Error>(())
/// ```
pub mod prelude;

/// Typed syntax tree of procedure bodies.
///
/// See [`syntax::SyntaxFactory`] for building trees in code.
pub mod syntax;

/// Semantic facts: symbols, types, constants and entry-point classification.
pub mod semantic;

/// Control flow graphs, UCFG lowering and batch processing.
pub mod analysis;

/// Shared infrastructure: graph storage, traversals and DOT rendering.
pub mod utils;

/// `flowscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// This is used consistently throughout the crate for all fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `flowscope` Error type
///
/// The main error type for all operations in this crate. Graph construction is the only
/// fallible stage; see the variant documentation for the individual causes.
pub use error::Error;
