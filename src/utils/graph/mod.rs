//! Generic directed graph infrastructure.
//!
//! [`DirectedGraph`] stores node and edge payloads in insertion order and keeps adjacency
//! lists in both directions. Control flow graphs are built on top of it; the traversal
//! algorithms in [`algorithms`] work on anything implementing the [`traits`](self) below.
//!
//! # Key Components
//!
//! - [`DirectedGraph`] - Adjacency-list graph with typed node and edge payloads
//! - [`NodeId`] / [`EdgeId`] - Strongly-typed indices
//! - [`GraphBase`], [`Successors`], [`Predecessors`], [`RootedGraph`] - Algorithm interfaces

mod directed;
mod node;
mod traits;

pub mod algorithms;

pub use directed::DirectedGraph;
pub use node::{EdgeId, NodeId};
pub use traits::{GraphBase, Predecessors, RootedGraph, Successors};
