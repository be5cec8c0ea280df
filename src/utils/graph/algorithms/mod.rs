//! Graph algorithms over the [`Successors`](crate::utils::graph::Successors) abstraction.
//!
//! - [`dfs`] - Iterative depth-first search (pre-order)
//! - [`postorder`] / [`reverse_postorder`] - Depth-first finishing orders
//! - [`reachable`] - Reachability set from a start node

mod traversal;

pub use traversal::{dfs, postorder, reachable, reverse_postorder, DfsIterator};
