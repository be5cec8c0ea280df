//! Shared infrastructure: graph storage, traversal and DOT rendering.

mod dot;
pub mod graph;

pub use dot::{escape_dot, DotGraph};
