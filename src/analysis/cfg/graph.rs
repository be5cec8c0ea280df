//! Control Flow Graph implementation.
//!
//! This module provides the main [`ControlFlowGraph`] structure that wraps basic blocks
//! with proper graph semantics and provides traversals and DOT export.

use std::{fmt::Write, sync::OnceLock};

use crate::{
    analysis::cfg::{
        block::BasicBlock,
        builder::CfgBuilder,
        edge::CfgEdgeKind,
    },
    semantic::SemanticModel,
    syntax::Procedure,
    utils::{
        escape_dot,
        graph::{
            algorithms, DirectedGraph, GraphBase, NodeId, Predecessors, RootedGraph, Successors,
        },
    },
    Result,
};

/// A control flow graph of one procedure.
///
/// The CFG provides a proper graph abstraction over basic blocks with efficient
/// traversal. It wraps an underlying [`DirectedGraph`] and provides domain-specific accessors.
///
/// # Shape
///
/// - Block ids are dense: `0..block_count()`, and equal the [`NodeId`] index of the block.
/// - The entry block has id `0`. The unique [`BlockKind::Exit`] block has the highest id,
///   unless the procedure is empty and entry and exit coincide.
/// - Every other block has at least one successor.
///
/// # Construction
///
/// ```rust
/// use flowscope::{analysis::ControlFlowGraph, semantic::MemorySemanticModel, syntax::SyntaxFactory};
///
/// let mut f = SyntaxFactory::new();
/// let condition = f.boolean(true);
/// let x = f.ident("x");
/// let ten = f.int(10);
/// let assign = f.assign(x, ten);
/// let then_branch = f.expr_stmt(assign);
/// let body = vec![f.if_stmt(condition, then_branch, None)];
/// let procedure = f.method("C.M()", Vec::new(), body);
///
/// let cfg = ControlFlowGraph::build(&procedure, &MemorySemanticModel::new())?;
/// assert_eq!(cfg.block_count(), 3);
/// assert!(cfg.exit_block().is_exit());
/// # Ok::<(), flowscope::Error>(())
/// ```
///
/// # Lifetime Parameter
///
/// Blocks borrow the syntax nodes they reference; `'a` is the lifetime of the procedure the
/// graph was built from.
///
/// # Thread Safety
///
/// `ControlFlowGraph` is [`Send`] and [`Sync`]. Lazy-initialized fields use
/// [`OnceLock`] for thread-safe initialization.
///
/// [`BlockKind::Exit`]: crate::analysis::cfg::BlockKind::Exit
#[derive(Debug)]
pub struct ControlFlowGraph<'a> {
    /// The procedure this graph was built from.
    procedure: &'a Procedure,
    /// The underlying directed graph structure.
    graph: DirectedGraph<BasicBlock<'a>, CfgEdgeKind>,
    /// Index of the entry block (always 0).
    entry: NodeId,
    /// Index of the unique exit block.
    exit: NodeId,
    /// Lazily computed reverse postorder.
    reverse_postorder: OnceLock<Vec<NodeId>>,
}

impl<'a> ControlFlowGraph<'a> {
    /// Builds the control flow graph of `procedure`.
    ///
    /// Building is deterministic: the same procedure always produces the same block ids,
    /// instruction order and edge order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Procedure`] when a jump inside the procedure cannot be resolved.
    pub fn build(procedure: &'a Procedure, semantic: &dyn SemanticModel) -> Result<Self> {
        CfgBuilder::build(procedure, semantic)
    }

    pub(crate) fn new(
        procedure: &'a Procedure,
        graph: DirectedGraph<BasicBlock<'a>, CfgEdgeKind>,
        entry: NodeId,
        exit: NodeId,
    ) -> Self {
        Self {
            procedure,
            graph,
            entry,
            exit,
            reverse_postorder: OnceLock::new(),
        }
    }

    /// Returns the procedure this graph was built from.
    #[must_use]
    pub fn procedure(&self) -> &'a Procedure {
        self.procedure
    }

    /// Returns the entry block ID.
    #[must_use]
    pub const fn entry(&self) -> NodeId {
        self.entry
    }

    /// Returns the exit block ID.
    #[must_use]
    pub const fn exit(&self) -> NodeId {
        self.exit
    }

    /// Returns the entry block.
    #[must_use]
    pub fn entry_block(&self) -> &BasicBlock<'a> {
        &self.graph[self.entry]
    }

    /// Returns the exit block.
    #[must_use]
    pub fn exit_block(&self) -> &BasicBlock<'a> {
        &self.graph[self.exit]
    }

    /// Returns the number of blocks in the CFG.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges in the CFG.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns a reference to the basic block at the given node ID.
    ///
    /// # Arguments
    ///
    /// * `node_id` - The node ID to look up
    ///
    /// # Returns
    ///
    /// A reference to the basic block, or `None` if the ID is invalid.
    #[must_use]
    pub fn block(&self, node_id: NodeId) -> Option<&BasicBlock<'a>> {
        self.graph.node(node_id)
    }

    /// Iterates all blocks in id order.
    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock<'a>> + '_ {
        self.graph.nodes().map(|(_, block)| block)
    }

    /// Returns the successor block IDs for a given block, in edge order.
    ///
    /// For a binary branch the true target comes first.
    pub fn successors(&self, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.successors(node_id)
    }

    /// Returns the predecessor block IDs for a given block.
    pub fn predecessors(&self, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.predecessors(node_id)
    }

    /// Returns the outgoing edges of a block as `(target, kind)` pairs.
    pub fn outgoing_edges(
        &self,
        node_id: NodeId,
    ) -> impl Iterator<Item = (NodeId, CfgEdgeKind)> + '_ {
        self.graph
            .outgoing_edges(node_id)
            .map(|(target, kind)| (target, *kind))
    }

    /// Returns blocks in reverse postorder from the entry.
    ///
    /// Computed once and cached. Blocks unreachable from the entry are not included.
    #[must_use]
    pub fn reverse_postorder(&self) -> &[NodeId] {
        self.reverse_postorder
            .get_or_init(|| algorithms::reverse_postorder(&self.graph, self.entry))
    }

    /// Returns blocks in postorder.
    #[must_use]
    pub fn postorder(&self) -> Vec<NodeId> {
        algorithms::postorder(&self.graph, self.entry)
    }

    /// Performs a depth-first traversal starting from the entry block.
    pub fn dfs(&self) -> impl Iterator<Item = NodeId> + '_ {
        algorithms::dfs(&self.graph, self.entry)
    }

    /// Returns the blocks reachable from the entry, in id order.
    #[must_use]
    pub fn reachable_blocks(&self) -> Vec<NodeId> {
        algorithms::reachable(&self.graph, self.entry)
            .into_iter()
            .enumerate()
            .filter_map(|(index, reachable)| reachable.then(|| NodeId::new(index)))
            .collect()
    }

    /// Returns a reference to the underlying graph.
    #[must_use]
    pub fn graph(&self) -> &DirectedGraph<BasicBlock<'a>, CfgEdgeKind> {
        &self.graph
    }

    /// Returns an iterator over all node IDs in the graph.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_ids()
    }

    /// Generates a DOT format representation of this control flow graph.
    ///
    /// The generated DOT can be rendered using Graphviz tools like `dot` or
    /// online viewers. The entry block is highlighted in green, the exit block in red.
    /// Nodes are named `B{id}`; each label starts with the block name and kind followed by
    /// one line per instruction. Edges carry their [`CfgEdgeKind`] label.
    ///
    /// # Arguments
    ///
    /// * `title` - Optional title for the graph, defaults to the procedure name
    #[must_use]
    pub fn to_dot(&self, title: Option<&str>) -> String {
        let mut dot = String::new();

        dot.push_str("digraph CFG {\n");
        let name = title.unwrap_or(&self.procedure.name);
        let _ = writeln!(dot, "    label=\"CFG: {}\";", escape_dot(name));
        dot.push_str("    labelloc=t;\n");
        dot.push_str("    node [shape=box, fontname=\"Courier\", fontsize=10];\n");
        dot.push_str("    edge [fontname=\"Courier\", fontsize=9];\n\n");

        for (node_id, block) in self.graph.nodes() {
            let is_entry = node_id == self.entry;
            let is_exit = node_id == self.exit;

            let mut label = format!("B{} {}", block.id, escape_dot(&block.kind.to_string()));
            if is_entry {
                label.push_str(" (entry)");
            }
            label.push_str("\\l");
            for instruction in &block.instructions {
                label.push_str(&escape_dot(&instruction.to_string()));
                label.push_str("\\l");
            }

            let style = if is_entry {
                ", style=filled, fillcolor=lightgreen"
            } else if is_exit {
                ", style=filled, fillcolor=lightcoral"
            } else {
                ""
            };
            let _ = writeln!(dot, "    B{} [label=\"{label}\"{style}];", block.id);
        }

        dot.push('\n');

        for node_id in self.graph.node_ids() {
            for (target, kind) in self.outgoing_edges(node_id) {
                let color = match kind {
                    CfgEdgeKind::Unconditional => "black",
                    CfgEdgeKind::ConditionalTrue => "green",
                    CfgEdgeKind::ConditionalFalse => "red",
                    CfgEdgeKind::Exception | CfgEdgeKind::Finally => "purple",
                };
                let _ = writeln!(
                    dot,
                    "    B{} -> B{} [label=\"{kind}\", color={color}];",
                    node_id.index(),
                    target.index()
                );
            }
        }

        dot.push_str("}\n");
        dot
    }
}

impl GraphBase for ControlFlowGraph<'_> {
    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        self.graph.node_ids()
    }
}

impl Successors for ControlFlowGraph<'_> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.successors(node)
    }
}

impl Predecessors for ControlFlowGraph<'_> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.predecessors(node)
    }
}

impl RootedGraph for ControlFlowGraph<'_> {
    fn entry(&self) -> NodeId {
        self.entry
    }
}
