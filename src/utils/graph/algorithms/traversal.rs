//! Depth-first traversals.
//!
//! Every walk keeps an explicit stack of successor frames instead of recursing, so deep or
//! heavily nested control flow cannot overflow the call stack. Successors are explored in the
//! order the graph reports them. An out-of-range start node yields an empty walk.

use std::vec::IntoIter;

use crate::utils::graph::{NodeId, Successors};

/// Lazy depth-first pre-order walk, created by [`dfs`].
pub struct DfsIterator<'g, G: Successors> {
    graph: &'g G,
    start: Option<NodeId>,
    frames: Vec<IntoIter<NodeId>>,
    seen: Vec<bool>,
}

impl<G: Successors> DfsIterator<'_, G> {
    fn enter(&mut self, node: NodeId) -> NodeId {
        self.seen[node.index()] = true;
        let successors: Vec<NodeId> = self.graph.successors(node).collect();
        self.frames.push(successors.into_iter());
        node
    }
}

impl<G: Successors> Iterator for DfsIterator<'_, G> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if let Some(start) = self.start.take() {
            return Some(self.enter(start));
        }

        loop {
            let frame = self.frames.last_mut()?;
            match frame.next() {
                Some(node) if !self.seen[node.index()] => return Some(self.enter(node)),
                Some(_) => {}
                None => {
                    self.frames.pop();
                }
            }
        }
    }
}

/// Walks the nodes reachable from `start` in depth-first pre-order.
pub fn dfs<G: Successors>(graph: &G, start: NodeId) -> DfsIterator<'_, G> {
    let node_count = graph.node_count();
    DfsIterator {
        graph,
        start: (start.index() < node_count).then_some(start),
        frames: Vec::new(),
        seen: vec![false; node_count],
    }
}

/// Collects the nodes reachable from `start` in post-order.
///
/// A node is emitted once all of its successors have been emitted, except for successors that
/// are still on the walk's path (back edges).
pub fn postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let node_count = graph.node_count();
    if start.index() >= node_count {
        return Vec::new();
    }

    let mut seen = vec![false; node_count];
    let mut order = Vec::with_capacity(node_count);
    let mut path: Vec<(NodeId, IntoIter<NodeId>)> = Vec::new();

    seen[start.index()] = true;
    path.push((start, graph.successors(start).collect::<Vec<_>>().into_iter()));

    while let Some((node, frame)) = path.last_mut() {
        if let Some(next) = frame.find(|successor| !seen[successor.index()]) {
            seen[next.index()] = true;
            path.push((next, graph.successors(next).collect::<Vec<_>>().into_iter()));
        } else {
            order.push(*node);
            path.pop();
        }
    }

    order
}

/// Collects the nodes reachable from `start` in reverse post-order.
///
/// Within an acyclic region every node precedes its successors, which makes this the usual
/// iteration order for forward analyses.
pub fn reverse_postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let mut order = postorder(graph, start);
    order.reverse();
    order
}

/// Marks the nodes reachable from `start`; the vector is indexed by node index.
pub fn reachable<G: Successors>(graph: &G, start: NodeId) -> Vec<bool> {
    let mut marks = vec![false; graph.node_count()];
    dfs(graph, start).for_each(|node| marks[node.index()] = true);
    marks
}
