//! The host graph: a labeled directed multigraph.

use ahash::AHashSet;

/// An opaque node identifier. The common case is a small integer, but
/// anything cheap to hash and order works.
pub type NodeId = u32;

/// An edge label. Labels form the input alphabet of the graph-lifted NFA.
pub type Label = String;

/// A labeled directed multigraph: a node set and a multiset of labeled edges.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: AHashSet<NodeId>,
    edges: Vec<(NodeId, Label, NodeId)>,
}

impl Graph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node, returning `true` if it was not already present.
    pub fn add_node(&mut self, node: NodeId) -> bool {
        self.nodes.insert(node)
    }

    /// Adds a labeled edge, registering its endpoints as nodes.
    pub fn add_edge(&mut self, from: NodeId, label: impl Into<Label>, to: NodeId) {
        self.add_node(from);
        self.add_node(to);
        self.edges.push((from, label.into(), to));
    }

    /// The node set.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// The number of distinct nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The edge multiset, as `(from, label, to)` triples.
    pub fn edges(&self) -> impl Iterator<Item = &(NodeId, Label, NodeId)> {
        self.edges.iter()
    }

    /// The distinct labels appearing on some edge.
    pub fn labels(&self) -> AHashSet<&Label> {
        self.edges.iter().map(|(_, l, _)| l).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_register_their_endpoints() {
        let mut g = Graph::new();
        g.add_edge(0, "a", 1);
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edges().count(), 1);
    }

    #[test]
    fn labels_are_deduplicated() {
        let mut g = Graph::new();
        g.add_edge(0, "a", 1);
        g.add_edge(1, "a", 2);
        g.add_edge(2, "b", 0);
        let labels: AHashSet<&str> = g.labels().into_iter().map(|s| s.as_str()).collect();
        assert_eq!(labels.len(), 2);
    }
}
