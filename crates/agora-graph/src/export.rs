//! Structural export of the graph.
//!
//! Two views are offered to consumers outside the crate: a serializable
//! [`GraphSnapshot`] for JSON output, and a [`PetgraphView`] for running
//! petgraph algorithms over the same nodes and edges.

use crate::edge::InteractionEdge;
use crate::graph::MultiDiGraph;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// One edge with its endpoints, for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeTriple {
    pub source: String,
    pub target: String,
    pub edge: InteractionEdge,
}

/// A self-contained copy of the graph's structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// All node ids, sorted.
    pub nodes: Vec<String>,
    /// Every edge, in the same order as [`MultiDiGraph::all_edges`].
    pub edges: Vec<EdgeTriple>,
    /// Forward adjacency: source → destination → edges.
    pub adjacency: BTreeMap<String, BTreeMap<String, Vec<InteractionEdge>>>,
}

impl GraphSnapshot {
    /// Serializes the snapshot as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl MultiDiGraph {
    /// Takes a serializable snapshot of the graph.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let edges = self
            .all_edges()
            .map(|(source, target, edge)| EdgeTriple {
                source: source.to_string(),
                target: target.to_string(),
                edge: InteractionEdge::clone(edge),
            })
            .collect();

        let adjacency = self
            .nodes()
            .filter_map(|node| {
                let adj = self.adjacency(node)?;
                let targets = adj
                    .iter()
                    .map(|(to, edges)| {
                        let edges = edges.iter().map(|e| InteractionEdge::clone(e)).collect();
                        (to.clone(), edges)
                    })
                    .collect();
                Some((node.to_string(), targets))
            })
            .collect();

        GraphSnapshot {
            nodes: self.nodes().map(str::to_string).collect(),
            edges,
            adjacency,
        }
    }
}

/// The graph loaded into a petgraph `DiGraph`.
///
/// Every multigraph edge becomes its own petgraph edge, so parallel
/// interactions keep their weight in algorithms that walk edges.
#[derive(Debug, Clone)]
pub struct PetgraphView {
    pub graph: DiGraph<String, Arc<InteractionEdge>>,
    pub index: HashMap<String, NodeIndex>,
}

impl PetgraphView {
    /// Builds the view. Node indexes follow sorted id order.
    pub fn from_graph(source: &MultiDiGraph) -> Self {
        let mut graph = DiGraph::with_capacity(source.node_count(), source.edge_count());
        let mut index = HashMap::with_capacity(source.node_count());

        for node in source.nodes() {
            let idx = graph.add_node(node.to_string());
            index.insert(node.to_string(), idx);
        }

        for (from, to, edge) in source.all_edges() {
            // Both endpoints were inserted above.
            if let (Some(&a), Some(&b)) = (index.get(from), index.get(to)) {
                graph.add_edge(a, b, Arc::clone(edge));
            }
        }

        Self { graph, index }
    }

    /// Gets the petgraph index for a node id.
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Gets the node id behind a petgraph index.
    pub fn node_id(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }

    /// Number of weakly connected components.
    pub fn weak_components(&self) -> usize {
        petgraph::algo::connected_components(&self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MultiDiGraph {
        let mut graph = MultiDiGraph::new();
        graph.add_edge("alice", "bob", InteractionEdge::new("q1").unwrap());
        graph.add_edge(
            "alice",
            "bob",
            InteractionEdge::with_timestamp("q2", "2024-05-01").unwrap(),
        );
        graph.add_edge("carol", "alice", InteractionEdge::new("q3").unwrap());
        graph
    }

    #[test]
    fn test_snapshot_contents() {
        let snapshot = sample().to_snapshot();

        assert_eq!(snapshot.nodes, vec!["alice", "bob", "carol"]);
        assert_eq!(snapshot.edges.len(), 3);
        assert_eq!(snapshot.edges[2].source, "carol");
        assert_eq!(snapshot.edges[2].edge.question_id(), "q3");
        assert_eq!(snapshot.adjacency["alice"]["bob"].len(), 2);
        assert!(!snapshot.adjacency.contains_key("bob"));
    }

    #[test]
    fn test_snapshot_json() {
        let json = sample().to_snapshot().to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(value["edges"][1]["edge"]["timestamp"], "2024-05-01");
        assert_eq!(value["edges"][0]["edge"]["timestamp"], serde_json::Value::Null);

        let back: GraphSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.edges.len(), 3);
    }

    #[test]
    fn test_petgraph_view_keeps_parallel_edges() {
        let view = PetgraphView::from_graph(&sample());

        assert_eq!(view.graph.node_count(), 3);
        assert_eq!(view.graph.edge_count(), 3);

        let alice = view.node_index("alice").unwrap();
        let bob = view.node_index("bob").unwrap();
        assert_eq!(view.graph.edges_connecting(alice, bob).count(), 2);
        assert_eq!(view.node_id(alice), Some("alice"));
        assert!(view.node_index("zoe").is_none());
    }

    #[test]
    fn test_weak_components() {
        let mut graph = sample();
        assert_eq!(PetgraphView::from_graph(&graph).weak_components(), 1);

        graph.add_edge("dave", "erin", InteractionEdge::new("q4").unwrap());
        assert_eq!(PetgraphView::from_graph(&graph).weak_components(), 2);
        assert_eq!(PetgraphView::from_graph(&MultiDiGraph::new()).weak_components(), 0);
    }
}
