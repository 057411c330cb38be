//! Core graph data structure.
//!
//! `MultiDiGraph` keeps two adjacency indexes over participant ids: a
//! forward index (source → destination → edges) and a backward index
//! (destination → source → edges). Both are updated through the same
//! insertion and removal paths, so out- and in-neighbourhoods are equally
//! cheap to read.

use crate::edge::{EdgeError, InteractionEdge};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Per-node adjacency: neighbour id → edges in insertion order.
pub(crate) type Adjacency = BTreeMap<String, Vec<Arc<InteractionEdge>>>;

type Index = BTreeMap<String, Adjacency>;

/// A directed graph that allows any number of edges between two nodes.
///
/// Absence is never an error: queries on unknown nodes return empty
/// results and zero degrees.
#[derive(Debug, Clone, Default)]
pub struct MultiDiGraph {
    nodes: BTreeSet<String>,
    forward: Index,
    backward: Index,
    edge_count: usize,
}

impl MultiDiGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directed edge from `from` to `to`.
    ///
    /// Both endpoints are registered as nodes. Duplicate edges are kept.
    pub fn add_edge(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        edge: impl Into<Arc<InteractionEdge>>,
    ) {
        let from = from.into();
        let to = to.into();
        let edge = edge.into();

        self.nodes.insert(from.clone());
        self.nodes.insert(to.clone());

        self.backward
            .entry(to.clone())
            .or_default()
            .entry(from.clone())
            .or_default()
            .push(Arc::clone(&edge));
        self.forward
            .entry(from)
            .or_default()
            .entry(to)
            .or_default()
            .push(edge);

        self.edge_count += 1;
    }

    /// Builds an edge record from `question_id` and `attrs`, then adds it.
    pub fn add_new_edge<'a, I>(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        question_id: impl Into<String>,
        attrs: I,
    ) -> Result<(), EdgeError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let edge = InteractionEdge::from_attributes(question_id, attrs)?;
        self.add_edge(from, to, edge);
        Ok(())
    }

    /// Removes a node together with every edge touching it.
    ///
    /// Returns `false`, leaving the graph untouched, if the node is absent.
    /// Neighbours stay in the node set even when this leaves them isolated.
    pub fn remove_node(&mut self, node: &str) -> bool {
        if !self.nodes.remove(node) {
            return false;
        }

        let mut removed = 0;

        if let Some(outgoing) = self.forward.remove(node) {
            for (to, edges) in outgoing {
                removed += edges.len();
                if to != node {
                    detach(&mut self.backward, &to, node);
                }
            }
        }

        if let Some(incoming) = self.backward.remove(node) {
            for (from, edges) in incoming {
                // Self-loops were counted with the outgoing block.
                if from != node {
                    removed += edges.len();
                    detach(&mut self.forward, &from, node);
                }
            }
        }

        self.edge_count -= removed;
        debug!(node, removed, "removed node");
        true
    }

    /// Returns the edges from `from` to `to` in insertion order.
    pub fn get_edges(&self, from: &str, to: &str) -> &[Arc<InteractionEdge>] {
        self.forward
            .get(from)
            .and_then(|adj| adj.get(to))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterates over every edge as `(from, to, edge)`.
    ///
    /// Sources and destinations come out in id order, parallel edges in
    /// insertion order.
    pub fn all_edges(&self) -> impl Iterator<Item = (&str, &str, &Arc<InteractionEdge>)> + '_ {
        self.forward.iter().flat_map(|(from, adj)| {
            adj.iter().flat_map(move |(to, edges)| {
                edges
                    .iter()
                    .map(move |edge| (from.as_str(), to.as_str(), edge))
            })
        })
    }

    /// Distinct nodes reachable from `node` in one hop.
    pub fn neighbors(&self, node: &str) -> Vec<&str> {
        keys(self.forward.get(node))
    }

    /// Distinct nodes with an edge into `node`.
    pub fn predecessors(&self, node: &str) -> Vec<&str> {
        keys(self.backward.get(node))
    }

    /// Number of outgoing edges, counting parallel edges separately.
    pub fn out_degree(&self, node: &str) -> usize {
        total(self.forward.get(node))
    }

    /// Number of incoming edges, counting parallel edges separately.
    pub fn in_degree(&self, node: &str) -> usize {
        total(self.backward.get(node))
    }

    /// Extracts the graph induced by `nodes`.
    ///
    /// Ids not present in this graph are ignored. Edge records are shared
    /// with this graph; the indexes are built fresh.
    pub fn subgraph<I, S>(&self, nodes: I) -> MultiDiGraph
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keep: BTreeSet<&str> = nodes
            .into_iter()
            .filter_map(|id| self.nodes.get(id.as_ref()).map(String::as_str))
            .collect();

        let mut sub = MultiDiGraph::new();
        sub.nodes = keep.iter().map(|id| id.to_string()).collect();

        for &from in &keep {
            let Some(adj) = self.forward.get(from) else {
                continue;
            };
            for (to, edges) in adj {
                if !keep.contains(to.as_str()) {
                    continue;
                }
                for edge in edges {
                    sub.add_edge(from, to.as_str(), Arc::clone(edge));
                }
            }
        }

        debug!(
            nodes = sub.node_count(),
            edges = sub.edge_count(),
            "extracted subgraph"
        );
        sub
    }

    /// Returns true if the node exists.
    pub fn contains_node(&self, node: &str) -> bool {
        self.nodes.contains(node)
    }

    /// Iterates over node ids in order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.iter().map(String::as_str)
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn adjacency(&self, node: &str) -> Option<&Adjacency> {
        self.forward.get(node)
    }

    /// Checks the structural invariants of both indexes.
    ///
    /// Every forward entry must be mirrored, edge for edge, in the backward
    /// index and the reverse; every id in either index must be a node; no
    /// index may hold empty entries; and `edge_count` must match.
    pub fn is_consistent(&self) -> bool {
        mirrors(&self.forward, &self.backward)
            && mirrors(&self.backward, &self.forward)
            && self.known_ids(&self.forward)
            && self.known_ids(&self.backward)
            && self.edge_count == self.all_edges().count()
    }

    fn known_ids(&self, index: &Index) -> bool {
        index.iter().all(|(outer, adj)| {
            self.nodes.contains(outer)
                && !adj.is_empty()
                && adj
                    .iter()
                    .all(|(inner, edges)| self.nodes.contains(inner) && !edges.is_empty())
        })
    }
}

/// Drops `inner` from `index[outer]`, pruning the outer entry if it empties.
fn detach(index: &mut Index, outer: &str, inner: &str) {
    if let Some(adj) = index.get_mut(outer) {
        adj.remove(inner);
        if adj.is_empty() {
            index.remove(outer);
        }
    }
}

fn keys(adj: Option<&Adjacency>) -> Vec<&str> {
    adj.map(|adj| adj.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

fn total(adj: Option<&Adjacency>) -> usize {
    adj.map(|adj| adj.values().map(Vec::len).sum()).unwrap_or(0)
}

fn mirrors(index: &Index, mirror: &Index) -> bool {
    index.iter().all(|(outer, adj)| {
        adj.iter().all(|(inner, edges)| {
            mirror
                .get(inner)
                .and_then(|m| m.get(outer))
                .is_some_and(|other| {
                    other.len() == edges.len()
                        && other.iter().zip(edges).all(|(a, b)| Arc::ptr_eq(a, b))
                })
        })
    })
}

impl std::fmt::Display for MultiDiGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MultiDiGraph(nodes={}, edges={})",
            self.node_count(),
            self.edge_count
        )
    }
}

/// Graph statistics for status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    /// Distinct ordered `(from, to)` pairs.
    pub pair_count: usize,
    /// Nodes with at least one outgoing edge.
    pub askers: usize,
    /// Nodes with at least one incoming edge.
    pub responders: usize,
}

impl MultiDiGraph {
    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            pair_count: self.forward.values().map(BTreeMap::len).sum(),
            askers: self.forward.len(),
            responders: self.backward.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(qid: &str) -> InteractionEdge {
        InteractionEdge::new(qid).unwrap()
    }

    fn qids(edges: &[Arc<InteractionEdge>]) -> Vec<&str> {
        edges.iter().map(|e| e.question_id()).collect()
    }

    /// alice→bob twice, carol→alice once.
    fn sample() -> MultiDiGraph {
        let mut graph = MultiDiGraph::new();
        graph.add_edge("alice", "bob", edge("q1"));
        graph.add_edge("alice", "bob", edge("q2"));
        graph.add_edge("carol", "alice", edge("q3"));
        graph
    }

    #[test]
    fn test_empty_graph() {
        let graph = MultiDiGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.all_edges().count(), 0);
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_sample_scenario() {
        let graph = sample();

        assert_eq!(graph.out_degree("alice"), 2);
        assert_eq!(graph.in_degree("alice"), 1);
        assert_eq!(graph.neighbors("alice"), vec!["bob"]);
        assert_eq!(graph.predecessors("alice"), vec!["carol"]);
        assert_eq!(qids(graph.get_edges("alice", "bob")), vec!["q1", "q2"]);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.is_consistent());

        let sub = graph.subgraph(["alice", "bob"]);
        assert_eq!(sub.nodes().collect::<Vec<_>>(), vec!["alice", "bob"]);
        assert_eq!(sub.edge_count(), 2);
        assert!(!sub.contains_node("carol"));
        assert_eq!(sub.in_degree("alice"), 0);
    }

    #[test]
    fn test_duplicate_edges_are_kept() {
        let mut graph = MultiDiGraph::new();
        let shared = Arc::new(edge("q1"));
        graph.add_edge("a", "b", Arc::clone(&shared));
        graph.add_edge("a", "b", Arc::clone(&shared));

        assert_eq!(graph.get_edges("a", "b").len(), 2);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_add_new_edge() {
        let mut graph = MultiDiGraph::new();
        graph
            .add_new_edge("a", "b", "q1", [("question_sent", "t0"), ("question_topic", "x")])
            .unwrap();

        let edges = graph.get_edges("a", "b");
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].timestamp(), Some("t0"));

        let err = graph
            .add_new_edge("a", "b", "", [("question_topic", "x")])
            .unwrap_err();
        assert_eq!(err, EdgeError::EmptyQuestionId);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_queries_on_unknown_nodes() {
        let graph = sample();
        assert!(graph.get_edges("zoe", "bob").is_empty());
        assert!(graph.get_edges("bob", "alice").is_empty());
        assert!(graph.neighbors("zoe").is_empty());
        assert!(graph.predecessors("zoe").is_empty());
        assert_eq!(graph.out_degree("zoe"), 0);
        assert_eq!(graph.in_degree("zoe"), 0);
        // Reads must not create entries.
        assert!(!graph.contains_node("zoe"));
        assert_eq!(graph.stats().askers, 2);
    }

    #[test]
    fn test_all_edges_order() {
        let graph = sample();
        let triples: Vec<_> = graph
            .all_edges()
            .map(|(f, t, e)| (f, t, e.question_id()))
            .collect();
        assert_eq!(
            triples,
            vec![
                ("alice", "bob", "q1"),
                ("alice", "bob", "q2"),
                ("carol", "alice", "q3"),
            ]
        );
        // Restartable
        assert_eq!(graph.all_edges().count(), 3);
    }

    #[test]
    fn test_remove_absent_node() {
        let mut graph = sample();
        assert!(!graph.remove_node("zoe"));
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.node_count(), 3);
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_remove_node_cleans_both_directions() {
        let mut graph = sample();
        assert!(graph.remove_node("alice"));

        assert!(!graph.contains_node("alice"));
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.neighbors("carol").is_empty());
        assert!(graph.predecessors("bob").is_empty());
        assert_eq!(graph.in_degree("bob"), 0);
        // Neighbours survive as isolated nodes.
        assert!(graph.contains_node("bob"));
        assert!(graph.contains_node("carol"));
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_remove_node_with_self_loop() {
        let mut graph = MultiDiGraph::new();
        graph.add_edge("a", "a", edge("q1"));
        graph.add_edge("a", "b", edge("q2"));
        graph.add_edge("c", "a", edge("q3"));
        graph.add_edge("b", "c", edge("q4"));

        assert!(graph.remove_node("a"));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.get_edges("b", "c").len(), 1);
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_subgraph_ignores_unknown_ids_and_keeps_isolated() {
        let mut graph = sample();
        graph.add_edge("dave", "erin", edge("q4"));

        let sub = graph.subgraph(vec!["alice".to_string(), "dave".into(), "nobody".into()]);
        assert_eq!(sub.nodes().collect::<Vec<_>>(), vec!["alice", "dave"]);
        assert_eq!(sub.edge_count(), 0);
        assert!(sub.is_consistent());
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_subgraph_shares_edge_records() {
        let graph = sample();
        let sub = graph.subgraph(["alice", "bob"]);
        let original = &graph.get_edges("alice", "bob")[0];
        let copied = &sub.get_edges("alice", "bob")[0];
        assert!(Arc::ptr_eq(original, copied));
    }

    #[test]
    fn test_stats_and_display() {
        let graph = sample();
        let stats = graph.stats();
        assert_eq!(stats.pair_count, 2);
        assert_eq!(stats.askers, 2);
        assert_eq!(stats.responders, 2);
        assert_eq!(graph.to_string(), "MultiDiGraph(nodes=3, edges=3)");
    }
}
