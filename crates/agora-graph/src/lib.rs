//! Agora Graph - interaction multigraph
//!
//! This crate holds the graph of who-answered-whom. Nodes are participant
//! ids; every question answered adds one directed edge from the asker to
//! the responder, so the same pair can be linked many times.
//!
//! # Architecture
//!
//! The graph keeps two adjacency indexes, forward and backward, updated
//! together so both directions can be read without scanning. On top of it:
//! - Structural export (JSON snapshot, petgraph view)
//! - Centrality ranking for spotting community leaders
//!
//! # Example
//!
//! ```
//! use agora_graph::{InteractionEdge, MultiDiGraph};
//!
//! let mut graph = MultiDiGraph::new();
//! graph.add_edge("alice", "bob", InteractionEdge::new("q1").unwrap());
//! graph.add_edge("alice", "bob", InteractionEdge::new("q2").unwrap());
//!
//! assert_eq!(graph.out_degree("alice"), 2);
//! assert_eq!(graph.neighbors("alice"), vec!["bob"]);
//! ```

mod edge;
mod export;
mod graph;
mod ranking;

pub use edge::{
    EdgeError, InteractionEdge, QUESTION_LANGUAGE, QUESTION_SENT, QUESTION_TOPIC,
    QUESTION_USER_ID, RESPONSE_LANGUAGE, RESPONSE_SENT, RESPONSE_TOPIC, RESPONSE_USER_ID,
};
pub use export::{EdgeTriple, GraphSnapshot, PetgraphView};
pub use graph::{GraphStats, MultiDiGraph};
pub use ranking::{
    compute_centrality, CentralityConfig, CentralityScores, Metric, RankedNode, RankingError,
};
