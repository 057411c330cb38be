//! Centrality ranking over the interaction graph.
//!
//! Answers "who are the community leaders?" from several angles:
//!
//! - **In/out degree**: who answers, or asks, the most questions.
//! - **PageRank**: who answers questions from people who are themselves
//!   well answered.
//! - **Betweenness**: who sits on the shortest paths between others.
//! - **HITS**: hubs ask questions that reach good authorities; authorities
//!   answer questions from good hubs.
//!
//! Everything here reads the graph through its public surface and the
//! [`PetgraphView`]; nothing touches the adjacency indexes directly.

use crate::export::PetgraphView;
use crate::graph::MultiDiGraph;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankingError {
    #[error("damping must be within [0, 1], got {0}")]
    InvalidDamping(f64),
    #[error("iteration limit must be at least 1")]
    ZeroIterations,
    #[error("tolerance must be positive, got {0}")]
    InvalidTolerance(f64),
    #[error("unknown metric '{0}'")]
    UnknownMetric(String),
}

/// Parameters for the iterative algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CentralityConfig {
    /// Probability of following an edge rather than teleporting.
    pub damping: f64,
    /// Upper bound on PageRank and HITS iterations.
    pub iterations: usize,
    /// Stop once the L1 change between iterations falls below this.
    pub tolerance: f64,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            iterations: 100,
            tolerance: 1e-8,
        }
    }
}

impl CentralityConfig {
    pub fn validate(&self) -> Result<(), RankingError> {
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(RankingError::InvalidDamping(self.damping));
        }
        if self.iterations == 0 {
            return Err(RankingError::ZeroIterations);
        }
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return Err(RankingError::InvalidTolerance(self.tolerance));
        }
        Ok(())
    }
}

/// A centrality measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    InDegree,
    OutDegree,
    PageRank,
    Betweenness,
    Hub,
    Authority,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::InDegree,
        Metric::OutDegree,
        Metric::PageRank,
        Metric::Betweenness,
        Metric::Hub,
        Metric::Authority,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InDegree => "in_degree",
            Self::OutDegree => "out_degree",
            Self::PageRank => "page_rank",
            Self::Betweenness => "betweenness",
            Self::Hub => "hub",
            Self::Authority => "authority",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Metric {
    type Err = RankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "in_degree" | "in" => Ok(Self::InDegree),
            "out_degree" | "out" => Ok(Self::OutDegree),
            "page_rank" | "pagerank" => Ok(Self::PageRank),
            "betweenness" => Ok(Self::Betweenness),
            "hub" | "hubs" => Ok(Self::Hub),
            "authority" | "authorities" => Ok(Self::Authority),
            _ => Err(RankingError::UnknownMetric(s.to_string())),
        }
    }
}

/// A node and its score under one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedNode {
    pub node: String,
    pub score: f64,
}

/// Scores for every node under every metric.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CentralityScores {
    pub in_degree: HashMap<String, f64>,
    pub out_degree: HashMap<String, f64>,
    pub page_rank: HashMap<String, f64>,
    pub betweenness: HashMap<String, f64>,
    pub hubs: HashMap<String, f64>,
    pub authorities: HashMap<String, f64>,
    /// Whether HITS converged within the iteration limit.
    pub hits_converged: bool,
}

impl CentralityScores {
    /// Gets the score map for a metric.
    pub fn scores(&self, metric: Metric) -> &HashMap<String, f64> {
        match metric {
            Metric::InDegree => &self.in_degree,
            Metric::OutDegree => &self.out_degree,
            Metric::PageRank => &self.page_rank,
            Metric::Betweenness => &self.betweenness,
            Metric::Hub => &self.hubs,
            Metric::Authority => &self.authorities,
        }
    }

    /// Returns the `k` highest-scoring nodes, ties broken by node id.
    pub fn top(&self, metric: Metric, k: usize) -> Vec<RankedNode> {
        let mut ranked: Vec<RankedNode> = self
            .scores(metric)
            .iter()
            .map(|(node, &score)| RankedNode {
                node: node.clone(),
                score,
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.node.cmp(&b.node))
        });
        ranked.truncate(k);
        ranked
    }
}

/// Computes every centrality metric for the graph.
#[instrument(skip(graph), fields(nodes = graph.node_count(), edges = graph.edge_count()))]
pub fn compute_centrality(
    graph: &MultiDiGraph,
    config: &CentralityConfig,
) -> Result<CentralityScores, RankingError> {
    config.validate()?;

    let mut scores = CentralityScores {
        in_degree: graph
            .nodes()
            .map(|n| (n.to_string(), graph.in_degree(n) as f64))
            .collect(),
        out_degree: graph
            .nodes()
            .map(|n| (n.to_string(), graph.out_degree(n) as f64))
            .collect(),
        ..Default::default()
    };

    let view = PetgraphView::from_graph(graph);
    scores.page_rank = by_id(&view, &page_rank(&view, config));
    scores.betweenness = by_id(&view, &betweenness(&view));

    let hits = hits(&view, config);
    scores.hubs = by_id(&view, &hits.hubs);
    scores.authorities = by_id(&view, &hits.authorities);
    scores.hits_converged = hits.converged;

    info!(
        nodes = graph.node_count(),
        hits_iterations = hits.iterations,
        hits_converged = hits.converged,
        "computed centrality"
    );

    Ok(scores)
}

fn by_id(view: &PetgraphView, values: &[f64]) -> HashMap<String, f64> {
    view.graph
        .node_indices()
        .map(|idx| (view.graph[idx].clone(), values[idx.index()]))
        .collect()
}

/// PageRank by power iteration.
///
/// Each parallel edge carries its own share of the source's rank. Rank held
/// by nodes with no outgoing edges is spread evenly over all nodes.
fn page_rank(view: &PetgraphView, config: &CentralityConfig) -> Vec<f64> {
    let g = &view.graph;
    let n = g.node_count();
    if n == 0 {
        return Vec::new();
    }

    let nf = n as f64;
    let out_degree: Vec<f64> = g
        .node_indices()
        .map(|v| g.edges_directed(v, Direction::Outgoing).count() as f64)
        .collect();
    let mut rank = vec![1.0 / nf; n];

    for _ in 0..config.iterations {
        let dangling: f64 = g
            .node_indices()
            .filter(|v| out_degree[v.index()] == 0.0)
            .map(|v| rank[v.index()])
            .sum();
        let base = (1.0 - config.damping) / nf + config.damping * dangling / nf;

        let mut next = vec![base; n];
        for edge in g.edge_references() {
            let from = edge.source().index();
            next[edge.target().index()] += config.damping * rank[from] / out_degree[from];
        }

        let delta: f64 = rank.iter().zip(&next).map(|(a, b)| (a - b).abs()).sum();
        rank = next;
        if delta < nf * config.tolerance {
            break;
        }
    }

    rank
}

/// Brandes' betweenness over distinct neighbours.
///
/// Normalised by `1 / ((n - 1)(n - 2))` for graphs with more than two nodes.
fn betweenness(view: &PetgraphView) -> Vec<f64> {
    let g = &view.graph;
    let n = g.node_count();
    let mut centrality = vec![0.0; n];
    if n == 0 {
        return centrality;
    }

    let successors: Vec<Vec<usize>> = g
        .node_indices()
        .map(|v| {
            let mut next: Vec<usize> = g.neighbors(v).map(|w| w.index()).collect();
            next.sort_unstable();
            next.dedup();
            next
        })
        .collect();

    for s in 0..n {
        let mut stack = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0_f64; n];
        let mut dist = vec![-1_i64; n];
        sigma[s] = 1.0;
        dist[s] = 0;

        let mut queue = VecDeque::from([s]);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in &successors[v] {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0_f64; n];
        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
        centrality.iter_mut().for_each(|c| *c *= scale);
    }
    centrality
}

struct Hits {
    hubs: Vec<f64>,
    authorities: Vec<f64>,
    iterations: usize,
    converged: bool,
}

/// HITS by power iteration, weighting each parallel edge separately.
///
/// Scores are L2-normalised while iterating and L1-normalised at the end.
fn hits(view: &PetgraphView, config: &CentralityConfig) -> Hits {
    let g = &view.graph;
    let n = g.node_count();
    if n == 0 {
        return Hits {
            hubs: Vec::new(),
            authorities: Vec::new(),
            iterations: 0,
            converged: true,
        };
    }

    let mut hub = vec![1.0; n];
    let mut auth = vec![1.0; n];
    normalize_l2(&mut hub);
    normalize_l2(&mut auth);

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.iterations {
        iterations += 1;

        let mut next_auth = vec![0.0; n];
        for edge in g.edge_references() {
            next_auth[edge.target().index()] += hub[edge.source().index()];
        }
        let mut next_hub = vec![0.0; n];
        for edge in g.edge_references() {
            next_hub[edge.source().index()] += next_auth[edge.target().index()];
        }
        normalize_l2(&mut next_auth);
        normalize_l2(&mut next_hub);

        let delta: f64 = auth
            .iter()
            .zip(&next_auth)
            .map(|(a, b)| (a - b).abs())
            .sum();
        auth = next_auth;
        hub = next_hub;

        if delta < config.tolerance {
            converged = true;
            break;
        }
    }

    normalize_l1(&mut hub);
    normalize_l1(&mut auth);

    Hits {
        hubs: hub,
        authorities: auth,
        iterations,
        converged,
    }
}

fn normalize_l2(v: &mut [f64]) {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

fn normalize_l1(v: &mut [f64]) {
    let norm: f64 = v.iter().map(|x| x.abs()).sum();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}
