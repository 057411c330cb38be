//! Graph builder for constructing the interaction graph from log rows.
//!
//! Every row becomes one edge from the asker to the responder. The edge
//! record only keeps the question id and send time, so the builder also
//! keeps each row in a side table keyed by question id.

use crate::error::IngestError;
use crate::record::InteractionRecord;
use agora_graph::MultiDiGraph;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of loading an interaction log.
#[derive(Debug)]
pub struct IngestResult {
    pub graph: MultiDiGraph,
    /// Full rows keyed by question id.
    pub records: HashMap<String, InteractionRecord>,
    /// Rows seen, including skipped ones.
    pub rows_read: usize,
    /// Rows that could not be used, as `(line, reason)`.
    pub skipped: Vec<(u64, String)>,
    pub duration_ms: u64,
}

/// Builds a [`MultiDiGraph`] from interaction records.
pub struct GraphBuilder {
    graph: MultiDiGraph,
    records: HashMap<String, InteractionRecord>,
    rows_read: usize,
    skipped: Vec<(u64, String)>,
    started: Instant,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            graph: MultiDiGraph::new(),
            records: HashMap::new(),
            rows_read: 0,
            skipped: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Adds one record as an edge.
    ///
    /// Records missing a participant or question id are rejected; the error
    /// reports the record's 1-based position among those added.
    pub fn add_record(&mut self, record: InteractionRecord) -> Result<(), IngestError> {
        let line = self.rows_read as u64 + 1;
        self.add_at(line, record)
    }

    pub(crate) fn add_at(
        &mut self,
        line: u64,
        record: InteractionRecord,
    ) -> Result<(), IngestError> {
        self.rows_read += 1;

        let missing = [
            ("question_user_id", &record.question_user_id),
            ("response_user_id", &record.response_user_id),
            ("question_id", &record.question_id),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());

        if let Some((column, _)) = missing {
            return Err(IngestError::InvalidRecord {
                line,
                reason: format!("missing {column}"),
            });
        }

        self.graph.add_new_edge(
            record.question_user_id.as_str(),
            record.response_user_id.as_str(),
            record.question_id.as_str(),
            record.attributes(),
        )?;

        if let Some(previous) = self.records.insert(record.question_id.clone(), record) {
            debug!(question_id = %previous.question_id, "question id seen more than once");
        }
        Ok(())
    }

    /// Records a row that could not be read.
    pub(crate) fn skip(&mut self, line: u64, reason: String) {
        warn!(line, %reason, "skipping row");
        self.skipped.push((line, reason));
    }

    /// Adds a record, noting it as skipped instead of failing.
    pub(crate) fn add_or_skip(&mut self, line: u64, record: InteractionRecord) {
        if let Err(e) = self.add_at(line, record) {
            let reason = match e {
                IngestError::InvalidRecord { reason, .. } => reason,
                other => other.to_string(),
            };
            self.skip(line, reason);
        }
    }

    /// Counts a row that failed before it could be parsed.
    pub(crate) fn count_unparsed(&mut self, line: u64, reason: String) {
        self.rows_read += 1;
        self.skip(line, reason);
    }

    /// Finishes building and returns the graph with its side table.
    pub fn build(self) -> IngestResult {
        let duration_ms = self.started.elapsed().as_millis() as u64;
        info!(
            rows = self.rows_read,
            skipped = self.skipped.len(),
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            duration_ms,
            "built interaction graph"
        );

        IngestResult {
            graph: self.graph,
            records: self.records,
            rows_read: self.rows_read,
            skipped: self.skipped,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_adds_edges() {
        let mut builder = GraphBuilder::new();
        builder
            .add_record(InteractionRecord::new("alice", "bob", "q1").with_question_sent("t1"))
            .unwrap();
        builder
            .add_record(InteractionRecord::new("alice", "bob", "q2"))
            .unwrap();
        builder
            .add_record(InteractionRecord::new("carol", "alice", "q3"))
            .unwrap();

        let result = builder.build();
        let graph = &result.graph;

        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.out_degree("alice"), 2);
        assert_eq!(graph.in_degree("alice"), 1);
        assert_eq!(graph.get_edges("alice", "bob")[0].timestamp(), Some("t1"));
        assert_eq!(result.rows_read, 3);
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_side_table_keeps_full_rows() {
        let mut builder = GraphBuilder::new();
        let mut record = InteractionRecord::new("alice", "bob", "q1");
        record.question_topic = Some("gardening".to_string());
        builder.add_record(record).unwrap();

        let result = builder.build();
        assert_eq!(
            result.records["q1"].question_topic.as_deref(),
            Some("gardening")
        );
    }

    #[test]
    fn test_rejects_missing_ids() {
        let mut builder = GraphBuilder::new();
        builder
            .add_record(InteractionRecord::new("alice", "bob", "q1"))
            .unwrap();

        let err = builder
            .add_record(InteractionRecord::new("alice", " ", "q2"))
            .unwrap_err();
        match err {
            IngestError::InvalidRecord { line, reason } => {
                assert_eq!(line, 2);
                assert_eq!(reason, "missing response_user_id");
            }
            other => panic!("unexpected error: {other}"),
        }

        let result = builder.build();
        assert_eq!(result.graph.edge_count(), 1);
        assert!(!result.graph.contains_node(" "));
    }
}
