//! Edge records for the interaction graph.
//!
//! Each edge stands for one question asked by its source participant and
//! answered by its destination participant. The record only keeps what
//! identifies the interaction: the question id and, when the log has one,
//! the time the question was sent.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Attribute carrying the time a question was sent.
pub const QUESTION_SENT: &str = "question_sent";
pub const QUESTION_USER_ID: &str = "question_user_id";
pub const QUESTION_LANGUAGE: &str = "question_language";
pub const QUESTION_TOPIC: &str = "question_topic";
pub const RESPONSE_USER_ID: &str = "response_user_id";
pub const RESPONSE_LANGUAGE: &str = "response_language";
pub const RESPONSE_TOPIC: &str = "response_topic";
pub const RESPONSE_SENT: &str = "response_sent";

/// Errors raised while constructing an edge record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EdgeError {
    #[error("question id must not be empty")]
    EmptyQuestionId,
}

/// One question/answer interaction between two participants.
///
/// Equality and hashing both cover `(question_id, timestamp)`, so two
/// records for the same question sent at the same time are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InteractionEdge {
    question_id: String,
    timestamp: Option<String>,
}

impl InteractionEdge {
    /// Creates an edge without a timestamp.
    pub fn new(question_id: impl Into<String>) -> Result<Self, EdgeError> {
        Self::build(question_id.into(), None)
    }

    /// Creates an edge stamped with the time the question was sent.
    pub fn with_timestamp(
        question_id: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Result<Self, EdgeError> {
        Self::build(question_id.into(), Some(timestamp.into()))
    }

    /// Creates an edge from a question id and a set of named attributes.
    ///
    /// Any attribute name is accepted. Only [`QUESTION_SENT`] ends up in the
    /// record; callers that need the rest should keep them keyed by
    /// question id.
    pub fn from_attributes<'a, I>(
        question_id: impl Into<String>,
        attrs: I,
    ) -> Result<Self, EdgeError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let timestamp = attrs
            .into_iter()
            .find(|(name, _)| *name == QUESTION_SENT)
            .map(|(_, value)| value.to_string());
        Self::build(question_id.into(), timestamp)
    }

    fn build(question_id: String, timestamp: Option<String>) -> Result<Self, EdgeError> {
        if question_id.trim().is_empty() {
            return Err(EdgeError::EmptyQuestionId);
        }
        Ok(Self {
            question_id,
            timestamp,
        })
    }

    /// The id of the question behind this interaction.
    pub fn question_id(&self) -> &str {
        &self.question_id
    }

    /// When the question was sent, if the log recorded it.
    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }
}

impl std::fmt::Display for InteractionEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:\t{}",
            self.question_id,
            self.timestamp.as_deref().unwrap_or("-")
        )
    }
}
