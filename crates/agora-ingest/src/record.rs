//! Interaction log rows.

use agora_graph::{
    QUESTION_LANGUAGE, QUESTION_SENT, QUESTION_TOPIC, QUESTION_USER_ID, RESPONSE_LANGUAGE,
    RESPONSE_SENT, RESPONSE_TOPIC, RESPONSE_USER_ID,
};
use serde::{Deserialize, Deserializer, Serialize};

/// One row of the interaction log: a question and the answer it got.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub question_user_id: String,
    pub response_user_id: String,
    pub question_id: String,

    #[serde(default, deserialize_with = "empty_as_none")]
    pub response_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub question_language: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub question_topic: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub question_sent: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub response_language: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub response_topic: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub response_sent: Option<String>,
}

impl InteractionRecord {
    /// Creates a record with only the required columns set.
    pub fn new(
        question_user_id: impl Into<String>,
        response_user_id: impl Into<String>,
        question_id: impl Into<String>,
    ) -> Self {
        Self {
            question_user_id: question_user_id.into(),
            response_user_id: response_user_id.into(),
            question_id: question_id.into(),
            response_id: None,
            question_language: None,
            question_topic: None,
            question_sent: None,
            response_language: None,
            response_topic: None,
            response_sent: None,
        }
    }

    /// Sets the time the question was sent.
    pub fn with_question_sent(mut self, sent: impl Into<String>) -> Self {
        self.question_sent = Some(sent.into());
        self
    }

    /// Named attributes present on this row, in the form edge records take.
    pub fn attributes(&self) -> Vec<(&str, &str)> {
        let mut attrs = vec![
            (QUESTION_USER_ID, self.question_user_id.as_str()),
            (RESPONSE_USER_ID, self.response_user_id.as_str()),
        ];
        let optional = [
            (QUESTION_LANGUAGE, &self.question_language),
            (QUESTION_TOPIC, &self.question_topic),
            (QUESTION_SENT, &self.question_sent),
            (RESPONSE_LANGUAGE, &self.response_language),
            (RESPONSE_TOPIC, &self.response_topic),
            (RESPONSE_SENT, &self.response_sent),
        ];
        attrs.extend(
            optional
                .into_iter()
                .filter_map(|(name, value)| value.as_deref().map(|v| (name, v))),
        );
        attrs
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
