//! Persisted analysis history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Model label recorded when every candidate model failed.
pub const NO_MODEL_SUCCEEDED: &str = "none";

/// One stored analysis attempt and its outcome.
///
/// Serializes to the wire shape served by `GET /history`, where the model
/// label is exposed as `model`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub symptoms: String,
    pub result: String,
    #[serde(rename = "model")]
    pub model_used: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryRecord {
    /// Case-insensitive substring match against symptoms or result.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        self.symptoms.to_lowercase().contains(&needle)
            || self.result.to_lowercase().contains(&needle)
    }
}
