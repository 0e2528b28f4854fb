//! History records handed to the completion hook.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::mode::PolishMode;

/// A finished polish, ready for a history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Unique record id.
    pub id: Uuid,
    /// When the session completed.
    pub timestamp: DateTime<Utc>,
    /// Mode used.
    pub mode: PolishMode,
    /// Original text.
    pub input_text: String,
    /// Final (parsed body) text.
    pub result_text: String,
    /// Provider id from the configuration.
    pub provider: String,
}

impl HistoryRecord {
    /// Creates a record stamped with a fresh id and the current time.
    pub fn new(
        mode: PolishMode,
        input_text: impl Into<String>,
        result_text: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            mode,
            input_text: input_text.into(),
            result_text: result_text.into(),
            provider: provider.into(),
        }
    }
}
