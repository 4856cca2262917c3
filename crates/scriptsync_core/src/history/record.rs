//! Persisted history entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One append-only history entry: the encoded patch pair for a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub uuid: String,
    pub created_at: DateTime<Utc>,
    pub author: String,
    /// Encoded patch from the new state back to the old one.
    pub undo_patch: String,
    /// Encoded patch from the old state to the new one.
    pub redo_patch: String,
    #[serde(default)]
    pub is_draft: bool,
}

impl HistoryRecord {
    /// Create a record stamped now with a fresh uuid.
    pub fn new(
        author: impl Into<String>,
        undo_patch: String,
        redo_patch: String,
        is_draft: bool,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            author: author.into(),
            undo_patch,
            redo_patch,
            is_draft,
        }
    }

    /// Record for the opposite transition: patches swapped, draft flag kept.
    pub fn inverse(&self, author: impl Into<String>) -> Self {
        Self::new(
            author,
            self.redo_patch.clone(),
            self.undo_patch.clone(),
            self.is_draft,
        )
    }
}

pub(crate) fn encode_record(record: &HistoryRecord) -> Result<Vec<u8>, bincode::Error> {
    bincode::serialize(record)
}

pub(crate) fn decode_record(bytes: &[u8]) -> Result<HistoryRecord, bincode::Error> {
    bincode::deserialize(bytes)
}
