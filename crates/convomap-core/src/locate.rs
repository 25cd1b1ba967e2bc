//! Locating prior index points for a conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::RowId;

/// One record as read back from a course's index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotRecord {
    /// Index-local sequential id.
    pub row_id: RowId,
    /// Logical conversation id.
    pub conversation_id: String,
    /// Transcript stored for the conversation so far.
    pub transcript: String,
    /// First query stored at insertion time.
    pub first_query: String,
    /// Original insertion timestamp.
    pub created_at: DateTime<Utc>,
    /// Embedding stored at insertion time.
    pub embedding: Vec<f32>,
}

/// Point-in-time view of a course's index records.
///
/// The snapshot is re-read at the start of every attempt and may be stale
/// relative to concurrent writers; the remote store's lock serializes the
/// actual writes and the last write wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSnapshot {
    /// Records currently in the index.
    pub records: Vec<SnapshotRecord>,
}

impl IndexSnapshot {
    /// Build a snapshot from records.
    pub fn new(records: Vec<SnapshotRecord>) -> Self {
        Self { records }
    }

    /// Find the prior point for a conversation id, if one exists.
    pub fn locate(&self, conversation_id: &str) -> Option<&SnapshotRecord> {
        self.records
            .iter()
            .find(|record| record.conversation_id == conversation_id)
    }

    /// Highest row id currently assigned, or 0 for an empty index.
    pub fn max_row_id(&self) -> RowId {
        self.records
            .iter()
            .map(|record| record.row_id)
            .max()
            .unwrap_or(0)
    }
}
