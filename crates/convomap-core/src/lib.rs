//! Synchronization engine for per-course conversation maps.
//!
//! This crate owns the merge/upsert logic that keeps a remote
//! embedding-index service consistent with an application's conversation
//! stream: transcript formatting, prior-point location, the INSERT/UPDATE
//! state machine, the bootstrap policy for new courses, the guarded upsert,
//! and the retry/backoff controller around one attempt.

pub mod bootstrap;
pub mod error;
pub mod locate;
pub mod merge;
pub mod retry;
pub mod service;
pub mod sync;
pub mod transcript;
pub mod types;
pub mod upsert;

/// Structured error kinds for collaborators and attempts.
pub use error::{EmbeddingError, IndexError, StoreError, SyncError};
/// Snapshot lookup of prior index points.
pub use locate::{IndexSnapshot, SnapshotRecord};
/// Collaborator interfaces and the default log-backed reporter.
pub use service::{
    ConversationStore, EmbeddingClient, ErrorReporter, IndexHandle, IndexService, LogReporter,
};
/// Engine facade and its tunables.
pub use sync::{SyncEngine, SyncOptions, SyncOutcome};
/// Core data model.
pub use types::{
    ContentPart, Conversation, ConversationRow, IndexDescriptor, IndexedRecord, Message,
    MessageContent, RecordDraft, Role, RowId,
};
/// Retry policy applied around whole attempts.
pub use retry::RetryPolicy;
