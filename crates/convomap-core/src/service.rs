//! Collaborator interfaces consumed by the synchronization engine.
//!
//! Implementations live elsewhere (HTTP clients in `convomap-remote`, stubs
//! in `convomap-test-utils`); each one is constructed once per process with
//! its credentials and injected into the engine.

use async_trait::async_trait;
use log::error;

use crate::error::{EmbeddingError, IndexError, StoreError, SyncError};
use crate::locate::IndexSnapshot;
use crate::types::{ConversationRow, IndexDescriptor, IndexedRecord, RowId};

/// Read-only access to the relational conversation store.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Fetch a course's historical conversation rows, in creation order.
    async fn historical_rows(&self, course: &str) -> Result<Vec<ConversationRow>, StoreError>;
}

/// Embedding-model service: text in, fixed-dimension vectors out.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed each input text, one vector per input, order-preserving.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Open handle to one course's index.
///
/// The remote store models update as delete-then-reinsert; additions and the
/// rebuild that follows must happen while holding the write lock.
#[async_trait]
pub trait IndexHandle: Send + Sync {
    /// Read the current records (metadata plus embeddings).
    async fn snapshot(&self) -> Result<IndexSnapshot, IndexError>;

    /// Acquire the exclusive write lock, waiting while another writer holds
    /// it rather than failing immediately.
    async fn acquire_lock(&self) -> Result<(), IndexError>;

    /// Release the write lock.
    async fn release_lock(&self) -> Result<(), IndexError>;

    /// Delete records by row id.
    async fn delete(&self, row_ids: &[RowId]) -> Result<(), IndexError>;

    /// Add records with their embeddings.
    async fn add(&self, records: &[IndexedRecord]) -> Result<(), IndexError>;

    /// Rebuild derived structure (clustering/topics) after a mutation.
    async fn rebuild(&self) -> Result<(), IndexError>;
}

/// Remote embedding-index service scoped by course.
#[async_trait]
pub trait IndexService: Send + Sync {
    /// Resolve the index for a course. Returns `IndexError::NotConfigured`
    /// when the course has no index yet.
    async fn open(&self, course: &str) -> Result<Box<dyn IndexHandle>, IndexError>;

    /// Create a course's index from an initial record set in one call,
    /// triggering index construction and topic derivation once.
    async fn bulk_create(&self, course: &str, records: &[IndexedRecord])
        -> Result<(), IndexError>;

    /// Resolve the UI descriptor for a course's index.
    async fn descriptor(&self, course: &str) -> Result<IndexDescriptor, IndexError>;
}

/// Fire-and-forget channel for permanent failures.
pub trait ErrorReporter: Send + Sync {
    /// Report a failure to the operator-facing error channel.
    fn report(&self, error: &SyncError);
}

/// Default reporter that writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, error: &SyncError) {
        error!("conversation sync failure: {error}");
    }
}
