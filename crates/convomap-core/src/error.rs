//! Error types for the synchronization engine.
//!
//! Collaborator failures are mapped once at each client boundary into the
//! structured kinds below; the retry controller classifies on the kind, never
//! on message text.

use thiserror::Error;

/// Errors returned by the remote embedding-index service.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The index is lock-held or mid-rebuild; safe to retry after a delay.
    #[error("index contention: {0}")]
    Contention(String),
    /// No index has been materialized for the course yet.
    #[error("index not configured: {0}")]
    NotConfigured(String),
    /// Any other remote failure.
    #[error("remote index error: {0}")]
    Remote(String),
    /// The remote response could not be decoded.
    #[error("index decode error: {0}")]
    Decode(String),
}

/// Errors returned by the embedding-model service.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Remote call failed.
    #[error("remote embedding error: {0}")]
    Remote(String),
    /// The remote response could not be decoded.
    #[error("embedding decode error: {0}")]
    Decode(String),
}

/// Errors returned by the relational conversation store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Remote call failed.
    #[error("remote store error: {0}")]
    Remote(String),
    /// The remote response could not be decoded.
    #[error("store decode error: {0}")]
    Decode(String),
}

/// Errors produced by one synchronization attempt.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Remote index failure.
    #[error("index error: {0}")]
    Index(#[from] IndexError),
    /// Embedding-model failure.
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
    /// Conversation-store failure.
    #[error("conversation store error: {0}")]
    Store(#[from] StoreError),
    /// The embedding service returned the wrong number of vectors.
    #[error("embedding service returned {got} vectors for {want} inputs")]
    EmbeddingShape { want: usize, got: usize },
}

impl SyncError {
    /// True when the attempt should be retried with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::Index(IndexError::Contention(_)))
    }

    /// True when the course has no index yet and the bootstrap path applies.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, SyncError::Index(IndexError::NotConfigured(_)))
    }
}
