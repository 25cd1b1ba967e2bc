//! The synchronization engine facade.
//!
//! Wraps one locate → merge → commit attempt in the retry/backoff controller
//! and exposes the best-effort public surface used by the conversation flow.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use convomap_config::ConvomapConfig;
use log::{debug, info, warn};

use crate::bootstrap::{plan_bootstrap, BootstrapPlan, MIN_BOOTSTRAP_ROWS};
use crate::error::{IndexError, SyncError};
use crate::merge::{merge, EmbeddingPlan, MergedRecord, RECENT_MESSAGE_WINDOW};
use crate::retry::RetryPolicy;
use crate::service::{ConversationStore, EmbeddingClient, ErrorReporter, IndexService};
use crate::types::{Conversation, IndexDescriptor, IndexedRecord};
use crate::upsert::{commit_bootstrap, commit_incremental};

/// Tunables for the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOptions {
    /// Backoff applied to transient contention.
    pub retry: RetryPolicy,
    /// Trailing messages appended per UPDATE.
    pub recent_message_window: usize,
    /// Historical rows required before a course index is materialized.
    pub min_bootstrap_rows: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            recent_message_window: RECENT_MESSAGE_WINDOW,
            min_bootstrap_rows: MIN_BOOTSTRAP_ROWS,
        }
    }
}

impl From<&ConvomapConfig> for SyncOptions {
    fn from(config: &ConvomapConfig) -> Self {
        Self {
            retry: RetryPolicy {
                max_attempts: config.retry.max_attempts,
                base_delay: std::time::Duration::from_millis(config.retry.base_delay_ms),
                growth_factor: config.retry.growth_factor,
            },
            recent_message_window: config.recent_message_window,
            min_bootstrap_rows: config.min_bootstrap_rows,
        }
    }
}

/// Terminal status of one `sync_conversation` call. Never an error: the
/// conversation flow proceeds regardless of the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Conversation upserted into an existing index.
    Logged { course: String },
    /// A brand-new index was bulk-created for the course.
    Created { course: String },
    /// The course has not crossed the bootstrap volume threshold yet.
    Deferred { course: String },
    /// The attempt failed permanently; already reported to the error channel.
    Failed { course: String },
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Logged { course } => write!(f, "Successfully logged for {course}"),
            SyncOutcome::Created { course } => {
                write!(f, "Successfully created conversation map for {course}")
            }
            SyncOutcome::Deferred { course } => write!(
                f,
                "Deferred conversation map for {course}: not enough conversations yet"
            ),
            SyncOutcome::Failed { course } => {
                write!(f, "Failed to log conversation for {course}")
            }
        }
    }
}

/// Best-effort synchronizer of conversations into per-course indexes.
pub struct SyncEngine {
    store: Arc<dyn ConversationStore>,
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<dyn IndexService>,
    reporter: Arc<dyn ErrorReporter>,
    options: SyncOptions,
}

impl SyncEngine {
    /// Create an engine over collaborator clients constructed once per
    /// process.
    pub fn new(
        store: Arc<dyn ConversationStore>,
        embedder: Arc<dyn EmbeddingClient>,
        index: Arc<dyn IndexService>,
        reporter: Arc<dyn ErrorReporter>,
        options: SyncOptions,
    ) -> Self {
        Self {
            store,
            embedder,
            index,
            reporter,
            options,
        }
    }

    /// Synchronize one conversation into its course's index.
    ///
    /// Transient contention is retried with exponential backoff; a missing
    /// index diverts to the bootstrap path exactly once; every other failure
    /// is reported to the error channel and degraded to a `Failed` outcome.
    pub async fn sync_conversation(&self, course: &str, conversation: &Conversation) -> SyncOutcome {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.attempt_incremental(course, conversation).await {
                Ok(outcome) => return outcome,
                Err(err) if err.is_not_configured() => {
                    info!("no index for course yet, switching to bootstrap (course={course})");
                    return self.bootstrap(course, conversation).await;
                }
                Err(err) if err.is_transient() && attempt < self.options.retry.max_attempts => {
                    let delay = self.options.retry.delay_for(attempt - 1);
                    warn!(
                        "index contention, backing off (course={course}, attempt={attempt}, delay={delay:?}): {err}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    self.reporter.report(&err);
                    warn!("giving up on conversation sync (course={course}, attempt={attempt}): {err}");
                    return SyncOutcome::Failed {
                        course: course.to_string(),
                    };
                }
            }
        }
    }

    /// Resolve the descriptor needed to embed a course's index view.
    ///
    /// Returns the empty descriptor when the course has no index; that case
    /// is not reported to the error channel.
    pub async fn index_descriptor(&self, course: &str) -> IndexDescriptor {
        match self.index.descriptor(course).await {
            Ok(descriptor) => descriptor,
            Err(IndexError::NotConfigured(reason)) => {
                debug!("no index descriptor yet (course={course}): {reason}");
                IndexDescriptor::empty()
            }
            Err(err) => {
                let err = SyncError::from(err);
                self.reporter.report(&err);
                IndexDescriptor::empty()
            }
        }
    }

    /// One incremental attempt: locate, merge, embed if needed, commit.
    async fn attempt_incremental(
        &self,
        course: &str,
        conversation: &Conversation,
    ) -> Result<SyncOutcome, SyncError> {
        let handle = self.index.open(course).await?;
        let snapshot = handle.snapshot().await?;
        let prior = snapshot.locate(&conversation.id);
        let prior_row_id = prior.map(|record| record.row_id);
        let merged = merge(
            course,
            conversation,
            prior,
            snapshot.max_row_id(),
            self.options.recent_message_window,
            Utc::now(),
        );
        let record = self.resolve_embedding(merged).await?;
        commit_incremental(handle.as_ref(), prior_row_id, &record).await?;
        info!(
            "logged conversation (course={course}, conversation_id={}, row_id={}, update={})",
            conversation.id,
            record.row_id,
            prior_row_id.is_some()
        );
        Ok(SyncOutcome::Logged {
            course: course.to_string(),
        })
    }

    /// Bootstrap path: assemble and bulk-create the course's initial index.
    async fn bootstrap(&self, course: &str, conversation: &Conversation) -> SyncOutcome {
        match self.attempt_bootstrap(course, conversation).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.reporter.report(&err);
                warn!("bootstrap failed (course={course}): {err}");
                SyncOutcome::Failed {
                    course: course.to_string(),
                }
            }
        }
    }

    async fn attempt_bootstrap(
        &self,
        course: &str,
        conversation: &Conversation,
    ) -> Result<SyncOutcome, SyncError> {
        let rows = self.store.historical_rows(course).await?;
        let plan = plan_bootstrap(
            course,
            &rows,
            conversation,
            self.options.min_bootstrap_rows,
            Utc::now(),
        );
        let BootstrapPlan::Ready(drafts) = plan else {
            debug!(
                "bootstrap deferred (course={course}, rows={}, required={})",
                rows.len(),
                self.options.min_bootstrap_rows
            );
            return Ok(SyncOutcome::Deferred {
                course: course.to_string(),
            });
        };

        let first_queries: Vec<String> =
            drafts.iter().map(|draft| draft.first_query.clone()).collect();
        let embeddings = self.embedder.embed(&first_queries).await?;
        if embeddings.len() != drafts.len() {
            return Err(SyncError::EmbeddingShape {
                want: drafts.len(),
                got: embeddings.len(),
            });
        }

        let records: Vec<IndexedRecord> = drafts
            .into_iter()
            .zip(embeddings)
            .map(|(draft, embedding)| draft.into_record(embedding))
            .collect();
        commit_bootstrap(self.index.as_ref(), course, &records).await?;
        info!(
            "created conversation map (course={course}, records={})",
            records.len()
        );
        Ok(SyncOutcome::Created {
            course: course.to_string(),
        })
    }

    /// Resolve a merged record's embedding plan against the embedding client.
    async fn resolve_embedding(&self, merged: MergedRecord) -> Result<IndexedRecord, SyncError> {
        let MergedRecord { draft, embedding } = merged;
        let embedding = match embedding {
            EmbeddingPlan::Reuse(vector) => vector,
            EmbeddingPlan::Compute(text) => {
                let mut vectors = self.embedder.embed(std::slice::from_ref(&text)).await?;
                if vectors.len() != 1 {
                    return Err(SyncError::EmbeddingShape {
                        want: 1,
                        got: vectors.len(),
                    });
                }
                vectors.remove(0)
            }
        };
        Ok(draft.into_record(embedding))
    }
}

#[cfg(test)]
mod tests {
    use super::SyncOutcome;
    use pretty_assertions::assert_eq;

    #[test]
    fn outcomes_render_operator_status_strings() {
        let course = "cs101".to_string();
        assert_eq!(
            SyncOutcome::Logged { course: course.clone() }.to_string(),
            "Successfully logged for cs101"
        );
        assert_eq!(
            SyncOutcome::Created { course: course.clone() }.to_string(),
            "Successfully created conversation map for cs101"
        );
        assert_eq!(
            SyncOutcome::Failed { course }.to_string(),
            "Failed to log conversation for cs101"
        );
    }
}
