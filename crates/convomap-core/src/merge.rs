//! INSERT/UPDATE state machine producing exactly one record per call.

use chrono::{DateTime, Utc};

use crate::locate::SnapshotRecord;
use crate::transcript::format_messages;
use crate::types::{Conversation, RecordDraft, RowId};

/// How many trailing messages an UPDATE appends onto the prior transcript.
/// Everything but the most recent turn is assumed to be synced already.
pub const RECENT_MESSAGE_WINDOW: usize = 2;

/// Whether the record needs a fresh embedding or carries the prior one.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingPlan {
    /// Embed this text (the conversation's first query).
    Compute(String),
    /// Reuse the embedding stored with the prior point.
    Reuse(Vec<f32>),
}

/// Outcome of a merge: the record metadata plus its embedding plan.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    /// Record metadata awaiting an embedding.
    pub draft: RecordDraft,
    /// Embedding source for the record.
    pub embedding: EmbeddingPlan,
}

/// Build the record for a conversation against the current index snapshot.
///
/// INSERT (no prior point): full transcript from all messages, fresh
/// timestamps, `row_id = max_row_id + 1`, embedding computed from the first
/// query. UPDATE (prior point found): only the newest `window` messages are
/// appended onto the prior transcript — fewer when the list is short —
/// preserving `row_id`, `created_at`, `first_query`, and the stored
/// embedding; `modified_at` is refreshed.
pub fn merge(
    course: &str,
    conversation: &Conversation,
    prior: Option<&SnapshotRecord>,
    max_row_id: RowId,
    window: usize,
    now: DateTime<Utc>,
) -> MergedRecord {
    match prior {
        None => {
            let formatted = format_messages(&conversation.messages);
            MergedRecord {
                draft: RecordDraft {
                    row_id: max_row_id + 1,
                    course: course.to_string(),
                    conversation_id: conversation.id.clone(),
                    transcript: formatted.transcript,
                    first_query: formatted.first_query.clone(),
                    user_email: conversation.user_email.clone(),
                    created_at: now,
                    modified_at: now,
                },
                embedding: EmbeddingPlan::Compute(formatted.first_query),
            }
        }
        Some(prior) => {
            let tail_start = conversation.messages.len().saturating_sub(window);
            let appended = format_messages(&conversation.messages[tail_start..]);
            let mut transcript = prior.transcript.clone();
            transcript.push_str(&appended.transcript);
            MergedRecord {
                draft: RecordDraft {
                    row_id: prior.row_id,
                    course: course.to_string(),
                    conversation_id: conversation.id.clone(),
                    transcript,
                    first_query: prior.first_query.clone(),
                    user_email: conversation.user_email.clone(),
                    created_at: prior.created_at,
                    modified_at: now,
                },
                embedding: EmbeddingPlan::Reuse(prior.embedding.clone()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{merge, EmbeddingPlan, RECENT_MESSAGE_WINDOW};
    use crate::locate::SnapshotRecord;
    use crate::types::{Conversation, Message, MessageContent, Role};
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    fn conversation(id: &str, texts: &[(&str, &str)]) -> Conversation {
        Conversation {
            id: id.to_string(),
            user_email: "student@example.edu".to_string(),
            messages: texts
                .iter()
                .map(|&(role, text)| Message {
                    role: Role::parse(role),
                    content: MessageContent::from(text),
                })
                .collect(),
        }
    }

    fn prior(row_id: i64, transcript: &str) -> SnapshotRecord {
        SnapshotRecord {
            row_id,
            conversation_id: "conv-1".to_string(),
            transcript: transcript.to_string(),
            first_query: "original query".to_string(),
            created_at: Utc::now() - Duration::hours(3),
            embedding: vec![0.5; 8],
        }
    }

    #[test]
    fn insert_assigns_next_row_id() {
        let convo = conversation("conv-1", &[("user", "hello")]);
        let now = Utc::now();

        let fresh = merge("cs101", &convo, None, 0, RECENT_MESSAGE_WINDOW, now);
        assert_eq!(fresh.draft.row_id, 1);

        let next = merge("cs101", &convo, None, 41, RECENT_MESSAGE_WINDOW, now);
        assert_eq!(next.draft.row_id, 42);
    }

    #[test]
    fn insert_requests_fresh_embedding_of_first_query() {
        let convo = conversation("conv-1", &[("user", "hello"), ("assistant", "hi")]);
        let now = Utc::now();
        let merged = merge("cs101", &convo, None, 0, RECENT_MESSAGE_WINDOW, now);
        assert_eq!(
            merged.embedding,
            EmbeddingPlan::Compute("hello".to_string())
        );
        assert_eq!(merged.draft.first_query, "hello");
        assert_eq!(merged.draft.created_at, now);
        assert_eq!(merged.draft.modified_at, now);
        assert!(merged.draft.transcript.contains(">>> 🙋 user: hello"));
        assert!(merged.draft.transcript.contains(">>> 🤖 assistant: hi"));
    }

    #[test]
    fn update_preserves_identity_and_reuses_embedding() {
        let convo = conversation(
            "conv-1",
            &[
                ("user", "hello"),
                ("assistant", "hi"),
                ("user", "and one more thing"),
                ("assistant", "certainly"),
            ],
        );
        let existing = prior(7, "\n>>> 🙋 user: hello\n");
        let now = Utc::now();

        let merged = merge(
            "cs101",
            &convo,
            Some(&existing),
            99,
            RECENT_MESSAGE_WINDOW,
            now,
        );
        assert_eq!(merged.draft.row_id, 7);
        assert_eq!(merged.draft.created_at, existing.created_at);
        assert_eq!(merged.draft.modified_at, now);
        assert_eq!(merged.draft.first_query, "original query");
        assert_eq!(merged.embedding, EmbeddingPlan::Reuse(existing.embedding));
        assert!(merged.draft.transcript.starts_with(&existing.transcript));
        assert!(merged
            .draft
            .transcript
            .contains(">>> 🙋 user: and one more thing"));
        assert!(merged.draft.transcript.contains(">>> 🤖 assistant: certainly"));
        // Only the newest two messages are appended.
        assert!(!merged.draft.transcript.contains(">>> 🤖 assistant: hi"));
    }

    #[test]
    fn update_with_short_tail_appends_whatever_exists() {
        let convo = conversation("conv-1", &[("user", "only message")]);
        let existing = prior(3, "prior transcript");
        let now = Utc::now();

        let merged = merge(
            "cs101",
            &convo,
            Some(&existing),
            3,
            RECENT_MESSAGE_WINDOW,
            now,
        );
        assert!(merged.draft.transcript.starts_with("prior transcript"));
        assert!(merged.draft.transcript.contains(">>> 🙋 user: only message"));
    }

    #[test]
    fn repeated_updates_duplicate_the_suffix() {
        let convo = conversation("conv-1", &[("user", "hello"), ("assistant", "hi")]);
        let now = Utc::now();
        let first = merge("cs101", &convo, None, 0, RECENT_MESSAGE_WINDOW, now);

        let stored = SnapshotRecord {
            row_id: first.draft.row_id,
            conversation_id: convo.id.clone(),
            transcript: first.draft.transcript.clone(),
            first_query: first.draft.first_query.clone(),
            created_at: first.draft.created_at,
            embedding: vec![0.5; 8],
        };
        let second = merge(
            "cs101",
            &convo,
            Some(&stored),
            first.draft.row_id,
            RECENT_MESSAGE_WINDOW,
            now,
        );
        // Append-only: the same trailing turn shows up twice, no deduplication.
        assert_eq!(second.draft.transcript.matches(">>> 🙋 user: hello").count(), 2);
        assert_eq!(
            second.draft.transcript.matches(">>> 🤖 assistant: hi").count(),
            2
        );
    }
}
