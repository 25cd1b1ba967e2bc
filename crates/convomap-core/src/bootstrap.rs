//! One-time bulk index assembly for courses crossing the volume threshold.

use chrono::{DateTime, Utc};

use crate::transcript::format_messages;
use crate::types::{Conversation, ConversationRow, RecordDraft};

/// Minimum number of historical rows before a course index is materialized.
pub const MIN_BOOTSTRAP_ROWS: usize = 19;

/// Result of planning a bootstrap.
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapPlan {
    /// Not enough volume yet; the caller retries on a later conversation.
    Deferred,
    /// Drafts for the initial bulk index, in historical order.
    Ready(Vec<RecordDraft>),
}

/// Assemble the initial bulk index from historical rows plus the triggering
/// conversation.
///
/// One draft per historical row with sequential row ids starting at 1. When
/// the triggering conversation matches a historical row's id, its full
/// message list is appended onto that row's transcript instead of creating a
/// duplicate row; otherwise it is appended as one final new draft. Embeddings
/// for the drafts' first queries are computed by the caller in one batch.
pub fn plan_bootstrap(
    course: &str,
    historical_rows: &[ConversationRow],
    triggering: &Conversation,
    min_rows: usize,
    now: DateTime<Utc>,
) -> BootstrapPlan {
    if historical_rows.len() < min_rows {
        return BootstrapPlan::Deferred;
    }

    let mut drafts = Vec::with_capacity(historical_rows.len() + 1);
    let mut triggering_merged = false;

    for (index, row) in historical_rows.iter().enumerate() {
        let formatted = format_messages(&row.conversation.messages);
        let mut transcript = formatted.transcript;
        if row.conversation.id == triggering.id {
            triggering_merged = true;
            transcript.push_str(&format_messages(&triggering.messages).transcript);
        }
        drafts.push(RecordDraft {
            row_id: index as i64 + 1,
            course: course.to_string(),
            conversation_id: row.conversation.id.clone(),
            transcript,
            first_query: formatted.first_query,
            user_email: row.user_email.clone(),
            created_at: row.created_at,
            modified_at: now,
        });
    }

    if !triggering_merged {
        let formatted = format_messages(&triggering.messages);
        drafts.push(RecordDraft {
            row_id: drafts.len() as i64 + 1,
            course: course.to_string(),
            conversation_id: triggering.id.clone(),
            transcript: formatted.transcript,
            first_query: formatted.first_query,
            user_email: triggering.user_email.clone(),
            created_at: now,
            modified_at: now,
        });
    }

    BootstrapPlan::Ready(drafts)
}

#[cfg(test)]
mod tests {
    use super::{plan_bootstrap, BootstrapPlan, MIN_BOOTSTRAP_ROWS};
    use crate::types::{Conversation, ConversationRow, Message, MessageContent, Role};
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    fn conversation(id: &str, text: &str) -> Conversation {
        Conversation {
            id: id.to_string(),
            user_email: "student@example.edu".to_string(),
            messages: vec![
                Message {
                    role: Role::User,
                    content: MessageContent::from(text),
                },
                Message {
                    role: Role::Assistant,
                    content: MessageContent::from("answer"),
                },
            ],
        }
    }

    fn rows(count: usize) -> Vec<ConversationRow> {
        (0..count)
            .map(|i| ConversationRow {
                user_email: format!("user{i}@example.edu"),
                created_at: Utc::now() - Duration::days(count as i64 - i as i64),
                conversation: conversation(&format!("conv-{i}"), &format!("query {i}")),
            })
            .collect()
    }

    #[test]
    fn defers_below_minimum_volume() {
        let plan = plan_bootstrap(
            "cs101",
            &rows(MIN_BOOTSTRAP_ROWS - 1),
            &conversation("conv-new", "latest"),
            MIN_BOOTSTRAP_ROWS,
            Utc::now(),
        );
        assert_eq!(plan, BootstrapPlan::Deferred);
    }

    #[test]
    fn new_triggering_conversation_appends_final_draft() {
        let now = Utc::now();
        let plan = plan_bootstrap(
            "cs101",
            &rows(MIN_BOOTSTRAP_ROWS),
            &conversation("conv-new", "latest"),
            MIN_BOOTSTRAP_ROWS,
            now,
        );
        let BootstrapPlan::Ready(drafts) = plan else {
            panic!("expected ready plan");
        };
        assert_eq!(drafts.len(), MIN_BOOTSTRAP_ROWS + 1);
        let row_ids: Vec<i64> = drafts.iter().map(|d| d.row_id).collect();
        assert_eq!(row_ids, (1..=MIN_BOOTSTRAP_ROWS as i64 + 1).collect::<Vec<_>>());
        let last = drafts.last().expect("final draft");
        assert_eq!(last.conversation_id, "conv-new");
        assert_eq!(last.created_at, now);
        assert_eq!(last.first_query, "latest");
    }

    #[test]
    fn matching_triggering_conversation_merges_into_its_row() {
        let historical = rows(MIN_BOOTSTRAP_ROWS);
        let trigger = conversation("conv-3", "follow-up question");
        let plan = plan_bootstrap(
            "cs101",
            &historical,
            &trigger,
            MIN_BOOTSTRAP_ROWS,
            Utc::now(),
        );
        let BootstrapPlan::Ready(drafts) = plan else {
            panic!("expected ready plan");
        };
        assert_eq!(drafts.len(), MIN_BOOTSTRAP_ROWS);
        let merged = drafts
            .iter()
            .find(|d| d.conversation_id == "conv-3")
            .expect("merged row");
        assert!(merged.transcript.contains(">>> 🙋 user: query 3"));
        assert!(merged
            .transcript
            .contains(">>> 🙋 user: follow-up question"));
        // created_at stays the historical row's timestamp.
        assert_eq!(merged.created_at, historical[3].created_at);
    }
}
