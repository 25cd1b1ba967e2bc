//! Small builders for conversation fixtures.

use chrono::{Duration, Utc};
use convomap_core::types::{Conversation, ConversationRow, Message, MessageContent, Role};

/// Build a message from a role string and plain text.
pub fn message(role: &str, text: &str) -> Message {
    Message {
        role: Role::parse(role),
        content: MessageContent::from(text),
    }
}

/// Build a conversation from (role, text) turns.
pub fn conversation(id: &str, user_email: &str, turns: &[(&str, &str)]) -> Conversation {
    Conversation {
        id: id.to_string(),
        user_email: user_email.to_string(),
        messages: turns
            .iter()
            .map(|&(role, text)| message(role, text))
            .collect(),
    }
}

/// Build `count` historical rows with distinct conversation ids and queries,
/// spaced one day apart ending in the past.
pub fn historical_rows(count: usize) -> Vec<ConversationRow> {
    (0..count)
        .map(|i| ConversationRow {
            user_email: format!("user{i}@example.edu"),
            created_at: Utc::now() - Duration::days((count - i) as i64),
            conversation: Conversation {
                id: format!("conv-{i}"),
                user_email: format!("user{i}@example.edu"),
                messages: vec![
                    message("user", &format!("query {i}")),
                    message("assistant", "answer"),
                ],
            },
        })
        .collect()
}
