//! Core data types shared across the synchronization engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Index-local sequential identifier for a record, distinct from the
/// conversation's logical id.
pub type RowId = i64;

/// Speaker role for a message.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User-authored message.
    User,
    /// Assistant-authored message.
    Assistant,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse a role from a lowercase string. Anything that is not "user"
    /// renders with the assistant marker, so it parses as assistant.
    pub fn parse(value: &str) -> Self {
        if value == "user" { Role::User } else { Role::Assistant }
    }
}

impl<'de> Deserialize<'de> for Role {
    /// Decode any role string; unknown roles fall back to assistant rather
    /// than rejecting the row.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Role::parse(&value))
    }
}

/// One element of a structured (list-form) message content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentPart {
    /// Display text for this part.
    #[serde(default)]
    pub text: String,
}

/// Message content, either a plain string or a structured list of parts.
///
/// Only the first part's `text` field is used for transcript purposes; the
/// rest of a list form is discarded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain string content.
    Text(String),
    /// Structured list content.
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Resolve the display text for this content.
    pub fn resolved_text(&self) -> &str {
        match self {
            MessageContent::Text(text) => text,
            MessageContent::Parts(parts) => {
                parts.first().map(|part| part.text.as_str()).unwrap_or("")
            }
        }
    }
}

impl From<&str> for MessageContent {
    fn from(value: &str) -> Self {
        MessageContent::Text(value.to_string())
    }
}

/// Single role-tagged message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role that produced the message.
    pub role: Role,
    /// Message content.
    pub content: MessageContent,
}

/// Full conversation payload as delivered by the conversation-handling flow.
///
/// `id` is the stable logical identifier; each sync call carries the full,
/// latest message list for that id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    /// Stable logical identifier.
    pub id: String,
    /// Email of the user who owns the conversation.
    pub user_email: String,
    /// Ordered message list.
    pub messages: Vec<Message>,
}

/// Historical conversation row as returned by the relational store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationRow {
    /// Email of the user who owns the conversation.
    pub user_email: String,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// The conversation payload stored on the row.
    pub conversation: Conversation,
}

/// The unit stored in the remote index: metadata plus embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedRecord {
    /// Index-local sequential id.
    pub row_id: RowId,
    /// Course (tenant) the record belongs to.
    pub course: String,
    /// Logical conversation id.
    pub conversation_id: String,
    /// Accumulated human-readable transcript.
    pub transcript: String,
    /// Resolved text of the conversation's first message.
    pub first_query: String,
    /// Email of the user who owns the conversation.
    pub user_email: String,
    /// Fixed at first insertion, never changed on update.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every insertion or update.
    pub modified_at: DateTime<Utc>,
    /// Embedding of the first query, computed once and carried forward.
    pub embedding: Vec<f32>,
}

/// Record metadata without its embedding, ready to be paired with one.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    /// Index-local sequential id.
    pub row_id: RowId,
    /// Course (tenant) the record belongs to.
    pub course: String,
    /// Logical conversation id.
    pub conversation_id: String,
    /// Accumulated human-readable transcript.
    pub transcript: String,
    /// Resolved text of the conversation's first message.
    pub first_query: String,
    /// Email of the user who owns the conversation.
    pub user_email: String,
    /// Fixed at first insertion.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every write.
    pub modified_at: DateTime<Utc>,
}

impl RecordDraft {
    /// Pair the draft with its embedding to produce a storable record.
    pub fn into_record(self, embedding: Vec<f32>) -> IndexedRecord {
        IndexedRecord {
            row_id: self.row_id,
            course: self.course,
            conversation_id: self.conversation_id,
            transcript: self.transcript,
            first_query: self.first_query,
            user_email: self.user_email,
            created_at: self.created_at,
            modified_at: self.modified_at,
            embedding,
        }
    }
}

/// Identifiers needed to embed a course's index view in the UI.
///
/// Both fields are `None` when the course has no index yet; that is not an
/// error condition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct IndexDescriptor {
    /// UI-embed-ready index id.
    pub index_id: Option<String>,
    /// Link to the hosted index view.
    pub index_link: Option<String>,
}

impl IndexDescriptor {
    /// Descriptor for a course with no index.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::{ContentPart, Message, MessageContent, Role};
    use pretty_assertions::assert_eq;

    #[test]
    fn role_parses_and_formats() {
        assert_eq!(Role::parse("user"), Role::User);
        assert_eq!(Role::parse("assistant"), Role::Assistant);
        assert_eq!(Role::parse("system"), Role::Assistant);
        assert_eq!(Role::User.as_str(), "user");
    }

    #[test]
    fn content_resolves_first_part_text() {
        let content = MessageContent::Parts(vec![
            ContentPart {
                text: "first".to_string(),
            },
            ContentPart {
                text: "second".to_string(),
            },
        ]);
        assert_eq!(content.resolved_text(), "first");
    }

    #[test]
    fn content_resolves_empty_for_missing_parts() {
        let content = MessageContent::Parts(Vec::new());
        assert_eq!(content.resolved_text(), "");
    }

    #[test]
    fn unknown_role_deserializes_as_assistant() {
        let message: Message =
            serde_json::from_str(r#"{"role": "system", "content": "course policy note"}"#)
                .expect("message");
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.content.resolved_text(), "course policy note");
    }

    #[test]
    fn role_round_trips_through_serde() {
        assert_eq!(serde_json::to_string(&Role::User).expect("json"), "\"user\"");
        let role: Role = serde_json::from_str("\"assistant\"").expect("role");
        assert_eq!(role, Role::Assistant);
    }

    #[test]
    fn content_deserializes_both_forms() {
        let text: MessageContent = serde_json::from_str("\"hello\"").expect("text form");
        assert_eq!(text.resolved_text(), "hello");

        let parts: MessageContent =
            serde_json::from_str(r#"[{"text": "hello", "type": "text"}]"#).expect("list form");
        assert_eq!(parts.resolved_text(), "hello");
    }
}
