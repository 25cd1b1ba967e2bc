//! Transcript rendering for conversation messages.

use crate::types::{Message, Role};

/// Marker prefix for user messages.
pub const USER_MARKER: &str = "🙋 ";
/// Marker prefix for any non-user message.
pub const ASSISTANT_MARKER: &str = "🤖 ";

/// Result of formatting a message sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedTranscript {
    /// Human-readable transcript, one marked line per message.
    pub transcript: String,
    /// Resolved text of the first message, empty for an empty sequence.
    pub first_query: String,
}

/// Render an ordered message sequence into a transcript string.
///
/// Pure; callable on any subsequence (e.g. only the newest messages) so the
/// merge engine can build incremental appends with the same rule.
pub fn format_messages(messages: &[Message]) -> FormattedTranscript {
    let mut transcript = String::new();
    for message in messages {
        transcript.push_str(&render_line(message));
    }
    let first_query = messages
        .first()
        .map(|message| message.content.resolved_text().to_string())
        .unwrap_or_default();
    FormattedTranscript {
        transcript,
        first_query,
    }
}

/// Render one message as a marked transcript line.
fn render_line(message: &Message) -> String {
    let marker = match message.role {
        Role::User => USER_MARKER,
        _ => ASSISTANT_MARKER,
    };
    format!(
        "\n>>> {marker}{role}: {text}\n",
        role = message.role.as_str(),
        text = message.content.resolved_text()
    )
}
