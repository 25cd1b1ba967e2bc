//! Conversation-store double returning canned rows.

use async_trait::async_trait;
use convomap_core::error::StoreError;
use convomap_core::service::ConversationStore;
use convomap_core::types::ConversationRow;

/// Store that returns the same rows for every course query.
#[derive(Clone, Default)]
pub struct StubConversationStore {
    rows: Vec<ConversationRow>,
}

impl StubConversationStore {
    pub fn new(rows: Vec<ConversationRow>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl ConversationStore for StubConversationStore {
    async fn historical_rows(&self, _course: &str) -> Result<Vec<ConversationRow>, StoreError> {
        Ok(self.rows.clone())
    }
}
