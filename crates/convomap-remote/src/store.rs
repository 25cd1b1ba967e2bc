//! Relational conversation-store client (read-only).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use convomap_config::EndpointConfig;
use convomap_core::error::StoreError;
use convomap_core::service::ConversationStore;
use convomap_core::types::{Conversation, ConversationRow};
use log::debug;
use serde::Deserialize;

/// Client for a PostgREST-style conversation table.
pub struct HttpConversationStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpConversationStore {
    /// Build a client from config; the session is reused for the process
    /// lifetime.
    pub fn new(config: &EndpointConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn query_url(&self, course: &str) -> String {
        format!(
            "{}/rest/v1/conversations?course_name=eq.{}&order=created_at.asc",
            self.base_url,
            urlencoding::encode(course)
        )
    }
}

#[derive(Deserialize)]
struct WireRow {
    user_email: String,
    created_at: DateTime<Utc>,
    convo: Conversation,
}

impl From<WireRow> for ConversationRow {
    fn from(row: WireRow) -> Self {
        ConversationRow {
            user_email: row.user_email,
            created_at: row.created_at,
            conversation: row.convo,
        }
    }
}

#[async_trait]
impl ConversationStore for HttpConversationStore {
    async fn historical_rows(&self, course: &str) -> Result<Vec<ConversationRow>, StoreError> {
        let response = self
            .client
            .get(self.query_url(course))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|err| StoreError::Remote(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Remote(format!("{status}: {body}")));
        }

        let rows: Vec<WireRow> = response
            .json()
            .await
            .map_err(|err| StoreError::Decode(err.to_string()))?;
        debug!("fetched historical rows (course={course}, rows={})", rows.len());
        Ok(rows.into_iter().map(ConversationRow::from).collect())
    }
}
