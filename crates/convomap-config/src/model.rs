//! Configuration schema for the conversation-map sync service.

use serde::{Deserialize, Serialize};

/// Prefix prepended to the course name to form the remote index name.
pub const DEFAULT_MAP_NAME_PREFIX: &str = "Conversation Map for ";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConvomapConfig {
    /// Remote index name prefix per course.
    pub map_name_prefix: String,
    /// Historical rows required before a course index is materialized.
    pub min_bootstrap_rows: usize,
    /// Trailing messages appended per incremental update.
    pub recent_message_window: usize,
    /// Backoff applied to transient index contention.
    pub retry: RetryConfig,
    /// Embedding-model service endpoint.
    pub embedding: EmbeddingServiceConfig,
    /// Remote embedding-index service endpoint.
    pub index: EndpointConfig,
    /// Relational conversation store endpoint.
    pub store: EndpointConfig,
}

impl Default for ConvomapConfig {
    fn default() -> Self {
        Self {
            map_name_prefix: DEFAULT_MAP_NAME_PREFIX.to_string(),
            min_bootstrap_rows: 19,
            recent_message_window: 2,
            retry: RetryConfig::default(),
            embedding: EmbeddingServiceConfig::default(),
            index: EndpointConfig::default(),
            store: EndpointConfig::default(),
        }
    }
}

/// Retry/backoff knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts before giving up, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Multiplicative growth per retry.
    pub growth_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 10_000,
            growth_factor: 1.5,
        }
    }
}

/// Shared shape for remote service endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct EndpointConfig {
    /// Service base URL.
    pub base_url: String,
    /// API key sent with every request.
    pub api_key: String,
}

/// Embedding-model service endpoint plus model selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingServiceConfig {
    /// Service base URL.
    pub base_url: String,
    /// API key sent with every request.
    pub api_key: String,
    /// Embedding model identifier.
    pub model: String,
}

impl Default for EmbeddingServiceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            model: "text-embedding-ada-002".to_string(),
        }
    }
}
