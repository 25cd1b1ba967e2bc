//! Deterministic embedding client double.

use std::sync::Arc;

use async_trait::async_trait;
use convomap_core::error::EmbeddingError;
use convomap_core::service::EmbeddingClient;
use parking_lot::Mutex;

/// Embedder that returns a fixed-dimension vector derived from each input's
/// length and records every batch it receives.
#[derive(Clone)]
pub struct FixedEmbedder {
    dimension: usize,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FixedEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Batches received so far, in call order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl EmbeddingClient for FixedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.lock().push(texts.to_vec());
        Ok(texts
            .iter()
            .map(|text| vec![text.len() as f32; self.dimension])
            .collect())
    }
}
