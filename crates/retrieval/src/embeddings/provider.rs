//! Embedding provider trait and factory.
//!
//! The provider resolved here is shared (`Arc`) between index build
//! and query classification: both sides must vectorize text with the
//! exact same model and normalization policy, or similarity and
//! anomaly scores silently go wrong.

use std::sync::Arc;
use voyager_core::{AppError, AppResult, EmbeddingSettings};

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "ollama", "trigram")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider from settings.
///
/// Remote providers verify connectivity during construction, so a
/// model that cannot be loaded fails at startup rather than on the
/// first query.
pub async fn create_provider(
    settings: &EmbeddingSettings,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match settings.provider.as_str() {
        "ollama" => {
            let provider =
                super::providers::ollama::OllamaProvider::new(settings.clone()).await?;
            Ok(Arc::new(provider))
        }

        "trigram" => {
            let provider =
                super::providers::trigram::TrigramProvider::new(settings.dimensions);
            Ok(Arc::new(provider))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: ollama, trigram",
            settings.provider
        ))),
    }
}
