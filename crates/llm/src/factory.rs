//! LLM provider factory.
//!
//! This module provides a factory for creating LLM clients based on
//! application configuration. It handles provider resolution and
//! credential checks: a provider that requires an API key refuses to
//! construct without one, so the absence of a credential is surfaced
//! at startup rather than on the first query.

use crate::client::LlmClient;
use crate::providers::{GeminiClient, MockClient};
use std::sync::Arc;
use voyager_core::{AppError, AppResult};

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("gemini", "mock")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key (required for "gemini")
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a
/// required credential is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    match provider.to_lowercase().as_str() {
        "gemini" => {
            let key = api_key.ok_or_else(|| {
                AppError::Config("Gemini provider requires an API key".to_string())
            })?;
            let client = match endpoint {
                Some(url) => GeminiClient::with_base_url(key, url),
                None => GeminiClient::new(key),
            };
            Ok(Arc::new(client))
        }
        "mock" => Ok(Arc::new(MockClient::new())),
        _ => Err(AppError::Config(format!(
            "Unknown generation provider: {}",
            provider
        ))),
    }
}
