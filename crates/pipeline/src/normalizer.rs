//! Query normalization.
//!
//! Users write in French, English, Modern Standard Arabic, or Tunisian
//! dialect; the index speaks canonical French. One generation call
//! rewrites the raw query into a standard French search query before
//! anything downstream sees it.

use tracing::debug;
use voyager_core::{AppError, AppResult};
use voyager_llm::{LlmClient, LlmRequest};
use voyager_prompt::build_normalization_prompt;

/// Rewrite a raw user query into a canonical French search query.
///
/// Blank input short-circuits with `AppError::EmptyQuery` before any
/// generation call. An empty rewrite falls back to the trimmed raw
/// query so a misbehaving model degrades retrieval quality instead of
/// failing the request.
pub async fn normalize(raw: &str, client: &dyn LlmClient, model: &str) -> AppResult<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::EmptyQuery);
    }

    let prompt = build_normalization_prompt(raw)?;
    let request = LlmRequest::new(prompt, model).with_temperature(0.0);

    let response = client.complete(&request).await?;
    let normalized = response.content.trim().to_string();

    if normalized.is_empty() {
        tracing::warn!("Normalizer returned an empty rewrite, keeping the raw query");
        return Ok(raw.to_string());
    }

    debug!("Normalized query: {:?} -> {:?}", raw, normalized);
    Ok(normalized)
}
