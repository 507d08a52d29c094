//! Grounded answer composition.
//!
//! The composer turns ranked retrieval results into a French answer
//! constrained to the supplied context. The grounding policy lives in
//! the system prompt; this module only formats the context block and
//! performs the generation call.

use tracing::debug;
use voyager_core::AppResult;
use voyager_llm::{LlmClient, LlmRequest};
use voyager_prompt::{answer_system_prompt, build_answer_prompt};
use voyager_retrieval::RetrievalResult;

/// Sampling temperature for answer composition. Low, since the answer
/// must stay close to the retrieved facts.
const ANSWER_TEMPERATURE: f32 = 0.2;

/// Upper bound on generated answer length.
const ANSWER_MAX_TOKENS: u32 = 1024;

/// Format ranked retrieval results into the context block injected
/// into the answer prompt. Highest-similarity entry first.
pub fn format_context(results: &RetrievalResult) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, (document, _score))| format!("[{}] {}", i + 1, document.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Compose a grounded answer for a normalized query.
///
/// Callers are expected to have handled the empty-retrieval case
/// already; composition always runs against at least one context
/// entry.
pub async fn compose(
    normalized_query: &str,
    results: &RetrievalResult,
    client: &dyn LlmClient,
    model: &str,
) -> AppResult<String> {
    let context = format_context(results);
    debug!(
        "Composing answer from {} context entries ({} chars)",
        results.len(),
        context.len()
    );

    let prompt = build_answer_prompt(normalized_query, &context)?;
    let request = LlmRequest::new(prompt, model)
        .with_system(answer_system_prompt())
        .with_temperature(ANSWER_TEMPERATURE)
        .with_max_tokens(ANSWER_MAX_TOKENS);

    let response = client.complete(&request).await?;
    Ok(response.content.trim().to_string())
}
