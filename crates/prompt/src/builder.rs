//! Prompt builders for the two generation calls in the pipeline.
//!
//! Both prompts are fixed contracts, not user-editable templates: the
//! normalizer prompt rewrites an arbitrary-language query into a
//! canonical French search query, and the composer prompt constrains
//! the answer to the retrieved context. Variables are injected with
//! Handlebars.

use crate::templates::{ANSWER_SYSTEM_PROMPT, ANSWER_USER_TEMPLATE, NORMALIZE_TEMPLATE};
use handlebars::Handlebars;
use std::collections::HashMap;
use voyager_core::{AppError, AppResult};

/// Render the query-normalization prompt for a raw user query.
pub fn build_normalization_prompt(raw_query: &str) -> AppResult<String> {
    let mut variables = HashMap::new();
    variables.insert("query".to_string(), raw_query.to_string());
    render_template(NORMALIZE_TEMPLATE, &variables)
}

/// Render the grounded-answer user prompt from the normalized query
/// and the formatted retrieval context.
pub fn build_answer_prompt(normalized_query: &str, context: &str) -> AppResult<String> {
    let mut variables = HashMap::new();
    variables.insert("query".to_string(), normalized_query.to_string());
    variables.insert("context".to_string(), context.to_string());
    render_template(ANSWER_USER_TEMPLATE, &variables)
}

/// The fixed behavioral policy sent as the system instruction for
/// answer composition.
pub fn answer_system_prompt() -> &'static str {
    ANSWER_SYSTEM_PROMPT
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Other(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Other(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_prompt_embeds_query() {
        let prompt = build_normalization_prompt("نحب نسافر لتونس").unwrap();
        assert!(prompt.contains("نحب نسافر لتونس"));
        assert!(prompt.contains("French"));
    }

    #[test]
    fn test_answer_prompt_embeds_query_and_context() {
        let prompt =
            build_answer_prompt("Voyage à Paris", "Trip 1. Destination: Paris.").unwrap();
        assert!(prompt.contains("Voyage à Paris"));
        assert!(prompt.contains("Destination: Paris"));
    }

    #[test]
    fn test_no_html_escaping() {
        let prompt = build_answer_prompt("A & B <c>", "x > y").unwrap();
        assert!(prompt.contains("A & B <c>"));
        assert!(prompt.contains("x > y"));
    }

    #[test]
    fn test_system_prompt_forbids_meta_vocabulary() {
        let system = answer_system_prompt();
        assert!(system.contains("Never mention"));
    }
}
