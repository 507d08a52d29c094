//! Ask command handler.
//!
//! Runs one query through the full pipeline: normalization, topicality
//! screening, retrieval, and grounded answer composition.

use clap::Args;
use voyager_core::{config::AppConfig, AppError, AppResult};
use voyager_llm::create_client;
use voyager_pipeline::{Engine, PipelineOutcome};
use voyager_prompt::EMPTY_QUERY_MESSAGE;
use voyager_retrieval::create_provider;

/// Ask a travel question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question, in French, English, Arabic, or Tunisian dialect
    pub query: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let query = self
            .query
            .clone()
            .ok_or_else(|| AppError::Config("No question provided".to_string()))?;

        let mut config = config.clone();
        config.resolve_api_key()?;

        let llm = create_client(&config.provider, None, config.api_key.as_deref())?;
        let embedder = create_provider(&config.embedding).await?;
        let engine = Engine::bootstrap(config, embedder, llm)?;

        match engine.answer_query(&query).await {
            Ok(outcome) => {
                self.print_outcome(&outcome)?;
                Ok(())
            }
            Err(err) if matches!(err.source, AppError::EmptyQuery) => {
                println!("{}", EMPTY_QUERY_MESSAGE);
                Ok(())
            }
            Err(err) => Err(AppError::Other(err.to_string())),
        }
    }

    fn print_outcome(&self, outcome: &PipelineOutcome) -> AppResult<()> {
        if self.json {
            let kind = match outcome {
                PipelineOutcome::Answer(_) => "answer",
                PipelineOutcome::OffTopic(_) => "off_topic",
            };
            let body = serde_json::json!({
                "outcome": kind,
                "text": outcome.message(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        } else {
            println!("{}", outcome.message());
        }
        Ok(())
    }
}
