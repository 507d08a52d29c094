//! Query orchestration.
//!
//! Sequences the full pipeline for one query: normalize, embed and
//! classify, retrieve, compose. Every stage runs under the configured
//! timeout and failures carry the stage they happened in. An
//! out-of-topic classification is a terminal outcome, not an error,
//! and skips retrieval and composition entirely.

use std::time::Duration;

use tracing::{debug, info};
use voyager_core::AppError;
use voyager_prompt::{NOT_FOUND_MESSAGE, OFF_TOPIC_MESSAGE};
use voyager_retrieval::Topicality;

use crate::composer;
use crate::engine::Engine;
use crate::normalizer;

/// Pipeline stage, for tagging failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Normalize,
    Classify,
    Retrieve,
    Compose,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Normalize => "normalize",
            Stage::Classify => "classify",
            Stage::Retrieve => "retrieve",
            Stage::Compose => "compose",
        };
        write!(f, "{}", name)
    }
}

/// A stage-tagged pipeline failure.
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: AppError,
}

/// Terminal outcome of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// A grounded answer (or the fixed not-found message when the
    /// index had nothing relevant).
    Answer(String),
    /// The query was classified outside the travel domain.
    OffTopic(String),
}

impl PipelineOutcome {
    /// The user-visible text of this outcome.
    pub fn message(&self) -> &str {
        match self {
            PipelineOutcome::Answer(text) | PipelineOutcome::OffTopic(text) => text,
        }
    }
}

/// Run a stage future under the pipeline timeout, tagging both faults
/// and expiry with the stage name.
async fn run_stage<T, F>(stage: Stage, limit: Duration, fut: F) -> Result<T, PipelineError>
where
    F: std::future::Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(PipelineError { stage, source }),
        Err(_) => Err(PipelineError {
            stage,
            source: AppError::Other(format!("timed out after {}s", limit.as_secs())),
        }),
    }
}

impl Engine {
    /// Answer one raw user query.
    pub async fn answer_query(&self, raw: &str) -> Result<PipelineOutcome, PipelineError> {
        let limit = Duration::from_secs(self.config.stage_timeout_secs);
        let model = self.config.model.as_str();

        let normalized = run_stage(
            Stage::Normalize,
            limit,
            normalizer::normalize(raw, self.llm.as_ref(), model),
        )
        .await?;

        let (embedding, topicality) = run_stage(Stage::Classify, limit, async {
            let embedding = self.embedder.embed(&normalized).await?;
            let topicality = self.screener.classify(&embedding)?;
            Ok((embedding, topicality))
        })
        .await?;

        if topicality == Topicality::OutOfTopic {
            info!("Query classified out-of-topic: {:?}", normalized);
            return Ok(PipelineOutcome::OffTopic(OFF_TOPIC_MESSAGE.to_string()));
        }

        let results = run_stage(Stage::Retrieve, limit, async {
            let index = self.open_index()?;
            index.search(&embedding, self.config.retrieval.top_k)
        })
        .await?;

        debug!("Retrieved {} context entries", results.len());

        // Nothing to ground an answer on: answer with the fixed
        // not-found message instead of letting the model fabricate.
        if results.is_empty() {
            return Ok(PipelineOutcome::Answer(NOT_FOUND_MESSAGE.to_string()));
        }

        let answer = run_stage(
            Stage::Compose,
            limit,
            composer::compose(&normalized, &results, self.llm.as_ref(), model),
        )
        .await?;

        Ok(PipelineOutcome::Answer(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{build_index, Engine};
    use std::sync::Arc;
    use voyager_core::{AppConfig, AppResult, EmbeddingSettings};
    use voyager_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage, MockClient};
    use voyager_retrieval::{create_provider, AnomalyScreener, VectorIndex};

    /// Client whose completions never finish in time.
    struct StalledClient;

    #[async_trait::async_trait]
    impl LlmClient for StalledClient {
        fn provider_name(&self) -> &str {
            "stalled"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(LlmResponse {
                content: request.prompt.clone(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }
    }

    const CORPUS: &[&str] = &[
        "Voyage ID 1. Destination: Paris. Durée: 7 jours. Hébergement: Hôtel (Coût: 1200). Voyageur: Amira (29 ans, Tunisienne).",
        "Voyage ID 2. Destination: Tunis. Durée: 3 jours. Hébergement: Airbnb (Coût: 300). Voyageur: John (41 ans, Américaine).",
        "Voyage ID 3. Destination: Rome. Durée: 5 jours. Hébergement: Hôtel (Coût: 800). Voyageur: Leïla (35 ans, Française).",
    ];

    fn test_config(data_dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig {
            data_dir: data_dir.to_path_buf(),
            provider: "mock".to_string(),
            model: "mock-model".to_string(),
            embedding: EmbeddingSettings {
                provider: "trigram".to_string(),
                model: "trigram-v1".to_string(),
                dimensions: 64,
                normalize: true,
                endpoint: None,
            },
            ..Default::default()
        };
        config.screener.trees = 20;
        config
    }

    /// Build a real engine over the small corpus: trigram embeddings,
    /// persisted index, fitted screener, scripted generation.
    async fn make_engine(
        dir: &std::path::Path,
        config: AppConfig,
        mock: Arc<MockClient>,
    ) -> Engine {
        std::fs::write(dir.join("voyages.txt"), CORPUS.join("\n\n")).unwrap();
        let embedder = create_provider(&config.embedding).await.unwrap();
        build_index(&config, &embedder).await.unwrap();

        let llm: Arc<dyn LlmClient> = mock;
        Engine::bootstrap(config, embedder, llm).unwrap()
    }

    #[tokio::test]
    async fn test_paris_query_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(
            MockClient::new()
                .with_reply("Quel est le coût du voyage à Paris ?")
                .with_reply("Le voyage à Paris a duré 7 jours et a coûté 1200."),
        );
        let engine = make_engine(dir.path(), test_config(dir.path()), mock.clone()).await;

        let outcome = engine
            .answer_query("how long was the trip to Paris and what did it cost")
            .await
            .unwrap();

        match outcome {
            PipelineOutcome::Answer(text) => assert!(text.contains("Paris")),
            other => panic!("expected an answer, got {:?}", other),
        }
        // One normalization call, one composition call
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_off_topic_query_skips_retrieval_and_composition() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockClient::new().with_reply("Comment réparer un moteur ?"));

        let mut config = test_config(dir.path());
        // Calibrated so that every score falls below it: forces the
        // rejection path deterministically.
        config.screener.threshold = 0.49;
        let engine = make_engine(dir.path(), config, mock.clone()).await;

        let outcome = engine.answer_query("how do I fix a car engine").await.unwrap();

        assert_eq!(
            outcome,
            PipelineOutcome::OffTopic(OFF_TOPIC_MESSAGE.to_string())
        );
        // Only the normalization call happened
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_retrieval_answers_not_found_without_generation() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let embedder = create_provider(&config.embedding).await.unwrap();

        // Screener fitted over the corpus, but an index with no
        // entries: retrieval legitimately comes back empty.
        let texts: Vec<String> = CORPUS.iter().map(|s| s.to_string()).collect();
        let corpus_embeddings = embedder.embed_batch(&texts).await.unwrap();
        let screener = AnomalyScreener::fit(&corpus_embeddings, &config.screener).unwrap();

        let index_path = config.index_path();
        VectorIndex::build(&index_path, embedder.model_name(), embedder.dimensions(), &[])
            .unwrap();

        let mock = Arc::new(MockClient::new().with_reply("Voyage à Paris ?"));
        let llm: Arc<dyn LlmClient> = mock.clone();
        let engine = Engine {
            config,
            embedder,
            llm,
            screener,
            index_path,
        };

        let outcome = engine.answer_query("trip to Paris").await.unwrap();
        assert_eq!(
            outcome,
            PipelineOutcome::Answer(NOT_FOUND_MESSAGE.to_string())
        );
        // Composition was never invoked on an empty context
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_blank_query_fails_in_normalize_stage() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockClient::new());
        let engine = make_engine(dir.path(), test_config(dir.path()), mock.clone()).await;

        let err = engine.answer_query("   ").await.unwrap_err();
        assert_eq!(err.stage, Stage::Normalize);
        assert!(matches!(err.source, AppError::EmptyQuery));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generation_failure_is_stage_tagged() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockClient::failing());
        let engine = make_engine(dir.path(), test_config(dir.path()), mock.clone()).await;

        let err = engine.answer_query("voyage à Paris").await.unwrap_err();
        assert_eq!(err.stage, Stage::Normalize);
        assert!(matches!(err.source, AppError::Generation(_)));
    }

    #[tokio::test]
    async fn test_stage_timeout_expiry_is_stage_tagged() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("voyages.txt"), CORPUS.join("\n\n")).unwrap();

        let mut config = test_config(dir.path());
        config.stage_timeout_secs = 0;

        let embedder = create_provider(&config.embedding).await.unwrap();
        build_index(&config, &embedder).await.unwrap();
        let engine = Engine::bootstrap(config, embedder, Arc::new(StalledClient)).unwrap();

        let err = engine.answer_query("voyage à Paris").await.unwrap_err();
        assert_eq!(err.stage, Stage::Normalize);
        assert!(matches!(err.source, AppError::Other(_)));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_corpus_member_text_is_in_topic_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        // Echo mode: normalization returns the query unchanged, the
        // composition reply is scripted.
        let mock = Arc::new(MockClient::new().with_reply(CORPUS[0]).with_reply("Paris."));
        let engine = make_engine(dir.path(), test_config(dir.path()), mock.clone()).await;

        let outcome = engine.answer_query(CORPUS[0]).await.unwrap();
        assert!(matches!(outcome, PipelineOutcome::Answer(_)));
    }
}
