//! Engine context: the bundle of embedder, index, screener, and
//! generation client a query is answered against.
//!
//! The SQLite index is reopened per operation (the connection is not
//! shareable across threads), so the engine only pins its path
//! together with the fitted screener and the resolved providers. A
//! re-index builds a whole new engine which is then swapped in through
//! `EngineHandle`; in-flight queries keep the context they started
//! with.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::info;
use voyager_core::{AppConfig, AppError, AppResult};
use voyager_llm::LlmClient;
use voyager_retrieval::{
    corpus, AnomalyScreener, Embedding, EmbeddingProvider, TravelDocument, VectorIndex,
};

/// Load the corpus, embed it, and persist a fresh vector index at the
/// configured path, replacing any prior index. Returns the number of
/// indexed documents.
///
/// The corpus is the tabular travel-records CSV when present, plus any
/// `.txt` free-text files under the data directory.
pub async fn build_index(
    config: &AppConfig,
    embedder: &Arc<dyn EmbeddingProvider>,
) -> AppResult<usize> {
    let mut documents: Vec<TravelDocument> = Vec::new();

    let corpus_path = config.corpus_path();
    if corpus_path.exists() {
        documents.extend(corpus::load_csv(&corpus_path)?);
    } else {
        tracing::warn!("No corpus CSV at {}", corpus_path.display());
    }

    documents.extend(corpus::load_text_dir(
        &config.data_dir,
        config.retrieval.chunk_size,
        config.retrieval.chunk_overlap,
    )?);

    if documents.is_empty() {
        return Err(AppError::CorpusUnavailable(format!(
            "No corpus documents found under {}",
            config.data_dir.display()
        )));
    }

    info!(
        "Embedding {} documents with {}/{}",
        documents.len(),
        embedder.provider_name(),
        embedder.model_name()
    );

    let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;

    let entries: Vec<(TravelDocument, Embedding)> =
        documents.into_iter().zip(embeddings).collect();

    let index = VectorIndex::build(
        &config.index_path(),
        embedder.model_name(),
        embedder.dimensions(),
        &entries,
    )?;

    info!(
        "Indexed {} documents at {}",
        index.len()?,
        config.index_path().display()
    );
    Ok(entries.len())
}

/// A fully assembled query-answering context.
pub struct Engine {
    pub(crate) config: AppConfig,
    pub(crate) embedder: Arc<dyn EmbeddingProvider>,
    pub(crate) llm: Arc<dyn LlmClient>,
    pub(crate) screener: AnomalyScreener,
    pub(crate) index_path: PathBuf,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("index_path", &self.index_path)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Assemble an engine from a persisted index.
    ///
    /// Opens the index, checks that it was built by the active
    /// embedding model, and fits the anomaly screener over the full
    /// exported embedding set. A missing index is an error here: query
    /// answering requires a prior `index` run.
    pub fn bootstrap(
        config: AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmClient>,
    ) -> AppResult<Self> {
        let index_path = config.index_path();

        let index = VectorIndex::open(&index_path)?.ok_or_else(|| {
            AppError::Index(format!(
                "No index found at {}. Run `voyager index` first",
                index_path.display()
            ))
        })?;

        if index.dimensions() != embedder.dimensions() {
            return Err(AppError::EmbeddingModelMismatch {
                expected: index.dimensions(),
                actual: embedder.dimensions(),
            });
        }
        if index.model() != embedder.model_name() {
            return Err(AppError::Config(format!(
                "Index was built with embedding model '{}' but '{}' is active; re-index to switch models",
                index.model(),
                embedder.model_name()
            )));
        }

        let corpus_embeddings = index.export_all_embeddings()?;
        let screener = AnomalyScreener::fit(&corpus_embeddings, &config.screener)?;

        info!(
            "Engine ready: {} indexed documents, screener threshold {:.2}",
            corpus_embeddings.len(),
            config.screener.threshold
        );

        Ok(Self {
            config,
            embedder,
            llm,
            screener,
            index_path,
        })
    }

    /// Open the persisted index for one operation.
    pub(crate) fn open_index(&self) -> AppResult<VectorIndex> {
        VectorIndex::open(&self.index_path)?.ok_or_else(|| {
            AppError::Index(format!(
                "Index disappeared from {}",
                self.index_path.display()
            ))
        })
    }
}

/// Shared, atomically swappable engine reference.
///
/// Readers grab an `Arc<Engine>` snapshot and answer their query
/// against it; `swap` installs a freshly bootstrapped engine after a
/// re-index without blocking in-flight queries.
pub struct EngineHandle {
    inner: RwLock<Arc<Engine>>,
}

impl EngineHandle {
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: RwLock::new(Arc::new(engine)),
        }
    }

    /// Snapshot the current engine.
    ///
    /// The lock guards a plain `Arc` swap with no partial state, so a
    /// poisoned lock is recovered rather than propagated.
    pub fn engine(&self) -> Arc<Engine> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Install a new engine, returning the one it replaced.
    pub fn swap(&self, engine: Engine) -> Arc<Engine> {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *guard, Arc::new(engine))
    }
}
