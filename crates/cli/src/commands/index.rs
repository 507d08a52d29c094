//! Index command handler.
//!
//! Builds the persisted vector index from the travel corpus.

use clap::Args;
use std::path::PathBuf;
use voyager_core::{config::AppConfig, AppResult};
use voyager_pipeline::build_index;
use voyager_retrieval::create_provider;

/// Build or rebuild the vector index from the corpus
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Corpus directory (overrides the configured data directory)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Rebuild even if an index already exists
    #[arg(long)]
    pub rebuild: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing index command");

        let mut config = config.clone();
        if let Some(corpus) = &self.corpus {
            config.data_dir = corpus.clone();
        }

        let index_path = config.index_path();
        if index_path.exists() && !self.rebuild {
            println!(
                "Index already exists at {} (use --rebuild to replace it)",
                index_path.display()
            );
            return Ok(());
        }

        let embedder = create_provider(&config.embedding).await?;
        let indexed = build_index(&config, &embedder).await?;

        if self.json {
            let summary = serde_json::json!({
                "indexed": indexed,
                "index_path": index_path.display().to_string(),
                "embedding_provider": embedder.provider_name(),
                "embedding_model": embedder.model_name(),
                "dimensions": embedder.dimensions(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!(
                "Indexed {} documents at {} ({}/{}, {} dimensions)",
                indexed,
                index_path.display(),
                embedder.provider_name(),
                embedder.model_name(),
                embedder.dimensions()
            );
        }

        Ok(())
    }
}
