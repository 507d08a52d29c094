//! Stats command handler.
//!
//! Shows what the persisted index currently holds.

use clap::Args;
use voyager_core::{config::AppConfig, AppResult};
use voyager_retrieval::VectorIndex;

/// Show index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let index_path = config.index_path();
        let Some(index) = VectorIndex::open(&index_path)? else {
            println!("No index found at {}. Run `voyager index` first", index_path.display());
            return Ok(());
        };

        let entries = index.len()?;

        if self.json {
            let stats = serde_json::json!({
                "index_path": index_path.display().to_string(),
                "entries": entries,
                "embedding_model": index.model(),
                "dimensions": index.dimensions(),
                "top_k": config.retrieval.top_k,
                "screener_threshold": config.screener.threshold,
            });
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("Index: {}", index_path.display());
            println!("Entries: {}", entries);
            println!("Embedding model: {} ({} dimensions)", index.model(), index.dimensions());
            println!("Retrieval top-k: {}", config.retrieval.top_k);
            println!("Screener threshold: {}", config.screener.threshold);
        }

        Ok(())
    }
}
