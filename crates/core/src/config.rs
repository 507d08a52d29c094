//! Configuration management for the voyager CLI.
//!
//! This module handles loading and merging configuration from multiple
//! sources:
//! - Environment variables
//! - Command-line flags
//! - Config file (voyager.yaml in the data directory)
//!
//! The configuration is data-directory-centric: the corpus, the
//! persisted vector index, and the optional config file all live under
//! one root.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Default file name of the tabular travel corpus.
pub const DEFAULT_CORPUS_FILE: &str = "Travel details dataset.csv";

/// Default relative location of the persisted vector index.
pub const DEFAULT_INDEX_FILE: &str = "vectorstore/voyager.db";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root data directory (corpus, index, config file)
    pub data_dir: PathBuf,

    /// Optional config file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,

    /// Text-generation provider (e.g., "gemini")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// API key for the generation provider (resolved from env)
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Log level override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    #[serde(default)]
    pub verbose: bool,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,

    /// Retrieval settings (corpus location, chunking, top-k)
    #[serde(default)]
    pub retrieval: RetrievalSettings,

    /// Embedding provider settings
    #[serde(default)]
    pub embedding: EmbeddingSettings,

    /// Anomaly screener settings
    #[serde(default)]
    pub screener: ScreenerSettings,

    /// Per-stage timeout applied by the orchestrator, in seconds
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,
}

/// Settings for corpus loading and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Corpus CSV file name, relative to the data directory
    pub corpus_file: String,

    /// Persisted index location, relative to the data directory
    pub index_file: String,

    /// Number of nearest neighbors retrieved per query
    pub top_k: usize,

    /// Maximum chunk length in characters (free-text sources)
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            corpus_file: DEFAULT_CORPUS_FILE.to_string(),
            index_file: DEFAULT_INDEX_FILE.to_string(),
            top_k: 4,
            chunk_size: 800,
            chunk_overlap: 100,
        }
    }
}

/// Settings for the embedding provider.
///
/// The same settings are used at index time and at query time; the
/// whole retrieval and screening pipeline depends on both sides
/// producing identical vectors for identical text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Provider name: "ollama" or "trigram"
    pub provider: String,

    /// Model identifier (provider-specific, multilingual)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Whether to normalize embeddings to unit length
    #[serde(default = "default_normalize")]
    pub normalize: bool,

    /// HTTP endpoint for remote providers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

fn default_normalize() -> bool {
    true
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "bge-m3".to_string(),
            dimensions: 1024,
            normalize: true,
            endpoint: None,
        }
    }
}

/// Settings for the isolation-forest anomaly screener.
///
/// The defaults mirror a conventional isolation-forest setup; the
/// threshold in particular should be calibrated empirically against
/// the corpus at hand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenerSettings {
    /// Decision threshold: scores strictly below it are out-of-topic
    pub threshold: f64,

    /// Number of isolation trees in the ensemble
    pub trees: usize,

    /// Subsample size per tree
    pub subsample: usize,

    /// RNG seed for reproducible fits
    pub seed: u64,
}

impl Default for ScreenerSettings {
    fn default() -> Self {
        Self {
            threshold: -0.5,
            trees: 100,
            subsample: 256,
            seed: 42,
        }
    }
}

fn default_stage_timeout_secs() -> u64 {
    60
}

/// Config file structure (voyager.yaml).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    provider: Option<String>,
    model: Option<String>,
    retrieval: Option<RetrievalSettings>,
    embedding: Option<EmbeddingSettings>,
    screener: Option<ScreenerSettings>,
    logging: Option<LoggingSection>,
    #[serde(rename = "stageTimeoutSecs")]
    stage_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            config_file: None,
            provider: "gemini".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            retrieval: RetrievalSettings::default(),
            embedding: EmbeddingSettings::default(),
            screener: ScreenerSettings::default(),
            stage_timeout_secs: default_stage_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, the optional
    /// YAML config file, and defaults.
    ///
    /// Environment variables:
    /// - `VOYAGER_DATA_DIR`: Root data directory
    /// - `VOYAGER_CONFIG`: Path to config file
    /// - `VOYAGER_PROVIDER`: Generation provider
    /// - `VOYAGER_MODEL`: Generation model identifier
    /// - `GEMINI_API_KEY`: API credential for the Gemini provider
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(data_dir) = std::env::var("VOYAGER_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(config_file) = std::env::var("VOYAGER_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if let Ok(provider) = std::env::var("VOYAGER_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("VOYAGER_MODEL") {
            config.model = model;
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        // Merge the YAML config file if present. An explicitly named
        // file must exist; the default location is optional.
        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.data_dir.join("voyager.yaml"));

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let file: ConfigFile = serde_yaml::from_str(&contents)?;
            config.merge_file(file);
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        Ok(config)
    }

    fn merge_file(&mut self, file: ConfigFile) {
        if let Some(provider) = file.provider {
            self.provider = provider;
        }
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(retrieval) = file.retrieval {
            self.retrieval = retrieval;
        }
        if let Some(embedding) = file.embedding {
            self.embedding = embedding;
        }
        if let Some(screener) = file.screener {
            self.screener = screener;
        }
        if let Some(secs) = file.stage_timeout_secs {
            self.stage_timeout_secs = secs;
        }
        if let Some(logging) = file.logging {
            if self.log_level.is_none() {
                self.log_level = logging.level;
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }
    }

    /// Apply command-line overrides on top of the loaded configuration.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(cf) = config_file {
            self.config_file = Some(cf);
        }
        if let Some(p) = provider {
            self.provider = p;
        }
        if let Some(m) = model {
            self.model = m;
        }
        if let Some(level) = log_level {
            self.log_level = Some(level);
        }
        if verbose {
            self.verbose = true;
            self.log_level = Some("debug".to_string());
        }
        if no_color {
            self.no_color = true;
        }
        self
    }

    /// Resolve the API credential for the active generation provider.
    ///
    /// A missing credential is a startup-fatal configuration error,
    /// never a per-call failure.
    pub fn resolve_api_key(&mut self) -> AppResult<()> {
        match self.provider.as_str() {
            "gemini" => match std::env::var("GEMINI_API_KEY") {
                Ok(key) if !key.trim().is_empty() => {
                    self.api_key = Some(key);
                    Ok(())
                }
                _ => Err(AppError::Config(
                    "GEMINI_API_KEY environment variable is not set".to_string(),
                )),
            },
            // Mock provider is credential-free (tests / offline dev)
            "mock" => Ok(()),
            other => Err(AppError::Config(format!(
                "Unknown generation provider: '{}'",
                other
            ))),
        }
    }

    /// Absolute path of the corpus CSV file.
    pub fn corpus_path(&self) -> PathBuf {
        self.data_dir.join(&self.retrieval.corpus_file)
    }

    /// Absolute path of the persisted vector index.
    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join(&self.retrieval.index_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.screener.threshold, -0.5);
        assert_eq!(config.screener.seed, 42);
        assert!(config.embedding.normalize);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::default().with_overrides(
            Some(PathBuf::from("/tmp/corpus")),
            None,
            Some("mock".to_string()),
            None,
            None,
            true,
            true,
        );
        assert_eq!(config.data_dir, PathBuf::from("/tmp/corpus"));
        assert_eq!(config.provider, "mock");
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert!(config.no_color);
    }

    #[test]
    fn test_paths_are_rooted_in_data_dir() {
        let config = AppConfig::default().with_overrides(
            Some(PathBuf::from("/srv/voyager")),
            None,
            None,
            None,
            None,
            false,
            false,
        );
        assert!(config.corpus_path().starts_with("/srv/voyager"));
        assert!(config.index_path().starts_with("/srv/voyager"));
    }

    #[test]
    fn test_config_file_merge() {
        let yaml = r#"
provider: mock
retrieval:
  corpus_file: trips.csv
  index_file: idx/voyager.db
  top_k: 8
  chunk_size: 500
  chunk_overlap: 50
screener:
  threshold: -0.4
  trees: 50
  subsample: 128
  seed: 7
"#;
        let file: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        let mut config = AppConfig::default();
        config.merge_file(file);
        assert_eq!(config.provider, "mock");
        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.screener.trees, 50);
        assert!((config.screener.threshold - (-0.4)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_provider_fails_key_resolution() {
        let mut config = AppConfig {
            provider: "nope".to_string(),
            ..Default::default()
        };
        assert!(config.resolve_api_key().is_err());
    }
}
