//! Corpus loading, embedding, vector search, and topicality screening.
//!
//! This crate owns everything between raw travel data and ranked
//! context: CSV and text corpus ingestion, text chunking, embedding
//! providers, the SQLite-backed vector index, and the isolation-forest
//! screener that rejects out-of-domain queries before retrieval.

pub mod chunker;
pub mod corpus;
pub mod embeddings;
pub mod index;
pub mod screener;
pub mod types;

pub use chunker::chunk_text;
pub use embeddings::{create_provider, EmbeddingProvider};
pub use index::VectorIndex;
pub use screener::{AnomalyScreener, Topicality};
pub use types::{DocMetadata, Embedding, RetrievalResult, TravelDocument};
