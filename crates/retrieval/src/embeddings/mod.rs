//! Embedding generation for travel documents and queries.
//!
//! One process resolves exactly one provider instance and shares it
//! between indexing and query handling; this is the consistency invariant
//! the whole retrieval and screening pipeline depends on.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
