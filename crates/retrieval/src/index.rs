//! SQLite-backed vector index for travel documents.
//!
//! The index is a flat store: one row per document with its embedding
//! as a little-endian f32 BLOB, searched by full-scan cosine
//! similarity. Rebuilds are explicit and total: `build` replaces any
//! prior index at the same location, there is no incremental update.
//!
//! The metadata table records the embedding model and dimensionality
//! so that a provider/index mismatch is caught at open time instead of
//! surfacing as a nonsense similarity score.

use crate::types::{DocMetadata, Embedding, RetrievalResult, TravelDocument};
use rusqlite::{params, Connection};
use std::path::Path;
use voyager_core::{AppError, AppResult};

/// Persistent vector index over travel documents.
#[derive(Debug)]
pub struct VectorIndex {
    conn: Connection,
    model: String,
    dimensions: usize,
}

impl VectorIndex {
    /// Build a fresh index at `db_path`, replacing any prior one.
    ///
    /// Every embedding must match `dimensions`; a stray vector from a
    /// different model is rejected up front with
    /// `EmbeddingModelMismatch`.
    pub fn build(
        db_path: &Path,
        model: &str,
        dimensions: usize,
        entries: &[(TravelDocument, Embedding)],
    ) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Index(format!("Failed to create index directory: {}", e))
            })?;
        }

        let mut conn = Connection::open(db_path)
            .map_err(|e| AppError::Index(format!("Failed to open SQLite index: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL,
                embedding BLOB NOT NULL
            );

            DELETE FROM entries;
            DELETE FROM meta;
            "#,
        )
        .map_err(|e| AppError::Index(format!("Failed to create tables: {}", e)))?;

        for (_, embedding) in entries {
            if embedding.len() != dimensions {
                return Err(AppError::EmbeddingModelMismatch {
                    expected: dimensions,
                    actual: embedding.len(),
                });
            }
        }

        let tx = conn
            .transaction()
            .map_err(|e| AppError::Index(format!("Failed to begin transaction: {}", e)))?;

        tx.execute(
            "INSERT INTO meta (key, value) VALUES ('model', ?1), ('dimensions', ?2), ('built_at', ?3)",
            params![
                model,
                dimensions.to_string(),
                chrono::Utc::now().to_rfc3339()
            ],
        )
        .map_err(|e| AppError::Index(format!("Failed to write index metadata: {}", e)))?;

        for (document, embedding) in entries {
            let metadata_json = serde_json::to_string(&document.metadata)
                .map_err(|e| AppError::Index(format!("Failed to serialize metadata: {}", e)))?;

            tx.execute(
                "INSERT INTO entries (content, metadata, embedding) VALUES (?1, ?2, ?3)",
                params![
                    document.content,
                    metadata_json,
                    embedding_to_bytes(embedding)
                ],
            )
            .map_err(|e| AppError::Index(format!("Failed to insert entry: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| AppError::Index(format!("Failed to commit index build: {}", e)))?;

        tracing::info!(
            "Built vector index at {} ({} entries, {} dims, model '{}')",
            db_path.display(),
            entries.len(),
            dimensions,
            model
        );

        Ok(Self {
            conn,
            model: model.to_string(),
            dimensions,
        })
    }

    /// Reopen a previously persisted index.
    ///
    /// Returns `Ok(None)` when no index exists at the path; absence
    /// is the signal for "build first", never an error.
    pub fn open(db_path: &Path) -> AppResult<Option<Self>> {
        if !db_path.exists() {
            return Ok(None);
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Index(format!("Failed to open SQLite index: {}", e)))?;

        let model: String = conn
            .query_row("SELECT value FROM meta WHERE key = 'model'", [], |row| {
                row.get(0)
            })
            .map_err(|e| AppError::Index(format!("Index missing model metadata: {}", e)))?;

        let dimensions: usize = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'dimensions'",
                [],
                |row| row.get::<_, String>(0),
            )
            .map_err(|e| AppError::Index(format!("Index missing dimensions metadata: {}", e)))?
            .parse()
            .map_err(|e| AppError::Index(format!("Corrupt dimensions metadata: {}", e)))?;

        tracing::debug!(
            "Opened vector index at {} (model '{}', {} dims)",
            db_path.display(),
            model,
            dimensions
        );

        Ok(Some(Self {
            conn,
            model,
            dimensions,
        }))
    }

    /// Embedding model the index was built with.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Dimensionality of stored embeddings.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of indexed entries.
    pub fn len(&self) -> AppResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .map_err(|e| AppError::Index(format!("Failed to count entries: {}", e)))?;
        Ok(count as usize)
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> AppResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Search for the k nearest entries by cosine similarity.
    ///
    /// An empty index yields an empty result, not an error.
    pub fn search(&self, query_embedding: &[f32], k: usize) -> AppResult<RetrievalResult> {
        if query_embedding.len() != self.dimensions {
            return Err(AppError::EmbeddingModelMismatch {
                expected: self.dimensions,
                actual: query_embedding.len(),
            });
        }

        let mut stmt = self
            .conn
            .prepare("SELECT content, metadata, embedding FROM entries")
            .map_err(|e| AppError::Index(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                let content: String = row.get(0)?;
                let metadata_json: String = row.get(1)?;
                let embedding_bytes: Vec<u8> = row.get(2)?;
                Ok((content, metadata_json, embedding_bytes))
            })
            .map_err(|e| AppError::Index(format!("Failed to query entries: {}", e)))?;

        let mut results: Vec<(TravelDocument, f32)> = Vec::new();
        for row in rows {
            let (content, metadata_json, embedding_bytes) =
                row.map_err(|e| AppError::Index(format!("Failed to read entry: {}", e)))?;

            let metadata: DocMetadata = serde_json::from_str(&metadata_json)
                .map_err(|e| AppError::Index(format!("Corrupt entry metadata: {}", e)))?;
            let embedding = bytes_to_embedding(&embedding_bytes)?;

            let score = cosine_similarity(query_embedding, &embedding);
            results.push((TravelDocument { content, metadata }, score));
        }

        // Sort by score descending
        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);

        tracing::debug!("Retrieved {} entries (requested top-{})", results.len(), k);

        Ok(results)
    }

    /// Export every stored embedding in stable (insertion) order.
    ///
    /// This is the training set for the anomaly screener's fit step.
    pub fn export_all_embeddings(&self) -> AppResult<Vec<Embedding>> {
        let mut stmt = self
            .conn
            .prepare("SELECT embedding FROM entries ORDER BY id")
            .map_err(|e| AppError::Index(format!("Failed to prepare export: {}", e)))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, Vec<u8>>(0))
            .map_err(|e| AppError::Index(format!("Failed to export embeddings: {}", e)))?;

        let mut embeddings = Vec::new();
        for row in rows {
            let bytes = row.map_err(|e| AppError::Index(format!("Failed to read entry: {}", e)))?;
            embeddings.push(bytes_to_embedding(&bytes)?);
        }

        Ok(embeddings)
    }
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Index("Invalid embedding bytes length".to_string()));
    }

    let mut embedding = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        let value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        embedding.push(value);
    }

    Ok(embedding)
}

/// Calculate cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn doc(content: &str) -> TravelDocument {
        TravelDocument::from_content(content)
    }

    fn sample_entries() -> Vec<(TravelDocument, Embedding)> {
        vec![
            (doc("Voyage à Paris"), vec![1.0, 0.0, 0.0]),
            (doc("Voyage à Rome"), vec![0.0, 1.0, 0.0]),
            (doc("Voyage à Tunis"), vec![0.0, 0.0, 1.0]),
        ]
    }

    #[test]
    fn test_build_and_search() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.db");
        let index = VectorIndex::build(&path, "test-model", 3, &sample_entries()).unwrap();

        let results = index.search(&[1.0, 0.1, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.content, "Voyage à Paris");
        assert!(results[0].1 > results[1].1);
    }

    #[test]
    fn test_open_absent_returns_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.db");
        assert!(VectorIndex::open(&path).unwrap().is_none());
    }

    #[test]
    fn test_open_roundtrip_matches_original_search() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.db");
        let built = VectorIndex::build(&path, "test-model", 3, &sample_entries()).unwrap();

        let query = [0.2, 0.9, 0.1];
        let original = built.search(&query, 3).unwrap();
        drop(built);

        let reopened = VectorIndex::open(&path).unwrap().unwrap();
        assert_eq!(reopened.model(), "test-model");
        assert_eq!(reopened.dimensions(), 3);

        let after = reopened.search(&query, 3).unwrap();
        assert_eq!(original.len(), after.len());
        for ((doc_a, score_a), (doc_b, score_b)) in original.iter().zip(after.iter()) {
            assert_eq!(doc_a, doc_b);
            assert!((score_a - score_b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_empty_index_search_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.db");
        let index = VectorIndex::build(&path, "test-model", 3, &[]).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 5).unwrap();
        assert!(results.is_empty());
        assert!(index.is_empty().unwrap());
    }

    #[test]
    fn test_rebuild_replaces_prior_index() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.db");
        VectorIndex::build(&path, "test-model", 3, &sample_entries()).unwrap();

        let replacement = vec![(doc("Voyage à Dubaï"), vec![1.0f32, 1.0, 0.0])];
        let index = VectorIndex::build(&path, "test-model", 3, &replacement).unwrap();

        assert_eq!(index.len().unwrap(), 1);
        let results = index.search(&[1.0, 1.0, 0.0], 5).unwrap();
        assert_eq!(results[0].0.content, "Voyage à Dubaï");
    }

    #[test]
    fn test_dimension_mismatch_on_build() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.db");
        let entries = vec![(doc("bad"), vec![1.0f32, 0.0])];

        let err = VectorIndex::build(&path, "test-model", 3, &entries).unwrap_err();
        assert!(matches!(
            err,
            AppError::EmbeddingModelMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_dimension_mismatch_on_search() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.db");
        let index = VectorIndex::build(&path, "test-model", 3, &sample_entries()).unwrap();

        let err = index.search(&[1.0, 0.0], 2).unwrap_err();
        assert!(matches!(err, AppError::EmbeddingModelMismatch { .. }));
    }

    #[test]
    fn test_export_preserves_insertion_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.db");
        let index = VectorIndex::build(&path, "test-model", 3, &sample_entries()).unwrap();

        let exported = index.export_all_embeddings().unwrap();
        assert_eq!(exported.len(), 3);
        assert_eq!(exported[0], vec![1.0, 0.0, 0.0]);
        assert_eq!(exported[2], vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_embedding_bytes_roundtrip() {
        let embedding = vec![0.25f32, -1.5, 3.75];
        let bytes = embedding_to_bytes(&embedding);
        assert_eq!(bytes_to_embedding(&bytes).unwrap(), embedding);
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &[1.0, 0.0, 0.0]) - 1.0).abs() < 0.001);
        assert!((cosine_similarity(&a, &[0.0, 1.0, 0.0])).abs() < 0.001);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0]), 0.0);
    }
}
