//! Retrieval system type definitions.

use serde::{Deserialize, Serialize};

/// A travel record (or chunk of one) in its canonical text form.
///
/// Immutable once created: produced by the corpus loader, embedded,
/// persisted in the vector index, and returned verbatim by searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelDocument {
    /// Canonical natural-language content used for embedding
    pub content: String,

    /// Typed metadata extracted at load time
    #[serde(default)]
    pub metadata: DocMetadata,
}

impl TravelDocument {
    /// Create a document from plain content with empty metadata.
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: DocMetadata::default(),
        }
    }
}

/// Metadata carried alongside a travel document.
///
/// Fields mirror the identifying columns of the tabular corpus; the
/// raw third-party row shape never escapes the loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocMetadata {
    /// Trip identifier from the source record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,

    /// Destination (mandatory for tabular records)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Accommodation type (hotel, resort, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accommodation_type: Option<String>,

    /// Transportation type (flight, train, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transportation_type: Option<String>,

    /// Traveler nationality
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traveler_nationality: Option<String>,

    /// Source file for free-text documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Chunk position within the source, when a record was split
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk: Option<u32>,
}

/// Ordered retrieval output: (document, similarity) pairs, descending
/// by similarity, length ≤ k. May be empty; an empty result is a
/// normal outcome, not an error.
pub type RetrievalResult = Vec<(TravelDocument, f32)>;

/// Fixed-dimensionality embedding vector.
pub type Embedding = Vec<f32>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_roundtrip() {
        let doc = TravelDocument {
            content: "Voyage 1. Destination: Paris.".to_string(),
            metadata: DocMetadata {
                trip_id: Some("1".to_string()),
                destination: Some("Paris".to_string()),
                ..Default::default()
            },
        };

        let json = serde_json::to_string(&doc).unwrap();
        let back: TravelDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn test_empty_metadata_serializes_compactly() {
        let doc = TravelDocument::from_content("hello");
        let json = serde_json::to_string(&doc.metadata).unwrap();
        assert_eq!(json, "{}");
    }
}
