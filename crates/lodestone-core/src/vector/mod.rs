//! Vector index client and language-partitioned index naming.
//!
//! The vector index is an external service; this module defines the record
//! and match types that cross the wire, the [`VectorIndex`] trait the
//! pipeline and indexer depend on, and the registry that maps a language
//! code to its dedicated index (`<base>-<lang>`).

mod remote;

use crate::error::VectorIndexError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use remote::RemoteVectorIndex;

/// Metadata stored with every vector.
///
/// Must contain enough information to reconstruct a dereferenceable link:
/// `article_url` plus either `chunk_html_id` (chunk-level index, anchor
/// deep links) or `slug` (whole-article index, content store key).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorMetadata {
    /// Title of the owning article
    pub article_title: String,
    /// Canonical URL of the owning article
    pub article_url: String,
    /// Language code of the article
    pub lang: String,
    /// Anchor id for chunk-level records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_html_id: Option<String>,
    /// Content store slug for whole-article records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Leading characters of the indexed text, for result previews
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_text_preview: Option<String>,
}

/// A vector plus metadata, as upserted into the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Deterministic id; see [`vector_id`]
    pub id: String,
    /// Embedding vector
    pub values: Vec<f32>,
    /// Link-reconstruction metadata
    pub metadata: VectorMetadata,
}

/// A nearest-neighbor match returned by a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMatch {
    /// Record id
    pub id: String,
    /// Similarity score (higher is more similar)
    pub score: f32,
    /// Metadata stored with the record, when requested
    #[serde(default)]
    pub metadata: Option<VectorMetadata>,
}

/// Client for an external nearest-neighbor vector index service.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Returns the `top_k` nearest neighbors to `vector` from `index`,
    /// with stored metadata.
    async fn query(
        &self,
        index: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorIndexError>;

    /// Upserts records into `index`. Records with existing ids are
    /// overwritten, which together with deterministic ids makes
    /// re-indexing idempotent.
    async fn upsert(&self, index: &str, records: &[VectorRecord]) -> Result<(), VectorIndexError>;
}

/// Maps language codes to their dedicated vector index.
///
/// One index per supported language, named `<base>-<lang>`. A language
/// without a binding is a configuration error, not a query error; callers
/// surface it distinctly (see
/// [`SearchError::UnsupportedLanguage`](crate::error::SearchError::UnsupportedLanguage)).
#[derive(Debug, Clone)]
pub struct IndexRegistry {
    base_name: String,
    languages: Vec<String>,
}

impl IndexRegistry {
    /// Creates a registry for the given base name and supported languages.
    pub fn new(base_name: impl Into<String>, languages: Vec<String>) -> Self {
        Self {
            base_name: base_name.into(),
            languages,
        }
    }

    /// Resolves the index name bound to a language, or `None` if the
    /// language is not configured.
    pub fn index_for(&self, lang: &str) -> Option<String> {
        let lang = lang.to_ascii_lowercase();
        self.languages
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(&lang))
            .then(|| format!("{}-{}", self.base_name, lang))
    }

    /// Configured language codes.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }
}

/// Derives the deterministic vector id for a unique record key.
///
/// The key is the chunk id for chunk-level records, or `<lang>/<slug>` for
/// whole-article records. Hashing (rather than a random id) means
/// re-indexing the same logical unit overwrites instead of duplicating.
pub fn vector_id(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}
