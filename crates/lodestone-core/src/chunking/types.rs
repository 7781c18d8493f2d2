use serde::{Deserialize, Serialize};

/// A source article produced by the site generator.
///
/// Immutable once built. Consumed by the chunker and, on the client side,
/// by the keyword matcher (through its own fetched document index).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Stable article identifier (used to derive chunk ids)
    pub id: String,
    /// Article title
    pub title: String,
    /// Canonical article URL
    pub url: String,
    /// Language code (e.g. "en", "zh")
    #[serde(default)]
    pub lang: String,
    /// Raw markdown-ish body text
    #[serde(rename = "rawContent", default)]
    pub raw_content: String,
    /// Optional summary used for the synthetic header chunk
    #[serde(default)]
    pub description: Option<String>,
}

/// A retrieval-sized excerpt of an article.
///
/// Chunk ids are deterministic: re-chunking unchanged content yields the
/// same id sequence, so re-indexing overwrites instead of duplicating.
/// The `chunk_html_id` doubles as the anchor for deep-linking search
/// results to a specific section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic id: `<article-id>-chunk-header` or `<article-id>-chunk-<n>`
    pub chunk_id: String,
    /// Title of the owning article
    pub article_title: String,
    /// URL of the owning article
    pub article_url: String,
    /// Chunk body text
    pub chunk_text: String,
    /// Anchor id for deep links; equal to `chunk_id`
    pub chunk_html_id: String,
}
