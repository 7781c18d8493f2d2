//! Error types for lodestone-core.
//!
//! This module defines error types that are used across the core library,
//! covering embedding, vector index, rerank, content store, keyword index,
//! and batch indexing operations.

use thiserror::Error;

/// Errors that can occur when talking to the embedding service.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// The embedding service request itself failed (network, HTTP status)
    #[error("Embedding request failed: {0}")]
    RequestFailed(String),
    /// The service responded but the payload could not be interpreted
    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),
    /// The service returned a different number of vectors than inputs
    #[error("Embedding count mismatch: expected {expected}, got {actual}")]
    CountMismatch {
        /// Number of input texts
        expected: usize,
        /// Number of vectors returned
        actual: usize,
    },
    /// A returned vector does not match the configured dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Configured embedding dimension
        expected: usize,
        /// Dimension of the offending vector
        actual: usize,
    },
}

/// Errors that can occur when querying or writing the vector index service.
#[derive(Debug, Clone, Error)]
pub enum VectorIndexError {
    /// Query or upsert request failed (network, HTTP status)
    #[error("Vector index request failed: {0}")]
    RequestFailed(String),
    /// Response payload could not be interpreted
    #[error("Malformed vector index response: {0}")]
    MalformedResponse(String),
}

/// Errors that can occur when calling the reranking service.
#[derive(Debug, Clone, Error)]
pub enum RerankError {
    /// Rerank request failed (network, HTTP status)
    #[error("Rerank request failed: {0}")]
    RequestFailed(String),
    /// Response payload could not be interpreted
    #[error("Malformed rerank response: {0}")]
    MalformedResponse(String),
}

/// Errors that can occur when fetching raw article content.
#[derive(Debug, Clone, Error)]
pub enum ContentError {
    /// Content fetch failed (network, non-404 HTTP status)
    #[error("Content fetch failed for {key}: {reason}")]
    FetchFailed {
        /// The `lang/slug` key that was requested
        key: String,
        /// Underlying failure description
        reason: String,
    },
}

/// Errors that can occur when loading the keyword document index.
///
/// Cloneable so a shared in-flight load can hand the same failure to
/// every waiting caller.
#[derive(Debug, Clone, Error)]
pub enum KeywordIndexError {
    /// Fetching the document index failed (network, HTTP status)
    #[error("Keyword index fetch failed: {0}")]
    FetchFailed(String),
    /// The payload was neither a JSON array nor newline-delimited JSON
    #[error("Keyword index parse failed: {0}")]
    ParseFailed(String),
}

/// Errors surfaced by the search pipeline.
///
/// The variants map onto the HTTP error taxonomy: [`SearchError::InvalidQuery`]
/// is a caller error (400), [`SearchError::UnsupportedLanguage`] is a
/// configuration error, and the remaining variants are upstream failures
/// (both 500).
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// Missing or empty query text
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// No vector index is configured for the requested language
    #[error("No vector index configured for language: {0}")]
    UnsupportedLanguage(String),
    /// Embedding the query failed
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    /// Querying the vector index failed
    #[error(transparent)]
    VectorIndex(#[from] VectorIndexError),
    /// Reranking failed
    #[error(transparent)]
    Rerank(#[from] RerankError),
}

impl SearchError {
    /// Whether this error is the caller's fault rather than the server's.
    pub fn is_validation(&self) -> bool {
        matches!(self, SearchError::InvalidQuery(_))
    }
}

/// Errors that abort a batch indexing run.
///
/// Per-record problems (missing url, missing anchor) are not errors: they
/// are logged and the record is skipped. Only failures that invalidate the
/// whole batch surface here.
#[derive(Debug, Clone, Error)]
pub enum IndexingError {
    /// Embedding a batch failed
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    /// Upserting vectors failed
    #[error(transparent)]
    VectorIndex(#[from] VectorIndexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(SearchError::InvalidQuery("empty".into()).is_validation());
        assert!(!SearchError::UnsupportedLanguage("fr".into()).is_validation());
        assert!(
            !SearchError::Embedding(EmbeddingError::RequestFailed("down".into())).is_validation()
        );
    }

    #[test]
    fn test_error_messages_include_detail() {
        let err = EmbeddingError::CountMismatch {
            expected: 3,
            actual: 1,
        };
        assert!(err.to_string().contains("expected 3"));

        let err = ContentError::FetchFailed {
            key: "en/post-1".into(),
            reason: "timeout".into(),
        };
        assert!(err.to_string().contains("en/post-1"));
    }
}
