//! Production configuration constants.
//!
//! This module contains constants that define the production configuration
//! for Lodestone. Runtime-tunable settings (endpoints, credentials, language
//! lists) live in the binaries' CLI structs; the values here are the
//! algorithmic defaults shared by the pipeline, the indexer, and the tests.

// =============================================================================
// Embedding Configuration
// =============================================================================

/// Embedding vector dimension.
///
/// Must match the dimension the embedding service produces for the
/// configured model. The indexer and the query embedder validate every
/// returned vector against this value.
pub const EMBEDDING_DIM: usize = 768;

/// Maximum texts per embedding service request.
pub const EMBED_BATCH_SIZE: usize = 50;

// =============================================================================
// Retrieval Configuration
// =============================================================================

/// Nearest-neighbor candidates fetched from the vector index per query.
pub const VECTOR_TOP_K: usize = 20;

/// Maximum results returned to the caller after filtering.
pub const FINAL_RESULT_COUNT: usize = 10;

/// Minimum similarity score for candidates from a chunk-level index.
///
/// Calibrated for cosine similarity against chunk embeddings. Do not reuse
/// for whole-article indices; see [`ARTICLE_SCORE_THRESHOLD`].
pub const CHUNK_SCORE_THRESHOLD: f32 = 0.46;

/// Minimum similarity score for candidates from a whole-article index.
///
/// Whole-article embeddings average over much longer text, so raw cosine
/// scores run lower than chunk-level scores for the same query.
pub const ARTICLE_SCORE_THRESHOLD: f32 = 0.40;

/// Minimum score for candidates that went through the reranker.
///
/// Rerank scores are calibrated differently from raw vector similarity,
/// so this threshold is intentionally looser.
pub const RERANK_SCORE_THRESHOLD: f32 = 0.1;

/// Maximum characters of candidate text sent to the reranker per context.
pub const MAX_RERANK_CONTEXT_CHARS: usize = 2000;

/// Upper bound on concurrent content store fetches per query.
pub const CONTENT_FETCH_CONCURRENCY: usize = 8;

// =============================================================================
// Chunking Configuration
// =============================================================================

/// Deepest heading level treated as a chunk boundary.
pub const DEFAULT_SPLIT_LEVEL: usize = 2;

/// Minimum character length before the greedy merger flushes a chunk.
pub const DEFAULT_MIN_CHUNK_LENGTH: usize = 50;

/// Characters of chunk text stored as preview in vector metadata.
pub const CHUNK_PREVIEW_CHARS: usize = 150;

// =============================================================================
// Highlighting Configuration
// =============================================================================

/// Character budget for keyword match previews.
pub const PREVIEW_CHAR_LIMIT: usize = 140;

/// Context window emitted around elided gaps in previews.
pub const PREVIEW_CONTEXT_OFFSET: usize = 20;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_are_distinct() {
        // Chunk-level and article-level indices are calibrated differently
        // and must never share a threshold constant.
        assert_ne!(CHUNK_SCORE_THRESHOLD, ARTICLE_SCORE_THRESHOLD);
        assert!(RERANK_SCORE_THRESHOLD < CHUNK_SCORE_THRESHOLD);
    }

    #[test]
    fn test_final_count_within_top_k() {
        let top_k = VECTOR_TOP_K;
        assert!(
            FINAL_RESULT_COUNT <= top_k,
            "final result count cannot exceed retrieved candidates"
        );
    }

    #[test]
    fn test_preview_window_smaller_than_budget() {
        assert!(PREVIEW_CONTEXT_OFFSET * 2 < PREVIEW_CHAR_LIMIT);
    }
}
