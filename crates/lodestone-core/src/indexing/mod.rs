//! Batch embedding and vector index upsert pipeline.
//!
//! Turns chunk artifacts (or whole articles) into [`VectorRecord`]s:
//! embed in batches, validate the service's response against the batch,
//! derive deterministic ids, attach link-reconstruction metadata, and
//! upsert into the language-specific index.
//!
//! A malformed unit (missing url or anchor/slug) is logged and skipped;
//! one bad record never aborts the rest of the batch. Batch-level
//! failures (embedding service down, upsert rejected) do abort, since
//! every remaining record would fail the same way.

use crate::chunking::Chunk;
use crate::embedding::EmbeddingClient;
use crate::error::{EmbeddingError, IndexingError};
use crate::vector::{vector_id, VectorIndex, VectorMetadata, VectorRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Indexer tuning knobs.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Texts per embedding service request
    pub batch_size: usize,
    /// Characters of unit text stored as metadata preview
    pub preview_chars: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            batch_size: crate::config::EMBED_BATCH_SIZE,
            preview_chars: crate::config::CHUNK_PREVIEW_CHARS,
        }
    }
}

/// Outcome of an indexing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexingReport {
    /// Records upserted into the vector index
    pub indexed: usize,
    /// Units skipped for missing required fields
    pub skipped: usize,
}

/// A whole article as a single retrieval unit.
///
/// Alternative to chunk-level indexing: one vector per article, keyed
/// `<lang>/<slug>` so the reranking path can fetch the full text from the
/// content store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleUnit {
    /// Article title
    pub title: String,
    /// Canonical article URL
    pub url: String,
    /// Language code
    pub lang: String,
    /// Content store slug
    pub slug: String,
    /// Full article text
    pub text: String,
}

/// Embeds and upserts chunk-level records into `index_name`.
pub async fn index_chunks(
    embedder: &dyn EmbeddingClient,
    index: &dyn VectorIndex,
    index_name: &str,
    lang: &str,
    chunks: &[Chunk],
    config: &IndexerConfig,
) -> Result<IndexingReport, IndexingError> {
    let mut report = IndexingReport::default();
    let batch_size = config.batch_size.max(1);

    for (batch_number, batch) in chunks.chunks(batch_size).enumerate() {
        let texts: Vec<String> = batch.iter().map(|c| c.chunk_text.clone()).collect();
        let embeddings = embed_validated(embedder, &texts).await?;

        let mut records = Vec::with_capacity(batch.len());
        for (chunk, embedding) in batch.iter().zip(embeddings) {
            if chunk.article_url.is_empty() || chunk.chunk_html_id.is_empty() {
                warn!(
                    "Skipping chunk {} with missing url or anchor",
                    chunk.chunk_id
                );
                report.skipped += 1;
                continue;
            }
            records.push(VectorRecord {
                id: vector_id(&chunk.chunk_id),
                values: embedding,
                metadata: VectorMetadata {
                    article_title: chunk.article_title.clone(),
                    article_url: chunk.article_url.clone(),
                    lang: lang.to_string(),
                    chunk_html_id: Some(chunk.chunk_html_id.clone()),
                    slug: None,
                    chunk_text_preview: Some(truncate_chars(&chunk.chunk_text, config.preview_chars)),
                },
            });
        }

        if !records.is_empty() {
            index.upsert(index_name, &records).await?;
            report.indexed += records.len();
        }
        debug!(
            "Indexed batch {} ({} records, {} skipped so far)",
            batch_number + 1,
            records.len(),
            report.skipped
        );
    }

    info!(
        "Indexed {} chunks into {} ({} skipped)",
        report.indexed, index_name, report.skipped
    );
    Ok(report)
}

/// Embeds and upserts whole-article records into `index_name`.
///
/// Records are keyed `<lang>/<slug>` so re-indexing an article overwrites
/// its previous vector.
pub async fn index_articles(
    embedder: &dyn EmbeddingClient,
    index: &dyn VectorIndex,
    index_name: &str,
    articles: &[ArticleUnit],
    config: &IndexerConfig,
) -> Result<IndexingReport, IndexingError> {
    let mut report = IndexingReport::default();
    let batch_size = config.batch_size.max(1);

    for batch in articles.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|a| a.text.clone()).collect();
        let embeddings = embed_validated(embedder, &texts).await?;

        let mut records = Vec::with_capacity(batch.len());
        for (article, embedding) in batch.iter().zip(embeddings) {
            if article.url.is_empty() || article.slug.is_empty() {
                warn!("Skipping article '{}' with missing url or slug", article.title);
                report.skipped += 1;
                continue;
            }
            let key = format!("{}/{}", article.lang, article.slug);
            records.push(VectorRecord {
                id: vector_id(&key),
                values: embedding,
                metadata: VectorMetadata {
                    article_title: article.title.clone(),
                    article_url: article.url.clone(),
                    lang: article.lang.clone(),
                    chunk_html_id: None,
                    slug: Some(article.slug.clone()),
                    chunk_text_preview: Some(truncate_chars(&article.text, config.preview_chars)),
                },
            });
        }

        if !records.is_empty() {
            index.upsert(index_name, &records).await?;
            report.indexed += records.len();
        }
    }

    info!(
        "Indexed {} articles into {} ({} skipped)",
        report.indexed, index_name, report.skipped
    );
    Ok(report)
}

/// Embeds a batch and validates the response count and per-vector
/// dimensionality against the client's configured dimension.
async fn embed_validated(
    embedder: &dyn EmbeddingClient,
    texts: &[String],
) -> Result<Vec<Vec<f32>>, IndexingError> {
    let embeddings = embedder.embed_batch(texts).await?;
    if embeddings.len() != texts.len() {
        return Err(EmbeddingError::CountMismatch {
            expected: texts.len(),
            actual: embeddings.len(),
        }
        .into());
    }
    let expected_dim = embedder.embedding_dim();
    for embedding in &embeddings {
        if embedding.len() != expected_dim {
            return Err(EmbeddingError::DimensionMismatch {
                expected: expected_dim,
                actual: embedding.len(),
            }
            .into());
        }
    }
    Ok(embeddings)
}

/// Truncates text to at most `max_chars` characters on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VectorIndexError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubEmbedder {
        dim: usize,
    }

    #[async_trait]
    impl EmbeddingClient for StubEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![0.5; self.dim]).collect())
        }

        fn embedding_dim(&self) -> usize {
            self.dim
        }
    }

    /// Embedder that drops the last vector, simulating a short response.
    struct ShortEmbedder;

    #[async_trait]
    impl EmbeddingClient for ShortEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            let mut vectors: Vec<Vec<f32>> = texts.iter().map(|_| vec![0.5; 4]).collect();
            vectors.pop();
            Ok(vectors)
        }

        fn embedding_dim(&self) -> usize {
            4
        }
    }

    #[derive(Default)]
    struct RecordingIndex {
        upserted: Mutex<Vec<VectorRecord>>,
    }

    #[async_trait]
    impl VectorIndex for RecordingIndex {
        async fn query(
            &self,
            _index: &str,
            _vector: &[f32],
            _top_k: usize,
        ) -> Result<Vec<crate::vector::VectorMatch>, VectorIndexError> {
            Ok(Vec::new())
        }

        async fn upsert(
            &self,
            _index: &str,
            records: &[VectorRecord],
        ) -> Result<(), VectorIndexError> {
            self.upserted.lock().unwrap().extend_from_slice(records);
            Ok(())
        }
    }

    fn make_chunk(id: &str, url: &str) -> Chunk {
        Chunk {
            chunk_id: id.to_string(),
            article_title: "Title".to_string(),
            article_url: url.to_string(),
            chunk_text: "Some chunk text for embedding purposes.".to_string(),
            chunk_html_id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_index_chunks_upserts_with_deterministic_ids() {
        let embedder = StubEmbedder { dim: 4 };
        let index = RecordingIndex::default();
        let chunks = vec![make_chunk("a-chunk-0", "/a/"), make_chunk("a-chunk-1", "/a/")];

        let report = index_chunks(
            &embedder,
            &index,
            "search-en",
            "en",
            &chunks,
            &IndexerConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(report, IndexingReport { indexed: 2, skipped: 0 });
        let upserted = index.upserted.lock().unwrap();
        assert_eq!(upserted.len(), 2);
        assert_eq!(upserted[0].id, vector_id("a-chunk-0"));
        assert_eq!(upserted[0].metadata.lang, "en");
        assert_eq!(
            upserted[0].metadata.chunk_html_id.as_deref(),
            Some("a-chunk-0")
        );
    }

    #[tokio::test]
    async fn test_malformed_chunk_is_skipped_not_fatal() {
        let embedder = StubEmbedder { dim: 4 };
        let index = RecordingIndex::default();
        let chunks = vec![make_chunk("a-chunk-0", ""), make_chunk("a-chunk-1", "/a/")];

        let report = index_chunks(
            &embedder,
            &index,
            "search-en",
            "en",
            &chunks,
            &IndexerConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(report, IndexingReport { indexed: 1, skipped: 1 });
    }

    #[tokio::test]
    async fn test_count_mismatch_aborts_batch() {
        let index = RecordingIndex::default();
        let chunks = vec![make_chunk("a-chunk-0", "/a/"), make_chunk("a-chunk-1", "/a/")];

        let err = index_chunks(
            &ShortEmbedder,
            &index,
            "search-en",
            "en",
            &chunks,
            &IndexerConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            IndexingError::Embedding(EmbeddingError::CountMismatch { .. })
        ));
        assert!(index.upserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_index_articles_keys_by_lang_and_slug() {
        let embedder = StubEmbedder { dim: 4 };
        let index = RecordingIndex::default();
        let articles = vec![ArticleUnit {
            title: "Hello".to_string(),
            url: "/post/hello/".to_string(),
            lang: "en".to_string(),
            slug: "hello".to_string(),
            text: "Body text".to_string(),
        }];

        index_articles(
            &embedder,
            &index,
            "search-en",
            &articles,
            &IndexerConfig::default(),
        )
        .await
        .unwrap();

        let upserted = index.upserted.lock().unwrap();
        assert_eq!(upserted[0].id, vector_id("en/hello"));
        assert_eq!(upserted[0].metadata.slug.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_preview_truncated_to_config() {
        let embedder = StubEmbedder { dim: 4 };
        let index = RecordingIndex::default();
        let mut chunk = make_chunk("a-chunk-0", "/a/");
        chunk.chunk_text = "x".repeat(500);

        index_chunks(
            &embedder,
            &index,
            "search-en",
            "en",
            &[chunk],
            &IndexerConfig {
                batch_size: 10,
                preview_chars: 150,
            },
        )
        .await
        .unwrap();

        let upserted = index.upserted.lock().unwrap();
        let preview = upserted[0].metadata.chunk_text_preview.as_deref().unwrap();
        assert_eq!(preview.chars().count(), 150);
    }
}
