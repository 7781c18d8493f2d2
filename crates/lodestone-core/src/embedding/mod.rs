//! Embedding service client abstractions.
//!
//! Lodestone never runs an embedding model in-process: both the indexer and
//! the query path call an external service through the [`EmbeddingClient`]
//! trait, which lets tests substitute a mock and keeps the indexer and the
//! query embedder on the same model and dimensionality by construction.

mod remote;

use crate::error::{EmbeddingError, SearchError};
use async_trait::async_trait;

pub use remote::RemoteEmbedder;

/// Client for an external embedding service.
///
/// Implementations must return exactly one vector per input text, each of
/// [`embedding_dim`](EmbeddingClient::embedding_dim) length, in input order.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embeds a batch of texts, one vector per input in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// The dimension every returned vector must have.
    fn embedding_dim(&self) -> usize;
}

/// Embeds a free-text query into the same vector space as the index.
///
/// Rejects empty queries with a validation error and fails loudly if the
/// service returns no vector or one of the wrong dimension; a silently
/// substituted zero vector would return arbitrary neighbors.
pub async fn embed_query(
    client: &dyn EmbeddingClient,
    query: &str,
) -> Result<Vec<f32>, SearchError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(SearchError::InvalidQuery(
            "query text cannot be empty".to_string(),
        ));
    }

    let mut vectors = client.embed_batch(&[query.to_string()]).await?;
    let vector = vectors.pop().ok_or(EmbeddingError::CountMismatch {
        expected: 1,
        actual: 0,
    })?;

    if vector.len() != client.embedding_dim() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: client.embedding_dim(),
            actual: vector.len(),
        }
        .into());
    }

    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEmbedder {
        dim: usize,
        vectors: Vec<Vec<f32>>,
    }

    #[async_trait]
    impl EmbeddingClient for FixedEmbedder {
        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(self.vectors.clone())
        }

        fn embedding_dim(&self) -> usize {
            self.dim
        }
    }

    #[tokio::test]
    async fn test_embed_query_rejects_empty() {
        let client = FixedEmbedder {
            dim: 3,
            vectors: vec![],
        };
        let err = embed_query(&client, "   ").await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_embed_query_returns_vector() {
        let client = FixedEmbedder {
            dim: 3,
            vectors: vec![vec![0.1, 0.2, 0.3]],
        };
        let vector = embed_query(&client, "hello").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_embed_query_fails_on_empty_response() {
        let client = FixedEmbedder {
            dim: 3,
            vectors: vec![],
        };
        let err = embed_query(&client, "hello").await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::Embedding(EmbeddingError::CountMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_embed_query_fails_on_wrong_dimension() {
        let client = FixedEmbedder {
            dim: 3,
            vectors: vec![vec![0.1, 0.2]],
        };
        let err = embed_query(&client, "hello").await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::Embedding(EmbeddingError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }
}
