//! HTTP embedding client for OpenAI-compatible endpoints.

use super::EmbeddingClient;
use crate::error::EmbeddingError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Embedding client that talks to an OpenAI-compatible `/embeddings`
/// endpoint.
///
/// Transient failures (429, 5xx, connect/timeout errors) are retried with
/// exponential backoff up to `max_retries` attempts; anything else fails
/// the batch immediately.
#[derive(Clone)]
pub struct RemoteEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dim: usize,
    max_retries: usize,
}

impl RemoteEmbedder {
    /// Builds a new embedding client.
    ///
    /// # Arguments
    /// * `api_key` - Bearer token for the service
    /// * `base_url` - Service base URL; `/embeddings` is appended
    /// * `model` - Model identifier sent with every request
    /// * `dim` - Expected dimension of every returned vector
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: String,
        dim: usize,
        timeout: Duration,
        max_retries: usize,
    ) -> Result<Self, EmbeddingError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| EmbeddingError::RequestFailed("invalid API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|err| EmbeddingError::RequestFailed(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model,
            dim,
            max_retries: max_retries.max(1),
        })
    }

    fn should_retry(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    fn retry_backoff(attempt: usize) -> Duration {
        let capped = attempt.min(5) as u32;
        Duration::from_millis(500 * (1 << capped))
    }
}

#[async_trait]
impl EmbeddingClient for RemoteEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut attempt = 0usize;
        loop {
            let request = EmbeddingRequest {
                model: &self.model,
                input: texts,
            };
            let response = self.client.post(&self.endpoint).json(&request).send().await;
            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let parsed: EmbeddingResponse = resp
                            .json()
                            .await
                            .map_err(|err| EmbeddingError::MalformedResponse(err.to_string()))?;
                        return parsed.into_vectors(texts.len(), self.dim);
                    }

                    let body = resp
                        .text()
                        .await
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if Self::should_retry(status) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        warn!("Embedding request failed ({status}), retrying (attempt {attempt})");
                        tokio::time::sleep(Self::retry_backoff(attempt)).await;
                        continue;
                    }
                    return Err(EmbeddingError::RequestFailed(format!("{status}: {body}")));
                }
                Err(err) => {
                    if (err.is_timeout() || err.is_connect() || err.is_request())
                        && attempt + 1 < self.max_retries
                    {
                        attempt += 1;
                        debug!("Embedding request error, retrying: {err}");
                        tokio::time::sleep(Self::retry_backoff(attempt)).await;
                        continue;
                    }
                    return Err(EmbeddingError::RequestFailed(err.to_string()));
                }
            }
        }
    }

    fn embedding_dim(&self) -> usize {
        self.dim
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl EmbeddingResponse {
    /// Orders vectors by their declared index and validates count and
    /// dimensionality against the request.
    fn into_vectors(
        mut self,
        expected_count: usize,
        expected_dim: usize,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if self.data.len() != expected_count {
            return Err(EmbeddingError::CountMismatch {
                expected: expected_count,
                actual: self.data.len(),
            });
        }
        self.data.sort_by_key(|entry| entry.index);
        for entry in &self.data {
            if entry.embedding.len() != expected_dim {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: expected_dim,
                    actual: entry.embedding.len(),
                });
            }
        }
        Ok(self.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_orders_by_index() {
        let response = EmbeddingResponse {
            data: vec![
                EmbeddingData {
                    embedding: vec![2.0, 2.0],
                    index: 1,
                },
                EmbeddingData {
                    embedding: vec![1.0, 1.0],
                    index: 0,
                },
            ],
        };
        let vectors = response.into_vectors(2, 2).unwrap();
        assert_eq!(vectors[0], vec![1.0, 1.0]);
        assert_eq!(vectors[1], vec![2.0, 2.0]);
    }

    #[test]
    fn test_response_count_mismatch() {
        let response = EmbeddingResponse {
            data: vec![EmbeddingData {
                embedding: vec![1.0],
                index: 0,
            }],
        };
        let err = response.into_vectors(2, 1).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::CountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_response_dimension_mismatch() {
        let response = EmbeddingResponse {
            data: vec![EmbeddingData {
                embedding: vec![1.0, 2.0, 3.0],
                index: 0,
            }],
        };
        let err = response.into_vectors(1, 2).unwrap_err();
        assert!(matches!(err, EmbeddingError::DimensionMismatch { .. }));
    }
}
