//! Cross-encoder reranking client and score application.
//!
//! The reranker re-scores a short candidate list against the full query
//! text for higher precision than vector similarity alone. It is an
//! optional pipeline stage gated by a per-language-pair policy (see
//! [`search::pipeline`](crate::search::pipeline)).

use crate::error::RerankError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// One scored context from a rerank response.
///
/// `id` is the 0-based position of the context in the request; the service
/// associates scores with inputs by position, not by content.
#[derive(Debug, Clone, Deserialize)]
pub struct RerankScore {
    /// Position of the scored context in the request
    pub id: usize,
    /// Relevance score (calibration differs from vector similarity)
    pub score: f32,
}

/// Client for an external cross-encoder reranking service.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Scores each context against the query. The result may be shorter
    /// than the input; callers treat missing positions as score 0.
    async fn rerank(&self, query: &str, contexts: &[String])
        -> Result<Vec<RerankScore>, RerankError>;
}

/// Maps rerank scores back onto candidates by position.
///
/// A count mismatch between scores and candidates is logged but not an
/// error: positions without a score default to 0.0 and sink to the bottom
/// after sorting.
pub fn scores_by_position(scores: &[RerankScore], candidate_count: usize) -> Vec<f32> {
    let mut by_position = vec![0.0f32; candidate_count];
    let mut applied = 0usize;
    for entry in scores {
        if let Some(slot) = by_position.get_mut(entry.id) {
            *slot = entry.score;
            applied += 1;
        } else {
            warn!(
                "Rerank score for out-of-range position {} ignored (candidates: {})",
                entry.id, candidate_count
            );
        }
    }
    if applied != candidate_count {
        warn!(
            "Reranker returned {} scores for {} candidates; missing scores default to 0",
            applied, candidate_count
        );
    }
    by_position
}

/// Reranker client for an HTTP service taking `{query, contexts}` and
/// returning `{response: [{id, score}, ...]}`.
#[derive(Clone)]
pub struct RemoteReranker {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl RemoteReranker {
    /// Builds a new rerank client.
    pub fn new(
        api_key: &str,
        endpoint: &str,
        model: String,
        timeout: Duration,
    ) -> Result<Self, RerankError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| RerankError::RequestFailed("invalid API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|err| RerankError::RequestFailed(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[async_trait]
impl Reranker for RemoteReranker {
    async fn rerank(
        &self,
        query: &str,
        contexts: &[String],
    ) -> Result<Vec<RerankScore>, RerankError> {
        if contexts.is_empty() {
            return Ok(Vec::new());
        }

        let request = RerankRequest {
            model: &self.model,
            query,
            contexts: contexts.iter().map(|text| ContextEntry { text }).collect(),
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|err| RerankError::RequestFailed(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(RerankError::RequestFailed(format!("{status}: {body}")));
        }

        let parsed: RerankResponse = resp
            .json()
            .await
            .map_err(|err| RerankError::MalformedResponse(err.to_string()))?;
        Ok(parsed.response)
    }
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    contexts: Vec<ContextEntry<'a>>,
}

#[derive(Serialize)]
struct ContextEntry<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct RerankResponse {
    response: Vec<RerankScore>,
}
