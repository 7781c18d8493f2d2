//! HTTP vector index client.

use super::{VectorIndex, VectorMatch, VectorRecord};
use crate::error::VectorIndexError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Vector index client speaking a Pinecone-style JSON protocol.
///
/// Queries go to `POST <base>/indexes/<name>/query`, upserts to
/// `POST <base>/indexes/<name>/upsert`. Authentication is an `api-key`
/// header.
#[derive(Clone)]
pub struct RemoteVectorIndex {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteVectorIndex {
    /// Builds a new vector index client.
    pub fn new(
        api_key: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, VectorIndexError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "api-key",
            HeaderValue::from_str(api_key.trim())
                .map_err(|_| VectorIndexError::RequestFailed("invalid API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|err| VectorIndexError::RequestFailed(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, index: &str, operation: &str) -> String {
        format!("{}/indexes/{}/{}", self.base_url, index, operation)
    }
}

#[async_trait]
impl VectorIndex for RemoteVectorIndex {
    async fn query(
        &self,
        index: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorIndexError> {
        let request = QueryRequest {
            vector,
            top_k,
            return_metadata: true,
        };
        let resp = self
            .client
            .post(self.endpoint(index, "query"))
            .json(&request)
            .send()
            .await
            .map_err(|err| VectorIndexError::RequestFailed(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(VectorIndexError::RequestFailed(format!("{status}: {body}")));
        }

        let parsed: QueryResponse = resp
            .json()
            .await
            .map_err(|err| VectorIndexError::MalformedResponse(err.to_string()))?;
        Ok(parsed.matches)
    }

    async fn upsert(&self, index: &str, records: &[VectorRecord]) -> Result<(), VectorIndexError> {
        let request = UpsertRequest { vectors: records };
        let resp = self
            .client
            .post(self.endpoint(index, "upsert"))
            .json(&request)
            .send()
            .await
            .map_err(|err| VectorIndexError::RequestFailed(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(VectorIndexError::RequestFailed(format!("{status}: {body}")));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    #[serde(rename = "topK")]
    top_k: usize,
    #[serde(rename = "returnMetadata")]
    return_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<VectorMatch>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_layout() {
        let index =
            RemoteVectorIndex::new("key", "https://vectors.example.com/", Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            index.endpoint("article-search-en", "query"),
            "https://vectors.example.com/indexes/article-search-en/query"
        );
    }

    #[test]
    fn test_query_response_tolerates_missing_matches() {
        let parsed: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.matches.is_empty());
    }
}
