//! HTTP client for the search server's semantic endpoint.

use async_trait::async_trait;
use lodestone_core::search::{BoxError, SearchHit, SemanticSearch};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Semantic search backed by a running `lodestone-server`.
#[derive(Clone)]
pub struct RemoteSearchClient {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteSearchClient {
    /// Builds a client for the given server base URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BoxError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, lang: &str) -> String {
        format!("{}/api/ai-search?lang={}", self.base_url, lang)
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

#[async_trait]
impl SemanticSearch for RemoteSearchClient {
    async fn search(&self, query: &str, lang: &str) -> Result<Vec<SearchHit>, BoxError> {
        let resp = self
            .client
            .post(self.search_url(lang))
            .json(&SearchRequest { query })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = match resp.json::<ErrorBody>().await {
                Ok(body) => match body.details {
                    Some(details) => format!("{} ({}): {}", body.error, status, details),
                    None => format!("{} ({})", body.error, status),
                },
                Err(_) => format!("search server returned {status}"),
            };
            return Err(message.into());
        }

        Ok(resp.json::<Vec<SearchHit>>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_includes_lang() {
        let client =
            RemoteSearchClient::new("http://localhost:8787/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.search_url("zh"),
            "http://localhost:8787/api/ai-search?lang=zh"
        );
    }

    #[test]
    fn test_error_body_parsing() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error": "Search failed", "details": "index down"}"#).unwrap();
        assert_eq!(body.error, "Search failed");
        assert_eq!(body.details.as_deref(), Some("index down"));
    }
}
