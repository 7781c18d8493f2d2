//! Content store client for fetching raw article text.
//!
//! The reranking path needs each candidate's full text, which lives in an
//! external blob store keyed `<lang>/<slug>`. Fetches fan out concurrently
//! with a fixed upper bound so one query cannot open an unbounded number
//! of connections.

use crate::error::ContentError;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Client for the article content store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetches the raw text stored under `<lang>/<slug>`.
    ///
    /// Returns `Ok(None)` when the key does not exist; that is an expected
    /// per-candidate condition, not an error.
    async fn fetch(&self, lang: &str, slug: &str) -> Result<Option<String>, ContentError>;
}

/// Fetches content for a list of `(lang, slug)` keys with bounded
/// concurrency, preserving input order.
///
/// Failed or missing fetches yield `None` for their slot after a warning;
/// a single unreachable blob must not fail the whole candidate list.
pub async fn fetch_all(
    store: Arc<dyn ContentStore>,
    keys: &[(String, String)],
    concurrency: usize,
) -> Vec<Option<String>> {
    stream::iter(keys.iter().cloned().enumerate())
        .map(|(position, (lang, slug))| {
            let store = store.clone();
            async move {
                let content = match store.fetch(&lang, &slug).await {
                    Ok(content) => content,
                    Err(err) => {
                        warn!("Content fetch failed, skipping candidate: {err}");
                        None
                    }
                };
                (position, content)
            }
        })
        .buffer_unordered(concurrency.max(1))
        .fold(
            vec![None; keys.len()],
            |mut slots, (position, content)| async move {
                slots[position] = content;
                slots
            },
        )
        .await
}

/// Content store client fetching `GET <base>/<lang>/<slug>`.
///
/// A 404 maps to `Ok(None)`; any other non-success status is an error.
#[derive(Clone)]
pub struct HttpContentStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpContentStore {
    /// Builds a new content store client.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ContentError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ContentError::FetchFailed {
                key: String::new(),
                reason: err.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn fetch(&self, lang: &str, slug: &str) -> Result<Option<String>, ContentError> {
        let key = format!("{lang}/{slug}");
        let url = format!("{}/{}", self.base_url, key);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| ContentError::FetchFailed {
                key: key.clone(),
                reason: err.to_string(),
            })?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(ContentError::FetchFailed {
                key,
                reason: format!("status {}", resp.status()),
            });
        }

        let text = resp.text().await.map_err(|err| ContentError::FetchFailed {
            key,
            reason: err.to_string(),
        })?;
        Ok(Some(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapStore {
        entries: HashMap<String, String>,
    }

    #[async_trait]
    impl ContentStore for MapStore {
        async fn fetch(&self, lang: &str, slug: &str) -> Result<Option<String>, ContentError> {
            let key = format!("{lang}/{slug}");
            if key == "en/broken" {
                return Err(ContentError::FetchFailed {
                    key,
                    reason: "connection reset".to_string(),
                });
            }
            Ok(self.entries.get(&key).cloned())
        }
    }

    fn make_store() -> Arc<dyn ContentStore> {
        let mut entries = HashMap::new();
        entries.insert("en/first".to_string(), "first body".to_string());
        entries.insert("en/second".to_string(), "second body".to_string());
        Arc::new(MapStore { entries })
    }

    #[tokio::test]
    async fn test_fetch_all_preserves_order() {
        let keys = vec![
            ("en".to_string(), "second".to_string()),
            ("en".to_string(), "first".to_string()),
        ];
        let contents = fetch_all(make_store(), &keys, 2).await;
        assert_eq!(contents[0].as_deref(), Some("second body"));
        assert_eq!(contents[1].as_deref(), Some("first body"));
    }

    #[tokio::test]
    async fn test_fetch_all_tolerates_missing_and_failed() {
        let keys = vec![
            ("en".to_string(), "first".to_string()),
            ("en".to_string(), "missing".to_string()),
            ("en".to_string(), "broken".to_string()),
        ];
        let contents = fetch_all(make_store(), &keys, 8).await;
        assert_eq!(contents[0].as_deref(), Some("first body"));
        assert_eq!(contents[1], None);
        assert_eq!(contents[2], None);
    }
}
