//! Keyword document index loading with a single-flight cache.
//!
//! The keyword matcher runs against a document collection fetched once per
//! process. The fetch is memoized behind [`KeywordIndexCache`]: concurrent
//! callers issued before the first load completes share one underlying
//! request, a successful load is cached for the lifetime of the process,
//! and a failed load resets the cache so a later call can retry.

use super::types::KeywordDocument;
use crate::error::KeywordIndexError;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// Source of the keyword document collection.
#[async_trait]
pub trait KeywordIndexLoader: Send + Sync {
    /// Loads and parses the full document collection.
    async fn load(&self) -> Result<Vec<KeywordDocument>, KeywordIndexError>;
}

type SharedLoad = Shared<BoxFuture<'static, Result<Arc<Vec<KeywordDocument>>, KeywordIndexError>>>;

enum CacheState {
    /// Nothing loaded, nothing in flight
    Empty,
    /// A load is in flight; new callers await the same future
    Loading(SharedLoad),
    /// Load succeeded; served from memory from now on
    Ready(Arc<Vec<KeywordDocument>>),
}

/// Process-wide single-flight cache for the keyword document index.
///
/// State machine: `Empty -> Loading -> Ready` on success, back to `Empty`
/// on failure. The mutex is only held to inspect or swap the state, never
/// across an await.
pub struct KeywordIndexCache {
    loader: Arc<dyn KeywordIndexLoader>,
    state: Mutex<CacheState>,
}

impl KeywordIndexCache {
    /// Creates a cache around the given loader.
    pub fn new(loader: Arc<dyn KeywordIndexLoader>) -> Self {
        Self {
            loader,
            state: Mutex::new(CacheState::Empty),
        }
    }

    /// Returns the document collection, loading it on first use.
    ///
    /// All concurrent callers during the initial load share one request
    /// and observe the same outcome.
    pub async fn get(&self) -> Result<Arc<Vec<KeywordDocument>>, KeywordIndexError> {
        let inflight = {
            let mut state = self.state.lock().expect("keyword cache lock poisoned");
            match &*state {
                CacheState::Ready(documents) => return Ok(documents.clone()),
                CacheState::Loading(inflight) => inflight.clone(),
                CacheState::Empty => {
                    let loader = self.loader.clone();
                    let inflight: SharedLoad = async move {
                        loader.load().await.map(Arc::new)
                    }
                    .boxed()
                    .shared();
                    *state = CacheState::Loading(inflight.clone());
                    inflight
                }
            }
        };

        let result = inflight.await;

        let mut state = self.state.lock().expect("keyword cache lock poisoned");
        if matches!(&*state, CacheState::Loading(_)) {
            *state = match &result {
                Ok(documents) => {
                    info!("Keyword index loaded ({} documents)", documents.len());
                    CacheState::Ready(documents.clone())
                }
                // Reset so a later search can retry the fetch.
                Err(_) => CacheState::Empty,
            };
        }
        result
    }
}

/// Parses the fetched payload into documents.
///
/// The payload is either a JSON array or newline-delimited JSON of the
/// same entry shape, detected by whether the trimmed text starts with
/// `[`. Entries missing a string `title` or `content` are silently
/// dropped; `permalink` falls back to `url`, then to empty.
pub fn parse_keyword_documents(payload: &str) -> Result<Vec<KeywordDocument>, KeywordIndexError> {
    let trimmed = payload.trim_start();
    let entries: Vec<serde_json::Value> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)
            .map_err(|err| KeywordIndexError::ParseFailed(err.to_string()))?
    } else {
        trimmed
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    };

    let total = entries.len();
    let documents: Vec<KeywordDocument> = entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry.get("title")?.as_str()?.to_string();
            let content = entry.get("content")?.as_str()?.to_string();
            let permalink = entry
                .get("permalink")
                .and_then(|value| value.as_str())
                .or_else(|| entry.get("url").and_then(|value| value.as_str()))
                .unwrap_or_default()
                .to_string();
            Some(KeywordDocument {
                title,
                content,
                permalink,
            })
        })
        .collect();

    if documents.len() < total {
        debug!(
            "Dropped {} keyword index entries without string title/content",
            total - documents.len()
        );
    }
    Ok(documents)
}

/// Loader that fetches the document index over HTTP.
#[derive(Clone)]
pub struct HttpKeywordIndexLoader {
    client: reqwest::Client,
    url: String,
}

impl HttpKeywordIndexLoader {
    /// Builds a loader for the configured index URL.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, KeywordIndexError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| KeywordIndexError::FetchFailed(err.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl KeywordIndexLoader for HttpKeywordIndexLoader {
    async fn load(&self) -> Result<Vec<KeywordDocument>, KeywordIndexError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| KeywordIndexError::FetchFailed(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(KeywordIndexError::FetchFailed(format!(
                "{} returned {status}",
                self.url
            )));
        }

        let payload = resp
            .text()
            .await
            .map_err(|err| KeywordIndexError::FetchFailed(err.to_string()))?;
        parse_keyword_documents(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        calls: AtomicUsize,
        fail_first: bool,
    }

    #[async_trait]
    impl KeywordIndexLoader for CountingLoader {
        async fn load(&self) -> Result<Vec<KeywordDocument>, KeywordIndexError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            if self.fail_first && call == 0 {
                return Err(KeywordIndexError::FetchFailed("boom".to_string()));
            }
            Ok(vec![KeywordDocument {
                title: "Doc".to_string(),
                content: "Body".to_string(),
                permalink: "/doc/".to_string(),
            }])
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_load() {
        let loader = Arc::new(CountingLoader {
            calls: AtomicUsize::new(0),
            fail_first: false,
        });
        let cache = KeywordIndexCache::new(loader.clone());

        let (a, b) = tokio::join!(cache.get(), cache.get());
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);

        // Subsequent call is served from memory.
        cache.get().await.unwrap();
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_resets_for_retry() {
        let loader = Arc::new(CountingLoader {
            calls: AtomicUsize::new(0),
            fail_first: true,
        });
        let cache = KeywordIndexCache::new(loader.clone());

        assert!(cache.get().await.is_err());
        let documents = cache.get().await.unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_parse_json_array() {
        let payload = r#"[
            {"title": "A", "content": "alpha", "permalink": "/a/"},
            {"title": "B", "content": "beta", "url": "/b/"}
        ]"#;
        let documents = parse_keyword_documents(payload).unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[1].permalink, "/b/");
    }

    #[test]
    fn test_parse_ndjson() {
        let payload = "{\"title\": \"A\", \"content\": \"alpha\", \"permalink\": \"/a/\"}\n\
                       \n\
                       {\"title\": \"B\", \"content\": \"beta\", \"permalink\": \"/b/\"}\n";
        let documents = parse_keyword_documents(payload).unwrap();
        assert_eq!(documents.len(), 2);
    }

    #[test]
    fn test_entries_without_string_fields_are_dropped() {
        let payload = r#"[
            {"title": "Good", "content": "text", "permalink": "/g/"},
            {"title": 42, "content": "text"},
            {"content": "no title"},
            {"title": "No content"}
        ]"#;
        let documents = parse_keyword_documents(payload).unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].title, "Good");
    }

    #[test]
    fn test_malformed_array_is_an_error() {
        assert!(parse_keyword_documents("[{not json").is_err());
    }
}
