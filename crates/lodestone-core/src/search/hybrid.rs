//! Client-side hybrid search orchestration.
//!
//! Runs the keyword matcher and the semantic pipeline as two independent
//! concurrent tasks and merges their outputs once both have resolved.
//! Each source reports and swallows its own failure by resolving to an
//! empty result set with an error note; a failure in one source never
//! blocks the other's results.

use super::keyword::{search_keywords, split_query_terms};
use super::keyword_index::KeywordIndexCache;
use super::merge::merge_results;
use super::types::{KeywordResult, MergedResult, SearchHit};
use crate::error::SearchError;
use crate::search::pipeline::SearchPipeline;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Boxed error for the semantic search seam, so both the in-process
/// pipeline and an HTTP client to the search server can implement it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The semantic half of hybrid search.
///
/// Implemented by [`SearchPipeline`] for in-process search and by the
/// CLI's HTTP client for searching through the server.
#[async_trait]
pub trait SemanticSearch: Send + Sync {
    /// Runs a semantic query for the target language.
    async fn search(&self, query: &str, lang: &str) -> Result<Vec<SearchHit>, BoxError>;
}

#[async_trait]
impl SemanticSearch for SearchPipeline {
    async fn search(&self, query: &str, lang: &str) -> Result<Vec<SearchHit>, BoxError> {
        SearchPipeline::search(self, query, lang)
            .await
            .map_err(|err: SearchError| -> BoxError { Box::new(err) })
    }
}

/// One source's results plus its failure note, if any.
///
/// A failed source carries an empty result list and `error` describes
/// what went wrong, for display in a dedicated error area.
#[derive(Debug, Clone, Default)]
pub struct SourceOutcome<T> {
    /// Results from this source (empty on failure)
    pub results: Vec<T>,
    /// Failure description when the source errored
    pub error: Option<String>,
}

/// The full outcome of one hybrid query.
#[derive(Debug, Clone)]
pub struct HybridOutcome {
    /// Keyword matcher output
    pub keyword: SourceOutcome<KeywordResult>,
    /// Semantic pipeline output
    pub semantic: SourceOutcome<SearchHit>,
    /// Merged, de-duplicated list (semantic first, keyword-only appended)
    pub merged: Vec<MergedResult>,
}

/// Client-side hybrid searcher.
pub struct HybridSearcher {
    keyword_index: Arc<KeywordIndexCache>,
    semantic: Arc<dyn SemanticSearch>,
    base_path: String,
}

impl HybridSearcher {
    /// Creates a hybrid searcher.
    ///
    /// `base_path` is stripped from links during merge-key normalization
    /// (empty when the site is served from the domain root).
    pub fn new(
        keyword_index: Arc<KeywordIndexCache>,
        semantic: Arc<dyn SemanticSearch>,
        base_path: impl Into<String>,
    ) -> Self {
        Self {
            keyword_index,
            semantic,
            base_path: base_path.into(),
        }
    }

    /// Runs both sources concurrently and merges once both complete.
    pub async fn search(&self, query: &str, lang: &str) -> HybridOutcome {
        let keyword_task = async {
            let terms = split_query_terms(query);
            match self.keyword_index.get().await {
                Ok(documents) => {
                    let results = search_keywords(&terms, &documents);
                    info!("Keyword search finished with {} results", results.len());
                    SourceOutcome {
                        results,
                        error: None,
                    }
                }
                Err(err) => {
                    warn!("Keyword search failed: {err}");
                    SourceOutcome {
                        results: Vec::new(),
                        error: Some(err.to_string()),
                    }
                }
            }
        };

        let semantic_task = async {
            match self.semantic.search(query, lang).await {
                Ok(results) => {
                    info!("Semantic search finished with {} results", results.len());
                    SourceOutcome {
                        results,
                        error: None,
                    }
                }
                Err(err) => {
                    warn!("Semantic search failed: {err}");
                    SourceOutcome {
                        results: Vec::new(),
                        error: Some(err.to_string()),
                    }
                }
            }
        };

        let (keyword, semantic) = tokio::join!(keyword_task, semantic_task);
        let merged = merge_results(&semantic.results, &keyword.results, &self.base_path);

        HybridOutcome {
            keyword,
            semantic,
            merged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KeywordIndexError;
    use crate::search::keyword_index::KeywordIndexLoader;
    use crate::search::types::KeywordDocument;

    struct StaticLoader {
        documents: Vec<KeywordDocument>,
        fail: bool,
    }

    #[async_trait]
    impl KeywordIndexLoader for StaticLoader {
        async fn load(&self) -> Result<Vec<KeywordDocument>, KeywordIndexError> {
            if self.fail {
                return Err(KeywordIndexError::FetchFailed("offline".to_string()));
            }
            Ok(self.documents.clone())
        }
    }

    struct StaticSemantic {
        hits: Vec<SearchHit>,
        fail: bool,
    }

    #[async_trait]
    impl SemanticSearch for StaticSemantic {
        async fn search(&self, _query: &str, _lang: &str) -> Result<Vec<SearchHit>, BoxError> {
            if self.fail {
                return Err(Box::new(SearchError::UnsupportedLanguage("xx".into())));
            }
            Ok(self.hits.clone())
        }
    }

    fn make_searcher(
        documents: Vec<KeywordDocument>,
        keyword_fail: bool,
        hits: Vec<SearchHit>,
        semantic_fail: bool,
    ) -> HybridSearcher {
        let cache = Arc::new(KeywordIndexCache::new(Arc::new(StaticLoader {
            documents,
            fail: keyword_fail,
        })));
        HybridSearcher::new(
            cache,
            Arc::new(StaticSemantic {
                hits,
                fail: semantic_fail,
            }),
            "",
        )
    }

    fn doc(title: &str, content: &str, permalink: &str) -> KeywordDocument {
        KeywordDocument {
            title: title.to_string(),
            content: content.to_string(),
            permalink: permalink.to_string(),
        }
    }

    #[tokio::test]
    async fn test_semantic_failure_does_not_block_keyword_results() {
        let searcher = make_searcher(
            vec![doc("A Random Walk", "random text", "/a/")],
            false,
            vec![],
            true,
        );

        let outcome = searcher.search("random", "en").await;

        assert!(outcome.semantic.error.is_some());
        assert!(outcome.semantic.results.is_empty());
        assert_eq!(outcome.keyword.results.len(), 1);
        assert_eq!(outcome.merged.len(), 1);
    }

    #[tokio::test]
    async fn test_keyword_failure_does_not_block_semantic_results() {
        let hits = vec![SearchHit {
            title: "Doc".to_string(),
            url: "/doc/".to_string(),
            anchor_link: "/doc/#c0".to_string(),
            lang: "en".to_string(),
            score: 0.9,
            preview: None,
        }];
        let searcher = make_searcher(vec![], true, hits, false);

        let outcome = searcher.search("query", "en").await;

        assert!(outcome.keyword.error.is_some());
        assert_eq!(outcome.semantic.results.len(), 1);
        assert_eq!(outcome.merged.len(), 1);
    }

    #[tokio::test]
    async fn test_both_sources_merge() {
        let hits = vec![SearchHit {
            title: "A Random Walk".to_string(),
            url: "https://x/a/".to_string(),
            anchor_link: "https://x/a/".to_string(),
            lang: "en".to_string(),
            score: 0.8,
            preview: None,
        }];
        let searcher = make_searcher(
            vec![
                doc("A Random Walk", "some random content", "/a/"),
                doc("Keyword Only", "more random words", "/k/"),
            ],
            false,
            hits,
            false,
        );

        let outcome = searcher.search("random", "en").await;

        assert_eq!(outcome.merged.len(), 2);
        // Shared document upgraded in place, keyword-only appended.
        assert_eq!(
            outcome.merged[0].origin,
            crate::search::types::ResultOrigin::Both
        );
        assert_eq!(
            outcome.merged[1].origin,
            crate::search::types::ResultOrigin::Keyword
        );
    }
}
