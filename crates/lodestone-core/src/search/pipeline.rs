//! Semantic retrieval pipeline: embed, retrieve, route, score, format.
//!
//! One query flows through: query embedding, language-routed vector index
//! lookup, optional per-article de-duplication, then either the reranking
//! path (fetch candidate text, cross-encoder re-score, rerank threshold)
//! or the plain threshold path (raw similarity cutoff), and finally
//! truncation and projection to the public [`SearchHit`] schema.
//!
//! Whether a query reranks is a configured per-language-pair policy, not a
//! hardcoded branch, so both paths are exercised in tests and an operator
//! can turn the reranker off without touching code.

use super::types::{RetrievalCandidate, SearchHit};
use crate::config::{
    CHUNK_SCORE_THRESHOLD, CONTENT_FETCH_CONCURRENCY, FINAL_RESULT_COUNT,
    MAX_RERANK_CONTEXT_CHARS, RERANK_SCORE_THRESHOLD, VECTOR_TOP_K,
};
use crate::content::{fetch_all, ContentStore};
use crate::embedding::{embed_query, EmbeddingClient};
use crate::error::SearchError;
use crate::rerank::{scores_by_position, Reranker};
use crate::vector::{IndexRegistry, VectorIndex, VectorMatch};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, instrument, warn};

/// When the reranking path applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RerankPolicy {
    /// Never rerank; always use the raw similarity threshold
    Disabled,
    /// Rerank only when the detected query language and the target
    /// language both equal the default language
    DefaultLanguageOnly,
    /// Rerank every query (useful in tests and evaluation)
    Always,
}

impl RerankPolicy {
    /// Whether this policy selects the reranking path for a query.
    pub fn applies(&self, query_lang: &str, target_lang: &str, default_lang: &str) -> bool {
        match self {
            RerankPolicy::Disabled => false,
            RerankPolicy::Always => true,
            RerankPolicy::DefaultLanguageOnly => {
                query_lang == default_lang && target_lang == default_lang
            }
        }
    }
}

/// Pipeline tuning knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Base name of the vector indices (`<base>-<lang>`)
    pub index_base: String,
    /// Supported language codes
    pub languages: Vec<String>,
    /// Default language, used for routing and the rerank policy
    pub default_language: String,
    /// Nearest-neighbor candidates fetched per query
    pub top_k: usize,
    /// Maximum results returned after filtering
    pub final_count: usize,
    /// Raw similarity cutoff on the non-reranked path
    pub score_threshold: f32,
    /// Score cutoff on the reranked path
    pub rerank_threshold: f32,
    /// Characters of candidate text sent to the reranker
    pub max_context_chars: usize,
    /// Concurrent content store fetches
    pub content_concurrency: usize,
    /// Keep only the best-scoring vector per article before scoring
    pub dedupe_by_article: bool,
    /// When the reranking path applies
    pub rerank_policy: RerankPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            index_base: "article-search".to_string(),
            languages: vec!["en".to_string(), "zh".to_string()],
            default_language: "en".to_string(),
            top_k: VECTOR_TOP_K,
            final_count: FINAL_RESULT_COUNT,
            score_threshold: CHUNK_SCORE_THRESHOLD,
            rerank_threshold: RERANK_SCORE_THRESHOLD,
            max_context_chars: MAX_RERANK_CONTEXT_CHARS,
            content_concurrency: CONTENT_FETCH_CONCURRENCY,
            dedupe_by_article: true,
            rerank_policy: RerankPolicy::DefaultLanguageOnly,
        }
    }
}

/// The server-side semantic search pipeline.
///
/// Stateless per request; all state is configuration plus the injected
/// service clients, so one instance is shared across requests.
pub struct SearchPipeline {
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    reranker: Option<Arc<dyn Reranker>>,
    content: Option<Arc<dyn ContentStore>>,
    registry: IndexRegistry,
    config: PipelineConfig,
}

impl SearchPipeline {
    /// Creates a pipeline from service clients and configuration.
    ///
    /// `reranker` and `content` may be omitted; the policy then falls back
    /// to the threshold path even when it would otherwise rerank.
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        reranker: Option<Arc<dyn Reranker>>,
        content: Option<Arc<dyn ContentStore>>,
        config: PipelineConfig,
    ) -> Self {
        let registry = IndexRegistry::new(config.index_base.clone(), config.languages.clone());
        Self {
            embedder,
            index,
            reranker,
            content,
            registry,
            config,
        }
    }

    /// Runs one query against the language-appropriate index.
    ///
    /// An empty `target_lang` falls back to the default language. A
    /// language with no configured index is a configuration error
    /// ([`SearchError::UnsupportedLanguage`]), surfaced distinctly from
    /// query validation errors.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        target_lang: &str,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let lang = {
            let lang = target_lang.trim().to_ascii_lowercase();
            if lang.is_empty() {
                self.config.default_language.clone()
            } else {
                lang
            }
        };
        let index_name = self
            .registry
            .index_for(&lang)
            .ok_or_else(|| SearchError::UnsupportedLanguage(lang.clone()))?;

        let query_vector = embed_query(self.embedder.as_ref(), query).await?;
        let matches = self
            .index
            .query(&index_name, &query_vector, self.config.top_k)
            .await?;
        debug!("Vector index {} returned {} matches", index_name, matches.len());

        let mut candidates = candidates_from_matches(matches);

        // The backend claims descending similarity; re-sort anyway.
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        if self.config.dedupe_by_article {
            candidates = best_per_article(candidates);
        }

        let query_lang = detect_query_language(query);
        let wants_rerank =
            self.config
                .rerank_policy
                .applies(query_lang, &lang, &self.config.default_language);

        let mut hits = if wants_rerank {
            match (&self.reranker, &self.content) {
                (Some(reranker), Some(content)) => {
                    self.rerank_path(query, candidates, reranker.clone(), content.clone())
                        .await?
                }
                _ => {
                    warn!("Rerank policy selected but reranker/content store not configured; using threshold path");
                    self.threshold_path(candidates)
                }
            }
        } else {
            self.threshold_path(candidates)
        };

        hits.truncate(self.config.final_count);
        info!("Returning {} results for lang {}", hits.len(), lang);
        Ok(hits)
    }

    /// Raw-similarity path: cutoff at the configured score threshold.
    fn threshold_path(&self, candidates: Vec<RetrievalCandidate>) -> Vec<SearchHit> {
        candidates
            .into_iter()
            .filter(|candidate| candidate.score >= self.config.score_threshold)
            .map(format_hit)
            .collect()
    }

    /// Reranking path: fetch candidate text, re-score with the
    /// cross-encoder, sort by rerank score, cut at the rerank threshold.
    ///
    /// Candidates whose content cannot be fetched are skipped; a score
    /// count mismatch from the reranker is tolerated (missing scores
    /// default to 0 and fall below the threshold).
    async fn rerank_path(
        &self,
        query: &str,
        candidates: Vec<RetrievalCandidate>,
        reranker: Arc<dyn Reranker>,
        content: Arc<dyn ContentStore>,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let keys: Vec<(String, String)> = candidates
            .iter()
            .map(|candidate| {
                (
                    candidate.lang.clone(),
                    candidate.slug.clone().unwrap_or_default(),
                )
            })
            .collect();
        let contents = fetch_all(content, &keys, self.config.content_concurrency).await;

        let mut rerankable: Vec<RetrievalCandidate> = Vec::new();
        let mut contexts: Vec<String> = Vec::new();
        for (candidate, text) in candidates.into_iter().zip(contents) {
            match text {
                Some(text) if !text.trim().is_empty() => {
                    contexts.push(text.chars().take(self.config.max_context_chars).collect());
                    rerankable.push(candidate);
                }
                _ => {
                    warn!(
                        "Skipping candidate '{}' with no fetchable content",
                        candidate.title
                    );
                }
            }
        }

        if rerankable.is_empty() {
            debug!("No candidates remaining after content fetch; returning empty results");
            return Ok(Vec::new());
        }

        let scores = reranker.rerank(query, &contexts).await?;
        let by_position = scores_by_position(&scores, rerankable.len());
        for (candidate, score) in rerankable.iter_mut().zip(by_position) {
            candidate.score = score;
        }

        rerankable
            .sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        Ok(rerankable
            .into_iter()
            .filter(|candidate| candidate.score >= self.config.rerank_threshold)
            .map(format_hit)
            .collect())
    }
}

/// Converts raw index matches to candidates, dropping matches whose
/// metadata cannot reconstruct a link (missing url, language, or both
/// anchor and slug).
fn candidates_from_matches(matches: Vec<VectorMatch>) -> Vec<RetrievalCandidate> {
    let total = matches.len();
    let candidates: Vec<RetrievalCandidate> = matches
        .into_iter()
        .filter_map(|entry| {
            let metadata = entry.metadata?;
            if metadata.article_url.is_empty() || metadata.lang.is_empty() {
                return None;
            }
            if metadata.chunk_html_id.is_none() && metadata.slug.is_none() {
                return None;
            }
            Some(RetrievalCandidate {
                score: entry.score,
                id: entry.id,
                lang: metadata.lang,
                slug: metadata.slug,
                anchor: metadata.chunk_html_id,
                title: if metadata.article_title.is_empty() {
                    "Unknown Title".to_string()
                } else {
                    metadata.article_title
                },
                url: metadata.article_url,
                preview: metadata.chunk_text_preview,
            })
        })
        .collect();

    if candidates.len() < total {
        debug!(
            "Filtered {} matches with incomplete metadata",
            total - candidates.len()
        );
    }
    candidates
}

/// Keeps only the highest-scoring candidate per article URL, preserving
/// the incoming (descending score) order, so one article's chunks cannot
/// monopolize the result list.
fn best_per_article(candidates: Vec<RetrievalCandidate>) -> Vec<RetrievalCandidate> {
    let mut seen = std::collections::HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.url.clone()))
        .collect()
}

/// Projects a candidate onto the public result schema.
fn format_hit(candidate: RetrievalCandidate) -> SearchHit {
    SearchHit {
        anchor_link: candidate.anchor_link(),
        title: candidate.title,
        url: candidate.url,
        lang: candidate.lang,
        score: candidate.score,
        preview: candidate.preview,
    }
}

/// Heuristic query language detection: any Han-script character marks the
/// query as Chinese, everything else as English.
pub fn detect_query_language(query: &str) -> &'static str {
    static HAN: OnceLock<Regex> = OnceLock::new();
    let han = HAN.get_or_init(|| Regex::new(r"\p{Han}").expect("Han pattern must compile"));
    if han.is_match(query) {
        "zh"
    } else {
        "en"
    }
}
