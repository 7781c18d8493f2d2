//! Hybrid search: semantic retrieval, keyword matching, and merging.
//!
//! # Architecture
//!
//! - `types`: result and candidate types shared across the stages
//! - `pipeline`: server-side semantic retrieval (embed, vector lookup,
//!   language routing, rerank-or-threshold, format)
//! - `keyword`: multi-term substring matcher over the local document index
//! - `keyword_index`: single-flight loading and caching of that index
//! - `highlight`: HTML-safe match highlighting and excerpt generation
//! - `merge`: key-normalized de-duplication of the two result streams
//! - `hybrid`: client-side orchestration running both sources concurrently
//!
//! The keyword and semantic halves are deliberately independent: the
//! server never falls back to keyword results (resilience comes from the
//! client running both and merging whatever arrives).

pub mod highlight;
pub mod hybrid;
pub mod keyword;
pub mod keyword_index;
pub mod merge;
pub mod pipeline;
pub mod types;

pub use highlight::{render_highlights, HighlightOptions, MatchSpan};
pub use hybrid::{BoxError, HybridOutcome, HybridSearcher, SemanticSearch, SourceOutcome};
pub use keyword::{search_keywords, split_query_terms};
pub use keyword_index::{
    parse_keyword_documents, HttpKeywordIndexLoader, KeywordIndexCache, KeywordIndexLoader,
};
pub use merge::{merge_results, normalize_link_key};
pub use pipeline::{detect_query_language, PipelineConfig, RerankPolicy, SearchPipeline};
pub use types::{
    KeywordDocument, KeywordResult, MergedResult, ResultOrigin, RetrievalCandidate, SearchHit,
};
