use serde::{Deserialize, Serialize};

/// A document from the locally fetched keyword index.
///
/// Entries missing a string title or content are dropped at parse time;
/// see [`parse_keyword_documents`](super::keyword_index::parse_keyword_documents).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordDocument {
    /// Document title (plain text)
    pub title: String,
    /// Document body (plain text)
    pub content: String,
    /// Canonical link to the document
    pub permalink: String,
}

/// A keyword match against one document.
///
/// Title and preview may contain `<mark>` highlight markup and `[...]`
/// elision markers; all literal text inside them is HTML-escaped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordResult {
    /// Title with matched terms highlighted
    pub title: String,
    /// Content excerpt around the matches
    pub preview: String,
    /// Canonical link to the document
    pub permalink: String,
    /// Total matches across title and content
    pub match_count: usize,
}

/// A transient candidate inside the semantic retrieval pipeline.
///
/// Built from a vector index match; discarded once the response is
/// formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalCandidate {
    /// Similarity score (raw vector score, later replaced by the rerank
    /// score on the rerank path)
    pub score: f32,
    /// Vector record id
    pub id: String,
    /// Language of the underlying article
    pub lang: String,
    /// Content store slug, when indexed at article level
    pub slug: Option<String>,
    /// Anchor id, when indexed at chunk level
    pub anchor: Option<String>,
    /// Article title
    pub title: String,
    /// Article URL
    pub url: String,
    /// Short text preview from vector metadata
    pub preview: Option<String>,
}

impl RetrievalCandidate {
    /// The deep link for this candidate: the article URL plus the chunk
    /// anchor when one exists.
    pub fn anchor_link(&self) -> String {
        match &self.anchor {
            Some(anchor) => format!("{}#{}", self.url, anchor),
            None => self.url.clone(),
        }
    }
}

/// A formatted semantic search hit, the server's public result schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Article title
    pub title: String,
    /// Article URL
    pub url: String,
    /// Deep link including the chunk anchor
    pub anchor_link: String,
    /// Language of the article
    pub lang: String,
    /// Relevance score (vector similarity or rerank score, path-dependent)
    pub score: f32,
    /// Short excerpt of the matched text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

/// Which source(s) a merged result came from.
///
/// Carried explicitly on every merged entry rather than inferred from
/// content inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultOrigin {
    /// Keyword matcher only
    Keyword,
    /// Semantic retrieval only
    Semantic,
    /// Both sources matched the same document
    Both,
}

/// One entry in the merged, de-duplicated result list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedResult {
    /// Title, preferring the keyword-highlighted version on overlap
    pub title: String,
    /// Summary/preview, preferring highlighted keyword excerpts
    pub summary: String,
    /// Link to the document (semantic anchor link or keyword permalink)
    pub link: String,
    /// Source provenance
    pub origin: ResultOrigin,
    /// Semantic relevance score, when the semantic source contributed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}
