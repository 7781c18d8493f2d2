//! Multi-term keyword matching over the local document index.
//!
//! Builds one case-insensitive alternation regex from the query terms and
//! scans every document's title and content independently. Documents are
//! scored by total match count and rendered with highlighted titles and
//! previews; a document with zero matches is excluded entirely.

use super::highlight::{render_highlights, HighlightOptions, MatchSpan};
use super::types::{KeywordDocument, KeywordResult};
use regex::{Regex, RegexBuilder};
use tracing::debug;

/// Runs the keyword matcher over the document collection.
///
/// `terms` are the whitespace-split query words; empty terms are ignored.
/// Results are sorted by match count descending; ties keep the documents'
/// encounter order (stable sort).
pub fn search_keywords(terms: &[String], documents: &[KeywordDocument]) -> Vec<KeywordResult> {
    let Some(matcher) = build_term_regex(terms) else {
        return Vec::new();
    };

    let mut results = Vec::new();
    for document in documents {
        let title_spans = find_match_spans(&matcher, &document.title);
        let content_spans = find_match_spans(&matcher, &document.content);

        let match_count = title_spans.len() + content_spans.len();
        if match_count == 0 {
            continue;
        }

        let title = render_highlights(&document.title, &title_spans, &HighlightOptions::title());
        let preview =
            render_highlights(&document.content, &content_spans, &HighlightOptions::preview());

        results.push(KeywordResult {
            title,
            preview,
            permalink: document.permalink.clone(),
            match_count,
        });
    }

    // Stable sort keeps encounter order for equal match counts.
    results.sort_by(|a, b| b.match_count.cmp(&a.match_count));
    debug!(
        "Keyword search matched {} of {} documents",
        results.len(),
        documents.len()
    );
    results
}

/// Builds a case-insensitive alternation regex from the non-empty terms,
/// with every term's special characters escaped.
///
/// Returns `None` when no usable terms remain, which callers treat as an
/// empty result set.
fn build_term_regex(terms: &[String]) -> Option<Regex> {
    let escaped: Vec<String> = terms
        .iter()
        .filter(|term| !term.trim().is_empty())
        .map(|term| regex::escape(term.trim()))
        .collect();
    if escaped.is_empty() {
        return None;
    }

    RegexBuilder::new(&escaped.join("|"))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Collects all non-overlapping match spans in `text`.
///
/// `find_iter` already advances past zero-width matches, so the scan
/// terminates even on degenerate patterns.
fn find_match_spans(matcher: &Regex, text: &str) -> Vec<MatchSpan> {
    matcher
        .find_iter(text)
        .map(|found| MatchSpan {
            start: found.start(),
            end: found.end(),
        })
        .collect()
}

/// Splits a raw query string into matcher terms.
pub fn split_query_terms(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_string).collect()
}
