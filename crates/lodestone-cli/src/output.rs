//! Output formatting for hybrid search results.
//!
//! Supports both human-readable terminal output and JSON for scripting.
//! Highlight markup is part of the result contract and survives in JSON;
//! the human renderer strips it and unescapes entities for the terminal.

use lodestone_core::search::{HybridOutcome, MergedResult, ResultOrigin};
use serde::Serialize;

/// JSON output structure for hybrid search results.
#[derive(Serialize)]
pub struct JsonOutput<'a> {
    /// The query that was executed
    pub query: &'a str,
    /// Target language
    pub lang: &'a str,
    /// Keyword source failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_error: Option<&'a str>,
    /// Semantic source failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_error: Option<&'a str>,
    /// Merged, de-duplicated results
    pub results: &'a [MergedResult],
}

/// Formats the outcome as JSON.
pub fn format_json(query: &str, lang: &str, outcome: &HybridOutcome) -> String {
    let output = JsonOutput {
        query,
        lang,
        keyword_error: outcome.keyword.error.as_deref(),
        semantic_error: outcome.semantic.error.as_deref(),
        results: &outcome.merged,
    };
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

/// Formats the outcome for human-readable terminal output.
pub fn format_human(query: &str, outcome: &HybridOutcome) -> String {
    let mut rendered = String::new();

    if outcome.merged.is_empty() {
        rendered.push_str(&format!("No results found for \"{query}\"\n"));
    } else {
        rendered.push_str(&format!(
            "Found {} result{} for \"{}\" (keyword: {}, semantic: {}):\n\n",
            outcome.merged.len(),
            if outcome.merged.len() == 1 { "" } else { "s" },
            query,
            outcome.keyword.results.len(),
            outcome.semantic.results.len(),
        ));

        for (position, result) in outcome.merged.iter().enumerate() {
            rendered.push_str(&format!(
                "{}. {}{}\n",
                position + 1,
                plain_text(&result.title),
                match result.score {
                    Some(score) => format!(" (score: {score:.3})"),
                    None => String::new(),
                }
            ));
            rendered.push_str(&format!("   {} [{}]\n", result.link, origin_label(result)));
            let summary = plain_text(&result.summary);
            if !summary.is_empty() {
                rendered.push_str(&format!("   {summary}\n"));
            }
            rendered.push('\n');
        }
    }

    let errors: Vec<String> = [
        outcome.keyword.error.as_ref().map(|e| format!("keyword: {e}")),
        outcome.semantic.error.as_ref().map(|e| format!("semantic: {e}")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !errors.is_empty() {
        rendered.push_str("Errors:\n");
        for error in errors {
            rendered.push_str(&format!("  {error}\n"));
        }
    }

    rendered.trim_end().to_string()
}

fn origin_label(result: &MergedResult) -> &'static str {
    match result.origin {
        ResultOrigin::Keyword => "keyword",
        ResultOrigin::Semantic => "semantic",
        ResultOrigin::Both => "both",
    }
}

/// Strips highlight markup and unescapes HTML entities for terminal display.
fn plain_text(text: &str) -> String {
    text.replace("<mark>", "")
        .replace("</mark>", "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
