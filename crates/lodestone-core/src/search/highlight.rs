//! Match highlighting and excerpt generation.
//!
//! Shared by title and content rendering in the keyword matcher. Given the
//! match spans for a text, produces HTML-safe output with matches wrapped
//! in `<mark>` tags. In ellipsis mode (content previews), long gaps between
//! matches collapse to small context windows around a literal `[...]`
//! marker, and emission stops once a character budget is exhausted; titles
//! render without ellipsis so the full text survives.
//!
//! All literal text is HTML-escaped before markup is inserted, so document
//! content can never smuggle its own markup into the output.

use crate::config::{PREVIEW_CHAR_LIMIT, PREVIEW_CONTEXT_OFFSET};

/// Opening highlight marker inserted around matches.
pub const HIGHLIGHT_OPEN: &str = "<mark>";
/// Closing highlight marker.
pub const HIGHLIGHT_CLOSE: &str = "</mark>";
/// Marker emitted where a gap was elided.
pub const ELLIPSIS_MARKER: &str = "[...]";

/// A half-open byte range of a match within the source text.
///
/// Byte offsets, always on character boundaries (they come from regex
/// matches).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

/// Rendering options for [`render_highlights`].
#[derive(Debug, Clone)]
pub struct HighlightOptions {
    /// Elide long gaps and enforce the character budget
    pub ellipsis: bool,
    /// Budget of emitted source characters before rendering stops
    pub char_limit: usize,
    /// Context window emitted on each side of an elided gap
    pub offset: usize,
}

impl HighlightOptions {
    /// Options for content previews: elision on, default budget.
    pub fn preview() -> Self {
        Self {
            ellipsis: true,
            char_limit: PREVIEW_CHAR_LIMIT,
            offset: PREVIEW_CONTEXT_OFFSET,
        }
    }

    /// Options for titles: full text, no elision or budget.
    pub fn title() -> Self {
        Self {
            ellipsis: false,
            char_limit: PREVIEW_CHAR_LIMIT,
            offset: PREVIEW_CONTEXT_OFFSET,
        }
    }
}

/// Escapes HTML-significant characters in literal text.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Renders `text` with the given match spans highlighted.
///
/// Overlapping or touching spans are merged into one highlighted range, so
/// the output never contains nested or adjacent markers for what reads as
/// a single match. In ellipsis mode, a gap longer than `options.offset`
/// emits an `offset`-sized window on each side of a `[...]` marker instead
/// of the whole gap, and rendering stops (possibly mid-span-list) once the
/// emitted-character budget is exceeded.
pub fn render_highlights(text: &str, spans: &[MatchSpan], options: &HighlightOptions) -> String {
    if spans.is_empty() {
        return if options.ellipsis {
            let leading: String = text.chars().take(options.char_limit).collect();
            escape_html(&leading)
        } else {
            escape_html(text)
        };
    }

    let mut spans = spans.to_vec();
    spans.sort_by_key(|span| span.start);

    let mut out = String::new();
    let mut last_index = 0usize;
    let mut emitted = 0usize;
    let mut i = 0usize;

    while i < spans.len() {
        let item = spans[i];

        if options.ellipsis && item.start > last_index + options.offset {
            let lead_end = ceil_char_boundary(text, last_index + options.offset);
            out.push_str(&escape_html(&text[last_index..lead_end]));
            out.push(' ');
            out.push_str(ELLIPSIS_MARKER);
            out.push(' ');
            let window_start = floor_char_boundary(text, item.start - options.offset);
            out.push_str(&escape_html(&text[window_start..item.start]));
            emitted += options.offset * 2;
        } else {
            out.push_str(&escape_html(&text[last_index..item.start]));
            emitted += text[last_index..item.start].chars().count();
        }

        // Fold any spans that overlap or touch this one into a single range.
        let mut end = item.end;
        let mut j = i + 1;
        while j < spans.len() && spans[j].start <= end {
            end = end.max(spans[j].end);
            j += 1;
        }

        out.push_str(HIGHLIGHT_OPEN);
        out.push_str(&escape_html(&text[item.start..end]));
        out.push_str(HIGHLIGHT_CLOSE);
        emitted += text[item.start..end].chars().count();

        i = j;
        last_index = end;

        if options.ellipsis && emitted > options.char_limit {
            break;
        }
    }

    if last_index < text.len() {
        let tail_end = if options.ellipsis {
            ceil_char_boundary(text, (last_index + options.offset).min(text.len()))
        } else {
            text.len()
        };
        out.push_str(&escape_html(&text[last_index..tail_end]));
        if options.ellipsis && tail_end != text.len() {
            out.push(' ');
            out.push_str(ELLIPSIS_MARKER);
        }
    }

    out
}

/// Largest char boundary `<= index`.
fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Smallest char boundary `>= index`.
fn ceil_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize) -> MatchSpan {
        MatchSpan { start, end }
    }

    #[test]
    fn test_single_match_is_wrapped() {
        let out = render_highlights(
            "A Random Walk",
            &[span(2, 8)],
            &HighlightOptions::title(),
        );
        assert_eq!(out, "A <mark>Random</mark> Walk");
    }

    #[test]
    fn test_overlapping_spans_merge_into_one_marker() {
        let out = render_highlights(
            "abcdefgh",
            &[span(0, 5), span(3, 8)],
            &HighlightOptions::title(),
        );
        assert_eq!(out, "<mark>abcdefgh</mark>");
    }

    #[test]
    fn test_touching_spans_merge() {
        let out = render_highlights(
            "abcdef",
            &[span(0, 3), span(3, 6)],
            &HighlightOptions::title(),
        );
        assert_eq!(out, "<mark>abcdef</mark>");
    }

    #[test]
    fn test_unsorted_spans_are_sorted_before_rendering() {
        let out = render_highlights(
            "one two three",
            &[span(8, 13), span(0, 3)],
            &HighlightOptions::title(),
        );
        assert_eq!(out, "<mark>one</mark> two <mark>three</mark>");
    }

    #[test]
    fn test_literal_text_is_escaped_before_markup() {
        let out = render_highlights(
            "<b>bold</b> term here",
            &[span(12, 16)],
            &HighlightOptions::title(),
        );
        assert_eq!(out, "&lt;b&gt;bold&lt;/b&gt; <mark>term</mark> here");
    }

    #[test]
    fn test_ellipsis_elides_long_gap() {
        let text = format!("{}match{}", "a".repeat(400), "b".repeat(80));
        let out = render_highlights(&text, &[span(400, 405)], &HighlightOptions::preview());

        assert!(out.contains(ELLIPSIS_MARKER));
        assert!(out.contains("<mark>match</mark>"));

        // Visible characters (markup stripped) stay near the budget.
        let visible = out
            .replace(HIGHLIGHT_OPEN, "")
            .replace(HIGHLIGHT_CLOSE, "");
        assert!(
            visible.chars().count() <= PREVIEW_CHAR_LIMIT,
            "preview too long: {} chars",
            visible.chars().count()
        );
    }

    #[test]
    fn test_char_budget_stops_emission_mid_list() {
        // Matches spread far apart: each elided gap costs 2 * offset
        // characters, so the budget runs out before the last match.
        let text = "term ".repeat(200);
        let spans: Vec<MatchSpan> = (0..200).map(|i| span(i * 5, i * 5 + 4)).collect();
        let out = render_highlights(&text, &spans, &HighlightOptions::preview());

        let marks = out.matches(HIGHLIGHT_OPEN).count();
        assert!(marks < 200, "budget should stop before all spans render");
        assert!(marks >= 1);
    }

    #[test]
    fn test_no_ellipsis_renders_full_text() {
        let text = format!("start {} end", "x".repeat(300));
        let out = render_highlights(&text, &[span(0, 5)], &HighlightOptions::title());
        assert!(out.ends_with(" end"));
        assert!(!out.contains(ELLIPSIS_MARKER));
    }

    #[test]
    fn test_no_spans_preview_truncates_to_budget() {
        let text = "y".repeat(500);
        let out = render_highlights(&text, &[], &HighlightOptions::preview());
        assert_eq!(out.chars().count(), PREVIEW_CHAR_LIMIT);
    }

    #[test]
    fn test_multibyte_window_boundaries_do_not_panic() {
        // Window edges land mid-character unless clamped.
        let text = "日本語のテキストが続きます。".repeat(10);
        let needle_start = text.char_indices().nth(50).map(|(i, _)| i).unwrap();
        let needle_end = text.char_indices().nth(53).map(|(i, _)| i).unwrap();
        let out = render_highlights(
            &text,
            &[span(needle_start, needle_end)],
            &HighlightOptions {
                ellipsis: true,
                char_limit: 60,
                offset: 7,
            },
        );
        assert!(out.contains(HIGHLIGHT_OPEN));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }
}
