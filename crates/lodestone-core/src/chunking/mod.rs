//! Heading-based article chunking with greedy merging.
//!
//! Splits an article's raw content at markdown heading boundaries, then
//! greedily merges adjacent segments so that no chunk falls below a
//! configured minimum length. Heading-based splitting preserves semantic
//! unit boundaries; the merge step keeps tiny sections from diluting
//! retrieval precision with low-information vectors.
//!
//! Chunk ids are derived from the article id and the chunk's position in
//! the merged sequence, so chunking the same content twice produces the
//! same ids and re-indexing overwrites rather than duplicates.

mod types;

use crate::config::{DEFAULT_MIN_CHUNK_LENGTH, DEFAULT_SPLIT_LEVEL};
use regex::Regex;
use tracing::warn;

pub use types::{Article, Chunk};

/// Chunker tuning knobs.
///
/// Loadable from a JSON config file via [`ChunkerConfig::from_json_str`];
/// invalid fields fall back to defaults with a warning rather than failing
/// the build.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkerConfig {
    /// Headings at levels `1..=split_level` start a new segment
    pub split_level: usize,
    /// Minimum chunk length (in characters) before the merger flushes
    pub min_chunk_length: usize,
    /// Whether to emit a synthetic title+description header chunk
    pub include_header_chunk: bool,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            split_level: DEFAULT_SPLIT_LEVEL,
            min_chunk_length: DEFAULT_MIN_CHUNK_LENGTH,
            include_header_chunk: true,
        }
    }
}

impl ChunkerConfig {
    /// Parses a config from JSON, keeping defaults for missing or invalid
    /// fields.
    ///
    /// A field of the wrong type logs a warning and keeps the default; the
    /// chunking stage should never abort a site build over a config typo.
    pub fn from_json_str(payload: &str) -> Self {
        let mut config = Self::default();
        let value: serde_json::Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(err) => {
                warn!("Invalid chunker config JSON, using defaults: {err}");
                return config;
            }
        };

        match value.get("splitLevel") {
            None => {}
            Some(level) => match level.as_u64() {
                Some(level) if level > 0 => config.split_level = level as usize,
                _ => warn!(
                    "Invalid splitLevel in chunker config, using default {}",
                    config.split_level
                ),
            },
        }

        match value.get("minChunkLength") {
            None => {}
            Some(len) => match len.as_u64() {
                Some(len) => config.min_chunk_length = len as usize,
                None => warn!(
                    "Invalid minChunkLength in chunker config, using default {}",
                    config.min_chunk_length
                ),
            },
        }

        if let Some(include) = value.get("includeHeaderChunk") {
            match include.as_bool() {
                Some(include) => config.include_header_chunk = include,
                None => warn!("Invalid includeHeaderChunk in chunker config, using default"),
            }
        }

        config
    }
}

/// Splits one article into an ordered list of chunks.
///
/// 1. If the article has a non-empty description, a header chunk combining
///    title and description is emitted first (id suffix `-chunk-header`).
/// 2. The raw content is sliced at heading boundaries (levels
///    `1..=split_level`; offset 0 is always an implicit boundary).
/// 3. Consecutive segments are greedily merged left-to-right until the
///    running buffer reaches `min_chunk_length`; a trailing undersized
///    buffer folds into the previous chunk instead of forming its own.
/// 4. Each merged chunk gets a deterministic id from the article id and
///    its 0-based position; the anchor id equals the chunk id.
pub fn chunk_article(article: &Article, config: &ChunkerConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    if config.include_header_chunk {
        if let Some(description) = &article.description {
            let description = description.trim();
            if !description.is_empty() {
                let header_id = format!("{}-chunk-header", article.id);
                chunks.push(Chunk {
                    chunk_id: header_id.clone(),
                    article_title: article.title.clone(),
                    article_url: article.url.clone(),
                    chunk_text: format!("{}\n\n{}", article.title, description),
                    chunk_html_id: header_id,
                });
            }
        }
    }

    let content = article.raw_content.as_str();
    if content.trim().is_empty() {
        return chunks;
    }

    let segments = slice_at_headings(content, config.split_level);
    let merged = merge_segments(segments, config.min_chunk_length);

    for (index, text) in merged.into_iter().enumerate() {
        let chunk_id = format!("{}-chunk-{}", article.id, index);
        chunks.push(Chunk {
            chunk_id: chunk_id.clone(),
            article_title: article.title.clone(),
            article_url: article.url.clone(),
            chunk_text: text,
            chunk_html_id: chunk_id,
        });
    }

    chunks
}

/// Finds heading boundaries and slices the content into trimmed, non-empty
/// segments.
///
/// A heading line is `#` repeated 1..=`split_level` times followed by a
/// space or tab. Deeper headings stay inside their parent segment.
fn slice_at_headings(content: &str, split_level: usize) -> Vec<String> {
    let level = split_level.max(1);
    let pattern = format!(r"(?m)^[ \t]*#{{1,{level}}}[ \t]+.*");
    // The pattern is built from a validated positive integer; it always compiles.
    let heading = Regex::new(&pattern).expect("heading pattern must compile");

    let mut boundaries = vec![0usize];
    for found in heading.find_iter(content) {
        if found.start() > 0 {
            boundaries.push(found.start());
        }
    }

    let mut segments = Vec::with_capacity(boundaries.len());
    for (i, &start) in boundaries.iter().enumerate() {
        let end = boundaries.get(i + 1).copied().unwrap_or(content.len());
        let segment = content[start..end].trim();
        if !segment.is_empty() {
            segments.push(segment.to_string());
        }
    }
    segments
}

/// Greedy left-to-right merge of segments into chunks of at least
/// `min_chunk_length` characters.
///
/// Segments accumulate into a buffer joined by blank lines; once the
/// buffer already meets the minimum, it is flushed and the next segment
/// starts a fresh buffer. A trailing undersized buffer folds into the
/// previous chunk so the sequence never ends with a fragment (unless it
/// is the only chunk).
fn merge_segments(segments: Vec<String>, min_chunk_length: usize) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    let mut buffer = String::new();

    for segment in segments {
        if buffer.is_empty() {
            buffer = segment;
        } else if buffer.chars().count() < min_chunk_length {
            buffer.push_str("\n\n");
            buffer.push_str(&segment);
        } else {
            merged.push(std::mem::replace(&mut buffer, segment));
        }
    }

    if !buffer.is_empty() {
        if buffer.chars().count() >= min_chunk_length || merged.is_empty() {
            merged.push(buffer);
        } else if let Some(last) = merged.last_mut() {
            last.push_str("\n\n");
            last.push_str(&buffer);
        }
    }

    merged
}
