//! Chunk command: article JSON in, chunk artifacts out.
//!
//! Reads the site generator's `content.json` for each configured
//! language, runs the chunker over every article, and writes one
//! `final-chunks.<lang>.json` artifact per language for the indexing
//! stage. A language whose input file is missing is skipped; a malformed
//! input file is reported and skipped without failing the run.

use anyhow::{Context, Result};
use clap::Args;
use lodestone_core::chunking::{chunk_article, Article, Chunk, ChunkerConfig};
use std::path::PathBuf;
use tracing::{info, warn};

/// Arguments for `lode chunk`.
#[derive(Args)]
pub struct ChunkArgs {
    /// Directory holding the generated site content
    #[arg(long, default_value = "public")]
    pub content_dir: PathBuf,

    /// Directory to write chunk artifacts into
    #[arg(long, default_value = "public")]
    pub out_dir: PathBuf,

    /// Optional chunker config JSON (splitLevel, minChunkLength, includeHeaderChunk)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Content section name under the content directory
    #[arg(long, default_value = "post")]
    pub section: String,

    /// Languages to process (comma separated)
    #[arg(long, value_delimiter = ',', default_value = "en,zh")]
    pub languages: Vec<String>,

    /// Default language (its content lives at the section root)
    #[arg(long, default_value = "en")]
    pub default_language: String,
}

/// Runs the chunking stage.
pub fn run(args: ChunkArgs) -> Result<()> {
    let config = load_chunker_config(args.config.as_deref())?;
    info!(
        "Chunking with splitLevel={} minChunkLength={}",
        config.split_level, config.min_chunk_length
    );

    let mut files_written = 0usize;
    for lang in &args.languages {
        let input_path =
            crate::content_input_path(&args.content_dir, &args.section, lang, &args.default_language);

        let payload = match std::fs::read_to_string(&input_path) {
            Ok(payload) => payload,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("No content file for '{lang}' at {}, skipping", input_path.display());
                continue;
            }
            Err(err) => {
                warn!("Failed to read {}: {err}, skipping '{lang}'", input_path.display());
                continue;
            }
        };

        let articles: Vec<Article> = match serde_json::from_str(&payload) {
            Ok(articles) => articles,
            Err(err) => {
                warn!("Failed to parse {}: {err}, skipping '{lang}'", input_path.display());
                continue;
            }
        };

        let chunks: Vec<Chunk> = articles
            .iter()
            .flat_map(|article| chunk_article(article, &config))
            .collect();
        if chunks.is_empty() {
            info!("No chunks generated for '{lang}'");
            continue;
        }

        let out_path = args.out_dir.join(format!("final-chunks.{lang}.json"));
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(&chunks)?;
        std::fs::write(&out_path, serialized)
            .with_context(|| format!("failed to write {}", out_path.display()))?;

        println!(
            "Wrote {} chunks from {} articles to {}",
            chunks.len(),
            articles.len(),
            out_path.display()
        );
        files_written += 1;
    }

    println!("Chunking complete ({files_written} language files)");
    Ok(())
}

/// Loads the chunker config file, or defaults when none is given.
///
/// A missing file at an explicitly passed path is an error; invalid
/// fields inside an existing file fall back per-field with warnings.
fn load_chunker_config(path: Option<&std::path::Path>) -> Result<ChunkerConfig> {
    match path {
        Some(path) => {
            let payload = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read chunker config {}", path.display()))?;
            Ok(ChunkerConfig::from_json_str(&payload))
        }
        None => Ok(ChunkerConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_content(dir: &std::path::Path, relative: &str, payload: &str) {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, payload).unwrap();
    }

    #[test]
    fn test_chunk_run_writes_artifacts_per_language() {
        let tmp = tempfile::tempdir().unwrap();
        write_content(
            tmp.path(),
            "post/content.json",
            r#"[{"id": "a", "title": "A", "url": "/post/a/",
                 "rawContent": "A body long enough to produce a single content chunk here."}]"#,
        );

        run(ChunkArgs {
            content_dir: tmp.path().to_path_buf(),
            out_dir: tmp.path().to_path_buf(),
            config: None,
            section: "post".to_string(),
            languages: vec!["en".to_string(), "zh".to_string()],
            default_language: "en".to_string(),
        })
        .unwrap();

        let artifact = tmp.path().join("final-chunks.en.json");
        let chunks: Vec<Chunk> =
            serde_json::from_str(&std::fs::read_to_string(artifact).unwrap()).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_id, "a-chunk-0");

        // zh input missing: skipped, no artifact.
        assert!(!tmp.path().join("final-chunks.zh.json").exists());
    }

    #[test]
    fn test_malformed_language_file_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write_content(tmp.path(), "post/content.json", "not json at all");

        // The run still succeeds; the language is skipped with a warning.
        run(ChunkArgs {
            content_dir: tmp.path().to_path_buf(),
            out_dir: tmp.path().to_path_buf(),
            config: None,
            section: "post".to_string(),
            languages: vec!["en".to_string()],
            default_language: "en".to_string(),
        })
        .unwrap();

        assert!(!tmp.path().join("final-chunks.en.json").exists());
    }
}
