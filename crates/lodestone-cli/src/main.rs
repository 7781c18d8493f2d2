//! Lodestone CLI - chunk, index, and search article corpora.
//!
//! # Usage
//!
//! ```bash
//! # Split generated article JSON into chunk artifacts
//! lode chunk --content-dir public --out-dir public
//!
//! # Embed chunk artifacts and upsert them into the vector index
//! lode index --chunks-dir public --vector-url https://vectors.example.com
//!
//! # Hybrid search: local keyword matching + the search server
//! lode search "random walk" --keyword-index-url https://site.example.com/index.json
//! lode search "query" --json
//! ```

mod api;
mod chunk;
mod index;
mod output;
mod search;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Lodestone search tooling.
#[derive(Parser)]
#[command(name = "lode", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Split generated article JSON into per-language chunk artifacts
    Chunk(chunk::ChunkArgs),
    /// Embed chunk artifacts and upsert them into the vector index
    Index(index::IndexArgs),
    /// Run a hybrid keyword + semantic search
    Search(search::SearchArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Command::Chunk(args) => chunk::run(args),
        Command::Index(args) => index::run(args).await,
        Command::Search(args) => search::run(args).await,
    }
}

/// Resolves the per-language content input path.
///
/// The default language lives at the section root
/// (`<content-dir>/<section>/content.json`); other languages sit under a
/// language directory (`<content-dir>/<lang>/<section>/content.json`).
pub(crate) fn content_input_path(
    content_dir: &std::path::Path,
    section: &str,
    lang: &str,
    default_language: &str,
) -> PathBuf {
    if lang == default_language {
        content_dir.join(section).join("content.json")
    } else {
        content_dir.join(lang).join(section).join("content.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_content_input_path_layout() {
        let base = Path::new("public");
        assert_eq!(
            content_input_path(base, "post", "en", "en"),
            Path::new("public/post/content.json")
        );
        assert_eq!(
            content_input_path(base, "post", "zh", "en"),
            Path::new("public/zh/post/content.json")
        );
    }
}
