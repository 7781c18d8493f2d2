//! Index command: chunk artifacts in, vector index records out.
//!
//! Reads each language's `final-chunks.<lang>.json`, embeds the chunk
//! text through the external embedding service, and upserts the resulting
//! records into that language's vector index.

use anyhow::{Context, Result};
use clap::Args;
use lodestone_core::chunking::Chunk;
use lodestone_core::config::EMBEDDING_DIM;
use lodestone_core::embedding::RemoteEmbedder;
use lodestone_core::indexing::{index_chunks, IndexerConfig};
use lodestone_core::vector::{IndexRegistry, RemoteVectorIndex};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Arguments for `lode index`.
#[derive(Args)]
pub struct IndexArgs {
    /// Directory holding the chunk artifacts
    #[arg(long, default_value = "public")]
    pub chunks_dir: PathBuf,

    /// Languages to index (comma separated)
    #[arg(long, value_delimiter = ',', default_value = "en,zh")]
    pub languages: Vec<String>,

    /// Base name of the per-language vector indices
    #[arg(long, env = "LODESTONE_INDEX_BASE", default_value = "article-search")]
    pub index_base: String,

    /// Base URL of the embedding service
    #[arg(long, env = "LODESTONE_EMBEDDING_URL")]
    pub embedding_url: String,

    /// API key for the embedding service
    #[arg(long, env = "LODESTONE_EMBEDDING_API_KEY", default_value = "")]
    pub embedding_api_key: String,

    /// Embedding model identifier
    #[arg(long, env = "LODESTONE_EMBEDDING_MODEL", default_value = "baai/bge-base-en-v1.5")]
    pub embedding_model: String,

    /// Embedding dimension the model produces
    #[arg(long, default_value_t = EMBEDDING_DIM)]
    pub embedding_dim: usize,

    /// Base URL of the vector index service
    #[arg(long, env = "LODESTONE_VECTOR_URL")]
    pub vector_url: String,

    /// API key for the vector index service
    #[arg(long, env = "LODESTONE_VECTOR_API_KEY", default_value = "")]
    pub vector_api_key: String,

    /// Texts per embedding request
    #[arg(long, default_value_t = lodestone_core::config::EMBED_BATCH_SIZE)]
    pub batch_size: usize,

    /// Seconds before upstream requests time out
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

/// Runs the indexing stage.
pub async fn run(args: IndexArgs) -> Result<()> {
    let timeout = Duration::from_secs(args.timeout_secs.max(1));
    let embedder = RemoteEmbedder::new(
        &args.embedding_api_key,
        &args.embedding_url,
        args.embedding_model.clone(),
        args.embedding_dim,
        timeout,
        3,
    )
    .context("failed to build embedding client")?;
    let vector_index = RemoteVectorIndex::new(&args.vector_api_key, &args.vector_url, timeout)
        .context("failed to build vector index client")?;
    let registry = IndexRegistry::new(args.index_base.clone(), args.languages.clone());

    let indexer_config = IndexerConfig {
        batch_size: args.batch_size.max(1),
        ..IndexerConfig::default()
    };

    for lang in &args.languages {
        let artifact = args.chunks_dir.join(format!("final-chunks.{lang}.json"));
        let payload = match std::fs::read_to_string(&artifact) {
            Ok(payload) => payload,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("No chunk artifact for '{lang}', skipping");
                continue;
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read {}", artifact.display()));
            }
        };
        let chunks: Vec<Chunk> = serde_json::from_str(&payload)
            .with_context(|| format!("failed to parse {}", artifact.display()))?;

        let index_name = registry
            .index_for(lang)
            .with_context(|| format!("language '{lang}' has no index binding"))?;

        let report = index_chunks(
            &embedder,
            &vector_index,
            &index_name,
            lang,
            &chunks,
            &indexer_config,
        )
        .await
        .with_context(|| format!("indexing failed for '{lang}'"))?;

        println!(
            "{index_name}: {} indexed, {} skipped",
            report.indexed, report.skipped
        );
    }

    Ok(())
}
