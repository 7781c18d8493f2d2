//! Lodestone search server.
//!
//! Serves `POST /api/ai-search` backed by external embedding, vector
//! index, and (optionally) rerank and content store services. The server
//! holds no per-request state; everything beyond configuration lives in
//! the upstream services.
//!
//! # Usage
//!
//! ```bash
//! lodestone-server \
//!     --embedding-url https://ai.example.com/v1 \
//!     --vector-url https://vectors.example.com \
//!     --languages en,zh
//! ```

mod api;

use anyhow::{Context, Result};
use clap::Parser;
use lodestone_core::config::EMBEDDING_DIM;
use lodestone_core::content::HttpContentStore;
use lodestone_core::embedding::RemoteEmbedder;
use lodestone_core::rerank::RemoteReranker;
use lodestone_core::search::{PipelineConfig, RerankPolicy, SearchPipeline};
use lodestone_core::vector::RemoteVectorIndex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Lodestone semantic search API server.
#[derive(Parser)]
#[command(name = "lodestone-server", version, about)]
struct Cli {
    /// Address to bind the HTTP server to (host:port)
    #[arg(long, env = "LODESTONE_BIND", default_value = "127.0.0.1:8787")]
    bind: String,

    /// Base URL of the embedding service
    #[arg(long, env = "LODESTONE_EMBEDDING_URL")]
    embedding_url: String,

    /// API key for the embedding service
    #[arg(long, env = "LODESTONE_EMBEDDING_API_KEY", default_value = "")]
    embedding_api_key: String,

    /// Embedding model identifier
    #[arg(long, env = "LODESTONE_EMBEDDING_MODEL", default_value = "baai/bge-base-en-v1.5")]
    embedding_model: String,

    /// Embedding dimension the model produces
    #[arg(long, default_value_t = EMBEDDING_DIM)]
    embedding_dim: usize,

    /// Base URL of the vector index service
    #[arg(long, env = "LODESTONE_VECTOR_URL")]
    vector_url: String,

    /// API key for the vector index service
    #[arg(long, env = "LODESTONE_VECTOR_API_KEY", default_value = "")]
    vector_api_key: String,

    /// Base name of the per-language vector indices
    #[arg(long, env = "LODESTONE_INDEX_BASE", default_value = "article-search")]
    index_base: String,

    /// Supported language codes (comma separated)
    #[arg(long, env = "LODESTONE_LANGUAGES", value_delimiter = ',', default_value = "en,zh")]
    languages: Vec<String>,

    /// Default language for routing and the rerank policy
    #[arg(long, env = "LODESTONE_DEFAULT_LANGUAGE", default_value = "en")]
    default_language: String,

    /// Rerank endpoint; reranking is disabled when omitted
    #[arg(long, env = "LODESTONE_RERANK_URL")]
    rerank_url: Option<String>,

    /// API key for the rerank service
    #[arg(long, env = "LODESTONE_RERANK_API_KEY", default_value = "")]
    rerank_api_key: String,

    /// Rerank model identifier
    #[arg(long, env = "LODESTONE_RERANK_MODEL", default_value = "baai/bge-reranker-base")]
    rerank_model: String,

    /// Content store base URL; required for the reranking path
    #[arg(long, env = "LODESTONE_CONTENT_URL")]
    content_url: Option<String>,

    /// Candidates fetched from the vector index per query
    #[arg(long, default_value_t = lodestone_core::config::VECTOR_TOP_K)]
    top_k: usize,

    /// Maximum results returned per query
    #[arg(long, default_value_t = lodestone_core::config::FINAL_RESULT_COUNT)]
    final_count: usize,

    /// Similarity threshold on the non-reranked path
    #[arg(long, default_value_t = lodestone_core::config::CHUNK_SCORE_THRESHOLD)]
    score_threshold: f32,

    /// Score threshold on the reranked path
    #[arg(long, default_value_t = lodestone_core::config::RERANK_SCORE_THRESHOLD)]
    rerank_threshold: f32,

    /// Return every matching chunk instead of the best one per article
    #[arg(long)]
    no_article_dedupe: bool,

    /// Seconds before upstream service requests time out
    #[arg(long, env = "LODESTONE_UPSTREAM_TIMEOUT_SECS", default_value_t = 30)]
    upstream_timeout_secs: u64,

    /// Retry attempts for transient embedding service errors
    #[arg(long, default_value_t = 3)]
    embedding_max_retries: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let timeout = Duration::from_secs(cli.upstream_timeout_secs.max(1));

    let embedder = RemoteEmbedder::new(
        &cli.embedding_api_key,
        &cli.embedding_url,
        cli.embedding_model.clone(),
        cli.embedding_dim,
        timeout,
        cli.embedding_max_retries,
    )
    .context("failed to build embedding client")?;

    let vector_index = RemoteVectorIndex::new(&cli.vector_api_key, &cli.vector_url, timeout)
        .context("failed to build vector index client")?;

    let reranker = match &cli.rerank_url {
        Some(url) => Some(Arc::new(
            RemoteReranker::new(&cli.rerank_api_key, url, cli.rerank_model.clone(), timeout)
                .context("failed to build rerank client")?,
        ) as Arc<dyn lodestone_core::rerank::Reranker>),
        None => None,
    };
    let content = match &cli.content_url {
        Some(url) => Some(Arc::new(
            HttpContentStore::new(url, timeout).context("failed to build content store client")?,
        ) as Arc<dyn lodestone_core::content::ContentStore>),
        None => None,
    };

    // Reranking is an explicit policy, not a hardcoded branch: it only
    // activates when both the rerank and content services are configured.
    let rerank_policy = if reranker.is_some() && content.is_some() {
        RerankPolicy::DefaultLanguageOnly
    } else {
        RerankPolicy::Disabled
    };

    let pipeline = SearchPipeline::new(
        Arc::new(embedder),
        Arc::new(vector_index),
        reranker,
        content,
        PipelineConfig {
            index_base: cli.index_base,
            languages: cli.languages,
            default_language: cli.default_language,
            top_k: cli.top_k.max(1),
            final_count: cli.final_count.max(1),
            score_threshold: cli.score_threshold,
            rerank_threshold: cli.rerank_threshold,
            dedupe_by_article: !cli.no_article_dedupe,
            rerank_policy,
            ..PipelineConfig::default()
        },
    );

    let app = api::router(api::AppState {
        pipeline: Arc::new(pipeline),
    });

    let addr: SocketAddr = cli
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", cli.bind))?;
    tracing::info!("lodestone-server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .await
        .context("server shutdown")?;
    Ok(())
}
