//! Search command: client-side hybrid search.
//!
//! Runs the keyword matcher (against the locally fetched document index)
//! and the semantic endpoint (through the search server) concurrently,
//! then prints the merged list. Either source failing leaves the other's
//! results intact; failures surface in a dedicated error section.

use crate::api::RemoteSearchClient;
use crate::output;
use anyhow::{anyhow, Result};
use clap::Args;
use lodestone_core::search::{HttpKeywordIndexLoader, HybridSearcher, KeywordIndexCache};
use std::sync::Arc;
use std::time::Duration;

/// Arguments for `lode search`.
#[derive(Args)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Target language
    #[arg(long, default_value = "en")]
    pub lang: String,

    /// Base URL of the search server
    #[arg(long, env = "LODESTONE_SERVER_URL", default_value = "http://127.0.0.1:8787")]
    pub server_url: String,

    /// URL of the keyword document index (JSON array or NDJSON)
    #[arg(long, env = "LODESTONE_KEYWORD_INDEX_URL")]
    pub keyword_index_url: String,

    /// Site base path stripped during merge-key normalization
    #[arg(long, default_value = "")]
    pub base_path: String,

    /// Maximum merged results to display
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Seconds before either source's requests time out
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

/// Runs one hybrid search and prints the merged results.
pub async fn run(args: SearchArgs) -> Result<()> {
    if args.query.trim().is_empty() {
        return Err(anyhow!("search query must not be empty"));
    }

    let timeout = Duration::from_secs(args.timeout_secs.max(1));
    let loader = HttpKeywordIndexLoader::new(&args.keyword_index_url, timeout)
        .map_err(|err| anyhow!("failed to build keyword index loader: {err}"))?;
    let semantic = RemoteSearchClient::new(&args.server_url, timeout)
        .map_err(|err| anyhow!("failed to build search client: {err}"))?;

    let searcher = HybridSearcher::new(
        Arc::new(KeywordIndexCache::new(Arc::new(loader))),
        Arc::new(semantic),
        args.base_path.clone(),
    );

    let mut outcome = searcher.search(&args.query, &args.lang).await;
    outcome.merged.truncate(args.limit);

    let rendered = if args.json {
        output::format_json(&args.query, &args.lang, &outcome)
    } else {
        output::format_human(&args.query, &outcome)
    };
    println!("{rendered}");
    Ok(())
}
