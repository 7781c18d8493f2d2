//! HTTP API for the semantic search pipeline.
//!
//! One endpoint: `POST /api/ai-search?lang=<code>` with body
//! `{"query": "..."}`. Preflight `OPTIONS` is answered with permissive
//! CORS headers, and every response (including 405s for other methods)
//! carries the same headers so browser clients can call the API from any
//! origin.

use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;
use axum::routing::post;
use axum::{middleware, Json, Router};
use lodestone_core::error::SearchError;
use lodestone_core::search::{SearchHit, SearchPipeline};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared state: the pipeline is stateless per request, so one instance
/// serves every request.
#[derive(Clone)]
pub struct AppState {
    /// The semantic retrieval pipeline
    pub pipeline: Arc<SearchPipeline>,
}

/// Query-string parameters for the search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Target language; empty falls back to the server default
    #[serde(default)]
    pub lang: Option<String>,
}

/// JSON request body for the search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Free-text query
    #[serde(default)]
    pub query: Option<String>,
}

/// JSON error body for 4xx/5xx responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable error summary
    pub error: String,
    /// Upstream error detail, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/ai-search", post(search_handler).options(preflight))
        .layer(middleware::map_response(apply_cors_headers))
        .with_state(state)
}

/// Adds permissive CORS headers to every response.
async fn apply_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type"),
    );
    response
}

/// Answers CORS preflight requests; the headers come from the middleware.
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Runs one search request through the pipeline.
///
/// Error mapping follows the pipeline's taxonomy: a missing or empty
/// query is the caller's fault (400); configuration and upstream service
/// failures are the server's (500, with upstream detail surfaced). There
/// is no keyword fallback at this boundary; the client runs keyword
/// search independently and merges whatever arrives.
async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    body: Option<Json<SearchRequest>>,
) -> Result<Json<Vec<SearchHit>>, (StatusCode, Json<ErrorBody>)> {
    let query = body
        .and_then(|Json(request)| request.query)
        .unwrap_or_default();
    if query.trim().is_empty() {
        return Err(bad_request("Missing query in request body"));
    }

    let lang = params.lang.unwrap_or_default();
    info!("Search request: lang={lang:?} query={query:?}");

    match state.pipeline.search(&query, &lang).await {
        Ok(hits) => Ok(Json(hits)),
        Err(err) if err.is_validation() => Err(bad_request(&err.to_string())),
        Err(SearchError::UnsupportedLanguage(lang)) => {
            warn!("Search rejected: no index for language {lang}");
            Err(internal_error(
                "Configuration error: unsupported language",
                Some(lang),
            ))
        }
        Err(err) => {
            warn!("Search failed: {err}");
            Err(internal_error("Search failed", Some(err.to_string())))
        }
    }
}

fn bad_request(message: &str) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.to_string(),
            details: None,
        }),
    )
}

fn internal_error(message: &str, details: Option<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: message.to_string(),
            details,
        }),
    )
}
