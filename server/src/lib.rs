use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use citesearch_core::{CorpusSource, EngineConfig, SearchEngine, SnapshotStats, Snippet};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;
const MAX_SUGGESTIONS: usize = 50;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default, alias = "query")]
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Deserialize)]
pub struct SuggestParams {
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}
fn default_limit() -> usize { 5 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHitView>,
}

#[derive(Serialize)]
pub struct SearchHitView {
    pub doc_id: u32,
    pub score: f64,
    pub title: String,
    pub url: String,
    /// HTML-escaped excerpt with matches wrapped in `<em>`.
    pub snippet: String,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub corpus: PathBuf,
    pub admin_token: Option<String>,
}

/// Build the engine from `corpus` and wire the routes. `ADMIN_TOKEN` guards the rebuild endpoint.
pub fn build_app(corpus: PathBuf, config: EngineConfig) -> Result<Router> {
    let engine = SearchEngine::initialize(CorpusSource::Directory(corpus.clone()), config)?;
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    Ok(router(AppState { engine: Arc::new(engine), corpus, admin_token }))
}

pub fn router(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler).post(search_post))
        .route("/autocomplete", get(autocomplete_handler).post(autocomplete_post))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/stats", get(stats_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    run_search(&state, params)
}

/// Body form `{"query": "..."}` (or `q`), as the browser front end sends it.
pub async fn search_post(State(state): State<AppState>, Json(params): Json<SearchParams>) -> Json<SearchResponse> {
    run_search(&state, params)
}

fn run_search(state: &AppState, params: SearchParams) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let k = params.k.clamp(1, MAX_K);
    let page = state.engine.snapshot().search_page(&params.q, k);
    let results = page
        .hits
        .into_iter()
        .map(|h| SearchHitView { doc_id: h.doc_id, score: h.score, title: h.title, url: h.url, snippet: render_snippet(&h.snippet) })
        .collect();
    let took_s = start.elapsed().as_secs_f64();
    tracing::debug!(query = %params.q, total_hits = page.total_hits, took_s, "search");
    Json(SearchResponse { query: params.q, took_s, total_hits: page.total_hits, results })
}

pub async fn autocomplete_handler(State(state): State<AppState>, Query(params): Query<SuggestParams>) -> Json<Vec<String>> {
    Json(state.engine.autocomplete(&params.prefix, params.limit.clamp(1, MAX_SUGGESTIONS)))
}

/// Body form `{"prefix": "..."}`, as the browser front end sends it.
pub async fn autocomplete_post(State(state): State<AppState>, Json(params): Json<SuggestParams>) -> Json<Vec<String>> {
    Json(state.engine.autocomplete(&params.prefix, params.limit.clamp(1, MAX_SUGGESTIONS)))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<u32>) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let snap = state.engine.snapshot();
    match snap.document(doc_id) {
        Some(doc) => Ok(Json(serde_json::json!({
            "doc_id": doc.id,
            "title": doc.title,
            "url": doc.url,
            "format": doc.format,
            "authority": snap.authority().get(doc.id),
            "cites": snap.graph().outgoing(doc.id),
            "text": doc.content,
        }))),
        None => Err((StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" })))),
    }
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<SnapshotStats> {
    Json(state.engine.snapshot().stats())
}

/// Reload the corpus directory and publish the new snapshot. In-flight queries keep the old one.
async fn rebuild_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<SnapshotStats>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let engine = state.engine.clone();
    let corpus = state.corpus.clone();
    let rebuilt = tokio::task::spawn_blocking(move || engine.rebuild(CorpusSource::Directory(corpus)))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    match rebuilt {
        Ok(snap) => {
            tracing::info!(num_docs = snap.documents().len(), "snapshot rebuilt");
            Ok(Json(snap.stats()))
        }
        Err(e) => {
            tracing::warn!(error = %e, "rebuild failed, keeping previous snapshot");
            Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}

fn render_snippet(snippet: &Snippet) -> String {
    let mut out = String::with_capacity(snippet.text.len() + 16);
    for (piece, hit) in snippet.segments() {
        if hit {
            out.push_str("<em>");
            escape_html_into(piece, &mut out);
            out.push_str("</em>");
        } else {
            escape_html_into(piece, &mut out);
        }
    }
    out
}

fn escape_html_into(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_rendering_escapes_text() {
        let snippet = Snippet { text: "a <b> & tries".into(), highlights: vec![8..13] };
        assert_eq!(render_snippet(&snippet), "a &lt;b&gt; &amp; <em>tries</em>");
    }
}
