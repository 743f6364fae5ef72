//! Search Routes - web search passthrough (Tavily)

use axum::{extract::State, routing::post, Json, Router};

use crate::error::{api_error, ApiError};
use crate::models::{SearchHit, SearchRequest, SearchResponse};
use crate::AppState;

const DEFAULT_MAX_RESULTS: usize = 5;

/// Search the web
#[utoipa::path(
    post,
    path = "/search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Answer and results", body = SearchResponse),
        (status = 400, description = "Empty query"),
        (status = 502, description = "Search provider error")
    ),
    tag = "Search"
)]
pub async fn web_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let limit = req.max_results.unwrap_or(DEFAULT_MAX_RESULTS).clamp(1, 20);
    tracing::info!("🔍 Web search: {}", req.query);

    let response = state
        .backends
        .web_search
        .search(&req.query, limit)
        .await
        .map_err(api_error)?;

    Ok(Json(SearchResponse {
        query: response.query,
        answer: response.answer,
        results: response
            .results
            .into_iter()
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                snippet: r.snippet,
                score: r.score,
            })
            .collect(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/search", post(web_search))
}
