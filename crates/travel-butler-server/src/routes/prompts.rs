//! Prompt Routes - run named prompt templates

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::error::{api_error, ApiError};
use crate::models::{PromptListResponse, PromptRunRequest, PromptRunResponse};
use crate::AppState;

/// List template names
#[utoipa::path(
    get,
    path = "/prompts",
    responses(
        (status = 200, description = "Registered templates", body = PromptListResponse)
    ),
    tag = "Prompt"
)]
pub async fn list_prompts(State(state): State<AppState>) -> Json<PromptListResponse> {
    let templates = state
        .prompts
        .templates()
        .names()
        .into_iter()
        .map(String::from)
        .collect();
    Json(PromptListResponse { templates })
}

/// Render a template with `vars` and complete it
///
/// POST /prompts/travel_plan {"vars": {"city": "成都", "days": "3", ...}}
#[utoipa::path(
    post,
    path = "/prompts/{name}",
    params(
        ("name" = String, Path, description = "Template name, e.g. travel_plan")
    ),
    request_body = PromptRunRequest,
    responses(
        (status = 200, description = "Model output", body = PromptRunResponse),
        (status = 400, description = "Missing template variable"),
        (status = 404, description = "Unknown template"),
        (status = 502, description = "LLM request failed")
    ),
    tag = "Prompt"
)]
pub async fn run_prompt(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<PromptRunRequest>,
) -> Result<Json<PromptRunResponse>, ApiError> {
    let text = state
        .prompts
        .run(&name, &req.vars, req.temperature)
        .await
        .map_err(api_error)?;
    Ok(Json(PromptRunResponse { name, text }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/prompts", get(list_prompts))
        .route("/prompts/:name", post(run_prompt))
}
