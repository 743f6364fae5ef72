//! Chat Routes - agent conversation over a server-side session

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use travel_butler::DomainError;

use crate::application::chat_runtime::EXPIRED_SESSION;
use crate::error::{api_error, ApiError};
use crate::models::{ChatMessageRequest, ChatMessageResponse, StartChatResponse};
use crate::AppState;

/// Open a chat session
#[utoipa::path(
    post,
    path = "/chat/start",
    responses(
        (status = 200, description = "Session created", body = StartChatResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Chat"
)]
pub async fn start_chat(
    State(state): State<AppState>,
) -> Result<Json<StartChatResponse>, ApiError> {
    let session_id = state.chat.start().await.map_err(api_error)?;
    Ok(Json(StartChatResponse { session_id }))
}

/// Send one message and get the assistant's reply
///
/// The session profile is refreshed from the message before the model runs;
/// the model may call tools (transport, hotels, scenic spots, planning,
/// web search) before answering.
#[utoipa::path(
    post,
    path = "/chat/message",
    request_body = ChatMessageRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatMessageResponse),
        (status = 400, description = "Blank message"),
        (status = 404, description = "Session unknown or expired"),
        (status = 502, description = "LLM request failed")
    ),
    tag = "Chat"
)]
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<ChatMessageRequest>,
) -> Result<Json<ChatMessageResponse>, ApiError> {
    let reply = state
        .chat
        .send(&req.session_id, &req.message)
        .await
        .map_err(|e| match e {
            DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, EXPIRED_SESSION.to_string()),
            other => api_error(other),
        })?;

    let profile = serde_json::to_value(&reply.profile)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(ChatMessageResponse {
        session_id: reply.session_id,
        reply: reply.reply,
        profile,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat/start", post(start_chat))
        .route("/chat/message", post(send_message))
        .route("/chat/message1", post(send_message))
}
