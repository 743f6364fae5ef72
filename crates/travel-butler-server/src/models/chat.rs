//! Chat - Session start and message exchange

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StartChatResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatMessageRequest {
    /// Session id from `/chat/start`
    pub session_id: String,
    pub message: String,
    /// Accepted for client-side caching; the server profile wins
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub client_meta: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatMessageResponse {
    pub session_id: String,
    pub reply: String,
    /// Travel conditions known so far
    #[schema(value_type = Object)]
    pub profile: serde_json::Value,
}
