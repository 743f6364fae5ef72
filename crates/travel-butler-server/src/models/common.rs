//! Common - Welcome, health and diagnostics

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WelcomeResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
    pub version: String,
}

/// Reachability of one transit side-process
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceReachability {
    pub name: String,
    pub url: Option<String>,
    pub reachable: bool,
    /// Tools advertised by `tools/list`
    pub tool_count: Option<usize>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransitHealthResponse {
    pub rail: ServiceReachability,
    pub flight: ServiceReachability,
}

/// `GET /test/ai` result; `status` is `success` or `error`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AiTestResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
