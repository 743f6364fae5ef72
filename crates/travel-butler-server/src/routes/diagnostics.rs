//! Diagnostics Routes - side-process reachability and LLM round-trip
//!
//! Both endpoints always answer 200; failures are reported in the body.

use axum::{extract::State, routing::get, Json, Router};

use travel_butler::DomainError;

use crate::models::{AiTestResponse, ServiceReachability, TransitHealthResponse};
use crate::AppState;

fn reachability(
    name: &str,
    url: Option<&String>,
    ping: Result<usize, DomainError>,
) -> ServiceReachability {
    match ping {
        Ok(tool_count) => ServiceReachability {
            name: name.to_string(),
            url: url.cloned(),
            reachable: true,
            tool_count: Some(tool_count),
            error: None,
        },
        Err(e) => ServiceReachability {
            name: name.to_string(),
            url: url.cloned(),
            reachable: false,
            tool_count: None,
            error: Some(e.to_string()),
        },
    }
}

/// Reachability of the rail and flight side-processes
///
/// GET /health/transit
#[utoipa::path(
    get,
    path = "/health/transit",
    responses(
        (status = 200, description = "Per-service reachability", body = TransitHealthResponse)
    ),
    tag = "Health"
)]
pub async fn transit_health(State(state): State<AppState>) -> Json<TransitHealthResponse> {
    let (rail, flight) = tokio::join!(
        state.backends.trains.ping(),
        state.backends.flights.ping()
    );

    let response = TransitHealthResponse {
        rail: reachability("12306", state.settings.mcp_12306_url.as_ref(), rail),
        flight: reachability(
            "variflight",
            state.settings.mcp_variflight_url.as_ref(),
            flight,
        ),
    };
    if !response.rail.reachable || !response.flight.reachable {
        tracing::warn!(
            "⚠️  Transit side-process check: rail={} flight={}",
            response.rail.reachable,
            response.flight.reachable
        );
    }
    Json(response)
}

/// One-line LLM round-trip
///
/// GET /test/ai
#[utoipa::path(
    get,
    path = "/test/ai",
    responses(
        (status = 200, description = "`success` with the model's answer, or `error` with a message", body = AiTestResponse)
    ),
    tag = "Health"
)]
pub async fn test_ai(State(state): State<AppState>) -> Json<AiTestResponse> {
    match state.backends.llm.health_check().await {
        Ok(answer) => Json(AiTestResponse {
            status: "success".to_string(),
            ai_response: Some(answer),
            message: None,
        }),
        Err(e) => {
            tracing::warn!("LLM health check failed: {}", e);
            Json(AiTestResponse {
                status: "error".to_string(),
                ai_response: None,
                message: Some(e.to_string()),
            })
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health/transit", get(transit_health))
        .route("/test/ai", get(test_ai))
}
