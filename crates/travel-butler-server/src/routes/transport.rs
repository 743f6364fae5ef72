//! Transport Routes - direct train/flight comparison for one leg

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::NaiveDate;

use travel_butler::TransportMode;

use crate::error::ApiError;
use crate::models::{TransportCompareRequest, TransportCompareResponse};
use crate::AppState;

fn parse_modes(raw: Option<&[String]>) -> Result<Vec<TransportMode>, ApiError> {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return Ok(TransportMode::all());
    };
    let mut modes = Vec::with_capacity(raw.len());
    for name in raw {
        let mode: TransportMode = name
            .parse()
            .map_err(|e: String| (StatusCode::BAD_REQUEST, e))?;
        if !modes.contains(&mode) {
            modes.push(mode);
        }
    }
    Ok(modes)
}

/// Compare trains and flights for a single leg
///
/// Lookup failures do not fail the request; they show up per mode under
/// `data.options.<mode>.error`.
#[utoipa::path(
    post,
    path = "/transport/compare",
    request_body = TransportCompareRequest,
    responses(
        (status = 200, description = "Lookups and analysis", body = TransportCompareResponse),
        (status = 400, description = "Bad date or unknown transport type")
    ),
    tag = "Transport"
)]
pub async fn compare_transport(
    State(state): State<AppState>,
    Json(req): Json<TransportCompareRequest>,
) -> Result<Json<TransportCompareResponse>, ApiError> {
    let date = req.date.trim();
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("日期格式错误: {}", e)))?;

    let departure = req.departure.trim();
    let destination = req.destination.trim();
    if departure.is_empty() || destination.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "departure 和 destination 不能为空".to_string(),
        ));
    }
    let modes = parse_modes(req.transport_types.as_deref())?;

    let plan = state
        .transport
        .plan_leg(departure, destination, date, &modes, "{}")
        .await;

    let data = serde_json::to_value(&plan)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(TransportCompareResponse {
        status: "success".to_string(),
        data,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/transport/compare", post(compare_transport))
}
