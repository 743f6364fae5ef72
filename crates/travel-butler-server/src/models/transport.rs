//! Transport - Direct train/flight comparison for one leg

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransportCompareRequest {
    pub departure: String,
    pub destination: String,
    /// YYYY-MM-DD
    pub date: String,
    /// `train` and/or `flight`; both when omitted
    #[serde(default)]
    pub transport_types: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransportCompareResponse {
    pub status: String,
    /// `{departure, destination, date, options, analysis_text}`
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}
