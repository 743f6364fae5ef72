//! Transport summaries - Condensed views over raw train / flight results

use serde::{Deserialize, Serialize};

/// Aggregate over a list of trains returned by the rail side-process
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainSummary {
    pub count: usize,
    /// Lowest price among seats that are still available
    pub min_price: Option<f64>,
    /// Trains with at least one available seat class
    pub available_train_count: usize,
}

/// One highlighted flight (cheapest or fastest) in a flight search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightLeg {
    pub flight_no: String,
    pub dep_time: Option<String>,
    pub arr_time: Option<String>,
    pub duration_text: Option<String>,
    pub duration_minutes: Option<u32>,
    pub price: Option<u32>,
}

/// Figures scraped from the flight side-process' text answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightSummary {
    pub count: Option<u32>,
    pub min_price: Option<u32>,
    pub min_duration_text: Option<String>,
    pub min_duration_minutes: Option<u32>,
    pub cheapest: Option<FlightLeg>,
    pub fastest: Option<FlightLeg>,
}
