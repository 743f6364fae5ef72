//! Transit Schedule Ports
//!
//! Train and flight lookups served by independently started side-processes.
//! Connection failures surface as [`DomainError::Unreachable`] so callers
//! can degrade instead of failing the whole request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{errors::DomainError, FlightSummary, TrainSummary};

/// Train search between two cities on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainQuery {
    pub from_city: String,
    pub to_city: String,
    /// YYYY-MM-DD
    pub date: String,
}

/// Train search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainSearchOutcome {
    /// Raw train rows as the side-process returned them
    pub trains: Vec<Value>,
    pub summary: TrainSummary,
    pub from_station: String,
    pub to_station: String,
    pub date: String,
    /// How the station pair was chosen, e.g. `representative_station`
    pub fallback: String,
}

/// Flight search between two IATA city codes on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightQuery {
    pub dep_city_code: String,
    pub arr_city_code: String,
    /// YYYY-MM-DD
    pub dep_date: String,
}

/// Flight search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightSearchOutcome {
    /// The side-process' answer text
    pub raw_text: String,
    pub summary: FlightSummary,
}

/// Rail schedule side-process
#[async_trait]
pub trait TrainScheduleService: Send + Sync {
    async fn search_trains(&self, query: &TrainQuery) -> Result<TrainSearchOutcome, DomainError>;

    /// Reachability check; returns the number of tools the side-process offers
    async fn ping(&self) -> Result<usize, DomainError>;
}

/// Flight schedule side-process
#[async_trait]
pub trait FlightScheduleService: Send + Sync {
    async fn search_flights(&self, query: &FlightQuery)
        -> Result<FlightSearchOutcome, DomainError>;

    /// Reachability check; returns the number of tools the side-process offers
    async fn ping(&self) -> Result<usize, DomainError>;
}
