//! PlanningMode - How the destination tool should respond

use serde::{Deserialize, Serialize};

/// Destination tool mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanningMode {
    /// Top-K destination suggestions
    #[default]
    Recommend,
    /// Day-by-day itinerary for a known destination
    Plan,
    /// Recommend, pick the first suggestion, then plan it
    OneClick,
}

impl std::fmt::Display for PlanningMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanningMode::Recommend => write!(f, "recommend"),
            PlanningMode::Plan => write!(f, "plan"),
            PlanningMode::OneClick => write!(f, "one_click"),
        }
    }
}

impl PlanningMode {
    /// Lenient parse: anything unrecognised (or blank) falls back to `Recommend`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "plan" => PlanningMode::Plan,
            "one_click" => PlanningMode::OneClick,
            _ => PlanningMode::Recommend,
        }
    }
}
