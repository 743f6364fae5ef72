//! TripType - Which legs of a journey to compare

use serde::{Deserialize, Serialize};

/// Legs covered by a transport comparison
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    /// depart city -> destination on the departure date
    Outbound,
    /// destination -> depart city on the return date
    Inbound,
    /// outbound, plus inbound when a return date is known
    #[default]
    Roundtrip,
}

impl TripType {
    pub fn includes_outbound(self) -> bool {
        matches!(self, TripType::Outbound | TripType::Roundtrip)
    }

    pub fn includes_inbound(self) -> bool {
        matches!(self, TripType::Inbound | TripType::Roundtrip)
    }
}

impl std::fmt::Display for TripType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TripType::Outbound => write!(f, "outbound"),
            TripType::Inbound => write!(f, "inbound"),
            TripType::Roundtrip => write!(f, "roundtrip"),
        }
    }
}

impl std::str::FromStr for TripType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "outbound" => Ok(TripType::Outbound),
            "inbound" => Ok(TripType::Inbound),
            "roundtrip" => Ok(TripType::Roundtrip),
            _ => Err(format!(
                "trip_type 不合法：{}（应为 outbound / inbound / roundtrip）",
                s.trim()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(" RoundTrip ".parse::<TripType>(), Ok(TripType::Roundtrip));
        assert_eq!("inbound".parse::<TripType>(), Ok(TripType::Inbound));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "oneway".parse::<TripType>().unwrap_err();
        assert!(err.contains("oneway"));
    }

    #[test]
    fn test_leg_coverage() {
        assert!(TripType::Roundtrip.includes_outbound());
        assert!(TripType::Roundtrip.includes_inbound());
        assert!(!TripType::Outbound.includes_inbound());
        assert!(!TripType::Inbound.includes_outbound());
    }
}
