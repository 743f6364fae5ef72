//! TransportMode - Means of travel the comparison covers

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Train,
    Flight,
}

impl TransportMode {
    pub fn all() -> Vec<TransportMode> {
        vec![TransportMode::Train, TransportMode::Flight]
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportMode::Train => write!(f, "train"),
            TransportMode::Flight => write!(f, "flight"),
        }
    }
}

impl std::str::FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "train" => Ok(TransportMode::Train),
            "flight" => Ok(TransportMode::Flight),
            _ => Err(format!("Unknown transport mode: {}", s)),
        }
    }
}
