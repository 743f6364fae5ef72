//! Train Summary
//!
//! Seat availability rules and aggregation over the rail side-process'
//! ticket list. Rows are kept as raw JSON; only the fields used here are
//! interpreted (`prices[].num`, `prices[].price`).

use serde_json::Value;

use crate::domain::entities::TrainSummary;

const STATION_CODE_KEYS: [&str; 6] = [
    "station_code",
    "stationCode",
    "code",
    "telecode",
    "station_telecode",
    "stationTelecode",
];

/// Whether a seat count means "tickets left".
///
/// Numbers must be positive; `有` means yes; `无`, `--`, `0` and blank mean
/// no; other strings count only if they parse as a positive number.
pub fn seat_available(num: &Value) -> bool {
    match num {
        Value::Number(n) => n.as_f64().is_some_and(|v| v > 0.0),
        Value::String(s) => match s.trim() {
            "无" | "--" | "0" | "" => false,
            "有" => true,
            other => other.parse::<f64>().is_ok_and(|v| v > 0.0),
        },
        _ => false,
    }
}

fn as_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Count, cheapest available price and number of trains with any seat
pub fn summarize_trains(trains: &[Value]) -> TrainSummary {
    let mut min_price: Option<f64> = None;
    let mut available_train_count = 0;

    for train in trains {
        let Some(prices) = train.get("prices").and_then(Value::as_array) else {
            continue;
        };

        let mut has_seat = false;
        for price in prices.iter().filter(|p| p.is_object()) {
            if !price.get("num").is_some_and(seat_available) {
                continue;
            }
            has_seat = true;

            if let Some(pv) = price.get("price").and_then(as_price) {
                if min_price.map_or(true, |m| pv < m) {
                    min_price = Some(pv);
                }
            }
        }

        if has_seat {
            available_train_count += 1;
        }
    }

    TrainSummary {
        count: trains.len(),
        min_price,
        available_train_count,
    }
}

/// Normalise a station entry to its telecode.
///
/// Entries are either the code itself or an object carrying it under one
/// of several key spellings.
pub fn pick_station_code(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Object(map) => STATION_CODE_KEYS.iter().find_map(|key| {
            map.get(*key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }),
        _ => None,
    }
}
