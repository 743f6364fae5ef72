//! 12306 rail side-process adapter.
//!
//! Resolves each city to its representative station, queries tickets, and
//! when that comes back empty tries up to 5×5 station pairs inside the two
//! cities before giving up.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use travel_butler::domain::services::{pick_station_code, summarize_trains};
use travel_butler::{DomainError, TrainQuery, TrainScheduleService, TrainSearchOutcome};

use super::McpClient;

const CITY_STATION_LIMIT: usize = 5;

/// [`TrainScheduleService`] backed by the 12306 MCP side-process
#[derive(Clone)]
pub struct RailSchedule {
    mcp: McpClient,
}

impl RailSchedule {
    pub fn new(mcp: McpClient) -> Self {
        Self { mcp }
    }

    async fn representative_codes(&self, query: &TrainQuery) -> Result<(String, String), DomainError> {
        let result = self
            .mcp
            .call_tool(
                "get-station-code-of-citys",
                json!({"citys": format!("{}|{}", query.from_city, query.to_city)}),
            )
            .await?;

        let Value::Object(map) = result else {
            return Err(DomainError::Parse("站点代码返回格式异常".into()));
        };

        let (from, to) = resolve_city_codes(&map, &query.from_city, &query.to_city);
        match (from, to) {
            (Some(from), Some(to)) => Ok((from, to)),
            _ => Err(DomainError::Parse("无法解析代表站 station_code".into())),
        }
    }

    async fn tickets(&self, from: &str, to: &str, date: &str) -> Result<Vec<Value>, DomainError> {
        let result = self
            .mcp
            .call_tool(
                "get-tickets",
                json!({"date": date, "fromStation": from, "toStation": to, "format": "json"}),
            )
            .await?;

        Ok(match result {
            Value::Array(rows) => rows,
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(rows)) => rows,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        })
    }

    async fn city_stations(&self, city: &str) -> Result<Value, DomainError> {
        self.mcp
            .call_tool("get-stations-code-in-city", json!({"city": city}))
            .await
    }

    fn outcome(trains: Vec<Value>, from: &str, to: &str, date: &str, fallback: &str) -> TrainSearchOutcome {
        TrainSearchOutcome {
            summary: summarize_trains(&trains),
            trains,
            from_station: from.to_string(),
            to_station: to.to_string(),
            date: date.to_string(),
            fallback: fallback.to_string(),
        }
    }
}

/// Station codes for both cities from a `get-station-code-of-citys` answer.
///
/// Accepts `{"citys": [{"city", "station_code"}, …]}` or a flat map keyed by
/// city name or by `fromStation`/`from` and `toStation`/`to`.
fn resolve_city_codes(
    map: &Map<String, Value>,
    from_city: &str,
    to_city: &str,
) -> (Option<String>, Option<String>) {
    if let Some(Value::Array(citys)) = map.get("citys") {
        let lookup = |city: &str| {
            citys
                .iter()
                .find(|entry| entry.get("city").and_then(Value::as_str) == Some(city))
                .and_then(pick_station_code)
        };
        return (lookup(from_city), lookup(to_city));
    }

    let first = |keys: [&str; 3]| {
        keys.iter()
            .filter_map(|k| map.get(*k))
            .find(|v| is_truthy(v))
            .and_then(pick_station_code)
    };
    (
        first(["fromStation", "from", from_city]),
        first(["toStation", "to", to_city]),
    )
}

/// Empty strings, containers, `false`, `0` and `null` do not count as an answer
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[async_trait]
impl TrainScheduleService for RailSchedule {
    async fn search_trains(&self, query: &TrainQuery) -> Result<TrainSearchOutcome, DomainError> {
        let (from_code, to_code) = self.representative_codes(query).await?;
        let date = query.date.as_str();

        let first = self.tickets(&from_code, &to_code, date).await?;
        if !first.is_empty() {
            return Ok(Self::outcome(first, &from_code, &to_code, date, "representative_station"));
        }

        let empty = |fallback: &str| Self::outcome(Vec::new(), &from_code, &to_code, date, fallback);

        let (dep, arr) = tokio::join!(
            self.city_stations(&query.from_city),
            self.city_stations(&query.to_city)
        );
        let (dep, arr) = match (dep, arr) {
            (Ok(dep), Ok(arr)) => (dep, arr),
            _ => return Ok(empty("failed_to_get_city_stations")),
        };
        let (Value::Array(dep), Value::Array(arr)) = (dep, arr) else {
            return Ok(empty("city_stations_format_invalid"));
        };

        for fc in dep.iter().take(CITY_STATION_LIMIT).filter_map(pick_station_code) {
            for tc in arr.iter().take(CITY_STATION_LIMIT).filter_map(pick_station_code) {
                match self.tickets(&fc, &tc, date).await {
                    Ok(rows) if !rows.is_empty() => {
                        tracing::info!("🚄 Found trains via city stations {} → {}", fc, tc);
                        return Ok(Self::outcome(rows, &fc, &tc, date, "tried_top5_city_stations"));
                    }
                    Ok(_) => {}
                    Err(e) => tracing::debug!("tickets {} → {} failed: {}", fc, tc, e),
                }
            }
        }

        Ok(empty("tried_top5_city_stations_but_empty"))
    }

    async fn ping(&self) -> Result<usize, DomainError> {
        Ok(self.mcp.list_tools().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};

    fn text_result(id: Value, payload: Value) -> Json<Value> {
        Json(json!({"jsonrpc": "2.0", "id": id, "result": {
            "content": [{"type": "text", "text": payload.to_string()}]
        }}))
    }

    /// Fake 12306 side-process: representative stations BJP/SHH have no
    /// tickets; the city-station pair VNP → AOH does.
    async fn spawn_fake(representative_has_tickets: bool) -> String {
        let router = Router::new().route(
            "/mcp",
            post(move |Json(body): Json<Value>| async move {
                let id = body["id"].clone();
                let args = &body["params"]["arguments"];
                let payload = match body["params"]["name"].as_str().unwrap_or_default() {
                    "get-station-code-of-citys" => json!({"citys": [
                        {"city": "北京", "station_code": "BJP"},
                        {"city": "上海", "stationCode": "SHH"}
                    ]}),
                    "get-tickets" => {
                        let pair = (args["fromStation"].as_str(), args["toStation"].as_str());
                        match pair {
                            (Some("BJP"), Some("SHH")) if representative_has_tickets => json!([
                                {"train_no": "G1", "prices": [{"num": "有", "price": 553}]}
                            ]),
                            (Some("VNP"), Some("AOH")) => json!({"data": [
                                {"train_no": "G3", "prices": [{"num": "12", "price": 600}]},
                                {"train_no": "G5", "prices": [{"num": "无", "price": 300}]}
                            ]}),
                            _ => json!([]),
                        }
                    }
                    "get-stations-code-in-city" => match args["city"].as_str() {
                        Some("北京") => json!([{"station_code": "BJP"}, {"station_code": "VNP"}]),
                        _ => json!([{"station_code": "SHH"}, {"station_code": "AOH"}]),
                    },
                    _ => json!(null),
                };
                text_result(id, payload)
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/mcp")
    }

    fn query() -> TrainQuery {
        TrainQuery {
            from_city: "北京".into(),
            to_city: "上海".into(),
            date: "2026-02-10".into(),
        }
    }

    #[tokio::test]
    async fn test_representative_station_hit() {
        let rail = RailSchedule::new(McpClient::new("12306", Some(spawn_fake(true).await)));
        let outcome = rail.search_trains(&query()).await.unwrap();
        assert_eq!(outcome.fallback, "representative_station");
        assert_eq!(outcome.from_station, "BJP");
        assert_eq!(outcome.to_station, "SHH");
        assert_eq!(outcome.summary.count, 1);
        assert_eq!(outcome.summary.min_price, Some(553.0));
    }

    #[tokio::test]
    async fn test_falls_back_to_city_stations() {
        let rail = RailSchedule::new(McpClient::new("12306", Some(spawn_fake(false).await)));
        let outcome = rail.search_trains(&query()).await.unwrap();
        assert_eq!(outcome.fallback, "tried_top5_city_stations");
        assert_eq!((outcome.from_station.as_str(), outcome.to_station.as_str()), ("VNP", "AOH"));
        assert_eq!(outcome.summary.count, 2);
        assert_eq!(outcome.summary.available_train_count, 1);
        assert_eq!(outcome.summary.min_price, Some(600.0));
    }

    #[tokio::test]
    async fn test_unknown_cities_fail_to_resolve() {
        let rail = RailSchedule::new(McpClient::new("12306", Some(spawn_fake(true).await)));
        let err = rail
            .search_trains(&TrainQuery {
                from_city: "火星".into(),
                to_city: "上海".into(),
                date: "2026-02-10".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Parse(_)));
    }

    #[test]
    fn test_resolve_flat_map() {
        let map = json!({"fromStation": "BJP", "上海": {"code": "SHH"}});
        let (from, to) = resolve_city_codes(map.as_object().unwrap(), "北京", "上海");
        assert_eq!(from.as_deref(), Some("BJP"));
        assert_eq!(to.as_deref(), Some("SHH"));

        // blank role keys fall through to the city name
        let map = json!({"fromStation": "", "from": {}, "北京": "BJP", "toStation": "SHH"});
        let (from, to) = resolve_city_codes(map.as_object().unwrap(), "北京", "上海");
        assert_eq!(from.as_deref(), Some("BJP"));
        assert_eq!(to.as_deref(), Some("SHH"));
    }
}
