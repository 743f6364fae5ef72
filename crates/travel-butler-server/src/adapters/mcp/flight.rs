//! Variflight flight side-process adapter.

use async_trait::async_trait;
use serde_json::{json, Value};

use travel_butler::domain::services::parse_flight_summary;
use travel_butler::{DomainError, FlightQuery, FlightScheduleService, FlightSearchOutcome};

use super::McpClient;

/// [`FlightScheduleService`] backed by the Variflight MCP side-process
#[derive(Clone)]
pub struct VariflightSchedule {
    mcp: McpClient,
}

impl VariflightSchedule {
    pub fn new(mcp: McpClient) -> Self {
        Self { mcp }
    }
}

/// The side-process answers in prose, sometimes wrapped as `{"data": "…"}`
fn answer_text(result: &Value) -> String {
    match result {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("data") {
            Some(Value::String(s)) => s.clone(),
            _ => result.to_string(),
        },
        other => other.to_string(),
    }
}

#[async_trait]
impl FlightScheduleService for VariflightSchedule {
    async fn search_flights(&self, query: &FlightQuery) -> Result<FlightSearchOutcome, DomainError> {
        let result = self
            .mcp
            .call_tool(
                "searchFlightItineraries",
                json!({
                    "depCityCode": query.dep_city_code,
                    "arrCityCode": query.arr_city_code,
                    "depDate": query.dep_date,
                }),
            )
            .await?;

        let raw_text = answer_text(&result);
        let summary = parse_flight_summary(&raw_text);
        tracing::debug!(
            "✈️  {} → {} on {}: {:?} flights",
            query.dep_city_code,
            query.arr_city_code,
            query.dep_date,
            summary.count
        );

        Ok(FlightSearchOutcome { raw_text, summary })
    }

    async fn ping(&self) -> Result<usize, DomainError> {
        Ok(self.mcp.list_tools().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};

    #[test]
    fn test_answer_text() {
        assert_eq!(answer_text(&json!("查询到了 2 条")), "查询到了 2 条");
        assert_eq!(answer_text(&json!({"data": "最低价：500元"})), "最低价：500元");
        assert_eq!(answer_text(&json!({"code": 0})), r#"{"code":0}"#);
    }

    #[tokio::test]
    async fn test_search_flights_summarises_answer() {
        let router = Router::new().route(
            "/mcp",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["params"]["name"], "searchFlightItineraries");
                assert_eq!(body["params"]["arguments"]["depCityCode"], "BJS");
                let text = json!({"data": "查询到了 5 条航班。最低价：680元\n最低价航班为：航班号：CA1234，价格：680元"});
                Json(json!({"jsonrpc": "2.0", "id": body["id"], "result": {
                    "content": [{"type": "text", "text": text.to_string()}]
                }}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let flights = VariflightSchedule::new(McpClient::new(
            "variflight",
            Some(format!("http://{addr}/mcp")),
        ));
        let outcome = flights
            .search_flights(&FlightQuery {
                dep_city_code: "BJS".into(),
                arr_city_code: "SHA".into(),
                dep_date: "2026-02-10".into(),
            })
            .await
            .unwrap();

        assert_eq!(outcome.summary.count, Some(5));
        assert_eq!(outcome.summary.min_price, Some(680));
        assert_eq!(outcome.summary.cheapest.unwrap().flight_no, "CA1234");
        assert!(outcome.raw_text.starts_with("查询到了"));
    }
}
