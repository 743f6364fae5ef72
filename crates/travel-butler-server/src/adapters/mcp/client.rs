//! JSON-RPC client for an MCP Streamable HTTP endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::{json, Value};

use travel_butler::DomainError;

const REQUEST_TIMEOUT_SECS: u64 = 45;
const SESSION_HEADER: &str = "mcp-session-id";

/// Client for one MCP endpoint.
///
/// Cloning shares the HTTP connection pool and the remembered session id.
#[derive(Clone)]
pub struct McpClient {
    client: Client,
    label: String,
    base_url: Option<String>,
    session_id: Arc<Mutex<Option<String>>>,
    next_id: Arc<AtomicU64>,
}

impl McpClient {
    /// `base_url` is the full endpoint, e.g. `http://127.0.0.1:8080/mcp`.
    /// `None` leaves the client unconfigured; every call then fails with
    /// [`DomainError::NotConfigured`].
    pub fn new(label: impl Into<String>, base_url: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            label: label.into(),
            base_url: base_url.filter(|u| !u.trim().is_empty()),
            session_id: Arc::new(Mutex::new(None)),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    fn current_session(&self) -> Option<String> {
        self.session_id.lock().ok().and_then(|guard| guard.clone())
    }

    fn remember_session(&self, value: &HeaderValue) {
        if let (Ok(id), Ok(mut guard)) = (value.to_str(), self.session_id.lock()) {
            *guard = Some(id.to_string());
        }
    }

    /// Send one JSON-RPC request and return the response object
    pub async fn rpc(&self, method: &str, params: Option<Value>) -> Result<Value, DomainError> {
        let url = self.base_url.as_deref().ok_or_else(|| {
            DomainError::NotConfigured(format!("{} MCP endpoint is not configured", self.label))
        })?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        let mut payload = json!({"jsonrpc": "2.0", "id": id, "method": method});
        if let Some(params) = params {
            payload["params"] = params;
        }

        let mut request = self
            .client
            .post(url)
            .header(ACCEPT, "application/json, text/event-stream")
            .header(CONTENT_TYPE, "application/json")
            .json(&payload);
        if let Some(session) = self.current_session() {
            request = request.header(SESSION_HEADER, session);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!("⚠️  {} MCP request failed: {}", self.label, e);
            if e.is_connect() || e.is_timeout() || e.is_request() {
                DomainError::Unreachable(format!("{} MCP unreachable at {url}: {e}", self.label))
            } else {
                DomainError::ExternalService(format!("{} MCP request failed: {e}", self.label))
            }
        })?;

        if let Some(session) = response.headers().get(SESSION_HEADER) {
            self.remember_session(session);
        }

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DomainError::ExternalService(format!("failed to read MCP body: {e}")))?;

        if status.as_u16() >= 400 {
            return Err(DomainError::ExternalService(format!(
                "{} MCP HTTP {}",
                self.label,
                status.as_u16()
            )));
        }

        let data = match serde_json::from_str::<Value>(&text) {
            Ok(value) => Some(value),
            Err(_) => parse_sse_json(&text),
        }
        .filter(Value::is_object)
        .ok_or_else(|| DomainError::Parse(format!("无法解析 MCP 响应: {}", preview(&text))))?;

        if let Some(error) = data.get("error").filter(|e| !e.is_null()) {
            return Err(DomainError::ExternalService(format!(
                "{} MCP error: {error}",
                self.label
            )));
        }

        Ok(data)
    }

    /// `tools/list` - the tool descriptors the side-process offers
    pub async fn list_tools(&self) -> Result<Vec<Value>, DomainError> {
        let data = self.rpc("tools/list", None).await?;
        Ok(data
            .pointer("/result/tools")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    /// `tools/call` - returns the unwrapped tool result (see [`extract_result`])
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, DomainError> {
        tracing::debug!("{} MCP tools/call {}", self.label, name);
        let data = self
            .rpc("tools/call", Some(json!({"name": name, "arguments": arguments})))
            .await?;
        Ok(extract_result(&data))
    }
}

/// First parseable `data:` line of a server-sent-events body
fn parse_sse_json(text: &str) -> Option<Value> {
    if !text.contains("data:") {
        return None;
    }
    text.lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .find(|raw| !raw.is_empty())
        .and_then(|raw| serde_json::from_str(raw).ok())
}

/// Unwrap a `tools/call` response.
///
/// `result.content[0].text` is parsed as JSON when possible and returned as
/// a string otherwise; without text content the bare `result` is returned.
pub fn extract_result(rpc: &Value) -> Value {
    let result = rpc.get("result").cloned().unwrap_or(Value::Null);
    match result.pointer("/content/0/text").and_then(Value::as_str) {
        Some(text) => serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())),
        None => result,
    }
}

fn preview(text: &str) -> String {
    text.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::post,
        Json, Router,
    };

    /// Fake MCP endpoint: `tools/list` answers as SSE, `tools/call` echoes
    /// the arguments as text content, unknown methods return a JSON-RPC error.
    async fn spawn_fake() -> String {
        let router = Router::new().route(
            "/mcp",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let id = body["id"].clone();
                let session = headers
                    .get(SESSION_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("none")
                    .to_string();
                match body["method"].as_str() {
                    Some("tools/list") => {
                        let rpc = json!({"jsonrpc": "2.0", "id": id, "result": {"tools": [
                            {"name": "get-tickets"}, {"name": "whoami"}
                        ]}});
                        let sse = format!("event: message\ndata: {rpc}\n\n");
                        (
                            [(SESSION_HEADER, "session-1"), ("content-type", "text/event-stream")],
                            sse,
                        )
                            .into_response()
                    }
                    Some("tools/call") => {
                        let text = if body["params"]["name"] == "whoami" {
                            session
                        } else {
                            body["params"]["arguments"].to_string()
                        };
                        Json(json!({"jsonrpc": "2.0", "id": id, "result": {
                            "content": [{"type": "text", "text": text}]
                        }}))
                        .into_response()
                    }
                    _ => Json(json!({"jsonrpc": "2.0", "id": id, "error": {
                        "code": -32601, "message": "Method not found"
                    }}))
                    .into_response(),
                }
            }),
        )
        .route(
            "/broken",
            post(|| async { Response::new(axum::body::Body::from("<html>oops</html>")) }),
        )
        .route("/down", post(|| async { StatusCode::BAD_GATEWAY }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_list_tools_over_sse_and_session_echo() {
        let base = spawn_fake().await;
        let client = McpClient::new("12306", Some(format!("{base}/mcp")));

        let tools = client.list_tools().await.unwrap();
        assert_eq!(tools.len(), 2);

        let who = client.call_tool("whoami", json!({})).await.unwrap();
        assert_eq!(who, json!("session-1"));
    }

    #[tokio::test]
    async fn test_call_tool_parses_text_content_as_json() {
        let base = spawn_fake().await;
        let client = McpClient::new("12306", Some(format!("{base}/mcp")));
        let result = client
            .call_tool("get-tickets", json!({"date": "2026-02-10"}))
            .await
            .unwrap();
        assert_eq!(result["date"], "2026-02-10");
    }

    #[tokio::test]
    async fn test_rpc_error_member() {
        let base = spawn_fake().await;
        let client = McpClient::new("12306", Some(format!("{base}/mcp")));
        let err = client.rpc("resources/list", None).await.unwrap_err();
        assert!(matches!(err, DomainError::ExternalService(_)));
    }

    #[tokio::test]
    async fn test_unparseable_and_http_errors() {
        let base = spawn_fake().await;
        let broken = McpClient::new("x", Some(format!("{base}/broken")));
        assert!(matches!(
            broken.list_tools().await.unwrap_err(),
            DomainError::Parse(_)
        ));

        let down = McpClient::new("x", Some(format!("{base}/down")));
        let err = down.list_tools().await.unwrap_err();
        assert!(err.to_string().contains("HTTP 502"));
    }

    #[tokio::test]
    async fn test_unconfigured() {
        let client = McpClient::new("variflight", None);
        assert!(matches!(
            client.list_tools().await.unwrap_err(),
            DomainError::NotConfigured(_)
        ));
    }

    #[tokio::test]
    async fn test_wrong_port_is_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = McpClient::new("12306", Some(format!("http://{addr}/mcp")));
        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(err, DomainError::Unreachable(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_extract_result() {
        let rpc = json!({"result": {"content": [{"text": "[1,2]"}]}});
        assert_eq!(extract_result(&rpc), json!([1, 2]));

        let rpc = json!({"result": {"content": [{"text": "查询到了 3 条"}]}});
        assert_eq!(extract_result(&rpc), json!("查询到了 3 条"));

        let rpc = json!({"result": {"tools": []}});
        assert_eq!(extract_result(&rpc), json!({"tools": []}));
    }

    #[test]
    fn test_parse_sse_json() {
        let body = "event: message\ndata: {\"a\":1}\n\n";
        assert_eq!(parse_sse_json(body), Some(json!({"a": 1})));
        assert_eq!(parse_sse_json("{\"a\":1}"), None);
    }
}
