//! Travel Butler API Client

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// API Client for the Travel Butler server
pub struct ButlerClient {
    client: Client,
    base_url: String,
}

/// Non-2xx answer from the server
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "API error ({}): {}", self.status, self.body)
    }
}

impl std::error::Error for ApiError {}

/// Server answered 404, e.g. a session lost on restart
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ApiError>()
        .is_some_and(|e| e.status == StatusCode::NOT_FOUND)
}

// ============================================
// API Request / Response Types
// ============================================

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct StartChatResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
struct ChatMessageRequest<'a> {
    session_id: &'a str,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessageResponse {
    pub session_id: String,
    pub reply: String,
    #[serde(default)]
    pub profile: Value,
}

#[derive(Debug, Serialize)]
struct TransportCompareRequest<'a> {
    departure: &'a str,
    destination: &'a str,
    date: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    transport_types: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransportCompareResponse {
    pub status: String,
    pub data: Value,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

impl ButlerClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T> {
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError { status, body }.into());
        }
        resp.json().await.context("Failed to parse response")
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .context("Failed to connect to Travel Butler API")?;
        Self::parse(resp).await
    }

    /// Health check
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = format!("{}/health", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to connect to Travel Butler API")?;
        Self::parse(resp).await
    }

    /// Open a chat session
    pub async fn start_chat(&self) -> Result<String> {
        let resp: StartChatResponse = self.post("/chat/start", &serde_json::json!({})).await?;
        Ok(resp.session_id)
    }

    /// Send one chat message
    pub async fn send_message(&self, session_id: &str, message: &str) -> Result<ChatMessageResponse> {
        self.post(
            "/chat/message",
            &ChatMessageRequest {
                session_id,
                message,
            },
        )
        .await
    }

    /// Send one chat message, opening a new session when the server no longer
    /// knows `session_id`. The second value is the new session id, if any.
    pub async fn send_or_restart(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<(ChatMessageResponse, Option<String>)> {
        match self.send_message(session_id, message).await {
            Err(e) if is_not_found(&e) => {
                let fresh = self.start_chat().await?;
                let reply = self.send_message(&fresh, message).await?;
                Ok((reply, Some(fresh)))
            }
            other => other.map(|reply| (reply, None)),
        }
    }

    /// Compare trains and flights for one leg
    pub async fn compare_transport(
        &self,
        departure: &str,
        destination: &str,
        date: &str,
        modes: Vec<String>,
    ) -> Result<TransportCompareResponse> {
        self.post(
            "/transport/compare",
            &TransportCompareRequest {
                departure,
                destination,
                date,
                transport_types: modes,
            },
        )
        .await
    }

    /// Web search
    pub async fn search(&self, query: &str, max_results: Option<usize>) -> Result<SearchResponse> {
        self.post("/search", &SearchRequest { query, max_results })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;

    async fn spawn_fake() -> String {
        let router = Router::new()
            .route(
                "/health",
                get(|| async {
                    Json(json!({"status": "ok", "message": "running", "version": "0.1.0"}))
                }),
            )
            .route(
                "/chat/start",
                post(|| async { Json(json!({"session_id": "s-1"})) }),
            )
            .route(
                "/chat/message",
                post(|Json(body): Json<Value>| async move {
                    if body["session_id"] == "s-1" {
                        Ok(Json(json!({
                            "session_id": "s-1",
                            "reply": format!("收到：{}", body["message"].as_str().unwrap_or("")),
                            "profile": {"destination": "成都"}
                        })))
                    } else {
                        Err((StatusCode::NOT_FOUND, "会话不存在或已过期，请重新 start"))
                    }
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_chat_round_trip() {
        let client = ButlerClient::new(&spawn_fake().await);

        assert_eq!(client.health().await.unwrap().status, "ok");
        let session = client.start_chat().await.unwrap();
        let reply = client.send_message(&session, "去成都").await.unwrap();
        assert_eq!(reply.reply, "收到：去成都");
        assert_eq!(reply.profile["destination"], "成都");
    }

    #[tokio::test]
    async fn test_api_error_carries_status_and_body() {
        let client = ButlerClient::new(&spawn_fake().await);

        let err = client.send_message("gone", "hi").await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("404"), "{text}");
        assert!(text.contains("请重新 start"), "{text}");
        assert!(is_not_found(&err));
    }

    #[tokio::test]
    async fn test_stale_session_is_replaced() {
        let client = ButlerClient::new(&spawn_fake().await);

        let (reply, fresh) = client.send_or_restart("gone", "去成都").await.unwrap();
        assert_eq!(fresh.as_deref(), Some("s-1"));
        assert_eq!(reply.session_id, "s-1");
        assert_eq!(reply.reply, "收到：去成都");

        let (_, fresh) = client.send_or_restart("s-1", "再来").await.unwrap();
        assert!(fresh.is_none());
    }
}
