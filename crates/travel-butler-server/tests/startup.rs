//! Startup contract: configuration, listener binding and side-process reachability

use std::net::SocketAddr;

use axum::{routing::post, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use travel_butler::{DomainError, TrainScheduleService};
use travel_butler_server::adapters::{McpClient, RailSchedule};
use travel_butler_server::config::{ConfigError, Settings};
use travel_butler_server::error::ServerError;
use travel_butler_server::{bind_listener, build_router, serve, AppState};

fn settings_with(extra: &[(&str, String)]) -> Settings {
    let mut pairs: Vec<(String, String)> = vec![
        ("DEEPSEEK_API_KEY".into(), "sk-test".into()),
        ("DEEPSEEK_BASE_URL".into(), "http://127.0.0.1:9/v1".into()),
        ("TAVILY_API_KEY".into(), "tvly-test".into()),
        ("PROJECT_NAME".into(), "出行管家测试".into()),
    ];
    pairs.extend(extra.iter().map(|(k, v)| (k.to_string(), v.clone())));
    Settings::from_source(|key| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap()
}

/// Minimal MCP side-process answering `tools/list`
async fn spawn_fake_mcp() -> String {
    let router = Router::new().route(
        "/mcp",
        post(|Json(body): Json<Value>| async move {
            Json(json!({
                "jsonrpc": "2.0",
                "id": body["id"],
                "result": {"tools": [
                    {"name": "get-tickets"},
                    {"name": "get-station-code-of-citys"},
                    {"name": "get-stations-code-in-city"}
                ]}
            }))
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/mcp", addr)
}

/// An address nothing listens on
async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn spawn_app(settings: Settings) -> SocketAddr {
    let state = AppState::from_settings(settings).unwrap();
    let listener = bind_listener("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, build_router(state)));
    addr
}

#[test]
fn test_missing_required_key_fails_fast() {
    let err = Settings::from_source(|_| None).unwrap_err();
    assert!(matches!(err, ConfigError::Missing("DEEPSEEK_API_KEY")));

    let err = Settings::from_source(|key| match key {
        "DEEPSEEK_API_KEY" | "DEEPSEEK_BASE_URL" => Some("x".into()),
        "TAVILY_API_KEY" => Some("   ".into()),
        _ => None,
    })
    .unwrap_err();
    assert!(err.to_string().contains("TAVILY_API_KEY"));
}

#[tokio::test]
async fn test_bound_listener_serves_welcome() {
    let addr = spawn_app(settings_with(&[])).await;

    let body: Value = reqwest::get(format!("http://{}/", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], "欢迎来到 出行管家测试 后端接口");
}

#[tokio::test]
async fn test_bind_conflict_is_fatal() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap();

    let err = bind_listener(addr).await.unwrap_err();
    match err {
        ServerError::Bind { addr: failed, .. } => assert_eq!(failed, addr),
        other => panic!("expected bind error, got {other}"),
    }
}

#[tokio::test]
async fn test_side_process_reachability() {
    let url = spawn_fake_mcp().await;
    let rail = RailSchedule::new(McpClient::new("12306", Some(url)));
    assert_eq!(rail.ping().await.unwrap(), 3);

    let wrong_port = format!("http://{}/mcp", closed_addr().await);
    let rail = RailSchedule::new(McpClient::new("12306", Some(wrong_port)));
    let err = rail.ping().await.unwrap_err();
    assert!(matches!(err, DomainError::Unreachable(_)), "{err}");
}

#[tokio::test]
async fn test_transit_health_reports_down_side_process() {
    let rail_url = spawn_fake_mcp().await;
    let flight_url = format!("http://{}/mcp", closed_addr().await);
    let addr = spawn_app(settings_with(&[
        ("MCP_12306_REMOTE_URL", rail_url.clone()),
        ("MCP_VARIFLIGHT_REMOTE_URL", flight_url),
    ]))
    .await;

    let response = reqwest::get(format!("http://{}/health/transit", addr))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["rail"]["reachable"], true);
    assert_eq!(body["rail"]["url"], rail_url.as_str());
    assert_eq!(body["flight"]["reachable"], false);
    assert!(body["flight"]["error"].is_string());
}

#[tokio::test]
async fn test_unconfigured_side_process_is_not_reachable() {
    let addr = spawn_app(settings_with(&[])).await;

    let body: Value = reqwest::get(format!("http://{}/health/transit", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["rail"]["reachable"], false);
    assert!(body["rail"]["url"].is_null());
    assert!(body["rail"]["error"]
        .as_str()
        .unwrap()
        .contains("Not configured"));
}
