//! Tavily web search client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use travel_butler::{DomainError, WebSearchResponse, WebSearchResult, WebSearchService};

const BASE_URL: &str = "https://api.tavily.com";
const TIMEOUT_SECS: u64 = 30;

/// Client for Tavily's `/search` endpoint
#[derive(Clone)]
pub struct TavilySearch {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TavilySearch {
    /// Creates a new client using the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at another host (tests, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl WebSearchService for TavilySearch {
    async fn search(&self, query: &str, limit: usize) -> Result<WebSearchResponse, DomainError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Validation("Search query cannot be empty".into()));
        }

        let request = SearchRequest {
            api_key: &self.api_key,
            query: trimmed,
            max_results: limit.clamp(1, 20),
            include_answer: true,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                if err.is_connect() || err.is_timeout() {
                    DomainError::Unreachable(format!("Tavily unreachable: {err}"))
                } else {
                    DomainError::ExternalService(format!("Request failed: {err}"))
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(DomainError::ExternalService("rate limited".into()));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(DomainError::ExternalService(format!(
                "Tavily API error ({}): {}",
                status.as_u16(),
                body
            )));
        }

        let payload: SearchResponse = response
            .json()
            .await
            .map_err(|err| DomainError::Parse(err.to_string()))?;

        tracing::debug!("Tavily returned {} results for {:?}", payload.results.len(), trimmed);

        Ok(WebSearchResponse {
            query: trimmed.to_string(),
            answer: payload.answer.filter(|a| !a.trim().is_empty()),
            results: payload
                .results
                .into_iter()
                .map(|r| WebSearchResult {
                    title: r.title,
                    url: r.url,
                    snippet: r.content,
                    score: r.score,
                })
                .collect(),
        })
    }
}

// ============================================
// Request/Response Types
// ============================================

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    include_answer: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: Option<f64>,
}
