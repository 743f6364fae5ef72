//! Web Search Service Port
//!
//! Abstract interface for web search operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Search result from web search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub score: Option<f64>,
}

/// Answer plus ranked results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchResponse {
    pub query: String,
    /// Short synthesized answer, when the backend provides one
    pub answer: Option<String>,
    pub results: Vec<WebSearchResult>,
}

/// Service interface for web search operations
#[async_trait]
pub trait WebSearchService: Send + Sync {
    /// Search the web for a query
    async fn search(&self, query: &str, limit: usize) -> Result<WebSearchResponse, DomainError>;
}
