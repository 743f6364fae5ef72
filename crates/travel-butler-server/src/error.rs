//! Server Errors
//!
//! Startup failures and the mapping from domain errors to HTTP responses.

use std::net::SocketAddr;

use axum::http::StatusCode;
use thiserror::Error;
use travel_butler::DomainError;

use crate::config::ConfigError;

/// Fatal startup / serving errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to initialise backends: {0}")]
    Init(#[from] DomainError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Route error type used by every handler
pub type ApiError = (StatusCode, String);

/// Status code for a domain error
pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::ExternalService(_) | DomainError::Parse(_) => StatusCode::BAD_GATEWAY,
        DomainError::Unreachable(_) | DomainError::NotConfigured(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// `map_err` adapter for handlers
pub fn api_error(err: DomainError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::warn!("Request failed: {}", err);
    }
    (status, err.to_string())
}
