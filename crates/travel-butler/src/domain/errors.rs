//! Domain Errors
//!
//! Error types for domain operations.

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    /// The remote side could not be reached at all (connection refused,
    /// wrong port, DNS failure, timeout). Always recoverable.
    #[error("Service unreachable: {0}")]
    Unreachable(String),

    /// An optional capability whose endpoint or key was not configured.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    pub fn not_found<T: AsRef<str>>(entity_type: T, id: &str) -> Self {
        Self::NotFound {
            entity_type: entity_type.as_ref().to_string(),
            id: id.to_string(),
        }
    }

    /// Whether the failure reflects an auxiliary service being down rather
    /// than a bad request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DomainError::Unreachable(_)
                | DomainError::NotConfigured(_)
                | DomainError::ExternalService(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DomainError::not_found("Session", "abc");
        assert_eq!(err.to_string(), "Entity not found: Session with id abc");
    }

    #[test]
    fn test_unreachable_is_recoverable() {
        assert!(DomainError::Unreachable("connection refused".into()).is_recoverable());
        assert!(!DomainError::Validation("bad".into()).is_recoverable());
    }
}
