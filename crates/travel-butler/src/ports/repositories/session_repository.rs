//! Session Repository Port
//!
//! Abstract interface for chat session persistence.

use async_trait::async_trait;

use crate::domain::{errors::DomainError, ChatSession};

/// Repository interface for chat sessions
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create and store a fresh session
    async fn create(&self) -> Result<ChatSession, DomainError>;

    /// Find a live session; expired sessions are reported as absent
    async fn load(&self, id: &str) -> Result<Option<ChatSession>, DomainError>;

    /// Save a session, refreshing its last-activity time
    async fn save(&self, session: &ChatSession) -> Result<(), DomainError>;

    /// Drop expired sessions, returning how many were removed
    async fn purge_expired(&self) -> Result<usize, DomainError> {
        Ok(0)
    }
}
