//! In-memory session repository.
//!
//! Single-process only; sessions vanish on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use travel_butler::{ChatSession, DomainError, SessionRepository};

/// [`SessionRepository`] keeping sessions in a map with idle expiry
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, ChatSession>>,
    ttl_secs: u64,
}

impl InMemorySessionRepository {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl_secs,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self) -> Result<ChatSession, DomainError> {
        let session = ChatSession::new();
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        tracing::info!("💬 Session created: {}", session.id);
        Ok(session)
    }

    async fn load(&self, id: &str) -> Result<Option<ChatSession>, DomainError> {
        let now = Utc::now();
        let expired = match self.sessions.read().await.get(id) {
            None => return Ok(None),
            Some(session) if !session.is_expired(self.ttl_secs, now) => {
                return Ok(Some(session.clone()))
            }
            Some(_) => true,
        };

        if expired {
            self.sessions.write().await.remove(id);
            tracing::debug!("Session expired: {}", id);
        }
        Ok(None)
    }

    async fn save(&self, session: &ChatSession) -> Result<(), DomainError> {
        let mut stored = session.clone();
        stored.updated_at = Utc::now();
        self.sessions.write().await.insert(stored.id.clone(), stored);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, DomainError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(self.ttl_secs, now));
        Ok(before - sessions.len())
    }
}
