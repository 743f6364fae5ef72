//! ChatSession - Server-side conversation state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChatMessage, UserProfile};

/// Conversation state kept between `/chat/message` calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub profile: UserProfile,
    pub history: Vec<ChatMessage>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Create a fresh session with a random UUID
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            profile: UserProfile::default(),
            history: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Whether the session has been idle longer than `ttl_secs`
    pub fn is_expired(&self, ttl_secs: u64, now: DateTime<Utc>) -> bool {
        let idle = now.signed_duration_since(self.updated_at);
        idle.num_seconds() > ttl_secs as i64
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
