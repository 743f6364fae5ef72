//! Profile Extractor
//!
//! Asks the LLM to pull travel conditions out of one user message.

use std::sync::Arc;

use chrono::NaiveDate;

use travel_butler::domain::services::{parse_profile_update, render_extract_prompt};
use travel_butler::{LlmProvider, ProfileUpdate};

const EXTRACT_TEMPERATURE: f32 = 0.0;

pub struct ProfileExtractor {
    llm: Arc<dyn LlmProvider>,
}

impl ProfileExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Extract an update; a failed LLM call yields an empty update so the
    /// chat turn can still proceed
    pub async fn extract(&self, user_text: &str, today: NaiveDate) -> ProfileUpdate {
        let prompt = render_extract_prompt(user_text, today);
        match self.llm.complete_simple(&prompt, EXTRACT_TEMPERATURE).await {
            Ok(output) => {
                let update = parse_profile_update(&output, user_text, today);
                tracing::debug!(?update, "🔍 Profile update extracted");
                update
            }
            Err(e) => {
                tracing::warn!("⚠️  Profile extraction failed: {}", e);
                ProfileUpdate::default()
            }
        }
    }
}
