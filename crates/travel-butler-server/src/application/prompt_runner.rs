//! Prompt Runner - render a named template and complete it

use std::collections::HashMap;
use std::sync::Arc;

use travel_butler::domain::services::TemplateRegistry;
use travel_butler::{CompletionOptions, DomainError, LlmProvider};

pub const DEFAULT_TEMPERATURE: f32 = 0.6;

pub struct PromptRunner {
    llm: Arc<dyn LlmProvider>,
    templates: TemplateRegistry,
}

impl PromptRunner {
    pub fn new(llm: Arc<dyn LlmProvider>, templates: TemplateRegistry) -> Self {
        Self { llm, templates }
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Missing variables are a `Validation` error, unknown names `NotFound`
    pub async fn run(
        &self,
        name: &str,
        vars: &HashMap<String, String>,
        temperature: Option<f32>,
    ) -> Result<String, DomainError> {
        let messages = self.templates.render(name, vars)?;
        let options =
            CompletionOptions::with_temperature(temperature.unwrap_or(DEFAULT_TEMPERATURE));
        tracing::info!("📝 Running prompt '{}'", name);
        let response = self.llm.complete(&messages, &options).await?;
        Ok(response.content)
    }
}
