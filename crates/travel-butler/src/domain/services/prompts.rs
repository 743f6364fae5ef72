//! Prompt Templates
//!
//! Named chat templates with `{var}` placeholders. Rendering checks that
//! every placeholder has a value before anything is sent to a model.

use std::collections::{BTreeSet, HashMap};

use crate::domain::entities::{ChatMessage, MessageRole};
use crate::domain::errors::DomainError;

/// A template made of role-tagged message bodies
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub name: String,
    pub messages: Vec<(MessageRole, String)>,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, messages: Vec<(MessageRole, String)>) -> Self {
        Self {
            name: name.into(),
            messages,
        }
    }

    /// Placeholder names in order of first appearance, deduplicated
    pub fn variables(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for (_, body) in &self.messages {
            for var in placeholders(body) {
                if seen.insert(var.clone()) {
                    out.push(var);
                }
            }
        }
        out
    }

    /// Substitute every placeholder. Extra variables are ignored.
    pub fn render(&self, vars: &HashMap<String, String>) -> Result<Vec<ChatMessage>, DomainError> {
        let missing: Vec<String> = self
            .variables()
            .into_iter()
            .filter(|v| !vars.contains_key(v))
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::Validation(format!(
                "missing var: {}",
                missing.join(", ")
            )));
        }

        Ok(self
            .messages
            .iter()
            .map(|(role, body)| {
                let mut text = body.clone();
                for (key, value) in vars {
                    text = text.replace(&format!("{{{key}}}"), value);
                }
                ChatMessage {
                    role: *role,
                    content: text,
                    tool_calls: Vec::new(),
                    tool_call_id: None,
                }
            })
            .collect())
    }
}

fn placeholders(body: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        let name = &after[..end];
        if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            out.push(name.to_string());
        }
        rest = &after[end + 1..];
    }
    out
}

/// Lookup table of named templates
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, PromptTemplate>,
}

impl TemplateRegistry {
    /// Registry with the built-in templates
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register(PromptTemplate::new(
            "travel_plan",
            vec![
                (
                    MessageRole::System,
                    "你是智能出行规划助理，输出简洁可执行的行程方案。".to_string(),
                ),
                (
                    MessageRole::User,
                    "出行地：{city}\n天数：{days} 天\n偏好：{preferences}\n预算：{budget}\n\
                     请输出分日程表，附交通/餐饮/住宿建议。"
                        .to_string(),
                ),
            ],
        ));
        registry
    }

    pub fn register(&mut self, template: PromptTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    pub fn get(&self, name: &str) -> Option<&PromptTemplate> {
        self.templates.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Render a named template
    pub fn render(
        &self,
        name: &str,
        vars: &HashMap<String, String>,
    ) -> Result<Vec<ChatMessage>, DomainError> {
        self.get(name)
            .ok_or_else(|| DomainError::not_found("PromptTemplate", name))?
            .render(vars)
    }
}
