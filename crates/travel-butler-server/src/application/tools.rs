//! Agent Tools
//!
//! Functions the chat model may call. Every tool answers with a
//! [`ToolEnvelope`]; failures are reported inside the envelope so the model
//! can explain them instead of the turn failing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use travel_butler::{ToolEnvelope, ToolSpec, UserProfile};

/// Per-turn context handed to every tool call
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Profile as known at the start of the turn
    pub profile: UserProfile,
}

impl ToolContext {
    /// `profile_json` argument if the model passed one, else the session profile
    pub fn profile_json(&self, explicit: Option<&str>) -> String {
        match explicit.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s.to_string(),
            None => self.profile.to_json_string(),
        }
    }
}

/// A model-callable function
#[async_trait]
pub trait AgentTool: Send + Sync {
    /// Name, description and JSON schema advertised to the model
    fn spec(&self) -> ToolSpec;

    /// Run with already-parsed JSON arguments
    async fn call(&self, args: Value, ctx: &ToolContext) -> ToolEnvelope;
}

/// Tools available to the chat runtime, looked up by name
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn AgentTool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn AgentTool>) {
        let name = tool.spec().name;
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, tool);
    }

    pub fn with(mut self, tool: Arc<dyn AgentTool>) -> Self {
        self.register(tool);
        self
    }

    /// Specs in registration order
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.spec())
            .collect()
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Execute a tool call as the model requested it (raw JSON argument text)
    pub async fn execute(&self, name: &str, arguments: &str, ctx: &ToolContext) -> ToolEnvelope {
        let Some(tool) = self.tools.get(name) else {
            return ToolEnvelope::failure("agent", format!("unknown tool: {name}"));
        };

        let args = if arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            match serde_json::from_str::<Value>(arguments) {
                Ok(v @ Value::Object(_)) => v,
                Ok(_) => {
                    return ToolEnvelope::failure(name, "tool arguments must be a JSON object")
                }
                Err(e) => {
                    return ToolEnvelope::failure(name, format!("invalid tool arguments: {e}"))
                }
            }
        };

        tracing::info!("🔧 Tool call: {}", name);
        let envelope = tool.call(args, ctx).await;
        if !envelope.ok {
            tracing::warn!("⚠️  Tool {} failed: {:?}", name, envelope.error);
        }
        envelope
    }
}

/// Parse a tool's typed arguments, turning serde errors into an envelope
pub fn parse_args<T>(source: &str, args: Value) -> Result<T, ToolEnvelope>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_value(args)
        .map_err(|e| ToolEnvelope::failure(source, format!("invalid tool arguments: {e}")))
}

/// Accepts `3`, `3.0` or `"3"`; models are loose about numeric types
pub fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Accepts booleans and the strings `"true"` / `"false"`
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}
