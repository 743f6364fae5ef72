//! ToolEnvelope - Uniform result returned by every agent tool

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{ok, data, error, source, retrieved_at}` - the shape every tool answers
/// with, so the model sees one result format regardless of the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolEnvelope {
    pub ok: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub source: String,
    pub retrieved_at: DateTime<Utc>,
}

impl ToolEnvelope {
    pub fn success(source: impl Into<String>, data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
            source: source.into(),
            retrieved_at: Utc::now(),
        }
    }

    pub fn failure(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
            source: source.into(),
            retrieved_at: Utc::now(),
        }
    }

    /// Text handed back to the model as the tool message content
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"ok":false,"error":"serialization failed: {e}"}}"#)
        })
    }

    /// `data.text` when present - most tools answer with ready-to-send prose
    pub fn text(&self) -> Option<&str> {
        self.data.as_ref()?.get("text")?.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_shape() {
        let env = ToolEnvelope::failure("amap", "city 不能为空");
        let value: Value = serde_json::from_str(&env.to_json_string()).unwrap();
        assert_eq!(value["ok"], json!(false));
        assert_eq!(value["data"], Value::Null);
        assert_eq!(value["error"], json!("city 不能为空"));
        assert_eq!(value["source"], json!("amap"));
        assert!(value["retrieved_at"].is_string());
    }

    #[test]
    fn test_text_accessor() {
        let env = ToolEnvelope::success("llm-trip", json!({"text": "成都 3 天", "mode": "plan"}));
        assert_eq!(env.text(), Some("成都 3 天"));
    }
}
