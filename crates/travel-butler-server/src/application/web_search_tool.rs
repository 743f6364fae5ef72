//! `web_search` tool over the configured search service

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use travel_butler::{ToolEnvelope, ToolSpec, WebSearchService};

use super::tools::{lenient_int, parse_args, AgentTool, ToolContext};

const SOURCE: &str = "tavily";
pub const DEFAULT_MAX_RESULTS: i64 = 5;

#[derive(Debug, Deserialize)]
struct SearchArgs {
    #[serde(default)]
    query: String,
    #[serde(default, deserialize_with = "lenient_int")]
    max_results: Option<i64>,
}

pub struct WebSearchTool {
    search: Arc<dyn WebSearchService>,
}

impl WebSearchTool {
    pub fn new(search: Arc<dyn WebSearchService>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl AgentTool for WebSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "web_search".into(),
            description: "联网搜索最新信息（如开放时间、活动、政策），返回摘要答案与来源链接。".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "max_results": {"type": "integer", "default": DEFAULT_MAX_RESULTS}
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Value, _ctx: &ToolContext) -> ToolEnvelope {
        let args: SearchArgs = match parse_args(SOURCE, args) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        let limit = args.max_results.unwrap_or(DEFAULT_MAX_RESULTS).clamp(1, 20) as usize;

        match self.search.search(&args.query, limit).await {
            Ok(response) => match serde_json::to_value(&response) {
                Ok(data) => ToolEnvelope::success(SOURCE, data),
                Err(e) => ToolEnvelope::failure(SOURCE, e.to_string()),
            },
            Err(e) => ToolEnvelope::failure(SOURCE, e.to_string()),
        }
    }
}
