//! Chat Runtime
//!
//! One conversational turn: refresh the session profile from the user's
//! message, then let the model answer, calling tools as it sees fit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDate};
use serde::Serialize;

use travel_butler::{
    ChatMessage, CompletionOptions, DomainError, LlmProvider, SessionRepository, UserProfile,
};

use super::profile_service::ProfileExtractor;
use super::tools::{ToolContext, ToolRegistry};

pub const DEFAULT_MAX_ROUNDS: usize = 8;
const CHAT_TEMPERATURE: f32 = 0.3;

pub const EXPIRED_SESSION: &str = "会话不存在或已过期，请重新 start";
const ROUND_LIMIT_REPLY: &str =
    "抱歉，这个问题需要的查询步骤太多，我暂时没能整理出结果。可以换个说法，或者把问题拆开一步步来问我。";

/// Standing instructions for the travel assistant
pub const SYSTEM_PROMPT: &str = "你是「AI 智能出行管家」，一名耐心、务实的中文旅行助手，帮助用户完成从选目的地、比交通、定酒店到排行程的全过程。

工作方式：
- 系统会在每轮对话附上“今天的日期”和“当前已知用户条件”（profile）。涉及日期的推断以此为准，不要重复询问 profile 里已有的信息。
- 需要真实数据时优先调用工具，不要凭记忆编造价格、车次、航班号、营业时间或地址：
  - compare_transport：出发城市、目的地和出发日期齐全后，查询火车与航班并比价；
  - recommend_and_plan_trip：推荐目的地（recommend）、为已定目的地排行程（plan）或一键推荐并规划（one_click）；
  - recommend_hotels_nearby：在某个地点附近找酒店并分析周边交通与配套；
  - search_hot_scenic_spots：查询城市热门景点；
  - web_search：查询需要联网的最新信息。
- 工具返回 ok=false 时，如实告诉用户哪里出了问题，并给出下一步建议；不要假装查到了数据。
- 工具返回的 data.text 通常可以直接作为回答主体，可适当精简，但不要改动其中的数据。
- 信息不足时，一次最多追问 2 个关键问题。
- 只输出纯文本，不要输出 JSON 或代码块。";

/// Result of one chat turn
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub session_id: String,
    pub reply: String,
    pub profile: UserProfile,
}

pub struct ChatRuntime {
    llm: Arc<dyn LlmProvider>,
    sessions: Arc<dyn SessionRepository>,
    extractor: ProfileExtractor,
    tools: ToolRegistry,
    max_rounds: usize,
    /// Held for a whole turn so one session runs one turn at a time
    turn_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ChatRuntime {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        sessions: Arc<dyn SessionRepository>,
        tools: ToolRegistry,
    ) -> Self {
        Self {
            extractor: ProfileExtractor::new(llm.clone()),
            llm,
            sessions,
            tools,
            max_rounds: DEFAULT_MAX_ROUNDS,
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Open a new session and return its id
    pub async fn start(&self) -> Result<String, DomainError> {
        let session = self.sessions.create().await?;
        tracing::info!("💬 Chat session started: {}", session.id);
        Ok(session.id)
    }

    pub async fn send(&self, session_id: &str, message: &str) -> Result<ChatReply, DomainError> {
        self.send_on(session_id, message, Local::now().date_naive())
            .await
    }

    /// Run a turn as if today were `today`
    pub async fn send_on(
        &self,
        session_id: &str,
        message: &str,
        today: NaiveDate,
    ) -> Result<ChatReply, DomainError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(DomainError::Validation("message 不能为空".to_string()));
        }

        let lock = self.turn_lock(session_id);
        let result = {
            let _turn = lock.lock().await;
            self.run_turn(session_id, message, today).await
        };
        drop(lock);
        self.release_turn_lock(session_id);
        result
    }

    fn turn_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .turn_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(session_id.to_string()).or_default().clone()
    }

    /// Forget the lock once no other turn holds or waits on it
    fn release_turn_lock(&self, session_id: &str) {
        let mut locks = self
            .turn_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if locks
            .get(session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(session_id);
        }
    }

    async fn run_turn(
        &self,
        session_id: &str,
        message: &str,
        today: NaiveDate,
    ) -> Result<ChatReply, DomainError> {
        let mut session = self
            .sessions
            .load(session_id)
            .await?
            .ok_or_else(|| DomainError::not_found("ChatSession", session_id))?;

        let update = self.extractor.extract(message, today).await;
        session.profile.merge(update);

        let context = [
            ChatMessage::system(format!(
                "今天的日期是：{}（请你在回答天气/行程时以此为准）",
                today.format("%Y-%m-%d")
            )),
            ChatMessage::system(format!(
                "当前已知用户条件为：{}",
                session.profile.to_json_string()
            )),
        ];
        let ctx = ToolContext {
            profile: session.profile.clone(),
        };
        let options = CompletionOptions::with_temperature(CHAT_TEMPERATURE).tools(self.tools.specs());

        let mut turn = vec![ChatMessage::user(message)];
        let mut reply = None;

        for round in 1..=self.max_rounds {
            let mut messages = Vec::with_capacity(session.history.len() + turn.len() + 3);
            messages.push(ChatMessage::system(SYSTEM_PROMPT));
            messages.extend(session.history.iter().cloned());
            messages.extend(context.iter().cloned());
            messages.extend(turn.iter().cloned());

            let response = self.llm.complete(&messages, &options).await?;
            if response.tool_calls.is_empty() {
                turn.push(ChatMessage::assistant(response.content.clone()));
                reply = Some(response.content);
                break;
            }

            tracing::debug!(round, calls = response.tool_calls.len(), "Model requested tools");
            let calls = response.tool_calls.clone();
            turn.push(ChatMessage::assistant_tool_calls(response.content, response.tool_calls));
            for call in calls {
                let envelope = self.tools.execute(&call.name, &call.arguments, &ctx).await;
                turn.push(ChatMessage::tool(call.id, envelope.to_json_string()));
            }
        }

        let reply = match reply {
            Some(reply) => reply,
            None => {
                tracing::warn!("⚠️  Tool round limit reached in session {}", session.id);
                turn.push(ChatMessage::assistant(ROUND_LIMIT_REPLY));
                ROUND_LIMIT_REPLY.to_string()
            }
        };

        session.history.extend(turn);
        self.sessions.save(&session).await?;

        Ok(ChatReply {
            session_id: session.id,
            reply,
            profile: session.profile,
        })
    }
}
