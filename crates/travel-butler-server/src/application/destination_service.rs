//! Destination Service
//!
//! Destination recommendations and day-by-day itineraries. Itineraries are
//! grounded in the scenic spots the POI service actually returns for the
//! city.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use travel_butler::domain::services::truncate_chars;
use travel_butler::{
    ChatMessage, CompletionOptions, DomainError, LlmProvider, PlanningMode, ToolEnvelope,
    ToolSpec,
};

use super::scenic_spots::{format_spots, ScenicSpotFinder};
use super::tools::{lenient_int, parse_args, AgentTool, ToolContext};

const SOURCE: &str = "llm-trip";
const DEFAULT_DESTINATION: &str = "成都";
const DEFAULT_REQUEST: &str = "帮我推荐一个合适的国内旅游目的地";
const MAX_PICK_CHARS: usize = 12;
const MAX_PROFILE_CHARS: usize = 2000;
const PLAN_SPOT_LIMIT: i64 = 15;

const RECOMMEND_TEMPERATURE: f32 = 0.6;
const PLAN_TEMPERATURE: f32 = 0.4;
const PICK_TEMPERATURE: f32 = 0.1;

const RECOMMEND_SYSTEM_PROMPT: &str = "你是专业旅行顾问。你将收到用户需求与profile(JSON字符串)。你的任务：给出TopK个目的地推荐，并说明理由。只输出纯文本，不要输出JSON，不要输出代码块，不要输出markdown标题符号。不要编造精确价格、精确营业时间；如涉及费用用“约/大致/可能”措辞，并建议以官方为准。

输出格式必须为：
【推荐目的地】
1) 目的地名（国内城市/区域）
   - 适配理由：...
   - 预算/天数匹配：...
2) ...
3) ...
【我需要确认】最多2个追问，用于推进下一步（是否已确定目的地/出发地/更偏好自然或人文等）。";

const PLAN_SYSTEM_PROMPT: &str = "你是资深旅行行程规划师。你将收到目的地、行程天数、用户profile(JSON字符串)、以及该城市真实热门景点清单。你的核心要求：行程中所有景点必须从提供的真实热门景点清单中选择，严禁编造任何景点/街区/餐饮点！请输出可执行、节奏不赶的行程安排，结合景点的区域分布规划动线（减少折返）。只输出纯文本，不要输出JSON，不要输出代码块。不要编造精确门票价格与精确地址；若不确定，用“约/建议现场或官方确认”。

强约束：
1) 每天分：上午/中午/下午/晚上；
2) 每个时段给1-2个点（仅从景点清单选），并解释为什么这样排（交通/动线/体力/区域分布）；
3) 每天给1条“可替换选项”（仅从景点清单选同区域景点）；
4) 结尾给“住宿建议区域”（结合景点分布）和“交通建议”（一句话即可）。

输出格式必须为：
【{destination} {days}天行程建议】
Day1：...
Day2：...
...
【备选与注意】...
【我需要确认】最多2个问题（例如：是否亲子/是否早起/是否需要把美食作为主线）。";

const PICK_SYSTEM_PROMPT: &str =
    "从用户的推荐清单中选出排名第1的目的地名称。只输出目的地名称（例如：成都），不要输出任何其它字符。";

const FALLBACK_RECOMMENDATION: &str = "【推荐目的地】
1) 成都
   - 适配理由：美食与人文兼具，城市交通方便
   - 预算/天数匹配：多数行程可灵活安排
【我需要确认】你大概想去几天？从哪里出发？";

pub struct DestinationService {
    llm: Arc<dyn LlmProvider>,
    spots: ScenicSpotFinder,
}

impl DestinationService {
    pub fn new(llm: Arc<dyn LlmProvider>, spots: ScenicSpotFinder) -> Self {
        Self { llm, spots }
    }

    async fn ask(&self, system: &str, user: String, temperature: f32) -> Result<String, DomainError> {
        let messages = [ChatMessage::system(system), ChatMessage::user(user)];
        let response = self
            .llm
            .complete(&messages, &CompletionOptions::with_temperature(temperature))
            .await?;
        Ok(response.content.trim().to_string())
    }

    /// Top-K destination suggestions as plain text
    pub async fn recommend(
        &self,
        user_input: &str,
        profile_json: &str,
        top_k: i64,
    ) -> Result<String, DomainError> {
        let user_input = match user_input.trim() {
            "" => DEFAULT_REQUEST,
            s => s,
        };
        let user = format!(
            "用户需求：{user_input}\n当前profile(JSON)：{}\nTopK：{top_k}\n",
            compact_profile(profile_json)
        );

        let text = self.ask(RECOMMEND_SYSTEM_PROMPT, user, RECOMMEND_TEMPERATURE).await?;
        if text.is_empty() {
            return Ok(FALLBACK_RECOMMENDATION.to_string());
        }
        Ok(text)
    }

    /// Day-by-day itinerary built from the city's real scenic spots
    pub async fn plan(
        &self,
        destination: &str,
        days: i64,
        profile_json: &str,
    ) -> Result<String, DomainError> {
        let destination = destination.trim();
        let spots = self.spots.search(destination, PLAN_SPOT_LIMIT).await;
        let spots_text = format_spots(&spots);
        tracing::info!(
            "🗺️  Planning {} days in {} ({} spots)",
            days,
            destination,
            spots.data.as_ref().and_then(|d| d.get("count")).cloned().unwrap_or(json!(0))
        );

        let system = PLAN_SYSTEM_PROMPT
            .replace("{destination}", destination)
            .replace("{days}", &days.to_string());
        let user = format!(
            "目的地：{destination}\n天数：{days}\n当前profile(JSON)：{}\n该城市真实热门景点清单：\n{spots_text}\n",
            compact_profile(profile_json)
        );

        let text = self.ask(&system, user, PLAN_TEMPERATURE).await?;
        if text.is_empty() {
            return Ok(fallback_plan(destination, days));
        }
        Ok(text)
    }

    /// Recommend, take the first suggestion, then plan it.
    /// Returns `(text, picked_destination)`.
    pub async fn one_click(
        &self,
        user_input: &str,
        profile_json: &str,
        destination: &str,
        days: i64,
        top_k: i64,
    ) -> Result<(String, String), DomainError> {
        let recommendation = self.recommend(user_input, profile_json, top_k).await?;

        let picked = self
            .ask(
                PICK_SYSTEM_PROMPT,
                format!("推荐清单文本：\n{recommendation}\n"),
                PICK_TEMPERATURE,
            )
            .await?;
        let picked = picked.lines().next().unwrap_or("").trim();
        let picked = if picked.is_empty() || picked.chars().count() > MAX_PICK_CHARS {
            match destination.trim() {
                "" => DEFAULT_DESTINATION.to_string(),
                d => d.to_string(),
            }
        } else {
            picked.to_string()
        };

        let plan = self.plan(&picked, days, profile_json).await?;
        Ok((format!("{recommendation}\n\n{plan}"), picked))
    }

    /// Dispatch on `mode`; failures come back inside the envelope
    pub async fn run(&self, request: TripRequest) -> ToolEnvelope {
        let days = request.days.clamp(1, 10);
        let top_k = request.top_k.clamp(1, 5);

        let result = match request.mode {
            PlanningMode::Plan => {
                if request.destination.trim().is_empty() {
                    return ToolEnvelope::failure(SOURCE, "mode=plan 需要提供 destination");
                }
                self.plan(&request.destination, days, &request.profile_json)
                    .await
                    .map(|text| json!({"text": text, "mode": "plan"}))
            }
            PlanningMode::OneClick => self
                .one_click(
                    &request.user_input,
                    &request.profile_json,
                    &request.destination,
                    days,
                    top_k,
                )
                .await
                .map(|(text, picked)| {
                    json!({"text": text, "mode": "one_click", "picked_destination": picked})
                }),
            PlanningMode::Recommend => self
                .recommend(&request.user_input, &request.profile_json, top_k)
                .await
                .map(|text| json!({"text": text, "mode": "recommend"})),
        };

        match result {
            Ok(data) => ToolEnvelope::success(SOURCE, data),
            Err(e) => ToolEnvelope::failure(SOURCE, format!("旅行规划工具失败：{e}")),
        }
    }
}

/// Input for [`DestinationService::run`]
#[derive(Debug, Clone)]
pub struct TripRequest {
    pub user_input: String,
    pub profile_json: String,
    pub mode: PlanningMode,
    pub destination: String,
    pub days: i64,
    pub top_k: i64,
}

fn compact_profile(profile_json: &str) -> String {
    let s = profile_json.trim();
    if s.is_empty() {
        "{}".to_string()
    } else if s.chars().count() > MAX_PROFILE_CHARS {
        format!("{}…(truncated)", truncate_chars(s, MAX_PROFILE_CHARS))
    } else {
        s.to_string()
    }
}

fn fallback_plan(destination: &str, days: i64) -> String {
    format!(
        "【{destination} {days}天行程建议】\n\
         Day1：上午城市核心街区随走随吃；中午本地特色餐；下午人文景点；晚上夜市/夜景。\n\
         Day2：上午自然或主题景点；中午简餐；下午购物/博物馆；晚上返程或轻松散步。\n\
         【备选与注意】如遇下雨优先安排室内博物馆/商圈。\n\
         【我需要确认】你更偏好打卡密集还是慢节奏？"
    )
}

// ============================================================================
// Tool
// ============================================================================

#[derive(Debug, Deserialize)]
struct TripArgs {
    #[serde(default)]
    user_input: String,
    #[serde(default)]
    profile_json: Option<String>,
    #[serde(default)]
    mode: String,
    #[serde(default)]
    destination: String,
    #[serde(default, deserialize_with = "lenient_int")]
    days: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    top_k: Option<i64>,
}

/// `recommend_and_plan_trip`
pub struct RecommendAndPlanTool {
    service: Arc<DestinationService>,
}

impl RecommendAndPlanTool {
    pub fn new(service: Arc<DestinationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AgentTool for RecommendAndPlanTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "recommend_and_plan_trip".into(),
            description: "旅行目的地推荐与行程规划：mode=recommend 给出TopK目的地推荐；mode=plan 基于 destination + days 与真实景点生成行程；mode=one_click 先推荐1个目的地再生成行程。".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "user_input": {"type": "string", "description": "用户原始需求"},
                    "profile_json": {"type": "string", "description": "用户画像 JSON；省略时使用当前会话画像"},
                    "mode": {"type": "string", "enum": ["recommend", "plan", "one_click"], "default": "recommend"},
                    "destination": {"type": "string"},
                    "days": {"type": "integer", "default": 3},
                    "top_k": {"type": "integer", "default": 3}
                }
            }),
        }
    }

    async fn call(&self, args: Value, ctx: &ToolContext) -> ToolEnvelope {
        let args: TripArgs = match parse_args(SOURCE, args) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        let request = TripRequest {
            profile_json: ctx.profile_json(args.profile_json.as_deref()),
            user_input: args.user_input,
            mode: PlanningMode::parse_lenient(&args.mode),
            destination: args.destination,
            days: args.days.unwrap_or(3),
            top_k: args.top_k.unwrap_or(3),
        };
        self.service.run(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{poi, text, FakePoi, ScriptedLlm};
    use std::sync::Mutex;

    fn spots() -> ScenicSpotFinder {
        ScenicSpotFinder::new(Some(Arc::new(FakePoi {
            center: None,
            pois: vec![poi("杜甫草堂", "风景名胜;风景名胜;纪念馆", 30.66, 104.03)],
            around_calls: Mutex::new(0),
        })))
    }

    fn request(mode: PlanningMode) -> TripRequest {
        TripRequest {
            user_input: "想去吃美食".into(),
            profile_json: r#"{"budget_cny":3000}"#.into(),
            mode,
            destination: String::new(),
            days: 30,
            top_k: 9,
        }
    }

    #[tokio::test]
    async fn test_recommend_clamps_and_uses_temperature() {
        let llm = Arc::new(ScriptedLlm::new("【推荐目的地】\n1) 重庆"));
        let svc = DestinationService::new(llm.clone(), spots());

        let env = svc.run(request(PlanningMode::Recommend)).await;
        assert!(env.ok);
        assert_eq!(env.data.as_ref().unwrap()["mode"], "recommend");

        let (messages, options) = llm.call(0);
        assert_eq!(options.temperature, Some(0.6));
        assert!(messages[1].content.contains("TopK：5"));
        assert!(messages[1].content.contains(r#"{"budget_cny":3000}"#));
    }

    #[tokio::test]
    async fn test_plan_requires_destination_and_uses_spots() {
        let llm = Arc::new(ScriptedLlm::new("Day1：杜甫草堂"));
        let svc = DestinationService::new(llm.clone(), spots());

        let env = svc.run(request(PlanningMode::Plan)).await;
        assert_eq!(env.error.as_deref(), Some("mode=plan 需要提供 destination"));
        assert_eq!(llm.call_count(), 0);

        let mut req = request(PlanningMode::Plan);
        req.destination = "成都".into();
        let env = svc.run(req).await;
        assert!(env.ok);

        let (messages, options) = llm.call(0);
        assert_eq!(options.temperature, Some(0.4));
        assert!(messages[0].content.contains("【成都 10天行程建议】"));
        assert!(messages[1].content.contains("1) 杜甫草堂（锦江区）- 风景名胜"));
    }

    #[tokio::test]
    async fn test_one_click_falls_back_on_long_pick() {
        let llm = Arc::new(
            ScriptedLlm::new("行程")
                .then(text("【推荐目的地】1) 西安"))
                .then(text("我认为最适合你的目的地是陕西省西安市及周边")),
        );
        let svc = DestinationService::new(llm.clone(), spots());

        let env = svc.run(request(PlanningMode::OneClick)).await;
        let data = env.data.unwrap();
        assert_eq!(data["picked_destination"], DEFAULT_DESTINATION);
        assert_eq!(data["text"], "【推荐目的地】1) 西安\n\n行程");
        assert_eq!(llm.call(1).1.temperature, Some(0.1));
    }

    #[tokio::test]
    async fn test_empty_output_falls_back() {
        let llm = Arc::new(ScriptedLlm::new(""));
        let svc = DestinationService::new(llm, spots());

        let env = svc.run(request(PlanningMode::Recommend)).await;
        assert!(env.text().unwrap().starts_with("【推荐目的地】\n1) 成都"));

        let text = svc.plan("成都", 2, "").await.unwrap();
        assert!(text.starts_with("【成都 2天行程建议】"));
    }

    #[tokio::test]
    async fn test_llm_failure_is_enveloped() {
        let llm = Arc::new(ScriptedLlm::new("").then_err(DomainError::Unreachable("down".into())));
        let svc = DestinationService::new(llm, spots());

        let env = svc.run(request(PlanningMode::Recommend)).await;
        assert!(!env.ok);
        assert!(env.error.unwrap().starts_with("旅行规划工具失败："));
    }
}
