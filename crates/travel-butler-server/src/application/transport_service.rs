//! Transport Comparison Service
//!
//! Queries the rail and flight side-processes for one leg of a trip, then
//! asks the LLM to compare what came back. When neither mode returns rows
//! a fixed "data insufficient" text is produced and the LLM is skipped, so
//! the model never fills in prices or timetables from memory.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use travel_butler::domain::services::{to_iata_city_code, truncate_chars};
use travel_butler::{
    ChatMessage, CompletionOptions, DomainError, FlightQuery, FlightScheduleService, LlmProvider,
    ToolEnvelope, ToolSpec, TrainQuery, TrainScheduleService, TransportMode, TripType,
    UserProfile,
};

use super::tools::{lenient_bool, parse_args, AgentTool, ToolContext};

const SOURCE: &str = "transport-exec";
const TRAIN_SOURCE: &str = "12306-mcp";
const FLIGHT_SOURCE: &str = "variflight-mcp";

const TRAIN_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(400);
const ANALYSIS_TEMPERATURE: f32 = 0.1;
/// Rows per mode handed to the model
const MAX_ROWS_FOR_LLM: usize = 10;
const MAX_FLIGHT_TEXT_FOR_LLM: usize = 4000;
const MAX_PROFILE_CHARS: usize = 1400;

const ANALYSIS_SYSTEM_PROMPT: &str = "你是交通比价助手。你会收到交通查询数据（火车/航班）与用户画像profile。
严格规则（必须遵守）：
- 只能基于“交通数据”中给出的内容做结论；禁止用常识/经验补全价格、时长、车次/航班号。
- 禁止出现“通常/一般/大概X小时/经验上”等推断语句。
- 如果某方式数据缺失或只有 error，请明确写“数据缺失/查询失败”，并给下一步建议。
- 输出只要纯文本，不要JSON，不要代码块。

输出结构必须包含：
【结论】1-2句话：总体建议（仅基于数据）。
【火车建议】如有数据：给出“最快/最省/综合”各1条（引用数据字段；缺字段就说明缺失）。
【飞机建议】如有数据：给出“最快/最省/综合”各1条（引用数据字段；缺字段就说明缺失）。
【对比建议】仅基于数据的对比点：价格区间、出发到达时间段、是否直达/中转等（数据没有就不要写）。
【下一步确认】最多2个问题，用于推进下一步（例如：是否固定出发时段/是否只看直达/是否只看高铁）。";

const EMPTY_ANALYSIS: &str = "已获取到交通数据，但模型未返回分析文本。";

// ============================================================================
// Result Types
// ============================================================================

/// Why a mode produced no data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeError {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl ModeError {
    fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.into(),
        }
    }

    fn from_domain(err: &DomainError) -> Self {
        let kind = match err {
            DomainError::Unreachable(_) => "unreachable",
            DomainError::NotConfigured(_) => "not_configured",
            DomainError::Validation(_) => "invalid_input",
            DomainError::Parse(_) => "parse_error",
            _ => "api_error",
        };
        Self::new(kind, err.to_string())
    }
}

impl std::fmt::Display for ModeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of one transport mode for one leg
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeResult {
    pub ok: bool,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<FlightQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ModeError>,
    /// Rows found (trains listed, or flights counted in the text answer)
    #[serde(default)]
    pub rows: usize,
}

impl ModeResult {
    fn failed(source: &str, error: ModeError) -> Self {
        Self {
            ok: false,
            source: source.to_string(),
            raw: None,
            summary: None,
            meta: None,
            query: None,
            error: Some(error),
            rows: 0,
        }
    }

    pub fn has_data(&self) -> bool {
        self.ok && self.rows > 0
    }

    /// Copy trimmed for the analysis prompt
    fn compact(&self) -> Value {
        let mut compact = self.clone();
        compact.raw = match compact.raw.take() {
            Some(Value::Array(rows)) => Some(Value::Array(
                rows.into_iter().take(MAX_ROWS_FOR_LLM).collect(),
            )),
            Some(Value::String(text)) => {
                Some(Value::String(truncate_chars(&text, MAX_FLIGHT_TEXT_FOR_LLM)))
            }
            other => other,
        };
        serde_json::to_value(compact).unwrap_or(Value::Null)
    }
}

/// Per-leg diagnostics surfaced to the chat model on request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegDebug {
    pub train_ok: bool,
    pub flight_ok: bool,
    pub train_error: Option<ModeError>,
    pub flight_error: Option<ModeError>,
    pub train_raw_len: usize,
    pub flight_raw_len: usize,
    pub flight_query: Option<FlightQuery>,
}

/// One leg's lookups plus the analysis text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegPlan {
    pub departure: String,
    pub destination: String,
    pub date: String,
    pub options: BTreeMap<String, ModeResult>,
    pub analysis_text: String,
    #[serde(skip)]
    pub debug: LegDebug,
}

// ============================================================================
// Service
// ============================================================================

pub struct TransportService {
    llm: Arc<dyn LlmProvider>,
    trains: Arc<dyn TrainScheduleService>,
    flights: Arc<dyn FlightScheduleService>,
    retry_backoff: Duration,
}

impl TransportService {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        trains: Arc<dyn TrainScheduleService>,
        flights: Arc<dyn FlightScheduleService>,
    ) -> Self {
        Self {
            llm,
            trains,
            flights,
            retry_backoff: DEFAULT_BACKOFF,
        }
    }

    /// Base delay between train retries (multiplied by the attempt number)
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Look up one leg with the requested modes and analyse the result
    pub async fn plan_leg(
        &self,
        departure: &str,
        destination: &str,
        date: &str,
        modes: &[TransportMode],
        profile_json: &str,
    ) -> LegPlan {
        tracing::info!("🚄 Transport lookup: {} → {} ({})", departure, destination, date);

        let want_train = modes.contains(&TransportMode::Train);
        let want_flight = modes.contains(&TransportMode::Flight);

        let (train, flight) = tokio::join!(
            async {
                if want_train {
                    Some(self.train_with_retry(departure, destination, date).await)
                } else {
                    None
                }
            },
            async {
                if want_flight {
                    Some(self.flight(departure, destination, date).await)
                } else {
                    None
                }
            }
        );

        let mut debug = LegDebug::default();
        let mut options = BTreeMap::new();
        if let Some(train) = train {
            debug.train_ok = train.has_data();
            debug.train_error = train.error.clone();
            debug.train_raw_len = train.rows;
            options.insert(TransportMode::Train.to_string(), train);
        }
        if let Some(flight) = flight {
            debug.flight_ok = flight.has_data();
            debug.flight_error = flight.error.clone();
            debug.flight_raw_len = flight.rows;
            debug.flight_query = flight.query.clone();
            options.insert(TransportMode::Flight.to_string(), flight);
        }

        let analysis_text = if options.values().any(ModeResult::has_data) {
            self.analyze(departure, destination, date, &options, profile_json)
                .await
        } else {
            tracing::warn!("⚠️  No transport data for {} → {}", departure, destination);
            no_data_text(departure, destination, date, &options, profile_json)
        };

        LegPlan {
            departure: departure.to_string(),
            destination: destination.to_string(),
            date: date.to_string(),
            options,
            analysis_text,
            debug,
        }
    }

    async fn train_with_retry(&self, departure: &str, destination: &str, date: &str) -> ModeResult {
        let query = TrainQuery {
            from_city: departure.to_string(),
            to_city: destination.to_string(),
            date: date.to_string(),
        };

        let mut last_error = ModeError::new("unknown", "train query failed");
        for attempt in 1..=TRAIN_ATTEMPTS {
            match self.trains.search_trains(&query).await {
                Ok(outcome) => {
                    return ModeResult {
                        ok: true,
                        source: TRAIN_SOURCE.to_string(),
                        rows: outcome.trains.len(),
                        summary: serde_json::to_value(&outcome.summary).ok(),
                        meta: Some(json!({
                            "from_station": outcome.from_station,
                            "to_station": outcome.to_station,
                            "date": outcome.date,
                            "fallback": outcome.fallback,
                        })),
                        raw: Some(Value::Array(outcome.trains)),
                        query: None,
                        error: None,
                    };
                }
                Err(e) => {
                    tracing::warn!("⚠️  Train query attempt {} failed: {}", attempt, e);
                    last_error = ModeError::from_domain(&e);
                    if matches!(e, DomainError::NotConfigured(_)) {
                        break;
                    }
                    if attempt < TRAIN_ATTEMPTS {
                        tokio::time::sleep(self.retry_backoff * attempt).await;
                    }
                }
            }
        }

        ModeResult::failed(TRAIN_SOURCE, last_error)
    }

    async fn flight(&self, departure: &str, destination: &str, date: &str) -> ModeResult {
        let Some(dep_city_code) = to_iata_city_code(departure) else {
            return ModeResult::failed(
                FLIGHT_SOURCE,
                ModeError::new("invalid_input", format!("无法解析出发城市IATA码：{departure}")),
            );
        };
        let Some(arr_city_code) = to_iata_city_code(destination) else {
            return ModeResult::failed(
                FLIGHT_SOURCE,
                ModeError::new("invalid_input", format!("无法解析目的地IATA码：{destination}")),
            );
        };

        let query = FlightQuery {
            dep_city_code,
            arr_city_code,
            dep_date: date.to_string(),
        };

        match self.flights.search_flights(&query).await {
            Ok(outcome) => {
                let summary = &outcome.summary;
                let rows = summary.count.map(|c| c as usize).unwrap_or(0).max(
                    usize::from(summary.cheapest.is_some() || summary.fastest.is_some()),
                );
                ModeResult {
                    ok: true,
                    source: FLIGHT_SOURCE.to_string(),
                    rows,
                    summary: serde_json::to_value(summary).ok(),
                    raw: Some(Value::String(outcome.raw_text)),
                    meta: None,
                    query: Some(query),
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!("⚠️  Flight query failed: {}", e);
                let mut result = ModeResult::failed(FLIGHT_SOURCE, ModeError::from_domain(&e));
                result.query = Some(query);
                result
            }
        }
    }

    async fn analyze(
        &self,
        departure: &str,
        destination: &str,
        date: &str,
        options: &BTreeMap<String, ModeResult>,
        profile_json: &str,
    ) -> String {
        let compact: serde_json::Map<String, Value> = options
            .iter()
            .map(|(mode, result)| (mode.clone(), result.compact()))
            .collect();

        let user = format!(
            "出发地：{departure}\n目的地：{destination}\n出发日期：{date}\n用户画像profile(JSON)：{}\n交通数据(JSON)：{}\n",
            compact_profile(profile_json),
            Value::Object(compact),
        );
        let messages = [
            ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
            ChatMessage::user(user),
        ];

        match self
            .llm
            .complete(&messages, &CompletionOptions::with_temperature(ANALYSIS_TEMPERATURE))
            .await
        {
            Ok(response) => {
                let text = response.content.trim();
                if text.is_empty() {
                    EMPTY_ANALYSIS.to_string()
                } else {
                    text.to_string()
                }
            }
            Err(e) => {
                tracing::error!("Transport analysis failed: {}", e);
                format!("分析失败：{e}")
            }
        }
    }

    /// Compare transport for the legs `trip_type` asks for, using the
    /// cities and dates from the profile.
    pub async fn compare(
        &self,
        profile: &UserProfile,
        trip_type: TripType,
        enable_debug: bool,
    ) -> ToolEnvelope {
        let depart_city = profile.depart_city.as_deref().map(str::trim).unwrap_or("");
        let destination = profile.destination.as_deref().map(str::trim).unwrap_or("");
        let dep_date = profile.departure_date.as_deref().map(str::trim).unwrap_or("");
        let ret_date = profile.return_date.as_deref().map(str::trim).unwrap_or("");

        let missing = missing_fields(trip_type, depart_city, destination, dep_date, ret_date);
        if !missing.is_empty() {
            return ToolEnvelope::failure(
                SOURCE,
                format!("交通比价缺少/不合法信息：{}。", missing.join("、")),
            );
        }

        let profile_json = profile.to_json_string();
        let modes = TransportMode::all();
        let mut notes = Vec::new();

        let outbound = if trip_type.includes_outbound() {
            let plan = self
                .plan_leg(depart_city, destination, dep_date, &modes, &profile_json)
                .await;
            Some(plan)
        } else {
            None
        };

        let inbound = match trip_type {
            TripType::Inbound => Some(
                self.plan_leg(destination, depart_city, ret_date, &modes, &profile_json)
                    .await,
            ),
            TripType::Roundtrip if is_iso_date(ret_date) => Some(
                self.plan_leg(destination, depart_city, ret_date, &modes, &profile_json)
                    .await,
            ),
            TripType::Roundtrip => {
                notes.push(if ret_date.is_empty() {
                    "如果你也想把返程一起对比，把返程那天告诉我，我可以把回程火车/航班也一起查出来。"
                } else {
                    "我看到你给了返程日期，但它目前不太像一个明确日期，所以这次先只查了去程；如果你愿意，告诉我返程那天我也可以一起比一下。"
                });
                None
            }
            TripType::Outbound => None,
        };

        let mut text = match (&outbound, &inbound) {
            (Some(out), Some(back)) => {
                format!("{}\n\n{}", leg_text(out, "去程"), leg_text(back, "返程"))
            }
            (Some(out), None) => leg_text(out, "去程"),
            (None, Some(back)) => leg_text(back, "返程"),
            (None, None) => String::new(),
        };
        if !notes.is_empty() {
            text.push_str("\n\n");
            text.push_str(&notes.join("\n"));
        }

        let leg_data = |leg: &Option<LegPlan>| -> Value {
            match leg {
                Some(plan) => {
                    let mut data = json!({
                        "text": plan.analysis_text,
                        "departure": plan.departure,
                        "destination": plan.destination,
                        "departure_date": plan.date,
                        "options": plan.options,
                    });
                    if enable_debug {
                        data["debug"] = serde_json::to_value(&plan.debug).unwrap_or(Value::Null);
                    }
                    data
                }
                None => Value::Null,
            }
        };

        ToolEnvelope::success(
            SOURCE,
            json!({
                "text": text,
                "trip_type": trip_type.to_string(),
                "outbound": leg_data(&outbound),
                "inbound": leg_data(&inbound),
                "has_inbound": inbound.is_some(),
            }),
        )
    }
}

fn is_iso_date(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn missing_fields(
    trip_type: TripType,
    depart_city: &str,
    destination: &str,
    dep_date: &str,
    ret_date: &str,
) -> Vec<&'static str> {
    let mut missing = Vec::new();
    match trip_type {
        TripType::Inbound => {
            if depart_city.is_empty() {
                missing.push("出发城市（用于返程到达）");
            }
            if destination.is_empty() {
                missing.push("目的地（用于返程出发）");
            }
            if ret_date.is_empty() {
                missing.push("返程日期");
            } else if !is_iso_date(ret_date) {
                missing.push("返程日期不合法");
            }
        }
        TripType::Outbound | TripType::Roundtrip => {
            if depart_city.is_empty() {
                missing.push("出发城市");
            }
            if destination.is_empty() {
                missing.push("目的地");
            }
            if dep_date.is_empty() {
                missing.push("出发日期");
            } else if !is_iso_date(dep_date) {
                missing.push("出发日期不合法");
            }
        }
    }
    missing
}

fn leg_text(plan: &LegPlan, label: &str) -> String {
    let body = plan.analysis_text.trim();
    let body = if body.is_empty() {
        format!("（{label}暂无可用分析文本）")
    } else {
        body.to_string()
    };
    format!(
        "【{label}】{} → {}（{}）\n{body}",
        plan.departure, plan.destination, plan.date
    )
}

fn compact_profile(profile_json: &str) -> String {
    let s = profile_json.trim();
    if s.is_empty() {
        return "{}".to_string();
    }
    if s.chars().count() <= MAX_PROFILE_CHARS {
        s.to_string()
    } else {
        format!("{}…(truncated)", truncate_chars(s, MAX_PROFILE_CHARS))
    }
}

fn no_data_text(
    departure: &str,
    destination: &str,
    date: &str,
    options: &BTreeMap<String, ModeResult>,
    profile_json: &str,
) -> String {
    let mut parts = vec![
        "【数据不足】暂时没有拿到可用的火车/航班列表，因此无法基于真实数据做比价与推荐。".to_string(),
        format!("出发地：{departure}；目的地：{destination}；出发日期：{date}"),
    ];

    match options.get("train").and_then(|r| r.error.as_ref()) {
        Some(err) => parts.push(format!("火车查询：失败（{err}）")),
        None => parts.push("火车查询：无返回数据（可能是接口暂时不可用或被限流）".to_string()),
    }
    match options.get("flight").and_then(|r| r.error.as_ref()) {
        Some(err) => parts.push(format!("航班查询：失败/无方案（{err}）")),
        None => parts.push("航班查询：无返回数据".to_string()),
    }

    parts.push("【下一步建议】".to_string());
    parts.push("1) 我可以立刻为你重试一次查询（火车 502/超时通常是暂时性的）。".to_string());
    parts.push(
        "2) 如果航班持续无数据，可能需要你确认出发/到达城市是否匹配航班数据源，或换一天出发日期再试。"
            .to_string(),
    );
    parts.push("3) 若你希望我只查火车或只查航班，也可以告诉我。".to_string());

    let profile = UserProfile::from_json_lenient(profile_json);
    if let Some(ret) = profile.return_date.as_deref().filter(|d| is_iso_date(d)) {
        parts.push(format!(
            "补充：你还提供了返程日期 {ret}，需要我把回程交通也一起比价吗？"
        ));
    }

    parts.join("\n")
}

// ============================================================================
// Tool
// ============================================================================

#[derive(Debug, Deserialize)]
struct CompareArgs {
    #[serde(default)]
    profile_json: Option<String>,
    #[serde(default)]
    trip_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    enable_debug: Option<bool>,
}

/// `compare_transport` - train vs flight for the profile's trip
pub struct CompareTransportTool {
    service: Arc<TransportService>,
}

impl CompareTransportTool {
    pub fn new(service: Arc<TransportService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AgentTool for CompareTransportTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "compare_transport".into(),
            description: "交通比价工具：根据用户画像中的出发城市、目的地、出发/返程日期，查询真实火车与航班数据并给出对比建议。trip_type 可选 outbound（仅去程）/ inbound（仅返程）/ roundtrip（默认，返程日期合法时追加返程）。".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "profile_json": {
                        "type": "string",
                        "description": "用户画像 JSON 字符串；省略时使用当前会话画像"
                    },
                    "trip_type": {
                        "type": "string",
                        "enum": ["outbound", "inbound", "roundtrip"],
                        "default": "roundtrip"
                    },
                    "enable_debug": {"type": "boolean", "default": true}
                }
            }),
        }
    }

    async fn call(&self, args: Value, ctx: &ToolContext) -> ToolEnvelope {
        let args: CompareArgs = match parse_args(SOURCE, args) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };

        let trip_type = match args
            .trip_type
            .as_deref()
            .unwrap_or("roundtrip")
            .parse::<TripType>()
        {
            Ok(t) => t,
            Err(message) => return ToolEnvelope::failure(SOURCE, message),
        };

        let profile = UserProfile::from_json_lenient(&ctx.profile_json(args.profile_json.as_deref()));
        self.service
            .compare(&profile, trip_type, args.enable_debug.unwrap_or(true))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeFlights, FakeTrains, ScriptedLlm};
    use travel_butler::MessageRole;

    const FLIGHT_TEXT: &str = "查询到了 2 条航班。最低价：560元，最短耗时：2h35m。\
        最低价航班为 CA1405，07:30 出发，10:05 到达，耗时2h35m，价格560元。";

    fn train_row() -> Value {
        json!({"train_no": "G89", "prices": [{"seat_name": "二等座", "num": "有", "price": 778.5}]})
    }

    fn service(llm: Arc<ScriptedLlm>, trains: Arc<FakeTrains>, flights: Arc<FakeFlights>) -> TransportService {
        TransportService::new(llm, trains, flights).with_retry_backoff(Duration::from_millis(1))
    }

    fn profile(ret: Option<&str>) -> UserProfile {
        UserProfile {
            depart_city: Some("北京".into()),
            destination: Some("成都".into()),
            departure_date: Some("2026-11-02".into()),
            return_date: ret.map(String::from),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_no_data_skips_llm() {
        let llm = Arc::new(ScriptedLlm::new("不应被调用"));
        let svc = service(
            llm.clone(),
            Arc::new(FakeTrains::failing(5)),
            Arc::new(FakeFlights::unreachable()),
        );

        let plan = svc
            .plan_leg("北京", "成都", "2026-11-02", &TransportMode::all(), "{}")
            .await;

        assert_eq!(llm.call_count(), 0);
        assert!(plan.analysis_text.starts_with("【数据不足】"));
        assert!(plan.analysis_text.contains("火车查询：失败"));
        assert!(!plan.debug.train_ok);
        assert_eq!(plan.options["flight"].error.as_ref().unwrap().kind, "unreachable");
    }

    #[tokio::test]
    async fn test_train_retries_then_succeeds() {
        let mut trains = FakeTrains::with_rows(vec![train_row()]);
        trains.fail_times = std::sync::Mutex::new(2);
        let trains = Arc::new(trains);
        let llm = Arc::new(ScriptedLlm::new("【结论】坐高铁"));
        let svc = service(llm.clone(), trains.clone(), Arc::new(FakeFlights::unreachable()));

        let plan = svc
            .plan_leg("北京", "成都", "2026-11-02", &[TransportMode::Train], "{}")
            .await;

        assert_eq!(trains.calls.lock().unwrap().len(), 3);
        assert!(plan.debug.train_ok);
        assert_eq!(plan.debug.train_raw_len, 1);
        assert_eq!(plan.analysis_text, "【结论】坐高铁");
        assert!(!plan.options.contains_key("flight"));

        let (messages, options) = llm.call(0);
        assert_eq!(options.temperature, Some(0.1));
        assert_eq!(messages[0].role, MessageRole::System);
        assert!(messages[1].content.contains("出发地：北京"));
    }

    #[tokio::test]
    async fn test_flight_text_counts_as_data() {
        let flights = Arc::new(FakeFlights::answering(FLIGHT_TEXT));
        let svc = service(
            Arc::new(ScriptedLlm::new("【结论】飞机更快")),
            Arc::new(FakeTrains::with_rows(vec![])),
            flights.clone(),
        );

        let plan = svc
            .plan_leg("北京", "成都", "2026-11-02", &TransportMode::all(), "{}")
            .await;

        assert!(plan.debug.flight_ok);
        assert!(!plan.debug.train_ok);
        assert_eq!(plan.debug.flight_raw_len, 2);
        let query = plan.debug.flight_query.unwrap();
        assert_eq!(query.dep_city_code, "BJS");
        assert_eq!(query.arr_city_code, "CTU");
        assert_eq!(plan.analysis_text, "【结论】飞机更快");
    }

    #[tokio::test]
    async fn test_unknown_city_is_invalid_input() {
        let flights = Arc::new(FakeFlights::answering(FLIGHT_TEXT));
        let svc = service(
            Arc::new(ScriptedLlm::new("x")),
            Arc::new(FakeTrains::with_rows(vec![])),
            flights.clone(),
        );

        let plan = svc
            .plan_leg("北京", "不存在城", "2026-11-02", &[TransportMode::Flight], "{}")
            .await;

        let err = plan.options["flight"].error.clone().unwrap();
        assert_eq!(err.kind, "invalid_input");
        assert!(err.message.contains("不存在城"));
        assert!(flights.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_analysis_and_llm_error() {
        let llm = Arc::new(
            ScriptedLlm::new("")
                .then(crate::fakes::text("   "))
                .then_err(DomainError::Unreachable("refused".into())),
        );
        let svc = service(
            llm,
            Arc::new(FakeTrains::with_rows(vec![train_row()])),
            Arc::new(FakeFlights::unreachable()),
        );

        let first = svc
            .plan_leg("北京", "成都", "2026-11-02", &[TransportMode::Train], "{}")
            .await;
        assert_eq!(first.analysis_text, EMPTY_ANALYSIS);

        let second = svc
            .plan_leg("北京", "成都", "2026-11-02", &[TransportMode::Train], "{}")
            .await;
        assert!(second.analysis_text.starts_with("分析失败："));
    }

    #[tokio::test]
    async fn test_compare_reports_missing_fields() {
        let svc = service(
            Arc::new(ScriptedLlm::new("x")),
            Arc::new(FakeTrains::with_rows(vec![])),
            Arc::new(FakeFlights::unreachable()),
        );
        let profile = UserProfile {
            destination: Some("成都".into()),
            departure_date: Some("11月2日".into()),
            ..Default::default()
        };

        let env = svc.compare(&profile, TripType::Outbound, true).await;
        assert!(!env.ok);
        assert_eq!(
            env.error.as_deref(),
            Some("交通比价缺少/不合法信息：出发城市、出发日期不合法。")
        );

        let env = svc.compare(&profile, TripType::Inbound, true).await;
        assert_eq!(
            env.error.as_deref(),
            Some("交通比价缺少/不合法信息：出发城市（用于返程到达）、返程日期。")
        );
    }

    #[tokio::test]
    async fn test_roundtrip_with_return_date() {
        let trains = Arc::new(FakeTrains::with_rows(vec![train_row()]));
        let svc = service(
            Arc::new(ScriptedLlm::new("分析")),
            trains.clone(),
            Arc::new(FakeFlights::unreachable()),
        );

        let env = svc
            .compare(&profile(Some("2026-11-06")), TripType::Roundtrip, true)
            .await;

        assert!(env.ok);
        let data = env.data.unwrap();
        assert_eq!(data["has_inbound"], json!(true));
        let text = data["text"].as_str().unwrap();
        assert!(text.starts_with("【去程】北京 → 成都（2026-11-02）\n分析"));
        assert!(text.contains("【返程】成都 → 北京（2026-11-06）"));
        assert_eq!(data["outbound"]["debug"]["train_ok"], json!(true));

        let calls = trains.calls.lock().unwrap();
        assert_eq!(calls[1].from_city, "成都");
        assert_eq!(calls[1].date, "2026-11-06");
    }

    #[tokio::test]
    async fn test_roundtrip_without_return_adds_note() {
        let svc = service(
            Arc::new(ScriptedLlm::new("分析")),
            Arc::new(FakeTrains::with_rows(vec![train_row()])),
            Arc::new(FakeFlights::unreachable()),
        );

        let env = svc.compare(&profile(None), TripType::Roundtrip, false).await;
        let data = env.data.unwrap();
        assert_eq!(data["has_inbound"], json!(false));
        assert_eq!(data["inbound"], Value::Null);
        assert!(data["outbound"].get("debug").is_none());
        assert!(data["text"].as_str().unwrap().contains("把返程那天告诉我"));

        let env = svc
            .compare(&profile(Some("下周五")), TripType::Roundtrip, false)
            .await;
        let text = env.data.unwrap()["text"].as_str().unwrap().to_string();
        assert!(text.contains("不太像一个明确日期"));
    }

    #[tokio::test]
    async fn test_tool_rejects_bad_trip_type() {
        let svc = Arc::new(service(
            Arc::new(ScriptedLlm::new("x")),
            Arc::new(FakeTrains::with_rows(vec![])),
            Arc::new(FakeFlights::unreachable()),
        ));
        let tool = CompareTransportTool::new(svc);

        let env = tool
            .call(json!({"trip_type": "oneway"}), &ToolContext::default())
            .await;
        assert!(!env.ok);
        assert!(env.error.unwrap().contains("trip_type 不合法"));
    }
}
