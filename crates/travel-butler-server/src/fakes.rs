//! Scripted port implementations shared by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use travel_butler::{
    ChatMessage, CompletionOptions, CompletionResponse, DomainError, FlightQuery,
    FlightScheduleService, FlightSearchOutcome, GeoPoint, LlmProvider, Poi, PoiSearchService,
    TokenUsage, ToolCall, TrainQuery, TrainScheduleService, TrainSearchOutcome,
    WebSearchResponse, WebSearchResult, WebSearchService,
};
use travel_butler::domain::services::{parse_flight_summary, summarize_trains};

/// LLM answering from a queue; falls back to a fixed reply when empty
pub struct ScriptedLlm {
    queue: Mutex<VecDeque<Result<CompletionResponse, DomainError>>>,
    fallback: String,
    delay: Option<std::time::Duration>,
    pub calls: Mutex<Vec<(Vec<ChatMessage>, CompletionOptions)>>,
}

pub fn text(content: &str) -> CompletionResponse {
    CompletionResponse {
        content: content.to_string(),
        tool_calls: Vec::new(),
        model: "fake".into(),
        usage: TokenUsage::default(),
        finish_reason: Some("stop".into()),
    }
}

pub fn tool_call(id: &str, name: &str, arguments: &str) -> CompletionResponse {
    CompletionResponse {
        content: String::new(),
        tool_calls: vec![ToolCall {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }],
        model: "fake".into(),
        usage: TokenUsage::default(),
        finish_reason: Some("tool_calls".into()),
    }
}

impl ScriptedLlm {
    pub fn new(fallback: &str) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: fallback.to_string(),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before every answer so concurrent callers interleave
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn then(self, response: CompletionResponse) -> Self {
        self.queue.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn then_err(self, err: DomainError) -> Self {
        self.queue.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call(&self, i: usize) -> (Vec<ChatMessage>, CompletionOptions) {
        self.calls.lock().unwrap()[i].clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, DomainError> {
        self.calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), options.clone()));
        let next = self.queue.lock().unwrap().pop_front();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        next.unwrap_or_else(|| Ok(text(&self.fallback)))
    }

    fn provider_name(&self) -> &str {
        "fake"
    }

    fn model_id(&self) -> &str {
        "fake-model"
    }
}

/// Train service returning fixed rows, or failing `fail_times` times first
pub struct FakeTrains {
    pub rows: Vec<Value>,
    pub fail_times: Mutex<usize>,
    pub calls: Mutex<Vec<TrainQuery>>,
}

impl FakeTrains {
    pub fn with_rows(rows: Vec<Value>) -> Self {
        Self {
            rows,
            fail_times: Mutex::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(times: usize) -> Self {
        Self {
            rows: Vec::new(),
            fail_times: Mutex::new(times),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TrainScheduleService for FakeTrains {
    async fn search_trains(&self, query: &TrainQuery) -> Result<TrainSearchOutcome, DomainError> {
        self.calls.lock().unwrap().push(query.clone());
        {
            let mut remaining = self.fail_times.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DomainError::ExternalService("12306 MCP HTTP 502".into()));
            }
        }
        Ok(TrainSearchOutcome {
            summary: summarize_trains(&self.rows),
            trains: self.rows.clone(),
            from_station: "BJP".into(),
            to_station: "CDW".into(),
            date: query.date.clone(),
            fallback: "representative_station".into(),
        })
    }

    async fn ping(&self) -> Result<usize, DomainError> {
        Ok(4)
    }
}

/// Flight service answering with fixed text; `None` means unreachable
pub struct FakeFlights {
    pub text: Option<String>,
    pub calls: Mutex<Vec<FlightQuery>>,
}

impl FakeFlights {
    pub fn answering(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            text: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl FlightScheduleService for FakeFlights {
    async fn search_flights(&self, query: &FlightQuery) -> Result<FlightSearchOutcome, DomainError> {
        self.calls.lock().unwrap().push(query.clone());
        match &self.text {
            Some(text) => Ok(FlightSearchOutcome {
                raw_text: text.clone(),
                summary: parse_flight_summary(text),
            }),
            None => Err(DomainError::Unreachable("variflight MCP unreachable".into())),
        }
    }

    async fn ping(&self) -> Result<usize, DomainError> {
        match self.text {
            Some(_) => Ok(2),
            None => Err(DomainError::Unreachable("connection refused".into())),
        }
    }
}

/// POI service over a fixed list; every search returns the whole list
pub struct FakePoi {
    pub center: Option<GeoPoint>,
    pub pois: Vec<Poi>,
    pub around_calls: Mutex<usize>,
}

pub fn poi(name: &str, category: &str, lat: f64, lon: f64) -> Poi {
    Poi {
        id: name.to_string(),
        name: name.to_string(),
        address: Some(format!("{name}路1号")),
        district: Some("锦江区".into()),
        tel: None,
        location: Some(GeoPoint::new(lat, lon)),
        distance_m: None,
        category: Some(category.to_string()),
        rating: None,
    }
}

#[async_trait]
impl PoiSearchService for FakePoi {
    async fn geocode(&self, _address: &str, _city: Option<&str>) -> Result<Option<GeoPoint>, DomainError> {
        Ok(self.center)
    }

    async fn search_text(
        &self,
        _keywords: &str,
        _city: Option<&str>,
        _types: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Poi>, DomainError> {
        Ok(self.pois.iter().take(limit).cloned().collect())
    }

    async fn search_around(
        &self,
        _center: GeoPoint,
        _keywords: &str,
        _radius_m: u32,
        limit: usize,
    ) -> Result<Vec<Poi>, DomainError> {
        *self.around_calls.lock().unwrap() += 1;
        Ok(self.pois.iter().take(limit).cloned().collect())
    }
}

/// Web search echoing the query
pub struct FakeSearch;

#[async_trait]
impl WebSearchService for FakeSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<WebSearchResponse, DomainError> {
        if query.trim().is_empty() {
            return Err(DomainError::Validation("Search query cannot be empty".into()));
        }
        Ok(WebSearchResponse {
            query: query.to_string(),
            answer: Some(format!("answer for {query}")),
            results: (0..limit.min(2))
                .map(|i| WebSearchResult {
                    title: format!("result {i}"),
                    url: format!("https://example.com/{i}"),
                    snippet: query.to_string(),
                    score: None,
                })
                .collect(),
        })
    }
}

/// Settings with only the required keys
pub fn settings() -> crate::config::Settings {
    crate::config::Settings::from_source(|key| match key {
        "DEEPSEEK_API_KEY" => Some("sk-test".into()),
        "DEEPSEEK_BASE_URL" => Some("http://127.0.0.1:9/v1".into()),
        "TAVILY_API_KEY" => Some("tvly-test".into()),
        _ => None,
    })
    .unwrap()
}

/// App state over fakes: rail answers one train, flight is unreachable
pub fn app_state(llm: std::sync::Arc<ScriptedLlm>) -> crate::AppState {
    use std::sync::Arc;

    let backends = crate::Backends {
        llm,
        web_search: Arc::new(FakeSearch),
        trains: Arc::new(FakeTrains::with_rows(vec![serde_json::json!({
            "train_no": "G89",
            "prices": [{"seat_name": "二等座", "num": "有", "price": 778.5}]
        })])),
        flights: Arc::new(FakeFlights::unreachable()),
        poi: None,
        sessions: Arc::new(crate::adapters::InMemorySessionRepository::new(3600)),
    };
    crate::AppState::new(settings(), backends)
}
