//! Travel Butler API Server
//!
//! HTTP host for the travel assistant: configuration, adapters for the
//! LLM / web search / transit side-processes / POI lookup, the chat agent
//! runtime, and the axum routes in front of them.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use travel_butler::domain::services::TemplateRegistry;
use travel_butler::{
    FlightScheduleService, LlmProvider, PoiSearchService, SessionRepository, TrainScheduleService,
    WebSearchService,
};

pub mod adapters;
pub mod application;
pub mod config;
pub mod dev_reload;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;

#[cfg(test)]
pub(crate) mod fakes;

use adapters::{
    AmapPoiSearch, InMemorySessionRepository, McpClient, OpenAiCompatibleProvider, RailSchedule,
    TavilySearch, VariflightSchedule,
};
use application::{
    ChatRuntime, CompareTransportTool, DestinationService, HotelService, HotelsNearbyTool,
    PromptRunner, RecommendAndPlanTool, ScenicSpotFinder, ScenicSpotsTool, ToolRegistry,
    TransportService, WebSearchTool,
};
use config::Settings;
use error::ServerError;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(300);

/// Port implementations the application services are built from
#[derive(Clone)]
pub struct Backends {
    pub llm: Arc<dyn LlmProvider>,
    pub web_search: Arc<dyn WebSearchService>,
    pub trains: Arc<dyn TrainScheduleService>,
    pub flights: Arc<dyn FlightScheduleService>,
    /// `None` when no POI key is configured
    pub poi: Option<Arc<dyn PoiSearchService>>,
    pub sessions: Arc<dyn SessionRepository>,
}

impl Backends {
    /// Real adapters configured from settings
    pub fn from_settings(settings: &Settings) -> Result<Self, ServerError> {
        let llm = OpenAiCompatibleProvider::new(
            &settings.deepseek_base_url,
            &settings.deepseek_api_key,
            &settings.llm_model,
        )?;
        tracing::info!("🤖 LLM client ready ({})", settings.llm_model);

        let rail = McpClient::new("12306", settings.mcp_12306_url.clone());
        let flight = McpClient::new("variflight", settings.mcp_variflight_url.clone());
        match rail.base_url() {
            Some(url) => tracing::info!("🚄 Rail side-process: {}", url),
            None => tracing::warn!("⚠️  No MCP_12306_REMOTE_URL set - train lookups disabled"),
        }
        match flight.base_url() {
            Some(url) => tracing::info!("✈️  Flight side-process: {}", url),
            None => tracing::warn!("⚠️  No MCP_VARIFLIGHT_REMOTE_URL set - flight lookups disabled"),
        }

        let poi = settings.amap_api_key.as_ref().map(|key| {
            tracing::info!("🗺️  POI search initialized (Amap)");
            Arc::new(AmapPoiSearch::new(key.clone())) as Arc<dyn PoiSearchService>
        });
        if poi.is_none() {
            tracing::warn!("⚠️  No AMAP_API_KEY set - hotel and scenic spot tools disabled");
        }

        Ok(Self {
            llm: Arc::new(llm),
            web_search: Arc::new(TavilySearch::new(settings.tavily_api_key.clone())),
            trains: Arc::new(RailSchedule::new(rail)),
            flights: Arc::new(VariflightSchedule::new(flight)),
            poi,
            sessions: Arc::new(InMemorySessionRepository::new(settings.session_ttl_secs)),
        })
    }
}

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub backends: Backends,
    pub chat: Arc<ChatRuntime>,
    pub transport: Arc<TransportService>,
    pub prompts: Arc<PromptRunner>,
}

impl AppState {
    /// Wire the application services and agent tools on top of `backends`
    pub fn new(settings: Settings, backends: Backends) -> Self {
        let transport = Arc::new(TransportService::new(
            backends.llm.clone(),
            backends.trains.clone(),
            backends.flights.clone(),
        ));
        let spots = ScenicSpotFinder::new(backends.poi.clone());
        let destinations = Arc::new(DestinationService::new(backends.llm.clone(), spots.clone()));
        let hotels = Arc::new(HotelService::new(backends.llm.clone(), backends.poi.clone()));

        let tools = ToolRegistry::new()
            .with(Arc::new(CompareTransportTool::new(transport.clone())))
            .with(Arc::new(RecommendAndPlanTool::new(destinations)))
            .with(Arc::new(HotelsNearbyTool::new(hotels)))
            .with(Arc::new(ScenicSpotsTool::new(spots)))
            .with(Arc::new(WebSearchTool::new(backends.web_search.clone())));
        tracing::info!("🔧 Agent tools: {}", tools.names().join(", "));

        let chat = Arc::new(ChatRuntime::new(
            backends.llm.clone(),
            backends.sessions.clone(),
            tools,
        ));
        let prompts = Arc::new(PromptRunner::new(
            backends.llm.clone(),
            TemplateRegistry::builtin(),
        ));

        Self {
            settings: Arc::new(settings),
            backends,
            chat,
            transport,
            prompts,
        }
    }

    pub fn from_settings(settings: Settings) -> Result<Self, ServerError> {
        let backends = Backends::from_settings(&settings)?;
        Ok(Self::new(settings, backends))
    }
}

/// All routes plus Swagger UI, CORS and request tracing
pub fn build_router(state: AppState) -> Router {
    let openapi = routes::swagger::ApiDoc::openapi();

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi))
        .merge(routes::common::router())
        .merge(routes::diagnostics::router())
        .merge(routes::chat::router())
        .merge(routes::transport::router())
        .merge(routes::search::router())
        .merge(routes::prompts::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the listener; failure is fatal and not retried
pub async fn bind_listener(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Periodically drop expired chat sessions
pub fn spawn_session_purger(sessions: Arc<dyn SessionRepository>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match sessions.purge_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::debug!("🧹 Purged {} expired sessions", n),
                Err(e) => tracing::warn!("Session purge failed: {}", e),
            }
        }
    })
}

/// Serve until Ctrl-C
pub async fn serve(listener: TcpListener, router: Router) -> Result<(), ServerError> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("👋 Shutting down");
        })
        .await?;
    Ok(())
}

/// Settings → backends → router → listener, then serve
pub async fn run(settings: Settings) -> Result<(), ServerError> {
    tracing::info!("🧳 {} initializing...", settings.project_name);
    let addr = settings.bind_addr()?;
    let state = AppState::from_settings(settings)?;
    spawn_session_purger(state.backends.sessions.clone());

    let listener = bind_listener(addr).await?;
    tracing::info!("📚 Swagger UI: http://{}/docs", addr);
    tracing::info!("✅ Travel Butler API listening on {}", addr);

    serve(listener, build_router(state)).await
}
