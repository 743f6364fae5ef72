//! OpenAPI Documentation
//!
//! Centralized API documentation using utoipa.

use utoipa::OpenApi;

use crate::models::{
    // Common models
    AiTestResponse,
    // Chat models
    ChatMessageRequest,
    ChatMessageResponse,
    HealthCheck,
    // Prompt models
    PromptListResponse,
    PromptRunRequest,
    PromptRunResponse,
    // Search models
    SearchHit,
    SearchRequest,
    SearchResponse,
    ServiceReachability,
    StartChatResponse,
    TransitHealthResponse,
    // Transport models
    TransportCompareRequest,
    TransportCompareResponse,
    WelcomeResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        super::common::welcome,
        super::common::health_check,
        super::diagnostics::transit_health,
        super::diagnostics::test_ai,
        // Chat endpoints
        super::chat::start_chat,
        super::chat::send_message,
        // Transport endpoints
        super::transport::compare_transport,
        // Search endpoints
        super::search::web_search,
        // Prompt endpoints
        super::prompts::list_prompts,
        super::prompts::run_prompt,
    ),
    info(
        title = "Travel Butler API",
        version = "0.1.0",
        description = "AI 智能出行管家 - conversational trip planning\n\nChat sessions drive an agent that compares trains and flights, plans itineraries, finds hotels and scenic spots, and searches the web.",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
    tags(
        (name = "Health", description = "Health and side-process diagnostics"),
        (name = "Chat", description = "Chat - Agent conversation with a session profile"),
        (name = "Transport", description = "Transport - Train/flight comparison"),
        (name = "Search", description = "Search - Web search via Tavily"),
        (name = "Prompt", description = "Prompt - Named prompt templates"),
    ),
    components(
        schemas(
            // Common
            WelcomeResponse,
            HealthCheck,
            ServiceReachability,
            TransitHealthResponse,
            AiTestResponse,
            // Chat
            StartChatResponse,
            ChatMessageRequest,
            ChatMessageResponse,
            // Transport
            TransportCompareRequest,
            TransportCompareResponse,
            // Search
            SearchRequest,
            SearchHit,
            SearchResponse,
            // Prompt
            PromptRunRequest,
            PromptRunResponse,
            PromptListResponse,
        )
    )
)]
pub struct ApiDoc;
