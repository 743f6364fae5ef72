//! Travel Butler Domain Library
//!
//! Core domain types and interfaces for the Travel Butler trip-planning assistant.
//!
//! # Architecture
//!
//! This crate follows the same ports-and-adapters split as the server:
//!
//! - **Domain Layer** (`domain/`): Pure business entities and logic
//!   - `entities/`: Core models (UserProfile, ChatSession, train/flight summaries)
//!   - `value_objects/`: Immutable value types (TripType, PlanningMode, TransportMode)
//!   - `services/`: Pure domain services (profile extraction, summaries, city codes, prompts)
//!   - `errors/`: Domain-specific error types
//!
//! - **Ports** (`ports/`): Abstract interfaces (traits)
//!   - `repositories/`: Session storage
//!   - `services/`: LLM, web search, transit side-processes and POI lookup
//!
//! # Usage
//!
//! ```rust,ignore
//! use travel_butler::domain::{UserProfile, ProfileUpdate};
//! use travel_butler::ports::{LlmProvider, TrainScheduleService};
//! ```

pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    ChatSession, DomainError, FlightLeg, FlightSummary, GeoPoint, PlanningMode, ProfileUpdate,
    ToolEnvelope, TrainSummary, TransportMode, TripType, UserProfile,
};
pub use ports::{
    ChatMessage, CompletionOptions, CompletionResponse, FlightQuery, FlightScheduleService,
    FlightSearchOutcome, LlmProvider, MessageRole, Poi, PoiSearchService, SessionRepository,
    TokenUsage, ToolCall, ToolSpec, TrainQuery, TrainScheduleService, TrainSearchOutcome,
    WebSearchResponse, WebSearchResult, WebSearchService,
};
