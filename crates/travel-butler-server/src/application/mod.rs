//! Application Layer
//!
//! Use cases that orchestrate the ports: the chat runtime, the agent tools
//! it can call, and the services behind the direct HTTP endpoints.

pub mod chat_runtime;
pub mod destination_service;
pub mod hotel_service;
pub mod profile_service;
pub mod prompt_runner;
pub mod scenic_spots;
pub mod tools;
pub mod transport_service;
pub mod web_search_tool;

pub use chat_runtime::{ChatReply, ChatRuntime};
pub use destination_service::{DestinationService, RecommendAndPlanTool, TripRequest};
pub use hotel_service::{HotelRequest, HotelService, HotelsNearbyTool};
pub use profile_service::ProfileExtractor;
pub use prompt_runner::PromptRunner;
pub use scenic_spots::{ScenicSpotFinder, ScenicSpotsTool};
pub use tools::{AgentTool, ToolContext, ToolRegistry};
pub use transport_service::{CompareTransportTool, LegPlan, TransportService};
pub use web_search_tool::WebSearchTool;
