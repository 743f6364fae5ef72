//! Infrastructure Adapters
//!
//! Implementations of domain ports for external systems.

pub mod llm;
pub mod mcp;
pub mod memory;
pub mod poi;
pub mod search;

// Re-exports
pub use llm::OpenAiCompatibleProvider;
pub use mcp::{McpClient, RailSchedule, VariflightSchedule};
pub use memory::InMemorySessionRepository;
pub use poi::AmapPoiSearch;
pub use search::TavilySearch;
