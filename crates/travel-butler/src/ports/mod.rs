//! Ports (Interfaces)
//!
//! Abstract interfaces that define how the domain layer
//! interacts with external systems (session storage, LLM, web search,
//! transit side-processes, POI lookup).
//!
//! Implementations of these traits live in the server crate.

pub mod repositories;
pub mod services;

// Re-exports
pub use repositories::*;
pub use services::*;
