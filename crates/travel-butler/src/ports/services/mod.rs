//! Service Ports
//!
//! Abstract interfaces for external services.

mod llm_provider;
mod poi;
mod transit;
mod web_search;

pub use llm_provider::*;
pub use poi::*;
pub use transit::*;
pub use web_search::*;
