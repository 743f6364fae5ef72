//! Travel Butler API Routes
//!
//! - / and /health - Welcome and liveness
//! - /health/transit, /test/ai - Side-process and LLM diagnostics
//! - /chat/start, /chat/message - Agent conversation
//! - /transport/compare - Direct train/flight comparison
//! - /search - Web search (Tavily)
//! - /prompts/:name - Named prompt templates

pub mod chat;
pub mod common;
pub mod diagnostics;
pub mod prompts;
pub mod search;
pub mod swagger;
pub mod transport;
