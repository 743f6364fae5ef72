//! Travel Butler API Models
//!
//! - Common: welcome, health, side-process reachability
//! - Chat: sessions and messages
//! - Transport: direct train/flight comparison
//! - Search / Prompt: web search and template runs

mod chat;
mod common;
mod prompt;
mod search;
mod transport;

pub use chat::*;
pub use common::*;
pub use prompt::*;
pub use search::*;
pub use transport::*;
