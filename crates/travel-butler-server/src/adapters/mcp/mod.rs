//! MCP Side-Process Clients
//!
//! The train and flight schedule services run as separately started
//! processes speaking JSON-RPC over Streamable HTTP. [`McpClient`] handles
//! the transport; `rail` and `flight` implement the domain ports on top.

mod client;
mod flight;
mod rail;

pub use client::{extract_result, McpClient};
pub use flight::VariflightSchedule;
pub use rail::RailSchedule;
