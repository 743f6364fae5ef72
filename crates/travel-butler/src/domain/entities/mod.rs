//! Domain Entities
//!
//! Pure domain models without infrastructure dependencies.
//! - UserProfile: travel conditions accumulated across a chat
//! - ChatSession: profile + conversation history
//! - Message: chat messages exchanged with the LLM
//! - Transport: train / flight summaries
//! - Geo: coordinates and distances
//! - ToolEnvelope: uniform tool result

mod geo;
mod message;
mod profile;
mod session;
mod tool_envelope;
mod transport;

pub use geo::*;
pub use message::*;
pub use profile::*;
pub use session::*;
pub use tool_envelope::*;
pub use transport::*;
