//! In-process adapters

mod session_store;

pub use session_store::InMemorySessionRepository;
