//! Repository Ports
//!
//! Abstract interfaces for data persistence operations.

mod session_repository;

pub use session_repository::*;
