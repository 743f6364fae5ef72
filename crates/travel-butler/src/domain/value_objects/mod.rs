//! Value Objects
//!
//! Immutable objects defined by their attributes rather than identity.

mod planning_mode;
mod transport_mode;
mod trip_type;

pub use planning_mode::*;
pub use transport_mode::*;
pub use trip_type::*;
