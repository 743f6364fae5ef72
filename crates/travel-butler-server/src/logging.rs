//! Logging initialisation via tracing-subscriber.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,tower_http=info";

/// Filter from the `var` environment variable, else the default
pub fn filter_from(var: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. `RUST_LOG` wins over the default filter,
/// so load `.env` first.
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_from("RUST_LOG"))
        .with_target(false)
        .try_init();
}
