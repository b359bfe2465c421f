//! Tracing subscriber setup shared by jfai binaries

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "jfai_processor=info,jfai_common=info";

/// Build the filter: `RUST_LOG` if present and valid, otherwise `fallback`
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global subscriber (fmt layer + env filter)
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(fallback: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(fallback))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
}
