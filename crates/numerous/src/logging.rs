//! Logging setup.

use numerous_error::{ConfigError, NumerousResult};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,numerous=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a human-readable console subscriber.
///
/// Honors `RUST_LOG`; without it, logs `info` and above, plus `debug` for
/// the numerous crates.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing() -> NumerousResult<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to initialize tracing: {}", e)))?;
    Ok(())
}

/// Install a subscriber that writes one JSON object per event.
///
/// Uses the same filter rules as [`init_tracing`].
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_json_tracing() -> NumerousResult<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to initialize tracing: {}", e)))?;
    Ok(())
}
