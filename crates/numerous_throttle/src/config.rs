//! Throttle configuration.

use crate::{DEFAULT_BACKOFF_SCHEDULE, DEFAULT_VOLUNTARY_THRESHOLD};
use numerous_error::{ConfigError, NumerousResult};
use serde::{Deserialize, Serialize};

/// Settings for the default throttle policy.
///
/// ```toml
/// [throttle]
/// voluntary_threshold = 40
/// backoff_schedule = [2, 5, 15, 30, 60]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ThrottleConfig {
    /// Remaining-quota level below which requests slow down voluntarily
    #[serde(default = "default_voluntary_threshold")]
    pub voluntary_threshold: i64,

    /// Seconds added to the server reset time on each 429 retry, by attempt
    #[serde(default = "default_backoff_schedule")]
    pub backoff_schedule: Vec<u64>,
}

fn default_voluntary_threshold() -> i64 {
    DEFAULT_VOLUNTARY_THRESHOLD
}

fn default_backoff_schedule() -> Vec<u64> {
    DEFAULT_BACKOFF_SCHEDULE.to_vec()
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            voluntary_threshold: default_voluntary_threshold(),
            backoff_schedule: default_backoff_schedule(),
        }
    }
}

impl ThrottleConfig {
    /// Check the settings make sense.
    ///
    /// # Errors
    ///
    /// Returns an error for a negative threshold or an empty schedule.
    pub fn validate(&self) -> NumerousResult<()> {
        if self.voluntary_threshold < 0 {
            return Err(ConfigError::new(format!(
                "voluntary_threshold must not be negative, got {}",
                self.voluntary_threshold
            ))
            .into());
        }
        if self.backoff_schedule.is_empty() {
            return Err(ConfigError::new("backoff_schedule must have at least one entry").into());
        }
        Ok(())
    }
}
