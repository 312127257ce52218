//! The built-in terminal policy.

use crate::{Next, ThrottleConfig, ThrottleContext, ThrottleParams, ThrottlePolicy};
use derive_getters::Getters;
use numerous_core::counters;
use std::time::Duration;
use tracing::{debug, warn};

/// Extra seconds added to the server's reset time, indexed by attempt.
pub const DEFAULT_BACKOFF_SCHEDULE: [u64; 5] = [2, 5, 15, 30, 60];

/// Remaining-quota level below which requests slow down voluntarily.
pub const DEFAULT_VOLUNTARY_THRESHOLD: i64 = 40;

const SHORT_VOLUNTARY_DELAY: Duration = Duration::from_secs(1);
const LONG_VOLUNTARY_DELAY: Duration = Duration::from_secs(3);

/// Default throttle behavior, always the last node of a chain.
///
/// - Attempt number past the end of the backoff schedule: give up, count
///   `throttleMaxed`, accept.
/// - Not a 429: if the remaining quota is known and below the voluntary
///   threshold, sleep 1s (more than half the threshold left) or 3s
///   (otherwise) and count `throttleVoluntaryBackoff`. Accept either way;
///   the request was already answered.
/// - 429: sleep for the server's reset time plus the schedule entry for
///   this attempt, count `throttle429`, retry.
///
/// This node never delegates.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct DefaultPolicy {
    /// Seconds of slop per attempt
    backoff_schedule: Vec<u64>,
    /// Voluntary slow-down threshold
    voluntary_threshold: i64,
}

impl DefaultPolicy {
    /// Policy with an explicit schedule and threshold.
    pub fn new(backoff_schedule: Vec<u64>, voluntary_threshold: i64) -> Self {
        Self {
            backoff_schedule,
            voluntary_threshold,
        }
    }

    /// Policy built from configuration.
    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(config.backoff_schedule.clone(), config.voluntary_threshold)
    }

    fn voluntary_delay(&self, remaining: i64) -> Option<Duration> {
        if remaining >= self.voluntary_threshold {
            return None;
        }
        if remaining.saturating_mul(2) > self.voluntary_threshold {
            Some(SHORT_VOLUNTARY_DELAY)
        } else {
            Some(LONG_VOLUNTARY_DELAY)
        }
    }
}

impl Default for DefaultPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BACKOFF_SCHEDULE.to_vec(), DEFAULT_VOLUNTARY_THRESHOLD)
    }
}

impl ThrottlePolicy for DefaultPolicy {
    fn decide(
        &mut self,
        ctx: &mut ThrottleContext<'_>,
        params: &ThrottleParams<'_>,
        _next: Next<'_>,
    ) -> bool {
        let Some(slop) = self.backoff_schedule.get(params.attempt as usize).copied() else {
            warn!(attempt = params.attempt, "Backoff schedule exhausted, giving up");
            ctx.stats.increment(counters::THROTTLE_MAXED);
            return false;
        };

        if !params.is_too_many_requests() {
            if let Some(delay) = params.rate_remaining.and_then(|r| self.voluntary_delay(r)) {
                debug!(
                    remaining = params.rate_remaining,
                    threshold = self.voluntary_threshold,
                    ?delay,
                    "Voluntary backoff"
                );
                ctx.stats.increment(counters::THROTTLE_VOLUNTARY);
                ctx.sleeper.sleep(delay);
            }
            return false;
        }

        let reset = params.rate_reset.unwrap_or(0).max(0).unsigned_abs();
        let delay = Duration::from_secs(reset.saturating_add(slop));
        warn!(
            attempt = params.attempt,
            reset,
            ?delay,
            "Server returned 429, backing off before retry"
        );
        ctx.stats.increment(counters::THROTTLE_429);
        ctx.sleeper.sleep(delay);
        true
    }
}
