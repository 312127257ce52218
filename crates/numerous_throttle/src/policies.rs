//! Bundled custom throttle policies.

use crate::{Next, TOO_MANY_REQUESTS, ThrottleContext, ThrottleParams, ThrottlePolicy};
use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use numerous_core::{Method, counters};
use serde::Serialize;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Keeps the default 429 handling but never slows down voluntarily.
///
/// Responses whose status is in `forwarded_codes` go to the rest of the
/// chain; everything else is accepted immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoVoluntaryBackoff {
    forwarded_codes: Vec<u16>,
}

impl NoVoluntaryBackoff {
    /// Forward these status codes instead of just 429.
    pub fn with_codes(codes: impl Into<Vec<u16>>) -> Self {
        Self {
            forwarded_codes: codes.into(),
        }
    }
}

impl Default for NoVoluntaryBackoff {
    fn default() -> Self {
        Self::with_codes([TOO_MANY_REQUESTS])
    }
}

impl ThrottlePolicy for NoVoluntaryBackoff {
    fn decide(
        &mut self,
        ctx: &mut ThrottleContext<'_>,
        params: &ThrottleParams<'_>,
        next: Next<'_>,
    ) -> bool {
        if self.forwarded_codes.contains(&params.result_code) {
            return next.decide(ctx, params);
        }
        false
    }
}

/// One attempt as seen by a [`RequestRecorder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: Method,
    /// Request URL as sent
    pub url: String,
    /// Status the server answered with
    pub result_code: u16,
    /// Zero-based attempt number
    pub attempt: u32,
}

/// Shared handle to the attempts a [`RequestRecorder`] has seen.
#[derive(Debug, Clone, Default)]
pub struct RequestLog {
    entries: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl RequestLog {
    fn push(&self, entry: RecordedRequest) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entry);
    }

    /// Snapshot of everything recorded so far.
    pub fn entries(&self) -> Vec<RecordedRequest> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of attempts recorded.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pass-through node that records every attempt, then delegates.
#[derive(Debug, Clone, Default)]
pub struct RequestRecorder {
    log: RequestLog,
}

impl RequestRecorder {
    /// A recorder plus the handle to read what it records.
    pub fn new() -> (Self, RequestLog) {
        let log = RequestLog::default();
        (Self { log: log.clone() }, log)
    }

    /// A recorder appending to an existing log.
    pub fn with_log(log: RequestLog) -> Self {
        Self { log }
    }
}

impl ThrottlePolicy for RequestRecorder {
    fn decide(
        &mut self,
        ctx: &mut ThrottleContext<'_>,
        params: &ThrottleParams<'_>,
        next: Next<'_>,
    ) -> bool {
        info!(
            method = %params.request.method(),
            url = %params.request.url(),
            code = params.result_code,
            attempt = params.attempt,
            "API attempt"
        );
        self.log.push(RecordedRequest {
            method: *params.request.method(),
            url: params.request.url().clone(),
            result_code: params.result_code,
            attempt: params.attempt,
        });
        next.decide(ctx, params)
    }
}

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Client-side pacing that works independently of the server's headers.
///
/// Each attempt consumes one cell of a `governor` quota. When the quota is
/// exhausted the node sleeps until the next cell is available, counts
/// `throttlePaced`, and then lets the rest of the chain classify the
/// response as usual.
pub struct PacingPolicy {
    limiter: DirectRateLimiter,
    clock: DefaultClock,
}

impl PacingPolicy {
    /// Pace to an arbitrary quota.
    pub fn new(quota: Quota) -> Self {
        Self {
            limiter: RateLimiter::direct(quota),
            clock: DefaultClock::default(),
        }
    }

    /// At most `requests` attempts per minute.
    pub fn per_minute(requests: NonZeroU32) -> Self {
        Self::new(Quota::per_minute(requests))
    }
}

impl std::fmt::Debug for PacingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacingPolicy").finish_non_exhaustive()
    }
}

impl ThrottlePolicy for PacingPolicy {
    fn decide(
        &mut self,
        ctx: &mut ThrottleContext<'_>,
        params: &ThrottleParams<'_>,
        next: Next<'_>,
    ) -> bool {
        if let Err(not_until) = self.limiter.check() {
            let wait = not_until.wait_time_from(self.clock.now());
            debug!(?wait, "Pacing quota exhausted");
            ctx.stats.increment(counters::THROTTLE_PACED);
            ctx.sleeper.sleep(wait);
        }
        next.decide(ctx, params)
    }
}
