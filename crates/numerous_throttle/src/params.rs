//! Per-attempt parameters handed to throttle policies.

use numerous_core::{Outcome, RequestDescriptor};

/// HTTP status the server uses when the rate limit is exhausted.
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Everything a policy may look at after one attempt.
///
/// Rebuilt for every attempt and discarded when the request loop ends.
#[derive(Debug, Clone, Copy)]
pub struct ThrottleParams<'a> {
    /// Zero-based attempt number
    pub attempt: u32,
    /// Requests left in the rate window, if reported
    pub rate_remaining: Option<i64>,
    /// Seconds until the rate window resets, if reported
    pub rate_reset: Option<i64>,
    /// HTTP status of this attempt
    pub result_code: u16,
    /// Raw transport outcome
    pub outcome: &'a Outcome,
    /// The request being attempted
    pub request: &'a RequestDescriptor,
}

impl<'a> ThrottleParams<'a> {
    /// Parameters for attempt `attempt` that produced `outcome`.
    pub fn new(attempt: u32, outcome: &'a Outcome, request: &'a RequestDescriptor) -> Self {
        Self {
            attempt,
            rate_remaining: outcome.rate().remaining,
            rate_reset: outcome.rate().reset,
            result_code: *outcome.status(),
            outcome,
            request,
        }
    }

    /// True when the server said "too many requests". Checked on the status
    /// code alone, whether or not the request accepts that code.
    pub fn is_too_many_requests(&self) -> bool {
        self.result_code == TOO_MANY_REQUESTS
    }
}
