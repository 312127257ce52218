//! Per-connection statistics.
//!
//! Counters only ever grow. The two rate gauges hold whatever the most
//! recent response reported, and the response-time list is a fixed-size
//! ring of the newest round-trip samples. Nothing here is reset
//! automatically; callers read it whenever they like.

use numerous_error::{JsonError, NumerousResult};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

/// Names of the counters maintained by the client.
pub mod counters {
    /// One per transport exchange.
    pub const SERVER_REQUESTS: &str = "serverRequests";
    /// One per request loop invocation.
    pub const SIMPLE_API: &str = "simpleAPI";
    /// One per page fetched by a collection iterator.
    pub const CHUNKED_FETCHES: &str = "chunkedFetches";
    /// Retries forced by a 429 response.
    pub const THROTTLE_429: &str = "throttle429";
    /// Voluntary slow-downs taken before the server forced one.
    pub const THROTTLE_VOLUNTARY: &str = "throttleVoluntaryBackoff";
    /// Times the backoff schedule ran out.
    pub const THROTTLE_MAXED: &str = "throttleMaxed";
    /// Request loops that ended in a non-accepted status.
    pub const SERVER_ERRORS: &str = "serverErrors";
    /// Client-side pacing delays.
    pub const THROTTLE_PACED: &str = "throttlePaced";
    /// Collection items dropped as boundary duplicates.
    pub const DUPLICATES_FILTERED: &str = "duplicatesFiltered";
}

/// Bounded list of recent response times, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseTimes {
    capacity: usize,
    samples: VecDeque<f64>,
}

impl ResponseTimes {
    /// An empty ring holding at most `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Record a sample, evicting the oldest when full.
    pub fn push(&mut self, seconds: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_back();
        }
        self.samples.push_front(seconds);
    }

    /// Change the capacity, keeping the newest samples.
    pub fn resize(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.samples.truncate(capacity);
    }

    /// Maximum number of samples kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples in seconds, newest first.
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<f64> {
        self.samples.front().copied()
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if no sample has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for ResponseTimes {
    fn default() -> Self {
        Self::with_capacity(1)
    }
}

/// Counter set owned by one connection.
///
/// # Examples
///
/// ```
/// use numerous_core::{Statistics, counters};
///
/// let mut stats = Statistics::default();
/// stats.increment(counters::THROTTLE_429);
/// stats.increment(counters::THROTTLE_429);
/// assert_eq!(stats.counter(counters::THROTTLE_429), 2);
/// assert_eq!(stats.counter("neverTouched"), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statistics {
    counters: BTreeMap<String, u64>,
    rate_remaining: Option<i64>,
    rate_reset: Option<i64>,
    response_times: ResponseTimes,
}

impl Statistics {
    /// Statistics keeping `window` response-time samples.
    pub fn with_response_time_window(window: usize) -> Self {
        Self {
            response_times: ResponseTimes::with_capacity(window),
            ..Self::default()
        }
    }

    /// Add one to a counter.
    pub fn increment(&mut self, name: &str) {
        self.add(name, 1);
    }

    /// Add `amount` to a counter.
    pub fn add(&mut self, name: &str, amount: u64) {
        let slot = self.counters.entry(name.to_string()).or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    /// Current counter value, zero if never incremented.
    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// All counters that have been touched, in name order.
    pub fn counters(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counters.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Remember the latest rate telemetry. Unknown values overwrite known
    /// ones: the gauges describe the last response, not the last good one.
    pub fn observe_rate(&mut self, remaining: Option<i64>, reset: Option<i64>) {
        self.rate_remaining = remaining;
        self.rate_reset = reset;
    }

    /// Rate remaining reported by the most recent response.
    pub fn rate_remaining(&self) -> Option<i64> {
        self.rate_remaining
    }

    /// Seconds-until-reset reported by the most recent response.
    pub fn rate_reset(&self) -> Option<i64> {
        self.rate_reset
    }

    /// Record a round-trip time.
    pub fn record_response_time(&mut self, elapsed: Duration) {
        self.response_times.push(elapsed.as_secs_f64());
    }

    /// The rolling response-time samples.
    pub fn response_times(&self) -> &ResponseTimes {
        &self.response_times
    }

    /// Change how many response-time samples are kept.
    pub fn set_response_time_window(&mut self, window: usize) {
        self.response_times.resize(window);
    }

    /// Pretty-printed JSON dump, for reports.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> NumerousResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| JsonError::from(e).into())
    }
}

// Flat map: counters by name, then the gauges and the sample list, so the
// JSON reads like one dictionary of statistics.
impl Serialize for Statistics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counters.len() + 3))?;
        for (name, value) in &self.counters {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry("rate-remaining", &self.rate_remaining)?;
        map.serialize_entry("rate-reset", &self.rate_reset)?;
        let samples: Vec<f64> = self.response_times.samples().collect();
        map.serialize_entry("serverResponseTimes", &samples)?;
        map.end()
    }
}
