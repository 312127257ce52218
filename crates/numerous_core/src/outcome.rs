//! What the transport observed for one HTTP exchange.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Rate-limit telemetry reported in response headers.
///
/// Either value is `None` when the header was missing or unparseable. Some
/// error responses omit the headers entirely, and "unknown" must never be
/// mistaken for "zero remaining".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateTelemetry {
    /// Requests left in the current rate window
    pub remaining: Option<i64>,
    /// Seconds until the rate window resets
    pub reset: Option<i64>,
}

impl RateTelemetry {
    /// Telemetry with both values known.
    pub fn known(remaining: i64, reset: i64) -> Self {
        Self {
            remaining: Some(remaining),
            reset: Some(reset),
        }
    }
}

/// Response body as decoded by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Parsed JSON document
    Json(Value),
    /// Zero-length body
    Empty,
    /// Non-empty body that is not valid JSON; holds the raw text
    Undecodable(String),
}

impl Body {
    /// Classify raw response text.
    ///
    /// # Examples
    ///
    /// ```
    /// use numerous_core::Body;
    ///
    /// assert_eq!(Body::from_text(""), Body::Empty);
    /// assert!(matches!(Body::from_text("{\"id\": 1}"), Body::Json(_)));
    /// assert!(matches!(Body::from_text("<html>"), Body::Undecodable(_)));
    /// ```
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            return Body::Empty;
        }
        match serde_json::from_str(text) {
            Ok(value) => Body::Json(value),
            Err(_) => Body::Undecodable(text.to_string()),
        }
    }
}

/// Structured result of exactly one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Outcome {
    /// Final HTTP status code
    status: u16,
    /// Reason phrase for the status code (may be empty)
    reason: String,
    /// Round-trip time
    elapsed: Duration,
    /// Rate-limit headers
    rate: RateTelemetry,
    /// Decoded body
    body: Body,
}

impl Outcome {
    /// An outcome with unknown rate telemetry and zero elapsed time.
    pub fn new(status: u16, body: Body) -> Self {
        Self {
            status,
            reason: String::new(),
            elapsed: Duration::ZERO,
            rate: RateTelemetry::default(),
            body,
        }
    }

    /// Set the reason phrase.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Set the round-trip time.
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Set the rate telemetry.
    pub fn with_rate(mut self, rate: RateTelemetry) -> Self {
        self.rate = rate;
        self
    }

    /// Consume the outcome, keeping only the body.
    pub fn into_body(self) -> Body {
        self.body
    }

    /// The body as JSON for diagnostics: the document itself, the raw text
    /// as a string, or null.
    pub fn body_as_json(&self) -> Value {
        match &self.body {
            Body::Json(value) => value.clone(),
            Body::Undecodable(text) => Value::String(text.clone()),
            Body::Empty => Value::Null,
        }
    }
}
