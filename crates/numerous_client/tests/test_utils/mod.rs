//! Test utilities for Numerous client tests.
//!
//! This module provides a scripted transport and outcome helpers.

#![allow(dead_code)]

pub mod mock_transport;

#[allow(unused_imports)]
pub use mock_transport::{MockResponse, MockTransport};

use numerous_client::{Connection, ConnectionBuilder};
use numerous_core::{Body, Outcome, RateTelemetry};
use numerous_throttle::RecordingSleeper;
use serde_json::{Map, Value, json};

/// A 200 response carrying `body`, with plenty of quota left.
pub fn ok(body: Value) -> Outcome {
    Outcome::new(200, Body::Json(body))
        .with_reason("OK")
        .with_rate(RateTelemetry::known(300, 60))
}

/// A response with `status` and an empty body, with plenty of quota left.
pub fn status(status: u16, reason: &str) -> Outcome {
    Outcome::new(status, Body::Empty)
        .with_reason(reason)
        .with_rate(RateTelemetry::known(300, 60))
}

/// A 429 with the given reset time.
pub fn too_many(reset: i64) -> Outcome {
    Outcome::new(429, Body::Empty)
        .with_reason("Too Many Requests")
        .with_rate(RateTelemetry::known(0, reset))
}

/// One collection page: `items` under `list`, and `next` under `next_key`
/// when there is a further page.
pub fn page(list: &str, items: Value, next_key: &str, next: Option<&str>) -> Outcome {
    let mut body = Map::new();
    body.insert(list.to_string(), items);
    if let Some(next) = next {
        body.insert(next_key.to_string(), Value::String(next.to_string()));
    }
    ok(Value::Object(body))
}

/// Events items with the given IDs.
pub fn events(ids: &[&str]) -> Value {
    Value::Array(
        ids.iter()
            .map(|id| json!({ "id": id, "value": 1 }))
            .collect(),
    )
}

/// A connection builder around `transport` that records sleeps.
pub fn builder(transport: MockTransport, sleeper: &RecordingSleeper) -> ConnectionBuilder<MockTransport> {
    Connection::builder(transport).sleeper(sleeper.clone())
}

/// A connection around `transport` that records sleeps instead of sleeping.
pub fn connect(transport: &MockTransport) -> (Connection<MockTransport>, RecordingSleeper) {
    let sleeper = RecordingSleeper::default();
    let connection = builder(transport.clone(), &sleeper)
        .build()
        .expect("Failed to build test connection");
    (connection, sleeper)
}
