//! Facade crate tests.

use numerous::{
    ApiErrorKind, Body, Connection, NumerousResult, Outcome, RateTelemetry, RecordingSleeper,
    RequestDescriptor, Transport, counters,
};
use serde_json::json;

/// Answers every request with the same status.
#[derive(Debug)]
struct FixedStatus(u16);

impl Transport for FixedStatus {
    fn execute(&self, _request: &RequestDescriptor) -> NumerousResult<Outcome> {
        Ok(Outcome::new(self.0, Body::Json(json!({"ok": self.0 == 200})))
            .with_rate(RateTelemetry::known(500, 10)))
    }
}

#[test]
fn test_facade_exposes_whole_client() -> anyhow::Result<()> {
    let mut nr = Connection::builder(FixedStatus(200))
        .sleeper(RecordingSleeper::default())
        .build()?;

    assert!(nr.ping()?);
    assert_eq!(nr.statistics().counter(counters::SERVER_REQUESTS), 1);
    Ok(())
}

#[test]
fn test_facade_errors_keep_their_kind() -> anyhow::Result<()> {
    let mut nr = Connection::builder(FixedStatus(401))
        .sleeper(RecordingSleeper::default())
        .build()?;

    let err = nr.user(None).unwrap_err();
    assert!(err.is_api_kind(ApiErrorKind::Auth));
    Ok(())
}

#[test]
fn test_tracing_initializes_once() {
    assert!(numerous::init_tracing().is_ok());
    assert!(numerous::init_tracing().is_err());
    assert!(numerous::init_json_tracing().is_err());
}
