//! Paginated collection tests against a scripted transport.

mod test_utils;

use numerous_core::counters;
use numerous_error::ApiErrorKind;
use serde_json::{Value, json};
use test_utils::{MockResponse, MockTransport, connect, events, ok, page, status, too_many};

const FIRST: &str = "/v1/metrics/m1/events";
const SECOND: &str = "https://api.numerousapp.com/v1/metrics/m1/events?chunk=2";
const THIRD: &str = "https://api.numerousapp.com/v1/metrics/m1/events?chunk=3";

fn ids(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .map(|item| item["id"].as_str().unwrap_or_default().to_string())
        .collect()
}

fn boundary_pages() -> MockTransport {
    MockTransport::new([
        page("events", events(&["1", "2", "3", "3"]), "nextURL", Some(SECOND)),
        page("events", events(&["3", "4"]), "nextURL", None),
    ])
}

#[test]
fn test_boundary_duplicates_are_dropped() -> anyhow::Result<()> {
    let transport = boundary_pages();
    let (mut nr, _) = connect(&transport);

    let items = nr.metric("m1").events()?.collect::<Result<Vec<_>, _>>()?;

    assert_eq!(ids(&items), vec!["1", "2", "3", "4"]);
    assert_eq!(transport.urls(), vec![FIRST.to_string(), SECOND.to_string()]);
    assert_eq!(nr.statistics().counter(counters::CHUNKED_FETCHES), 2);
    assert_eq!(nr.statistics().counter(counters::DUPLICATES_FILTERED), 2);
    Ok(())
}

#[test]
fn test_disabled_filter_yields_everything() -> anyhow::Result<()> {
    let transport = boundary_pages();
    let (mut nr, _) = connect(&transport);

    assert!(nr.set_duplicate_filter(false));
    assert!(!nr.set_duplicate_filter(false));
    let items = nr.metric("m1").events()?.collect::<Result<Vec<_>, _>>()?;

    assert_eq!(ids(&items), vec!["1", "2", "3", "3", "3", "4"]);
    assert_eq!(nr.statistics().counter(counters::DUPLICATES_FILTERED), 0);
    Ok(())
}

#[test]
fn test_duplicates_two_pages_apart_are_kept() -> anyhow::Result<()> {
    let transport = MockTransport::new([
        page("events", events(&["a"]), "nextURL", Some(SECOND)),
        page("events", events(&["b"]), "nextURL", Some(THIRD)),
        page("events", events(&["a"]), "nextURL", None),
    ]);
    let (mut nr, _) = connect(&transport);

    let items = nr.metric("m1").events()?.collect::<Result<Vec<_>, _>>()?;

    assert_eq!(ids(&items), vec!["a", "b", "a"]);
    Ok(())
}

#[test]
fn test_collections_without_filter_keep_duplicates() -> anyhow::Result<()> {
    let subscriptions = json!([{"id": "s"}, {"id": "s"}]);
    let transport = MockTransport::new([page("subscriptions", subscriptions, "nextURL", None)]);
    let (mut nr, _) = connect(&transport);

    let mut metric = nr.metric("m1");
    let iter = metric.subscriptions()?;
    assert!(!iter.filters_duplicates());
    assert_eq!(iter.count(), 2);
    assert_eq!(transport.urls(), vec!["/v2/metrics/m1/subscriptions".to_string()]);
    Ok(())
}

#[test]
fn test_no_request_until_first_item() -> anyhow::Result<()> {
    let transport = boundary_pages();
    let (mut nr, _) = connect(&transport);

    let mut metric = nr.metric("m1");
    let mut iter = metric.events()?;
    assert_eq!(transport.call_count(), 0);

    iter.next().transpose()?;
    assert_eq!(transport.call_count(), 1);
    Ok(())
}

#[test]
fn test_empty_collection_ends_immediately() -> anyhow::Result<()> {
    let transport = MockTransport::new([ok(json!({"events": null}))]);
    let (mut nr, _) = connect(&transport);

    let mut metric = nr.metric("m1");
    let mut iter = metric.events()?;
    assert!(iter.next().is_none());
    assert!(iter.next().is_none());
    assert_eq!(transport.call_count(), 1);
    Ok(())
}

#[test]
fn test_empty_page_with_next_link_ends_iteration() -> anyhow::Result<()> {
    let transport = MockTransport::new([
        page("events", json!([]), "nextURL", Some(SECOND)),
        page("events", events(&["9"]), "nextURL", None),
    ]);
    let (mut nr, _) = connect(&transport);

    let mut metric = nr.metric("m1");
    let mut iter = metric.events()?;
    assert!(iter.next().is_none());
    assert!(iter.next().is_none());
    assert_eq!(transport.call_count(), 1);
    Ok(())
}

#[test]
fn test_unfiltered_replay_is_identical() -> anyhow::Result<()> {
    let mut runs = Vec::new();
    for _ in 0..2 {
        let transport = boundary_pages();
        let (mut nr, _) = connect(&transport);
        nr.set_duplicate_filter(false);
        let items = nr.metric("m1").events()?.collect::<Result<Vec<_>, _>>()?;
        runs.push(ids(&items));
    }

    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[0], vec!["1", "2", "3", "3", "3", "4"]);
    Ok(())
}

#[test]
fn test_stream_uses_items_and_next() -> anyhow::Result<()> {
    let next = "https://api.numerousapp.com/v2/metrics/m1/stream?chunk=2";
    let transport = MockTransport::new([
        page("items", events(&["x"]), "next", Some(next)),
        page("items", events(&["y"]), "next", None),
    ]);
    let (mut nr, _) = connect(&transport);

    let items = nr.metric("m1").stream()?.collect::<Result<Vec<_>, _>>()?;

    assert_eq!(ids(&items), vec!["x", "y"]);
    assert_eq!(transport.urls()[0], "/v2/metrics/m1/stream");
    assert_eq!(transport.urls()[1], next);
    Ok(())
}

#[test]
fn test_bad_identifier_on_first_page() {
    let transport = MockTransport::new([status(400, "Bad Request")]);
    let (mut nr, _) = connect(&transport);

    let mut metric = nr.metric("not a metric");
    let mut iter = metric.events().unwrap();
    let err = iter.next().unwrap().unwrap_err();

    let api = err.api().expect("expected a server error record");
    assert_eq!(api.kind, ApiErrorKind::Server);
    assert_eq!(api.code, 400);
    assert_eq!(api.reason, "Bad identifier");
    assert!(iter.next().is_none());
}

#[test]
fn test_auth_failure_on_first_page_passes_through() {
    let transport = MockTransport::new([status(401, "Unauthorized")]);
    let (mut nr, _) = connect(&transport);

    let err = nr.metrics(None).unwrap().next().unwrap().unwrap_err();

    assert!(err.is_api_kind(ApiErrorKind::Auth));
    assert_eq!(transport.urls(), vec!["/v2/users/me/metrics".to_string()]);
}

#[test]
fn test_later_page_failure_is_chunking_error() {
    let transport = MockTransport::new([
        page("events", events(&["1", "2"]), "nextURL", Some(SECOND)),
        status(500, "Internal Server Error"),
    ]);
    let (mut nr, _) = connect(&transport);

    let mut metric = nr.metric("m1");
    let results: Vec<_> = metric.events().unwrap().collect();

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    let err = results[2].as_ref().unwrap_err();
    let api = err.api().expect("expected a server error record");
    assert_eq!(api.kind, ApiErrorKind::Chunking);
    assert_eq!(api.code, 500);
    assert_eq!(api.details["reason"], "Internal Server Error");
}

#[test]
fn test_transport_failure_mid_collection_is_chunking_error() {
    let transport = MockTransport::new([page("events", events(&["1"]), "nextURL", Some(SECOND))]);
    transport.push(MockResponse::Fail("connection reset".into()));
    let (mut nr, _) = connect(&transport);

    let mut metric = nr.metric("m1");
    let results: Vec<_> = metric.events().unwrap().collect();

    assert_eq!(results.len(), 2);
    let err = results[1].as_ref().unwrap_err();
    assert!(err.is_api_kind(ApiErrorKind::Chunking));
    assert_eq!(err.code(), Some(0));
}

#[test]
fn test_each_page_goes_through_the_throttle() -> anyhow::Result<()> {
    let transport = MockTransport::new([
        page("events", events(&["1"]), "nextURL", Some(SECOND)),
        too_many(0),
        page("events", events(&["2"]), "nextURL", None),
    ]);
    let (mut nr, sleeper) = connect(&transport);

    let items = nr.metric("m1").events()?.collect::<Result<Vec<_>, _>>()?;

    assert_eq!(ids(&items), vec!["1", "2"]);
    assert_eq!(sleeper.sleeps().len(), 1);
    assert_eq!(nr.statistics().counter(counters::CHUNKED_FETCHES), 2);
    assert_eq!(nr.statistics().counter(counters::SERVER_REQUESTS), 3);
    assert_eq!(nr.statistics().counter(counters::THROTTLE_429), 1);
    Ok(())
}
