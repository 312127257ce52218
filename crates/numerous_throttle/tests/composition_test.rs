//! Tests for chaining custom policies in front of the default.

use numerous_core::{Body, Method, Outcome, RateTelemetry, RequestDescriptor, Statistics, counters};
use numerous_throttle::{
    Next, NoVoluntaryBackoff, PacingPolicy, RecordingSleeper, RequestRecorder, ThrottleChain,
    ThrottleConfig, ThrottleContext, ThrottleParams, ThrottlePolicy,
};
use std::num::NonZeroU32;
use std::time::Duration;

fn low_quota_ok() -> Outcome {
    Outcome::new(200, Body::Empty).with_rate(RateTelemetry::known(5, 30))
}

fn too_many() -> Outcome {
    Outcome::new(429, Body::Empty).with_rate(RateTelemetry::known(0, 1))
}

struct Harness {
    stats: Statistics,
    sleeper: RecordingSleeper,
    request: RequestDescriptor,
}

impl Harness {
    fn new() -> Self {
        Self {
            stats: Statistics::default(),
            sleeper: RecordingSleeper::default(),
            request: RequestDescriptor::new(Method::Post, "/v1/metrics/7/events"),
        }
    }

    fn decide(&mut self, chain: &mut ThrottleChain, attempt: u32, outcome: &Outcome) -> bool {
        let params = ThrottleParams::new(attempt, outcome, &self.request);
        let mut ctx = ThrottleContext {
            stats: &mut self.stats,
            sleeper: &self.sleeper,
        };
        chain.decide(&mut ctx, &params)
    }
}

#[test]
fn test_no_voluntary_backoff_skips_slowdown() {
    let mut chain = ThrottleChain::builder()
        .policy(NoVoluntaryBackoff::default())
        .build();
    let mut h = Harness::new();

    assert!(!h.decide(&mut chain, 0, &low_quota_ok()));
    assert!(h.sleeper.sleeps().is_empty());
    assert_eq!(h.stats.counter(counters::THROTTLE_VOLUNTARY), 0);
}

#[test]
fn test_no_voluntary_backoff_keeps_429_handling() {
    let mut chain = ThrottleChain::builder()
        .policy(NoVoluntaryBackoff::default())
        .build();
    let mut h = Harness::new();

    assert!(h.decide(&mut chain, 0, &too_many()));
    assert_eq!(h.sleeper.sleeps(), vec![Duration::from_secs(3)]);
    assert_eq!(h.stats.counter(counters::THROTTLE_429), 1);
}

#[test]
fn test_no_voluntary_backoff_with_extra_codes() {
    let mut chain = ThrottleChain::builder()
        .policy(NoVoluntaryBackoff::with_codes([429, 500]))
        .build();
    let mut h = Harness::new();

    // 500 reaches the default, which accepts it (not a 429) with no slow-down
    // because the quota is unknown.
    let outcome = Outcome::new(500, Body::Empty);
    assert!(!h.decide(&mut chain, 0, &outcome));
    assert!(h.sleeper.sleeps().is_empty());
}

#[test]
fn test_recorder_logs_and_delegates() {
    let (recorder, log) = RequestRecorder::new();
    let mut chain = ThrottleChain::builder().policy(recorder).build();
    let mut h = Harness::new();

    assert!(h.decide(&mut chain, 0, &too_many()));
    assert!(!h.decide(&mut chain, 1, &low_quota_ok()));

    let entries = log.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].method, Method::Post);
    assert_eq!(entries[0].url, "/v1/metrics/7/events");
    assert_eq!(entries[0].result_code, 429);
    assert_eq!(entries[1].attempt, 1);

    // The default still ran behind the recorder.
    assert_eq!(h.stats.counter(counters::THROTTLE_429), 1);
    assert_eq!(h.stats.counter(counters::THROTTLE_VOLUNTARY), 1);
}

#[derive(Debug)]
struct AcceptEverything;

impl ThrottlePolicy for AcceptEverything {
    fn decide(
        &mut self,
        _ctx: &mut ThrottleContext<'_>,
        _params: &ThrottleParams<'_>,
        _next: Next<'_>,
    ) -> bool {
        false
    }
}

#[test]
fn test_node_that_does_not_delegate_short_circuits() {
    let mut chain = ThrottleChain::builder()
        .policy(AcceptEverything)
        .policy(NoVoluntaryBackoff::default())
        .build();
    let mut h = Harness::new();

    assert!(!h.decide(&mut chain, 0, &too_many()));
    assert!(h.sleeper.sleeps().is_empty());
    assert_eq!(h.stats.counter(counters::THROTTLE_429), 0);
}

#[test]
fn test_decide_from_position_skips_earlier_nodes() {
    let mut chain = ThrottleChain::builder()
        .policy(AcceptEverything)
        .build();
    let mut h = Harness::new();
    let outcome = too_many();
    let params = ThrottleParams::new(0, &outcome, &h.request);
    let mut ctx = ThrottleContext {
        stats: &mut h.stats,
        sleeper: &h.sleeper,
    };

    assert!(!chain.decide_from(0, &mut ctx, &params));
    assert!(chain.decide_from(1, &mut ctx, &params));
    assert!(!chain.decide_from(7, &mut ctx, &params));
}

#[test]
fn test_pacing_policy_sleeps_once_quota_is_spent() {
    let per_hour_one = governor::Quota::per_hour(NonZeroU32::MIN);
    let mut chain = ThrottleChain::builder()
        .policy(PacingPolicy::new(per_hour_one))
        .build();
    let mut h = Harness::new();
    let outcome = Outcome::new(200, Body::Empty);

    assert!(!h.decide(&mut chain, 0, &outcome));
    assert!(h.sleeper.sleeps().is_empty());

    assert!(!h.decide(&mut chain, 0, &outcome));
    let sleeps = h.sleeper.sleeps();
    assert_eq!(sleeps.len(), 1);
    assert!(sleeps[0] > Duration::from_secs(60));
    assert_eq!(h.stats.counter(counters::THROTTLE_PACED), 1);
}

#[test]
fn test_chain_from_config() {
    let config = ThrottleConfig {
        voluntary_threshold: 10,
        backoff_schedule: vec![4],
    };
    let mut chain = ThrottleChain::from_config(&config);
    let mut h = Harness::new();

    // 5 remaining is below 10 and not more than half: long delay.
    assert!(!h.decide(&mut chain, 0, &low_quota_ok()));
    assert_eq!(h.sleeper.sleeps(), vec![Duration::from_secs(3)]);

    assert!(h.decide(&mut chain, 0, &too_many()));
    assert_eq!(h.sleeper.sleeps()[1], Duration::from_secs(5));
}

#[test]
fn test_config_validation() {
    assert!(ThrottleConfig::default().validate().is_ok());

    let negative = ThrottleConfig {
        voluntary_threshold: -1,
        ..ThrottleConfig::default()
    };
    assert!(negative.validate().is_err());

    let empty = ThrottleConfig {
        backoff_schedule: vec![],
        ..ThrottleConfig::default()
    };
    assert!(empty.validate().is_err());
}
