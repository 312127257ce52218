//! Throttle policies for the Numerous request loop.
//!
//! After every HTTP attempt the request loop asks a [`ThrottleChain`]
//! whether to retry. The chain is an ordered list of [`ThrottlePolicy`]
//! nodes ending in the built-in [`DefaultPolicy`]. Each node either decides
//! on its own or hands the same parameters to the rest of the chain through
//! [`Next`], so custom nodes behave like decorators around the default.
//!
//! ## Bundled policies
//!
//! - [`DefaultPolicy`] - fixed backoff schedule for 429 responses plus a
//!   voluntary slow-down when the remaining quota runs low
//! - [`NoVoluntaryBackoff`] - keeps 429 handling, skips the slow-down
//! - [`RequestRecorder`] - logs every attempt, then delegates
//! - [`PacingPolicy`] - client-side pacing with a `governor` quota
//!
//! All sleeping goes through a [`Sleeper`] so the blocking delays can be
//! observed in tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chain;
mod config;
mod default_policy;
mod params;
mod policies;
mod policy;
mod sleeper;

pub use chain::{ThrottleChain, ThrottleChainBuilder};
pub use config::ThrottleConfig;
pub use default_policy::{DEFAULT_BACKOFF_SCHEDULE, DEFAULT_VOLUNTARY_THRESHOLD, DefaultPolicy};
pub use params::{TOO_MANY_REQUESTS, ThrottleParams};
pub use policies::{NoVoluntaryBackoff, PacingPolicy, RecordedRequest, RequestLog, RequestRecorder};
pub use policy::{Next, ThrottleContext, ThrottlePolicy};
pub use sleeper::{RecordingSleeper, Sleeper, ThreadSleeper};
