//! Core data types for the Numerous metrics API client.
//!
//! This crate holds the plain data shared by the throttling and client
//! crates: what a request looks like before it is sent, what the transport
//! observed when it came back, the per-connection statistics, and the static
//! table of REST endpoints.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod endpoint;
mod outcome;
mod request;
mod statistics;

pub use endpoint::{ApiContext, CollectionKeys, Endpoint, OpInfo, endpoint};
pub use outcome::{Body, Outcome, RateTelemetry};
pub use request::{Method, MultipartFile, Payload, RequestDescriptor, RequestDescriptorBuilder};
pub use statistics::{ResponseTimes, Statistics, counters};
