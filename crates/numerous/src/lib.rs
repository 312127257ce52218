//! Numerous - client for the Numerous metrics API
//!
//! Numerous tracks numbers ("metrics") that users update and subscribe to.
//! This crate reads and writes them over the REST API, slowing down as the
//! server's rate quota runs low and retrying when the server says "too many
//! requests".
//!
//! # Quick Start
//!
//! ```no_run
//! use numerous::{Connection, WriteOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! numerous::init_tracing()?;
//!
//! let mut nr = Connection::new(std::env::var("NUMEROUS_API_KEY")?)?;
//! let mut metric = nr.metric("5746205777638039629");
//! metric.write(42.into(), WriteOptions::only_if_changed())?;
//!
//! for item in metric.stream()? {
//!     println!("{}", item?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `numerous_error` - Error types
//! - `numerous_core` - Request descriptors, outcomes, statistics, endpoint table
//! - `numerous_throttle` - Throttle policy chain and bundled policies
//! - `numerous_client` - Transport, request loop, collections, API operations
//!
//! This crate (`numerous`) re-exports everything for convenience.

#![forbid(unsafe_code)]

mod logging;

pub use logging::{init_json_tracing, init_tracing};

pub use numerous_client::*;
pub use numerous_core::*;
pub use numerous_error::*;
pub use numerous_throttle::*;
