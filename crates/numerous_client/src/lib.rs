//! Throttled client for the Numerous metrics API.
//!
//! A [`Connection`] owns one transport, one throttle chain and one set of
//! statistics. Every API call goes through its request loop: send, let the
//! throttle chain decide whether to retry, and classify whatever response
//! it finally accepts. Collection reads go through a [`ChunkedIter`], which
//! drives the same loop once per page.
//!
//! Connections are `Send` but every operation takes `&mut self`; give each
//! thread its own connection.
//!
//! # Example
//!
//! ```no_run
//! use numerous_client::{Connection, WriteOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut nr = Connection::new("nmrs_yourkey")?;
//! let mut metric = nr.metric("5746205777638039629");
//! metric.write(17.into(), WriteOptions::default())?;
//! for event in metric.events()? {
//!     println!("{}", event?);
//! }
//! println!("{}", serde_json::to_string(nr.statistics())?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod config;
mod connection;
mod metric;
mod server;
mod transport;

pub use collection::ChunkedIter;
pub use config::{ClientConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_SERVER};
pub use connection::{Connection, ConnectionBuilder, UNAUTHORIZED};
pub use metric::{Metric, WriteOptions};
pub use transport::{HttpTransport, RATE_REMAINING_HEADER, RATE_RESET_HEADER, Transport};
