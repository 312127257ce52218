//! Error types for the Numerous client.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! [`ApiError`] is the record for a failed server exchange. It is tagged
//! with an [`ApiErrorKind`] and carries the HTTP status code, a short reason
//! and a JSON details payload. Everything else (transport failures,
//! configuration problems) has its own small error type, and all of them
//! convert into [`NumerousError`].
//!
//! # Examples
//!
//! ```
//! use numerous_error::{NumerousResult, HttpError};
//!
//! fn fetch_data() -> NumerousResult<String> {
//!     Err(HttpError::new("Connection refused"))?
//! }
//!
//! match fetch_data() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod builder;
mod config;
mod error;
mod http;
mod json;

pub use api::{ApiError, ApiErrorKind};
pub use builder::{BuilderError, BuilderErrorKind};
pub use config::ConfigError;
pub use error::{NumerousError, NumerousErrorKind, NumerousResult};
pub use http::HttpError;
pub use json::JsonError;
