//! Errors reported by the Numerous server.
//!
//! An [`ApiError`] is raised once a complete HTTP exchange has been judged a
//! failure: the server answered with a status the operation does not accept,
//! or answered with a body that could not be decoded. It carries the status
//! code, a short reason and whatever diagnostic payload was available.

use serde_json::Value;

/// Which flavor of server failure occurred.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
    strum::EnumIter,
)]
pub enum ApiErrorKind {
    /// Any non-accepted response, or an undecodable body.
    #[display("server error")]
    Server,
    /// The server rejected the credentials (401).
    #[display("authorization failure")]
    Auth,
    /// An only-if-changed write made no change.
    #[display("conflict")]
    Conflict,
    /// A collection page after the first one could not be fetched.
    #[display("chunking failure")]
    Chunking,
}

/// Error record for a failed server exchange, with source location.
///
/// # Examples
///
/// ```
/// use numerous_error::{ApiError, ApiErrorKind};
/// use serde_json::json;
///
/// let err = ApiError::new(ApiErrorKind::Server, 404, "Not Found", json!({"id": "/v1/metrics/1"}));
/// assert_eq!(err.code, 404);
/// assert_eq!(err.kind, ApiErrorKind::Server);
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("API Error: {} {} ({}) at line {} in {}", kind, code, reason, line, file)]
pub struct ApiError {
    /// The error kind
    pub kind: ApiErrorKind,
    /// HTTP status code of the failed exchange
    pub code: u16,
    /// Short reason phrase
    pub reason: String,
    /// Diagnostic payload (decoded server JSON, raw text, wrapped error)
    pub details: Value,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ApiError {
    /// Create a new ApiError at the current location.
    #[track_caller]
    pub fn new(kind: ApiErrorKind, code: u16, reason: impl Into<String>, details: Value) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            code,
            reason: reason.into(),
            details,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Generic server error.
    #[track_caller]
    pub fn server(code: u16, reason: impl Into<String>, details: Value) -> Self {
        Self::new(ApiErrorKind::Server, code, reason, details)
    }

    /// Authorization failure.
    #[track_caller]
    pub fn auth(code: u16, reason: impl Into<String>, details: Value) -> Self {
        Self::new(ApiErrorKind::Auth, code, reason, details)
    }

    /// Copy of this error under a different kind and reason.
    ///
    /// Status code and details are kept, so the original diagnosis survives
    /// re-labeling.
    #[track_caller]
    pub fn relabel(&self, kind: ApiErrorKind, reason: impl Into<String>) -> Self {
        Self::new(kind, self.code, reason, self.details.clone())
    }

    /// True for an authorization failure.
    pub fn is_auth(&self) -> bool {
        self.kind == ApiErrorKind::Auth
    }
}
