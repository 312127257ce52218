//! Top-level error wrapper types.

use crate::{ApiError, ApiErrorKind, BuilderError, ConfigError, HttpError, JsonError};

/// Every error condition the Numerous crates can produce.
///
/// # Examples
///
/// ```
/// use numerous_error::{NumerousError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: NumerousError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum NumerousErrorKind {
    /// Error record from a completed server exchange
    #[from(ApiError)]
    Api(ApiError),
    /// Transport failure
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
}

/// Numerous error with kind discrimination.
///
/// # Examples
///
/// ```
/// use numerous_error::{ApiError, NumerousResult};
/// use serde_json::Value;
///
/// fn read_metric() -> NumerousResult<Value> {
///     Err(ApiError::auth(401, "Unauthorized", Value::Null))?
/// }
///
/// let err = read_metric().unwrap_err();
/// assert_eq!(err.code(), Some(401));
/// assert!(err.api().is_some_and(|api| api.is_auth()));
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Numerous Error: {}", _0)]
pub struct NumerousError(Box<NumerousErrorKind>);

impl NumerousError {
    /// Create a new error from a kind.
    pub fn new(kind: NumerousErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &NumerousErrorKind {
        &self.0
    }

    /// The server error record, if this is one.
    pub fn api(&self) -> Option<&ApiError> {
        match self.kind() {
            NumerousErrorKind::Api(api) => Some(api),
            _ => None,
        }
    }

    /// HTTP status code of a server error record.
    pub fn code(&self) -> Option<u16> {
        self.api().map(|api| api.code)
    }

    /// True if this is a server error record of the given kind.
    pub fn is_api_kind(&self, kind: ApiErrorKind) -> bool {
        self.api().is_some_and(|api| api.kind == kind)
    }
}

// Generic From implementation for any type that converts to NumerousErrorKind
impl<T> From<T> for NumerousError
where
    T: Into<NumerousErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Numerous operations.
pub type NumerousResult<T> = std::result::Result<T, NumerousError>;
