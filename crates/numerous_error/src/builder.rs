//! Errors raised while assembling a request.

/// What went wrong while assembling a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BuilderErrorKind {
    /// A request field was never set
    #[display("Missing required field: {}", _0)]
    MissingField(String),

    /// An endpoint template names a placeholder nobody supplied
    #[display("Endpoint {} has no value for {{{}}}", endpoint, field)]
    UnresolvedPlaceholder {
        /// Endpoint table name
        endpoint: String,
        /// Placeholder name without braces
        field: String,
    },

    /// The assembled request is inconsistent
    #[display("Validation failed: {}", _0)]
    ValidationFailed(String),
}

/// Request assembly error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Builder Error: {} at line {} in {}", kind, line, file)]
pub struct BuilderError {
    kind: BuilderErrorKind,
    line: u32,
    file: &'static str,
}

impl BuilderError {
    /// Create a new builder error with caller location tracking.
    #[track_caller]
    pub fn new(kind: BuilderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &BuilderErrorKind {
        &self.kind
    }
}
