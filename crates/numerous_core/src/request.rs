//! Request descriptors.
//!
//! A [`RequestDescriptor`] is the immutable description of one API call:
//! where it goes, which HTTP method, what it carries, and which status codes
//! count as success. The request loop hands the same descriptor to the
//! transport on every attempt.

use derive_getters::Getters;
use numerous_error::{BuilderError, BuilderErrorKind, NumerousResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP methods used by the Numerous API.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

/// One file part of a multipart form upload.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct MultipartFile {
    /// Form field name
    field: String,
    /// File name reported to the server
    file_name: String,
    /// Raw file contents
    bytes: Vec<u8>,
    /// MIME type of the contents
    mime_type: String,
}

impl MultipartFile {
    /// Create a multipart file part.
    pub fn new(
        field: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// The `image` part the photo endpoints expect.
    pub fn image(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self::new("image", "image.img", bytes, mime_type)
    }
}

/// Request body.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    /// No body
    #[default]
    None,
    /// JSON document, sent as `application/json`
    Json(Value),
    /// Multipart form with a single file part
    Multipart(MultipartFile),
}

/// Immutable description of one API call.
///
/// # Examples
///
/// ```
/// use numerous_core::{Method, RequestDescriptor};
///
/// let request = RequestDescriptor::builder()
///     .url("/v1/metrics/5")
///     .method(Method::Delete)
///     .success_codes(vec![204])
///     .build()
///     .unwrap();
///
/// assert!(request.accepts(204));
/// assert!(!request.accepts(200));
/// ```
#[derive(Debug, Clone, PartialEq, derive_builder::Builder, Getters)]
#[builder(setter(into), build_fn(private, name = "build_internal"))]
pub struct RequestDescriptor {
    /// Server-relative path (`/v1/...`) or absolute URL
    url: String,
    /// HTTP method
    #[builder(default)]
    method: Method,
    /// Request body
    #[builder(default)]
    payload: Payload,
    /// Status codes treated as success
    #[builder(default = "vec![200]")]
    success_codes: Vec<u16>,
}

impl RequestDescriptorBuilder {
    /// Build the RequestDescriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is missing or no accepted status code is
    /// given.
    pub fn build(&self) -> NumerousResult<RequestDescriptor> {
        let descriptor = self
            .build_internal()
            .map_err(|e| BuilderError::new(BuilderErrorKind::MissingField(e.to_string())))?;
        if descriptor.success_codes.is_empty() {
            return Err(BuilderError::new(BuilderErrorKind::ValidationFailed(
                "at least one accepted status code is required".to_string(),
            ))
            .into());
        }
        Ok(descriptor)
    }
}

impl RequestDescriptor {
    /// Creates a new request descriptor builder.
    pub fn builder() -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::default()
    }

    /// A request accepting only 200 with no body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            payload: Payload::None,
            success_codes: vec![200],
        }
    }

    /// A plain GET.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Replace the body.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Replace the accepted status codes. An empty list is ignored.
    pub fn with_success_codes(mut self, codes: impl Into<Vec<u16>>) -> Self {
        let codes = codes.into();
        if !codes.is_empty() {
            self.success_codes = codes;
        }
        self
    }

    /// Same request aimed at a different URL (used for next-page links).
    pub fn with_url(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..self.clone()
        }
    }

    /// Whether `code` is one of the accepted status codes.
    pub fn accepts(&self, code: u16) -> bool {
        self.success_codes.contains(&code)
    }
}
