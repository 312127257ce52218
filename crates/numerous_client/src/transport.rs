//! HTTP transport.
//!
//! A [`Transport`] performs exactly one HTTP exchange per call and reports
//! what it saw as an [`Outcome`]. It never retries, sleeps or judges the
//! status code; that is the request loop's job.

use numerous_core::{Body, Method, Outcome, Payload, RateTelemetry, RequestDescriptor};
use numerous_error::{HttpError, NumerousResult};
use reqwest::blocking::{Client, multipart};
use reqwest::header::HeaderMap;
use std::time::Instant;
use tracing::{debug, error, instrument};

/// Header carrying the requests left in the current rate window.
pub const RATE_REMAINING_HEADER: &str = "x-rate-limit-remaining";

/// Header carrying the seconds until the rate window resets.
pub const RATE_RESET_HEADER: &str = "x-rate-limit-reset";

/// One HTTP exchange per call.
pub trait Transport: std::fmt::Debug + Send {
    /// Send `request` once and report the result.
    ///
    /// # Errors
    ///
    /// Returns an error only when no HTTP response was obtained at all
    /// (connection refused, timeout, TLS failure). Any response, whatever
    /// its status, is an `Ok` outcome.
    fn execute(&self, request: &RequestDescriptor) -> NumerousResult<Outcome>;
}

/// Blocking reqwest transport with HTTP basic authentication.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    /// Create a transport for `base_url` (scheme and host, no trailing
    /// slash) authenticating with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> NumerousResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("numerous-rust/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::new(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Base URL server-relative paths are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `url`; next-page links arrive already absolute.
    pub fn absolute_url(&self, url: &str) -> String {
        if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            url.to_string()
        }
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    fn execute(&self, request: &RequestDescriptor) -> NumerousResult<Outcome> {
        let url = self.absolute_url(request.url());
        let mut builder = self
            .client
            .request(reqwest_method(*request.method()), &url)
            .basic_auth(&self.api_key, Some(""));

        match request.payload() {
            Payload::None => {}
            Payload::Json(value) => builder = builder.json(value),
            Payload::Multipart(file) => {
                let part = multipart::Part::bytes(file.bytes().clone())
                    .file_name(file.file_name().clone())
                    .mime_str(file.mime_type())
                    .map_err(|e| HttpError::new(format!("Invalid MIME type: {}", e)))?;
                builder = builder.multipart(multipart::Form::new().part(file.field().clone(), part));
            }
        }

        let started = Instant::now();
        let response = builder.send().map_err(|e| {
            error!(error = %e, "HTTP request failed");
            HttpError::new(format!("Request to {} failed: {}", url, e))
        })?;

        let status = response.status();
        let rate = RateTelemetry {
            remaining: header_value(response.headers(), RATE_REMAINING_HEADER),
            reset: header_value(response.headers(), RATE_RESET_HEADER),
        };
        let text = response
            .text()
            .map_err(|e| HttpError::new(format!("Failed to read response body: {}", e)))?;
        let elapsed = started.elapsed();

        debug!(
            status = status.as_u16(),
            remaining = ?rate.remaining,
            reset = ?rate.reset,
            elapsed_ms = elapsed.as_millis() as u64,
            "HTTP exchange complete"
        );

        Ok(Outcome::new(status.as_u16(), Body::from_text(&text))
            .with_reason(status.canonical_reason().unwrap_or_default())
            .with_elapsed(elapsed)
            .with_rate(rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_relative_urls_resolve_against_base() {
        let transport = HttpTransport::new("key", "https://api.numerousapp.com/").unwrap();
        assert_eq!(
            transport.absolute_url("/v1/metrics/5"),
            "https://api.numerousapp.com/v1/metrics/5"
        );
        assert_eq!(
            transport.absolute_url("https://api.numerousapp.com/v2/next?chunk=2"),
            "https://api.numerousapp.com/v2/next?chunk=2"
        );
    }

    #[test]
    fn test_missing_or_garbled_headers_are_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert(RATE_REMAINING_HEADER, HeaderValue::from_static("37"));
        headers.insert(RATE_RESET_HEADER, HeaderValue::from_static("soon"));

        assert_eq!(header_value(&headers, RATE_REMAINING_HEADER), Some(37));
        assert_eq!(header_value(&headers, RATE_RESET_HEADER), None);
        assert_eq!(header_value(&HeaderMap::new(), RATE_REMAINING_HEADER), None);
    }
}
