//! Account-level operations: users, metric lists, metric creation.

use crate::{ChunkedIter, Connection, Metric, Transport};
use numerous_core::{ApiContext, Method, MultipartFile, Payload};
use numerous_error::{ApiError, NumerousResult};
use serde_json::{Map, Value};
use tracing::{info, instrument};

impl<T: Transport> Connection<T> {
    /// Handle on metric `id`. No request is made.
    pub fn metric(&mut self, id: impl Into<String>) -> Metric<'_, T> {
        Metric::new(self, id)
    }

    /// Metrics owned by `user` (yourself when `None`).
    ///
    /// # Errors
    ///
    /// Returns an error only if the endpoint cannot be resolved; request
    /// failures surface through the iterator.
    pub fn metrics(&mut self, user: Option<&str>) -> NumerousResult<ChunkedIter<'_, T>> {
        let api = ApiContext::resolve("metrics-collection", Method::Get, &[("userId", user)])?;
        self.collection(&api)
    }

    /// Subscriptions held by `user` (yourself when `None`).
    ///
    /// # Errors
    ///
    /// See [`Connection::metrics`].
    pub fn subscriptions(&mut self, user: Option<&str>) -> NumerousResult<ChunkedIter<'_, T>> {
        let api = ApiContext::resolve("user-subscriptions", Method::Get, &[("userId", user)])?;
        self.collection(&api)
    }

    /// Profile of `user` (yourself when `None`).
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the read fails.
    pub fn user(&mut self, user: Option<&str>) -> NumerousResult<Value> {
        let api = ApiContext::resolve("user", Method::Get, &[("userId", user)])?;
        self.call(&api)
    }

    /// Upload your own profile photo.
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the upload fails.
    pub fn user_photo(&mut self, image: Vec<u8>, mime_type: &str) -> NumerousResult<Value> {
        let api = ApiContext::resolve("user-photo", Method::Post, &[])?;
        self.call_with(&api, Payload::Multipart(MultipartFile::image(image, mime_type)))
    }

    /// The most popular metrics (the server default count when `None`).
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the read fails.
    pub fn most_popular(&mut self, count: Option<u32>) -> NumerousResult<Value> {
        let count = count.map(|c| c.to_string());
        let api = ApiContext::resolve("popular", Method::Get, &[("count", count.as_deref())])?;
        self.call(&api)
    }

    /// Check connectivity and credentials by reading your own profile.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying read is returned as is.
    pub fn ping(&mut self) -> NumerousResult<bool> {
        self.user(None)?;
        Ok(true)
    }

    /// Create a metric named `label`.
    ///
    /// `attributes` seeds the new metric's fields; `value`, when given,
    /// overrides any value among them.
    ///
    /// # Errors
    ///
    /// Returns the request loop's error, or a server error if the response
    /// carries no metric ID.
    #[instrument(skip(self, attributes))]
    pub fn create_metric(
        &mut self,
        label: &str,
        value: Option<Value>,
        attributes: Map<String, Value>,
    ) -> NumerousResult<Metric<'_, T>> {
        let mut body = attributes;
        body.insert("label".to_string(), Value::String(label.to_string()));
        if let Some(value) = value {
            body.insert("value".to_string(), value);
        }

        let api = ApiContext::resolve("create", Method::Post, &[])?;
        let created = self.call_with(&api, Payload::Json(Value::Object(body)))?;
        let id = match created.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(ApiError::server(201, "Created metric has no id", created).into());
            }
        };

        info!(metric_id = %id, "Created metric");
        Ok(self.metric(id))
    }
}
