//! Operations on a single metric.

use crate::{ChunkedIter, Connection, Transport};
use numerous_core::{ApiContext, Method, MultipartFile, Payload};
use numerous_error::{ApiError, ApiErrorKind, NumerousResult};
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

/// Status codes that mean a metric ID does not name a metric.
const INVALID_ID_CODES: [u16; 2] = [400, 404];

/// Status code for an only-if-changed write that changed nothing.
const CONFLICT: u16 = 409;

/// Flags for [`Metric::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    /// Fail with a conflict error if the value would not change
    pub only_if_changed: bool,
    /// Add the value to the current one instead of replacing it
    pub add: bool,
}

impl WriteOptions {
    /// Only write if the value changes.
    pub fn only_if_changed() -> Self {
        Self {
            only_if_changed: true,
            ..Self::default()
        }
    }

    /// Add to the current value.
    pub fn add() -> Self {
        Self {
            add: true,
            ..Self::default()
        }
    }
}

/// Handle on one metric, borrowing the connection it talks through.
#[derive(Debug)]
pub struct Metric<'c, T: Transport> {
    connection: &'c mut Connection<T>,
    id: String,
}

impl<'c, T: Transport> Metric<'c, T> {
    pub(crate) fn new(connection: &'c mut Connection<T>, id: impl Into<String>) -> Self {
        Self {
            connection,
            id: id.into(),
        }
    }

    /// The metric ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    fn api(&self, name: &str, method: Method, extra: &[(&str, Option<&str>)]) -> NumerousResult<ApiContext> {
        let mut substitutions = vec![("metricId", Some(self.id.as_str()))];
        substitutions.extend_from_slice(extra);
        ApiContext::resolve(name, method, &substitutions)
    }

    fn collection(&mut self, name: &str) -> NumerousResult<ChunkedIter<'_, T>> {
        let api = self.api(name, Method::Get, &[])?;
        self.connection.collection(&api)
    }

    fn write_interaction(&mut self, body: Value) -> NumerousResult<String> {
        let api = self.api("interactions", Method::Post, &[])?;
        let created = self.connection.call_with(&api, Payload::Json(body))?;
        created_id(created)
    }

    /// All fields of the metric.
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the read fails.
    pub fn read(&mut self) -> NumerousResult<Value> {
        let api = self.api("metric", Method::Get, &[])?;
        self.connection.call(&api)
    }

    /// The metric's current value (null if the server sent none).
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the read fails.
    pub fn read_value(&mut self) -> NumerousResult<Value> {
        let mut fields = self.read()?;
        Ok(fields.get_mut("value").map(Value::take).unwrap_or(Value::Null))
    }

    /// The metric's label.
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the read fails.
    pub fn label(&mut self) -> NumerousResult<Option<String>> {
        let fields = self.read()?;
        Ok(fields.get("label").and_then(Value::as_str).map(str::to_string))
    }

    /// The metric's web link.
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the read fails.
    pub fn web_url(&mut self) -> NumerousResult<Option<String>> {
        let fields = self.read()?;
        Ok(fields
            .pointer("/links/web")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Whether the ID names an existing metric.
    ///
    /// A metric that exists now can still be deleted a moment later.
    ///
    /// # Errors
    ///
    /// Failures other than "bad ID" (400) and "not found" (404) are returned
    /// as is.
    pub fn validate(&mut self) -> NumerousResult<bool> {
        match self.read() {
            Ok(_) => Ok(true),
            Err(e) if e.code().is_some_and(|code| INVALID_ID_CODES.contains(&code)) => {
                debug!(metric_id = %self.id, code = ?e.code(), "Metric ID is not valid");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Iterate the metric's events, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error only if the endpoint cannot be resolved.
    pub fn events(&mut self) -> NumerousResult<ChunkedIter<'_, T>> {
        self.collection("events")
    }

    /// Iterate the metric's stream (events and interactions merged).
    ///
    /// # Errors
    ///
    /// Returns an error only if the endpoint cannot be resolved.
    pub fn stream(&mut self) -> NumerousResult<ChunkedIter<'_, T>> {
        self.collection("stream")
    }

    /// Iterate the metric's interactions (comments, likes, errors).
    ///
    /// # Errors
    ///
    /// Returns an error only if the endpoint cannot be resolved.
    pub fn interactions(&mut self) -> NumerousResult<ChunkedIter<'_, T>> {
        self.collection("interactions")
    }

    /// Iterate the subscriptions to this metric.
    ///
    /// # Errors
    ///
    /// Returns an error only if the endpoint cannot be resolved.
    pub fn subscriptions(&mut self) -> NumerousResult<ChunkedIter<'_, T>> {
        self.collection("subscriptions")
    }

    /// One user's subscription to this metric (yours when `None`).
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the read fails.
    pub fn subscription(&mut self, user: Option<&str>) -> NumerousResult<Value> {
        let api = self.api("subscription", Method::Get, &[("userId", user)])?;
        self.connection.call(&api)
    }

    /// Subscribe to this metric.
    ///
    /// The server wants the complete subscription on every write, so unless
    /// `overwrite_all` is set the current subscription is read first and
    /// `params` merged over it.
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the read or write fails.
    #[instrument(skip(self, params), fields(metric_id = %self.id))]
    pub fn subscribe(
        &mut self,
        params: Map<String, Value>,
        user: Option<&str>,
        overwrite_all: bool,
    ) -> NumerousResult<Value> {
        let body = if overwrite_all {
            params
        } else {
            merge(self.subscription(user)?, params)
        };
        let api = self.api("subscription", Method::Put, &[("userId", user)])?;
        self.connection.call_with(&api, Payload::Json(Value::Object(body)))
    }

    /// Write a new value, returning the event the server created.
    ///
    /// # Errors
    ///
    /// With [`WriteOptions::only_if_changed`], a 409 from the server comes
    /// back as a conflict error. Other failures are returned as is.
    #[instrument(skip(self), fields(metric_id = %self.id))]
    pub fn write(&mut self, value: Value, options: WriteOptions) -> NumerousResult<Value> {
        let mut body = json!({ "value": value });
        if options.only_if_changed {
            body["onlyIfChanged"] = Value::Bool(true);
        }
        if options.add {
            body["action"] = Value::String("ADD".to_string());
        }

        let api = self.api("events", Method::Post, &[])?;
        match self.connection.call_with(&api, Payload::Json(body)) {
            Err(e) if options.only_if_changed && e.code() == Some(CONFLICT) => {
                let conflict = e
                    .api()
                    .map(|api| api.relabel(ApiErrorKind::Conflict, "No change"))
                    .unwrap_or_else(|| ApiError::new(ApiErrorKind::Conflict, CONFLICT, "No change", Value::Null));
                Err(conflict.into())
            }
            other => other,
        }
    }

    /// Update the metric's settings (label, description and so on).
    ///
    /// The server replaces all settings on every write, so unless
    /// `overwrite_all` is set the metric is read first and `params` merged
    /// over it.
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the read or write fails.
    #[instrument(skip(self, params), fields(metric_id = %self.id))]
    pub fn update(&mut self, params: Map<String, Value>, overwrite_all: bool) -> NumerousResult<Value> {
        let body = if overwrite_all {
            params
        } else {
            merge(self.read()?, params)
        };
        let api = self.api("metric", Method::Put, &[])?;
        self.connection.call_with(&api, Payload::Json(Value::Object(body)))
    }

    /// Like the metric. Returns the new interaction's ID.
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the write fails.
    pub fn like(&mut self) -> NumerousResult<String> {
        self.write_interaction(json!({ "kind": "like" }))
    }

    /// Comment on the metric. Returns the new interaction's ID.
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the write fails.
    pub fn comment(&mut self, text: &str) -> NumerousResult<String> {
        self.write_interaction(json!({ "kind": "comment", "commentBody": text }))
    }

    /// Attach an error report to the metric. Returns the new interaction's
    /// ID.
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the write fails.
    pub fn send_error(&mut self, text: &str) -> NumerousResult<String> {
        self.write_interaction(json!({ "kind": "error", "commentBody": text }))
    }

    /// Upload the metric's photo.
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the upload fails.
    pub fn photo(&mut self, image: Vec<u8>, mime_type: &str) -> NumerousResult<Value> {
        let api = self.api("photo", Method::Post, &[])?;
        self.connection
            .call_with(&api, Payload::Multipart(MultipartFile::image(image, mime_type)))
    }

    /// Remove the metric's photo.
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the delete fails.
    pub fn photo_delete(&mut self) -> NumerousResult<()> {
        let api = self.api("photo", Method::Delete, &[])?;
        self.connection.call(&api).map(|_| ())
    }

    /// One event by ID.
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the read fails.
    pub fn event(&mut self, event_id: &str) -> NumerousResult<Value> {
        let api = self.api("event", Method::Get, &[("eventId", Some(event_id))])?;
        self.connection.call(&api)
    }

    /// Delete one event.
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the delete fails.
    pub fn event_delete(&mut self, event_id: &str) -> NumerousResult<()> {
        let api = self.api("event", Method::Delete, &[("eventId", Some(event_id))])?;
        self.connection.call(&api).map(|_| ())
    }

    /// One interaction by ID.
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the read fails.
    pub fn interaction(&mut self, interaction_id: &str) -> NumerousResult<Value> {
        let api = self.api("interaction", Method::Get, &[("interactionId", Some(interaction_id))])?;
        self.connection.call(&api)
    }

    /// Delete one interaction.
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the delete fails.
    pub fn interaction_delete(&mut self, interaction_id: &str) -> NumerousResult<()> {
        let api = self.api(
            "interaction",
            Method::Delete,
            &[("interactionId", Some(interaction_id))],
        )?;
        self.connection.call(&api).map(|_| ())
    }

    /// Delete the metric. This cannot be undone.
    ///
    /// # Errors
    ///
    /// Returns the request loop's error if the delete fails.
    #[instrument(skip(self), fields(metric_id = %self.id))]
    pub fn delete(&mut self) -> NumerousResult<()> {
        let api = self.api("metric", Method::Delete, &[])?;
        self.connection.call(&api).map(|_| ())
    }
}

/// `current` as an object with `updates` written over it.
fn merge(current: Value, updates: Map<String, Value>) -> Map<String, Value> {
    let mut merged = match current {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    merged.extend(updates);
    merged
}

fn created_id(created: Value) -> NumerousResult<String> {
    match created.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(ApiError::server(201, "Created interaction has no id", created).into()),
    }
}
