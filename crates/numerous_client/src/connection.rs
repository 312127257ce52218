//! The connection and its request loop.

use crate::{ChunkedIter, ClientConfig, HttpTransport, Transport};
use numerous_core::{ApiContext, Body, Payload, RequestDescriptor, Statistics, counters};
use numerous_error::{ApiError, ConfigError, NumerousResult};
use numerous_throttle::{Sleeper, ThreadSleeper, ThrottleChain, ThrottleContext, ThrottleParams};
use serde_json::{Map, Value, json};
use tracing::{debug, instrument, warn};

/// Status code the server uses for bad credentials.
pub const UNAUTHORIZED: u16 = 401;

/// A client session with the Numerous API.
///
/// Owns the transport, the throttle chain, the sleeper and the statistics.
/// Every operation takes `&mut self`, so a connection is used by one thread
/// at a time; threads that need concurrency each build their own.
#[derive(Debug)]
pub struct Connection<T: Transport = HttpTransport> {
    transport: T,
    chain: ThrottleChain,
    sleeper: Box<dyn Sleeper>,
    stats: Statistics,
    max_attempts: u32,
    filter_duplicates: bool,
}

impl Connection<HttpTransport> {
    /// Connect to the default server with bundled default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> NumerousResult<Self> {
        Self::from_config(api_key, &ClientConfig::default())
    }

    /// Connect using `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn from_config(api_key: impl Into<String>, config: &ClientConfig) -> NumerousResult<Self> {
        let transport = HttpTransport::new(api_key, config.base_url())?;
        Connection::builder(transport).config(config.clone()).build()
    }
}

impl<T: Transport> Connection<T> {
    /// Start building a connection around `transport`.
    pub fn builder(transport: T) -> ConnectionBuilder<T> {
        ConnectionBuilder {
            transport,
            config: ClientConfig::default(),
            chain: None,
            sleeper: None,
        }
    }

    /// Usage statistics for this connection.
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Mutable access to the statistics, to resize the response-time window.
    pub fn statistics_mut(&mut self) -> &mut Statistics {
        &mut self.stats
    }

    /// The transport this connection sends through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Attempt ceiling for one API call.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether collections drop boundary duplicates.
    pub fn filters_duplicates(&self) -> bool {
        self.filter_duplicates
    }

    /// Turn boundary-duplicate filtering on or off for collections started
    /// after this call. Returns the previous setting.
    pub fn set_duplicate_filter(&mut self, enabled: bool) -> bool {
        std::mem::replace(&mut self.filter_duplicates, enabled)
    }

    /// Replace the throttle chain.
    pub fn set_throttle(&mut self, chain: ThrottleChain) {
        self.chain = chain;
    }

    /// Perform one API call through the request loop.
    ///
    /// The request is sent until the throttle chain declines a retry or the
    /// attempt ceiling is reached; the last response is then classified.
    ///
    /// # Errors
    ///
    /// Returns an auth error on 401, a server error for any other status the
    /// request does not accept or for an undecodable body, and a transport
    /// error if no response was obtained.
    ///
    /// The chain also sees the final permitted attempt, so a 429 there still
    /// sleeps before the error is returned.
    #[instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    pub fn execute(&mut self, request: &RequestDescriptor) -> NumerousResult<Value> {
        self.stats.increment(counters::SIMPLE_API);

        let mut last = None;
        for attempt in 0..self.max_attempts {
            self.stats.increment(counters::SERVER_REQUESTS);
            let outcome = self.transport.execute(request)?;
            self.stats.record_response_time(*outcome.elapsed());
            self.stats
                .observe_rate(outcome.rate().remaining, outcome.rate().reset);

            let params = ThrottleParams::new(attempt, &outcome, request);
            let mut ctx = ThrottleContext {
                stats: &mut self.stats,
                sleeper: self.sleeper.as_ref(),
            };
            let retry = self.chain.decide(&mut ctx, &params);
            debug!(attempt, status = *outcome.status(), retry, "Attempt complete");

            last = Some(outcome);
            if !retry {
                break;
            }
        }

        let outcome = last.ok_or_else(|| ConfigError::new("max_attempts must be at least 1"))?;
        let code = *outcome.status();
        let url = request.url();

        if request.accepts(code) {
            return match outcome.into_body() {
                Body::Json(value) => Ok(value),
                Body::Empty => Ok(Value::Object(Map::new())),
                Body::Undecodable(text) => {
                    warn!(code, "Accepted response body is not JSON");
                    Err(ApiError::server(
                        code,
                        "JSON decode failure",
                        json!({
                            "error-type": "JSONDecodeError",
                            "code": code,
                            "value": text,
                            "id": url,
                        }),
                    )
                    .into())
                }
            };
        }

        self.stats.increment(counters::SERVER_ERRORS);
        let reason = if outcome.reason().is_empty() {
            format!("HTTP {}", code)
        } else {
            outcome.reason().clone()
        };
        let details = json!({
            "error-type": "HTTPError",
            "code": code,
            "reason": reason,
            "value": format!("Server returned an HTTP error: {}", reason),
            "id": url,
            "body": outcome.body_as_json(),
        });
        warn!(code, reason = %reason, "Server rejected request");

        if code == UNAUTHORIZED {
            Err(ApiError::auth(code, reason, details).into())
        } else {
            Err(ApiError::server(code, reason, details).into())
        }
    }

    /// Perform the operation described by `api` with no body.
    ///
    /// # Errors
    ///
    /// See [`Connection::execute`].
    pub fn call(&mut self, api: &ApiContext) -> NumerousResult<Value> {
        self.execute(&api.request())
    }

    /// Perform the operation described by `api` carrying `payload`.
    ///
    /// # Errors
    ///
    /// See [`Connection::execute`].
    pub fn call_with(&mut self, api: &ApiContext, payload: Payload) -> NumerousResult<Value> {
        self.execute(&api.request_with(payload))
    }

    /// Iterate over the paginated collection described by `api`.
    ///
    /// No request is made until the first item is asked for.
    ///
    /// # Errors
    ///
    /// Returns an error if `api` does not describe a collection read.
    pub fn collection(&mut self, api: &ApiContext) -> NumerousResult<ChunkedIter<'_, T>> {
        let keys = api.collection().ok_or_else(|| {
            ConfigError::new(format!("{} {} is not a collection", api.method(), api.url()))
        })?;
        let request = api.request();
        Ok(ChunkedIter::new(self, request, keys))
    }

    pub(crate) fn record(&mut self, counter: &str) {
        self.stats.increment(counter);
    }
}

/// Builder for [`Connection`].
#[derive(Debug)]
pub struct ConnectionBuilder<T: Transport> {
    transport: T,
    config: ClientConfig,
    chain: Option<ThrottleChain>,
    sleeper: Option<Box<dyn Sleeper>>,
}

impl<T: Transport> ConnectionBuilder<T> {
    /// Use `config` for attempts, duplicate filtering, the response-time
    /// window and, unless [`throttle`](Self::throttle) is called, the
    /// default throttle policy.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom throttle chain.
    pub fn throttle(mut self, chain: ThrottleChain) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Use a custom sleeper (tests inject a recording one).
    pub fn sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Some(Box::new(sleeper));
        self
    }

    /// Attempt ceiling for one API call. A 429 on the last attempt still
    /// sleeps its backoff before the call fails.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.max_attempts = max_attempts;
        self
    }

    /// Initial duplicate-filter setting.
    pub fn filter_duplicates(mut self, enabled: bool) -> Self {
        self.config.filter_duplicates = enabled;
        self
    }

    /// Number of recent response times kept.
    pub fn response_time_window(mut self, window: usize) -> Self {
        self.config.response_time_window = window;
        self
    }

    /// Build the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> NumerousResult<Connection<T>> {
        self.config.validate()?;
        let chain = self
            .chain
            .unwrap_or_else(|| ThrottleChain::from_config(&self.config.throttle));
        let sleeper = self.sleeper.unwrap_or_else(|| Box::new(ThreadSleeper));

        Ok(Connection {
            transport: self.transport,
            chain,
            sleeper,
            stats: Statistics::with_response_time_window(self.config.response_time_window),
            max_attempts: self.config.max_attempts,
            filter_duplicates: self.config.filter_duplicates,
        })
    }
}
