//! Static table of Numerous REST endpoints.
//!
//! Each entry names a URL template with `{placeholder}` fields, defaults for
//! some of those fields, and per-method details: which status codes count as
//! success and, for collections, which response fields hold the page items
//! and the next-page link. The table is built once on first use and never
//! changes afterwards.

use crate::{Method, Payload, RequestDescriptor};
use numerous_error::{BuilderError, BuilderErrorKind, ConfigError, NumerousResult};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

/// Response field names for one paginated collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectionKeys {
    /// Field holding the page's items
    pub list: &'static str,
    /// Field holding the next page URL (absent on the last page)
    pub next: &'static str,
    /// Item field used to drop server-side boundary duplicates, for the
    /// collections known to produce them
    pub dup_filter: Option<&'static str>,
}

/// Details for one HTTP method on an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpInfo {
    /// Accepted status codes (empty means just 200)
    pub success_codes: &'static [u16],
    /// Present when the method reads a paginated collection
    pub collection: Option<CollectionKeys>,
}

/// One entry of the endpoint table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// URL template, e.g. `/v1/metrics/{metricId}`
    pub template: &'static str,
    /// Values used for placeholders the caller leaves out
    pub defaults: &'static [(&'static str, &'static str)],
    /// Method-specific details; methods not listed use [`OpInfo::default`]
    pub ops: &'static [(Method, OpInfo)],
}

impl Endpoint {
    /// Details for `method`, falling back to the plain defaults.
    pub fn op(&self, method: Method) -> OpInfo {
        self.ops
            .iter()
            .find(|(m, _)| *m == method)
            .map(|(_, op)| *op)
            .unwrap_or_default()
    }
}

const CREATED: &[u16] = &[201];
const NO_CONTENT: &[u16] = &[204];
const ME: &[(&str, &str)] = &[("userId", "me")];

const fn collection(list: &'static str, next: &'static str, dup_filter: Option<&'static str>) -> OpInfo {
    OpInfo {
        success_codes: &[],
        collection: Some(CollectionKeys {
            list,
            next,
            dup_filter,
        }),
    }
}

const fn codes(success_codes: &'static [u16]) -> OpInfo {
    OpInfo {
        success_codes,
        collection: None,
    }
}

static TABLE: &[(&str, Endpoint)] = &[
    (
        "metric",
        Endpoint {
            template: "/v1/metrics/{metricId}",
            defaults: &[],
            ops: &[(Method::Delete, codes(NO_CONTENT))],
        },
    ),
    (
        "stream",
        Endpoint {
            template: "/v2/metrics/{metricId}/stream",
            defaults: &[],
            ops: &[(Method::Get, collection("items", "next", Some("id")))],
        },
    ),
    (
        "events",
        Endpoint {
            template: "/v1/metrics/{metricId}/events",
            defaults: &[],
            ops: &[
                (Method::Get, collection("events", "nextURL", Some("id"))),
                (Method::Post, codes(CREATED)),
            ],
        },
    ),
    (
        "event",
        Endpoint {
            template: "/v1/metrics/{metricId}/events/{eventId}",
            defaults: &[],
            ops: &[(Method::Delete, codes(NO_CONTENT))],
        },
    ),
    (
        "interactions",
        Endpoint {
            template: "/v2/metrics/{metricId}/interactions",
            defaults: &[],
            ops: &[
                (Method::Get, collection("interactions", "nextURL", Some("id"))),
                (Method::Post, codes(CREATED)),
            ],
        },
    ),
    (
        "interaction",
        Endpoint {
            template: "/v2/metrics/{metricId}/interactions/{interactionId}",
            defaults: &[],
            ops: &[(Method::Delete, codes(NO_CONTENT))],
        },
    ),
    (
        "subscriptions",
        Endpoint {
            template: "/v2/metrics/{metricId}/subscriptions",
            defaults: &[],
            ops: &[(Method::Get, collection("subscriptions", "nextURL", None))],
        },
    ),
    (
        "subscription",
        Endpoint {
            template: "/v1/metrics/{metricId}/subscriptions/{userId}",
            defaults: ME,
            ops: &[(Method::Put, codes(&[200, 201]))],
        },
    ),
    (
        "photo",
        Endpoint {
            template: "/v1/metrics/{metricId}/photo",
            defaults: &[],
            ops: &[
                (Method::Post, codes(CREATED)),
                (Method::Delete, codes(NO_CONTENT)),
            ],
        },
    ),
    (
        "create",
        Endpoint {
            template: "/v1/metrics",
            defaults: &[],
            ops: &[(Method::Post, codes(CREATED))],
        },
    ),
    (
        "metrics-collection",
        Endpoint {
            template: "/v2/users/{userId}/metrics",
            defaults: ME,
            ops: &[(Method::Get, collection("metrics", "nextURL", None))],
        },
    ),
    (
        "user-subscriptions",
        Endpoint {
            template: "/v2/users/{userId}/subscriptions",
            defaults: ME,
            ops: &[(Method::Get, collection("subscriptions", "nextURL", None))],
        },
    ),
    (
        "user",
        Endpoint {
            template: "/v1/users/{userId}",
            defaults: ME,
            ops: &[],
        },
    ),
    (
        "user-photo",
        Endpoint {
            template: "/v1/users/{userId}/photo",
            defaults: ME,
            ops: &[(Method::Post, codes(CREATED))],
        },
    ),
    (
        "popular",
        Endpoint {
            template: "/v1/metrics/popular?count={count}",
            defaults: &[("count", "10")],
            ops: &[],
        },
    ),
];

static ENDPOINTS: LazyLock<HashMap<&'static str, &'static Endpoint>> =
    LazyLock::new(|| TABLE.iter().map(|(name, info)| (*name, info)).collect());

/// Look up an endpoint by operation name.
///
/// # Examples
///
/// ```
/// use numerous_core::{endpoint, Method};
///
/// let events = endpoint("events").unwrap();
/// assert_eq!(events.op(Method::Post).success_codes, &[201]);
/// assert!(endpoint("no-such-thing").is_none());
/// ```
pub fn endpoint(name: &str) -> Option<&'static Endpoint> {
    ENDPOINTS.get(name).copied()
}

/// A fully resolved API operation: concrete URL, method, accepted codes and
/// collection keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiContext {
    url: String,
    method: Method,
    success_codes: Vec<u16>,
    collection: Option<CollectionKeys>,
}

/// Substitute each `{name}` token of `template` from `values` in a single
/// left-to-right pass. Substituted text is never scanned again. Returns the
/// name of the first token without a value.
fn fill_template<'t>(template: &'t str, values: &HashMap<&str, &str>) -> Result<String, &'t str> {
    let mut url = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        url.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            return Err(after);
        };
        let field = &after[..end];
        let value = values.get(field).ok_or(field)?;
        url.push_str(value);
        rest = &after[end + 1..];
    }
    url.push_str(rest);
    Ok(url)
}

impl ApiContext {
    /// Resolve endpoint `name` for `method`.
    ///
    /// Placeholders are filled from the endpoint defaults first, then from
    /// `substitutions`; a `None` substitution leaves the default in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is unknown or a placeholder has no
    /// value.
    ///
    /// # Examples
    ///
    /// ```
    /// use numerous_core::{ApiContext, Method};
    ///
    /// let ctx = ApiContext::resolve("subscription", Method::Get, &[("metricId", Some("42"))]).unwrap();
    /// assert_eq!(ctx.url(), "/v1/metrics/42/subscriptions/me");
    ///
    /// let ctx = ApiContext::resolve("user", Method::Get, &[("userId", Some("77"))]).unwrap();
    /// assert_eq!(ctx.url(), "/v1/users/77");
    /// ```
    pub fn resolve(
        name: &str,
        method: Method,
        substitutions: &[(&str, Option<&str>)],
    ) -> NumerousResult<Self> {
        let info = endpoint(name)
            .ok_or_else(|| ConfigError::new(format!("Unknown API endpoint: {}", name)))?;

        let mut values: HashMap<&str, &str> = info.defaults.iter().copied().collect();
        for (key, value) in substitutions {
            if let Some(value) = value {
                values.insert(*key, *value);
            }
        }

        let url = fill_template(info.template, &values).map_err(|field| {
            BuilderError::new(BuilderErrorKind::UnresolvedPlaceholder {
                endpoint: name.to_string(),
                field: field.to_string(),
            })
        })?;

        let op = info.op(method);
        let success_codes = if op.success_codes.is_empty() {
            vec![200]
        } else {
            op.success_codes.to_vec()
        };
        debug!(endpoint = name, %method, url = %url, "Resolved API context");

        Ok(Self {
            url,
            method,
            success_codes,
            collection: op.collection,
        })
    }

    /// Resolved server-relative URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Accepted status codes.
    pub fn success_codes(&self) -> &[u16] {
        &self.success_codes
    }

    /// Collection keys, for paginated reads.
    pub fn collection(&self) -> Option<CollectionKeys> {
        self.collection
    }

    /// Request descriptor with no body.
    pub fn request(&self) -> RequestDescriptor {
        self.request_with(Payload::None)
    }

    /// Request descriptor carrying `payload`.
    pub fn request_with(&self, payload: Payload) -> RequestDescriptor {
        RequestDescriptor::new(self.method, self.url.clone())
            .with_payload(payload)
            .with_success_codes(self.success_codes.clone())
    }
}
