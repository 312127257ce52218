//! Lazy iteration over paginated collections.
//!
//! Collection reads (events, stream, interactions, subscriptions, a user's
//! metrics) return one page at a time with a link to the next page. A
//! [`ChunkedIter`] fetches pages on demand through the connection's request
//! loop and yields their items one by one.
//!
//! # Boundary duplicates
//!
//! For some collections the server can repeat an item across the boundary
//! between two consecutive pages. When filtering is on, the iterator
//! remembers the IDs seen in the current page and the page before it, and
//! drops any item whose ID is in either set. The previous set is discarded
//! at every fetch, so memory stays bounded by two pages no matter how long
//! the collection is. The price is that a duplicate more than one page away
//! from its twin would slip through; the server never produces those.

use crate::{Connection, Transport};
use numerous_core::{CollectionKeys, RequestDescriptor, counters};
use numerous_error::{ApiError, ApiErrorKind, NumerousError, NumerousResult};
use serde_json::{Value, json};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, instrument, warn};

/// Status code for a malformed request.
const BAD_REQUEST: u16 = 400;

/// IDs seen in the current page and the one before it.
#[derive(Debug, Default)]
struct DupFilter {
    field: &'static str,
    previous: HashSet<String>,
    current: HashSet<String>,
}

impl DupFilter {
    fn new(field: &'static str) -> Self {
        Self {
            field,
            ..Self::default()
        }
    }

    /// Forget the older page; the current page becomes the previous one.
    fn rotate(&mut self) {
        self.previous = std::mem::take(&mut self.current);
    }

    /// Record `item` and report whether it should be yielded. Items without
    /// the ID field are always yielded.
    fn admit(&mut self, item: &Value) -> bool {
        let Some(id) = item.get(self.field).map(id_key) else {
            return true;
        };
        if self.previous.contains(&id) || self.current.contains(&id) {
            return false;
        }
        self.current.insert(id);
        true
    }
}

fn id_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Iterator over one paginated collection.
///
/// Yields `Ok(item)` for each item, or a single `Err` after which the
/// iteration ends. The iterator borrows its connection mutably for its
/// whole life and cannot be restarted; ask the connection for a new one.
#[derive(Debug)]
pub struct ChunkedIter<'c, T: Transport> {
    connection: &'c mut Connection<T>,
    request: RequestDescriptor,
    keys: CollectionKeys,
    buffer: VecDeque<Value>,
    next_url: Option<String>,
    first_page: bool,
    dup_filter: Option<DupFilter>,
}

impl<'c, T: Transport> ChunkedIter<'c, T> {
    /// Iterate the collection at `request`'s URL, reading pages with `keys`.
    ///
    /// Duplicate filtering follows the connection's setting at this moment
    /// and applies only if `keys` names an ID field.
    pub fn new(
        connection: &'c mut Connection<T>,
        request: RequestDescriptor,
        keys: CollectionKeys,
    ) -> Self {
        let dup_filter = keys
            .dup_filter
            .filter(|_| connection.filters_duplicates())
            .map(DupFilter::new);

        Self {
            next_url: Some(request.url().clone()),
            connection,
            request,
            keys,
            buffer: VecDeque::new(),
            first_page: true,
            dup_filter,
        }
    }

    /// Whether this iterator drops boundary duplicates.
    pub fn filters_duplicates(&self) -> bool {
        self.dup_filter.is_some()
    }

    /// Next buffered item, fetching one page when the buffer is empty. A
    /// fetched page with no items ends the collection even if it carries a
    /// next link.
    fn next_raw(&mut self) -> NumerousResult<Option<Value>> {
        if self.buffer.is_empty() {
            let Some(url) = self.next_url.take() else {
                return Ok(None);
            };
            self.fetch_page(url)?;
            if self.buffer.is_empty() {
                debug!("Empty page ends the collection");
                self.next_url = None;
            }
        }
        Ok(self.buffer.pop_front())
    }

    #[instrument(skip(self), fields(list = self.keys.list))]
    fn fetch_page(&mut self, url: String) -> NumerousResult<()> {
        if let Some(filter) = &mut self.dup_filter {
            filter.rotate();
        }
        self.connection.record(counters::CHUNKED_FETCHES);

        let first = std::mem::replace(&mut self.first_page, false);
        let request = self.request.with_url(url);
        let mut page = self
            .connection
            .execute(&request)
            .map_err(|e| {
                warn!(error = %e, first, "Collection page fetch failed");
                relabel(first, e)
            })?;

        let items = match page.get_mut(self.keys.list).map(Value::take) {
            Some(Value::Array(items)) => items,
            None | Some(Value::Null) => Vec::new(),
            Some(other) => {
                warn!(field = self.keys.list, value = %other, "Page list field is not an array");
                Vec::new()
            }
        };
        self.next_url = match page.get_mut(self.keys.next).map(Value::take) {
            Some(Value::String(next)) if !next.is_empty() => Some(next),
            _ => None,
        };

        debug!(
            items = items.len(),
            more = self.next_url.is_some(),
            "Fetched collection page"
        );
        self.buffer.extend(items);
        Ok(())
    }
}

/// Re-label a page failure by where it happened.
///
/// On the first page a 400 means the collection's identifier was bad; other
/// first-page failures pass through untouched. Later failures are chunking
/// errors, keeping the underlying code and details.
fn relabel(first: bool, err: NumerousError) -> NumerousError {
    let relabeled = match (first, err.api()) {
        (true, Some(api)) if api.code == BAD_REQUEST => {
            Some(api.relabel(ApiErrorKind::Server, "Bad identifier"))
        }
        (true, _) => None,
        (false, Some(api)) => Some(api.relabel(ApiErrorKind::Chunking, "Getting next chunk")),
        (false, None) => Some(ApiError::new(
            ApiErrorKind::Chunking,
            0,
            "Getting next chunk",
            json!({ "error": err.to_string() }),
        )),
    };
    relabeled.map_or(err, NumerousError::from)
}

impl<T: Transport> Iterator for ChunkedIter<'_, T> {
    type Item = NumerousResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = match self.next_raw() {
                Ok(Some(item)) => item,
                Ok(None) => return None,
                Err(e) => {
                    self.buffer.clear();
                    self.next_url = None;
                    return Some(Err(e));
                }
            };

            let admitted = self
                .dup_filter
                .as_mut()
                .is_none_or(|filter| filter.admit(&item));
            if admitted {
                return Some(Ok(item));
            }
            debug!("Dropped boundary duplicate");
            self.connection.record(counters::DUPLICATES_FILTERED);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_remembers_two_pages() {
        let mut filter = DupFilter::new("id");
        assert!(filter.admit(&json!({"id": "a"})));
        assert!(!filter.admit(&json!({"id": "a"})));

        filter.rotate();
        assert!(!filter.admit(&json!({"id": "a"})));
        assert!(filter.admit(&json!({"id": "b"})));

        filter.rotate();
        filter.rotate();
        assert!(filter.admit(&json!({"id": "a"})));
    }

    #[test]
    fn test_items_without_id_always_pass() {
        let mut filter = DupFilter::new("id");
        assert!(filter.admit(&json!({"value": 1})));
        assert!(filter.admit(&json!({"value": 1})));
    }

    #[test]
    fn test_numeric_ids_compare_by_text() {
        let mut filter = DupFilter::new("id");
        assert!(filter.admit(&json!({"id": 7})));
        assert!(!filter.admit(&json!({"id": 7})));
    }

    #[test]
    fn test_relabel_first_page_bad_request() {
        let err: NumerousError = ApiError::server(400, "Bad Request", Value::Null).into();
        let relabeled = relabel(true, err);
        let api = relabeled.api().unwrap();
        assert_eq!(api.kind, ApiErrorKind::Server);
        assert_eq!(api.reason, "Bad identifier");
        assert_eq!(api.code, 400);
    }

    #[test]
    fn test_relabel_later_page_is_chunking() {
        let err: NumerousError = ApiError::server(500, "Internal Server Error", json!({"x": 1})).into();
        let relabeled = relabel(false, err);
        let api = relabeled.api().unwrap();
        assert_eq!(api.kind, ApiErrorKind::Chunking);
        assert_eq!(api.code, 500);
        assert_eq!(api.details, json!({"x": 1}));
    }

    #[test]
    fn test_relabel_first_page_auth_passes_through() {
        let err: NumerousError = ApiError::auth(401, "Unauthorized", Value::Null).into();
        assert!(relabel(true, err).is_api_kind(ApiErrorKind::Auth));
    }
}
