use std::sync::Arc;

use jiff::Timestamp;

use crate::query::QueryError;

/// Snapshot of one cache entry as seen by a typed reader.
///
/// `data` is always present: the cached value, or the placeholder while
/// nothing has been fetched successfully (`is_placeholder`).
#[derive(Debug)]
pub struct QueryState<T> {
    pub data: Arc<T>,
    /// No value yet and a fetch is running
    pub is_loading: bool,
    pub is_fetching: bool,
    pub is_stale: bool,
    pub is_placeholder: bool,
    /// Set only while `data` is a placeholder; failures behind a cached value
    /// fall back to that value silently.
    pub error: Option<QueryError>,
    /// Wall-clock time of the last successful fetch or write
    pub updated_at: Option<Timestamp>,
}

impl<T> QueryState<T> {
    pub fn is_success(&self) -> bool {
        !self.is_placeholder
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            is_loading: self.is_loading,
            is_fetching: self.is_fetching,
            is_stale: self.is_stale,
            is_placeholder: self.is_placeholder,
            error: self.error.clone(),
            updated_at: self.updated_at,
        }
    }
}
