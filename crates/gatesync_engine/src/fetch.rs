//! Read-side network boundary for the cache gateway.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// HTTP method of a request passing through the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET - the only method the gateway ever caches.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// DELETE.
    Delete,
}

/// A request passing through the cache gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchRequest {
    /// HTTP method.
    pub method: Method,
    /// Path, e.g. `/guests`.
    pub path: String,
    /// Query string without the leading `?`, if any.
    pub query: Option<String>,
}

impl FetchRequest {
    /// Creates a GET request for `path`.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: None,
        }
    }

    /// Creates a request with an explicit method.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
        }
    }

    /// Sets the query string.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Returns the path with the query string appended, if any.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }
}

/// A successful network response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// The response body, opaque to the gateway.
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Creates a response from its body.
    #[must_use]
    pub fn new(body: Vec<u8>) -> Self {
        Self { body }
    }
}

/// Why a network fetch failed.
///
/// The gateway treats every variant the same way - fall back to the
/// snapshot store - so the distinction exists only for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The backend could not be reached at all.
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The backend answered with a failure status.
    #[error("server error: status {0}")]
    Status(u16),
}

/// The read-side network boundary.
///
/// This trait abstracts the HTTP layer for reads, allowing different
/// implementations (an [`super::HttpClient`]-backed fetcher, a mock for
/// testing). Implementations attach authentication themselves; the gateway
/// never sees credentials.
pub trait Fetcher: Send + Sync {
    /// Issues the request against the live backend.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the backend did not produce a successful
    /// response.
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for std::sync::Arc<F> {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        (**self).fetch(request)
    }
}

/// A scripted fetcher for testing.
#[derive(Debug, Default)]
pub struct MockFetcher {
    offline: AtomicBool,
    bodies: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockFetcher {
    /// Creates a new mock fetcher with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a successful response body for `path_and_query`.
    pub fn set_body(&self, path_and_query: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.bodies.lock().insert(path_and_query.into(), body.into());
    }

    /// Sets whether every fetch fails as unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Unreachable("offline".into()));
        }
        self.bodies
            .lock()
            .get(&request.path_and_query())
            .cloned()
            .map(FetchResponse::new)
            .ok_or_else(|| {
                FetchError::Unreachable(format!(
                    "no scripted response for {}",
                    request.path_and_query()
                ))
            })
    }
}
