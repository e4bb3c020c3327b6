//! Configuration for the cache gateway.

use crate::fetch::{FetchRequest, Method};
use gatesync_core::CacheKey;

/// A read route whose responses are cached for offline fallback.
///
/// Only GET requests for the exact `path` match; the query string is
/// ignored, so every variant of a list request shares one snapshot
/// (last-write-wins).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRoute {
    /// Resource name used in the derived cache key.
    pub resource: String,
    /// Request path this route intercepts, e.g. `/guests`.
    pub path: String,
}

impl CachedRoute {
    /// Creates a route caching `path` under `resource`.
    #[must_use]
    pub fn new(resource: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            path: path.into(),
        }
    }

    fn matches(&self, request: &FetchRequest) -> bool {
        request.method == Method::Get && request.path == self.path
    }
}

/// Configuration for the cache gateway.
///
/// `scope` isolates cache keys between signed-in users so one guard's
/// cached guest list is never served to another.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Cache-key scope, typically the signed-in user id.
    pub scope: String,
    /// Routes the gateway intercepts. Everything else passes through.
    pub routes: Vec<CachedRoute>,
}

impl GatewayConfig {
    /// Creates a configuration with the default guest-list route.
    #[must_use]
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            routes: vec![CachedRoute::new("guests", "/guests")],
        }
    }

    /// Creates a configuration with no routes.
    #[must_use]
    pub fn empty(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            routes: Vec::new(),
        }
    }

    /// Adds a cached route.
    #[must_use]
    pub fn with_route(mut self, route: CachedRoute) -> Self {
        self.routes.push(route);
        self
    }

    /// Returns the cache key for `request` if a route intercepts it.
    #[must_use]
    pub fn key_for(&self, request: &FetchRequest) -> Option<CacheKey> {
        self.routes
            .iter()
            .find(|route| route.matches(request))
            .map(|route| CacheKey::list(&route.resource, &self.scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_route_intercepts_guest_list() {
        let config = GatewayConfig::new("7");

        let key = config.key_for(&FetchRequest::get("/guests")).unwrap();
        assert_eq!(key.as_str(), "guests:list:7");
    }

    #[test]
    fn query_string_shares_the_key() {
        let config = GatewayConfig::new("7");

        let plain = config.key_for(&FetchRequest::get("/guests")).unwrap();
        let filtered = config
            .key_for(&FetchRequest::get("/guests").with_query("status=pending"))
            .unwrap();
        assert_eq!(plain, filtered);
    }

    #[test]
    fn non_get_is_not_intercepted() {
        let config = GatewayConfig::new("7");
        let request = FetchRequest::new(Method::Post, "/guests");
        assert!(config.key_for(&request).is_none());
    }

    #[test]
    fn unrelated_path_is_not_intercepted() {
        let config = GatewayConfig::new("7");
        assert!(config.key_for(&FetchRequest::get("/reports/daily")).is_none());
        assert!(config.key_for(&FetchRequest::get("/guests/5")).is_none());
    }

    #[test]
    fn empty_config_intercepts_nothing() {
        let config = GatewayConfig::empty("7");
        assert!(config.key_for(&FetchRequest::get("/guests")).is_none());
    }

    #[test]
    fn added_routes_intercept() {
        let config =
            GatewayConfig::new("gate-3").with_route(CachedRoute::new("assets", "/assets/guard-gate"));

        let key = config
            .key_for(&FetchRequest::get("/assets/guard-gate"))
            .unwrap();
        assert_eq!(key.as_str(), "assets:list:gate-3");
    }

    #[test]
    fn scopes_derive_distinct_keys() {
        let a = GatewayConfig::new("1");
        let b = GatewayConfig::new("2");
        let request = FetchRequest::get("/guests");
        assert_ne!(a.key_for(&request), b.key_for(&request));
    }
}
