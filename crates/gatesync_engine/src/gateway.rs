//! Cache gateway: network-first reads with snapshot fallback.

use crate::config::GatewayConfig;
use crate::error::EngineResult;
use crate::fetch::{FetchRequest, Fetcher};
use gatesync_core::{EventBus, SnapshotStore, SyncEvent};
use std::sync::Arc;
use tracing::{debug, warn};

/// Where a gateway response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Live network response.
    Network,
    /// Snapshot substituted after a network failure.
    Cache {
        /// When the substituted snapshot was captured, in milliseconds
        /// since the Unix epoch.
        captured_at_ms: u64,
    },
}

/// A response returned by the gateway.
///
/// A fallback is indistinguishable from a live response except through
/// [`GatewayResponse::origin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    /// The response body.
    pub body: Vec<u8>,
    /// Whether the body came from the network or the snapshot store.
    pub origin: Origin,
}

impl GatewayResponse {
    /// Returns true if this response was served from the snapshot store.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, Origin::Cache { .. })
    }
}

/// Applies network-first-with-cache-fallback to intercepted reads.
///
/// Requests matching a configured route are tried against the network
/// first; a successful body is written through to the snapshot store and
/// announced on the bus, a failure is answered from the last good snapshot
/// if one exists. Everything else passes through untouched.
pub struct CacheGateway<F: Fetcher> {
    config: GatewayConfig,
    fetcher: F,
    snapshots: SnapshotStore,
    bus: Arc<EventBus>,
}

impl<F: Fetcher> CacheGateway<F> {
    /// Creates a gateway.
    pub fn new(
        config: GatewayConfig,
        fetcher: F,
        snapshots: SnapshotStore,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            config,
            fetcher,
            snapshots,
            bus,
        }
    }

    /// Issues `request`, applying the cache policy if a route matches.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Network`] carrying the original fetch
    /// failure when the network failed and no snapshot exists for the
    /// derived key. A cache miss is never reported as its own error.
    pub fn fetch(&self, request: &FetchRequest) -> EngineResult<GatewayResponse> {
        let Some(key) = self.config.key_for(request) else {
            debug!(path = %request.path, "passthrough request");
            let response = self.fetcher.fetch(request)?;
            return Ok(GatewayResponse {
                body: response.body,
                origin: Origin::Network,
            });
        };

        match self.fetcher.fetch(request) {
            Ok(response) => {
                // Cache writes are best-effort; the live response is served
                // either way.
                match self.snapshots.put(&key, &response.body) {
                    Ok(()) => {
                        debug!(%key, "snapshot refreshed");
                        self.bus.publish(SyncEvent::CacheRefreshed { key });
                    }
                    Err(error) => {
                        warn!(%key, %error, "snapshot write failed; serving uncached");
                    }
                }
                Ok(GatewayResponse {
                    body: response.body,
                    origin: Origin::Network,
                })
            }
            Err(fetch_error) => match self.snapshots.get(&key) {
                Ok(Some(snapshot)) => {
                    warn!(%key, error = %fetch_error, "network failed; serving snapshot");
                    Ok(GatewayResponse {
                        body: snapshot.payload,
                        origin: Origin::Cache {
                            captured_at_ms: snapshot.captured_at_ms,
                        },
                    })
                }
                Ok(None) => Err(fetch_error.into()),
                Err(store_error) => {
                    // The caller sees the network failure, not the fallback
                    // read failure.
                    warn!(%key, error = %store_error, "fallback read failed");
                    Err(fetch_error.into())
                }
            },
        }
    }

    /// Returns the gateway's snapshot store.
    #[must_use]
    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }
}
