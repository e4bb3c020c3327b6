//! Mutation-side backend boundary and its HTTP adapters.

use crate::fetch::{FetchError, FetchRequest, FetchResponse, Fetcher, Method};
use gatesync_core::{ActionId, ActionKind, AssetPayload, CheckInPayload, PendingAction};
use parking_lot::Mutex;
use std::collections::HashSet;

/// Replays one pending action against the backend.
///
/// The executor knows how to map an action kind to the correct backend
/// call; the drainer treats the backend only as "succeeds or fails". Any
/// HTTP-status or body interpretation belongs here, not in the drainer.
pub trait ActionExecutor: Send + Sync {
    /// Replays `action`.
    ///
    /// # Errors
    ///
    /// Returns a failure description, which halts the current drain and is
    /// carried in the halt report.
    fn execute(&self, action: &PendingAction) -> Result<(), String>;
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport (reqwest,
/// ureq, a platform webview bridge, ...). Implementations attach the bearer
/// credential to every request; the engine never sees it.
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response body on success.
    ///
    /// Any non-success condition, from an unreachable host to a failure
    /// status, is an `Err` with a description.
    fn send(&self, method: Method, path_and_query: &str) -> Result<Vec<u8>, String>;
}

/// An [`ActionExecutor`] that replays actions as authenticated backend calls.
///
/// Dispatch is exhaustive over [`ActionKind`], so adding a kind without a
/// route is a compile error.
pub struct HttpActionExecutor<C: HttpClient> {
    client: C,
}

impl<C: HttpClient> HttpActionExecutor<C> {
    /// Creates an executor over the given client.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    fn endpoint(action: &PendingAction) -> Result<String, String> {
        match action.kind {
            ActionKind::ConfirmCheckIn => {
                let payload: CheckInPayload = decode(action)?;
                Ok(format!("/guests/{}/confirm-in", payload.guest_id))
            }
            ActionKind::AssetCheckout => {
                let payload: AssetPayload = decode(action)?;
                Ok(format!("/assets/{}/checkout", payload.asset_id))
            }
            ActionKind::AssetReturn => {
                let payload: AssetPayload = decode(action)?;
                Ok(format!("/assets/{}/checkin-back", payload.asset_id))
            }
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(action: &PendingAction) -> Result<T, String> {
    action
        .decode_payload()
        .map_err(|e| format!("undecodable {} payload: {e}", action.kind))
}

impl<C: HttpClient> ActionExecutor for HttpActionExecutor<C> {
    fn execute(&self, action: &PendingAction) -> Result<(), String> {
        let endpoint = Self::endpoint(action)?;
        self.client.send(Method::Post, &endpoint).map(|_| ())
    }
}

/// A [`Fetcher`] that issues reads through an [`HttpClient`].
pub struct HttpFetcher<C: HttpClient> {
    client: C,
}

impl<C: HttpClient> HttpFetcher<C> {
    /// Creates a fetcher over the given client.
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

impl<C: HttpClient> Fetcher for HttpFetcher<C> {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        self.client
            .send(request.method, &request.path_and_query())
            .map(FetchResponse::new)
            .map_err(FetchError::Unreachable)
    }
}

/// A scripted executor for testing.
///
/// Succeeds by default; individual actions or whole kinds can be scripted
/// to fail. Every invocation is recorded in order.
#[derive(Debug, Default)]
pub struct MockExecutor {
    fail_ids: Mutex<HashSet<ActionId>>,
    fail_kinds: Mutex<HashSet<ActionKind>>,
    executed: Mutex<Vec<ActionId>>,
}

impl MockExecutor {
    /// Creates an executor that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a failure for one action id.
    pub fn fail_action(&self, id: ActionId) {
        self.fail_ids.lock().insert(id);
    }

    /// Scripts a failure for every action of `kind`.
    pub fn fail_kind(&self, kind: ActionKind) {
        self.fail_kinds.lock().insert(kind);
    }

    /// Clears all scripted failures.
    pub fn clear_failures(&self) {
        self.fail_ids.lock().clear();
        self.fail_kinds.lock().clear();
    }

    /// Returns the ids the executor was invoked for, in invocation order.
    #[must_use]
    pub fn executed(&self) -> Vec<ActionId> {
        self.executed.lock().clone()
    }
}

impl ActionExecutor for MockExecutor {
    fn execute(&self, action: &PendingAction) -> Result<(), String> {
        self.executed.lock().push(action.id);
        if self.fail_ids.lock().contains(&action.id) {
            return Err(format!("action {} rejected", action.id));
        }
        if self.fail_kinds.lock().contains(&action.kind) {
            return Err(format!("{} rejected", action.kind));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatesync_core::encode_payload;
    use parking_lot::Mutex as PlMutex;

    /// Records every request and answers with an empty body.
    #[derive(Default)]
    struct RecordingClient {
        requests: PlMutex<Vec<(Method, String)>>,
        fail: bool,
    }

    impl HttpClient for RecordingClient {
        fn send(&self, method: Method, path_and_query: &str) -> Result<Vec<u8>, String> {
            self.requests.lock().push((method, path_and_query.into()));
            if self.fail {
                Err("status 500".into())
            } else {
                Ok(Vec::new())
            }
        }
    }

    fn action(kind: ActionKind, payload: Vec<u8>) -> PendingAction {
        PendingAction {
            id: ActionId::new(1),
            kind,
            payload,
            created_at_ms: 1,
        }
    }

    #[test]
    fn check_in_maps_to_confirm_endpoint() {
        let executor = HttpActionExecutor::new(RecordingClient::default());
        let payload = encode_payload(&CheckInPayload { guest_id: 17 }).unwrap();

        executor
            .execute(&action(ActionKind::ConfirmCheckIn, payload))
            .unwrap();

        let requests = executor.client.requests.lock();
        assert_eq!(
            *requests,
            vec![(Method::Post, "/guests/17/confirm-in".to_string())]
        );
    }

    #[test]
    fn asset_kinds_map_to_asset_endpoints() {
        let executor = HttpActionExecutor::new(RecordingClient::default());
        let payload = encode_payload(&AssetPayload { asset_id: 42 }).unwrap();

        executor
            .execute(&action(ActionKind::AssetCheckout, payload.clone()))
            .unwrap();
        executor
            .execute(&action(ActionKind::AssetReturn, payload))
            .unwrap();

        let requests = executor.client.requests.lock();
        assert_eq!(requests[0].1, "/assets/42/checkout");
        assert_eq!(requests[1].1, "/assets/42/checkin-back");
    }

    #[test]
    fn backend_failure_is_reported() {
        let executor = HttpActionExecutor::new(RecordingClient {
            fail: true,
            ..Default::default()
        });
        let payload = encode_payload(&AssetPayload { asset_id: 1 }).unwrap();

        let result = executor.execute(&action(ActionKind::AssetCheckout, payload));
        assert_eq!(result, Err("status 500".to_string()));
    }

    #[test]
    fn undecodable_payload_fails_without_a_request() {
        let executor = HttpActionExecutor::new(RecordingClient::default());

        let result = executor.execute(&action(ActionKind::ConfirmCheckIn, b"junk".to_vec()));
        assert!(result.is_err());
        assert!(executor.client.requests.lock().is_empty());
    }

    #[test]
    fn http_fetcher_forwards_path_and_query() {
        let fetcher = HttpFetcher::new(RecordingClient::default());

        fetcher
            .fetch(&FetchRequest::get("/guests").with_query("status=pending"))
            .unwrap();

        let requests = fetcher.client.requests.lock();
        assert_eq!(
            *requests,
            vec![(Method::Get, "/guests?status=pending".to_string())]
        );
    }

    #[test]
    fn mock_executor_records_and_fails_as_scripted() {
        let executor = MockExecutor::new();
        executor.fail_kind(ActionKind::AssetReturn);

        let payload = encode_payload(&AssetPayload { asset_id: 1 }).unwrap();
        let checkout = action(ActionKind::AssetCheckout, payload.clone());
        assert!(executor.execute(&checkout).is_ok());

        let ret = action(ActionKind::AssetReturn, payload);
        assert!(executor.execute(&ret).is_err());

        assert_eq!(executor.executed().len(), 2);

        executor.clear_failures();
        let ret2 = action(ActionKind::AssetReturn, Vec::new());
        assert!(executor.execute(&ret2).is_ok());
    }
}
