//! remote::mock
//!
//! Scripted transport for deterministic testing.
//!
//! # Design
//!
//! Responses are queued up front and handed out in order, one per call.
//! Every request is recorded so tests can assert on exactly what would
//! have gone over the wire. A call with nothing queued fails with
//! `TransportError::Unscripted`.
//!
//! # Example
//!
//! ```
//! use keelson::remote::{ApiRequest, MockTransport, Transport};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let transport = MockTransport::new();
//! transport.respond(201, json!({"objectId": "p1"}));
//!
//! let response = transport
//!     .send(ApiRequest::post("classes/Post", json!({"title": "Hi"})))
//!     .await
//!     .unwrap();
//!
//! assert_eq!(response.status, 201);
//! assert_eq!(transport.requests()[0].path, "classes/Post");
//! # });
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value as Json;

use super::traits::{ApiRequest, ApiResponse, Transport, TransportError};

/// Mock transport for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    /// Outcomes handed out in order.
    script: VecDeque<Result<ApiResponse, TransportError>>,
    /// Recorded requests for verification.
    requests: Vec<ApiRequest>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a response.
    pub fn respond(&self, status: u16, body: Json) -> &Self {
        self.lock()
            .script
            .push_back(Ok(ApiResponse::new(status, body)));
        self
    }

    /// Queue a transport failure.
    pub fn fail(&self, error: TransportError) -> &Self {
        self.lock().script.push_back(Err(error));
        self
    }

    /// Get all recorded requests.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock().requests.clone()
    }

    /// Most recent request, if any.
    pub fn last_request(&self) -> Option<ApiRequest> {
        self.lock().requests.last().cloned()
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Number of queued outcomes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.lock().script.len()
    }

    /// Clear recorded requests.
    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut inner = self.lock();
        let described = request.to_string();
        inner.requests.push(request);
        inner
            .script
            .pop_front()
            .unwrap_or(Err(TransportError::Unscripted(described)))
    }
}
