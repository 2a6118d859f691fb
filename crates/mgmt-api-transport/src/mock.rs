// ============================================
// File: crates/mgmt-api-transport/src/mock.rs
// ============================================
//! # Mock Transport Implementation
//!
//! ## Creation Reason
//! Provides a scripted transport for testing the session façade, task
//! resolver and query aggregator without a management server.
//!
//! ## Main Functionality
//! - Replies are queued in order and popped by each `send`
//! - Every request is captured for verification
//! - The fingerprint returned by `probe_fingerprint` is scripted
//!
//! ## Usage in Tests
//! ```ignore
//! use mgmt_api_common::types::ServerEndpoint;
//! use mgmt_api_transport::{ApiRequest, ApiTransport, MockTransport};
//! use serde_json::json;
//!
//! let transport = MockTransport::new();
//! transport.push_json(200, json!({"sid": "S1"}));
//!
//! let request = ApiRequest::new(ServerEndpoint::with_default_port("mgmt"), "login", json!({}));
//! let response = transport.send(&request).await.unwrap();
//! assert_eq!(response.str_field("sid"), Some("S1"));
//! assert_eq!(transport.request_count(), 1);
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This is for testing only - do not use in production
//! - An exhausted script is an error, so unexpected extra calls fail loudly
//!
//! ## Last Modified
//! v0.1.0 - Initial mock implementation

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use mgmt_api_common::types::ServerEndpoint;
use mgmt_api_core::crypto::Fingerprint;
use mgmt_api_core::protocol::{ApiResponse, DEFAULT_USER_AGENT};

use crate::error::{Result, TransportError};
use crate::traits::{ApiRequest, ApiTransport};

// ============================================
// MockTransport
// ============================================

/// Scripted transport for testing.
#[derive(Default)]
pub struct MockTransport {
    /// Replies returned by successive `send` calls
    replies: Mutex<VecDeque<Result<ApiResponse>>>,
    /// Requests seen so far
    requests: Mutex<Vec<ApiRequest>>,
    /// What `probe_fingerprint` reports
    fingerprint: Mutex<Option<Fingerprint>>,
}

impl MockTransport {
    /// Creates a mock with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply with `status` and JSON `body`.
    ///
    /// A body that is not an object is replayed as a `Protocol` error, the
    /// way the HTTPS transport reports it.
    pub fn push_json(&self, status: u16, body: Value) {
        let reply = ApiResponse::from_parts(status, body)
            .map_err(|e| TransportError::protocol("scripted reply", status, e));
        self.replies.lock().push_back(reply);
    }

    /// Queues a transport failure.
    pub fn push_error(&self, error: TransportError) {
        self.replies.lock().push_back(Err(error));
    }

    /// Sets the fingerprint reported by `probe_fingerprint`.
    pub fn set_fingerprint(&self, fingerprint: Fingerprint) {
        *self.fingerprint.lock() = Some(fingerprint);
    }

    /// Requests seen so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    /// Number of `send` calls so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of queued replies not yet consumed.
    #[must_use]
    pub fn pending_replies(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl ApiTransport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().push(request.clone());
        self.replies.lock().pop_front().unwrap_or_else(|| {
            Err(TransportError::connection(
                &request.endpoint,
                format!("mock script exhausted at '{}'", request.command),
            ))
        })
    }

    async fn probe_fingerprint(&self, endpoint: &ServerEndpoint) -> Result<Fingerprint> {
        self.fingerprint
            .lock()
            .clone()
            .ok_or_else(|| TransportError::connection(endpoint, "mock has no fingerprint"))
    }

    fn user_agent(&self) -> &str {
        DEFAULT_USER_AGENT
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(command: &str) -> ApiRequest {
        ApiRequest::new(ServerEndpoint::with_default_port("mgmt"), command, json!({}))
    }

    #[tokio::test]
    async fn test_replies_in_order() {
        let mock = MockTransport::new();
        mock.push_json(200, json!({"n": 1}));
        mock.push_json(500, json!({"message": "boom"}));

        let first = mock.send(&request("a")).await.unwrap();
        let second = mock.send(&request("b")).await.unwrap();
        assert_eq!(first.payload()["n"], 1);
        assert!(!second.is_success());

        let commands: Vec<_> = mock.requests().into_iter().map(|r| r.command).collect();
        assert_eq!(commands, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_non_object_reply_is_protocol_error() {
        let mock = MockTransport::new();
        mock.push_json(200, json!([1, 2]));
        let err = mock.send(&request("a")).await.unwrap_err();
        assert!(matches!(err, TransportError::Protocol { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_exhausted_script_fails() {
        let mock = MockTransport::new();
        let err = mock.send(&request("a")).await.unwrap_err();
        assert!(err.is_connection_error());
    }

    #[tokio::test]
    async fn test_scripted_fingerprint() {
        let mock = MockTransport::new();
        let endpoint = ServerEndpoint::with_default_port("mgmt");
        assert!(mock.probe_fingerprint(&endpoint).await.is_err());

        mock.set_fingerprint(Fingerprint::of_der(b"cert"));
        assert_eq!(
            mock.probe_fingerprint(&endpoint).await.unwrap(),
            Fingerprint::of_der(b"cert")
        );
    }
}
