// ============================================
// File: crates/mgmt-api-transport/src/traits.rs
// ============================================
//! # Transport Traits
//!
//! ## Creation Reason
//! Defines the single-exchange interface the session façade builds on,
//! so the task resolver and query aggregator can be driven by a scripted
//! transport in tests.
//!
//! ## Main Functionality
//! - `ApiRequest`: one command to one server, with or without a session
//! - `ApiTransport`: send one request, or read a server's fingerprint
//!
//! ## ⚠️ Important Note for Next Developer
//! - Implementations must be Send + Sync for use in async contexts
//! - `send` never retries and never follows tasks or pages; that is the
//!   client crate's job
//!
//! ## Last Modified
//! v0.1.0 - Initial trait definitions

use async_trait::async_trait;
use serde_json::Value;

use mgmt_api_common::types::{ServerEndpoint, SessionId};
use mgmt_api_core::crypto::Fingerprint;
use mgmt_api_core::protocol::{command_path, ApiResponse, LOGIN_COMMAND};

use crate::error::Result;

// ============================================
// ApiRequest
// ============================================

/// One command sent to one management server.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Server to call.
    pub endpoint: ServerEndpoint,
    /// Session header value; `None` only for `login`.
    pub session_id: Option<SessionId>,
    /// Command name, e.g. `show-hosts`.
    pub command: String,
    /// JSON body.
    pub payload: Value,
}

impl ApiRequest {
    /// Creates a request without a session.
    pub fn new(endpoint: ServerEndpoint, command: impl Into<String>, payload: Value) -> Self {
        Self {
            endpoint,
            session_id: None,
            command: command.into(),
            payload,
        }
    }

    /// Attaches a session id.
    #[must_use]
    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Full request URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "https://{}{}",
            self.endpoint.authority(),
            command_path(&self.command)
        )
    }

    /// `true` for the `login` command.
    #[must_use]
    pub fn is_login(&self) -> bool {
        self.command == LOGIN_COMMAND
    }
}

// ============================================
// ApiTransport Trait
// ============================================

/// Abstract interface for one management API exchange.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Sends one request and decodes the reply.
    ///
    /// Non-200 replies are returned as unsuccessful responses, not errors.
    ///
    /// # Errors
    /// - Connection/timeout errors if the exchange could not complete
    /// - Certificate errors if the server is not trusted
    /// - Protocol errors if the reply body is not JSON
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;

    /// Opens a connection that trusts any certificate and returns the
    /// fingerprint the server presented.
    ///
    /// # Errors
    /// Returns a connection error if no certificate could be read.
    async fn probe_fingerprint(&self, endpoint: &ServerEndpoint) -> Result<Fingerprint>;

    /// `User-Agent` sent with every request.
    fn user_agent(&self) -> &str;
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_url() {
        let req = ApiRequest::new(ServerEndpoint::new("mgmt.local", 4434), "show-hosts", json!({}));
        assert_eq!(req.url(), "https://mgmt.local:4434/web_api/show-hosts");
        assert!(!req.is_login());

        let v6 = ApiRequest::new(ServerEndpoint::new("::1", 443), "login", json!({}));
        assert_eq!(v6.url(), "https://[::1]:443/web_api/login");
        assert!(v6.is_login());
    }

    #[test]
    fn test_with_session() {
        let sid = SessionId::new("S1").unwrap();
        let req = ApiRequest::new(ServerEndpoint::with_default_port("m"), "logout", json!({}))
            .with_session(sid.clone());
        assert_eq!(req.session_id, Some(sid));
    }
}
