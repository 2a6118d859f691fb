// ============================================
// File: crates/mgmt-api-client/src/session.rs
// ============================================
//! # Session
//!
//! ## Creation Reason
//! Holds the authenticated context threaded through every call after login.
//!
//! ## Main Functionality
//! - `Session`: endpoint, session id and reported API version
//! - `LoginOutcome`: the login reply together with the session it opened
//!
//! ## ⚠️ Important Note for Next Developer
//! - A `Session` only exists once the server has issued a session id;
//!   there is no "half logged in" state to check for
//! - `ApiClient::logout` consumes the session so it cannot be reused
//!
//! ## Last Modified
//! v0.1.0 - Initial session types

use mgmt_api_common::types::{ServerEndpoint, SessionId};
use mgmt_api_core::error::CoreError;
use mgmt_api_core::protocol::{ApiResponse, API_VERSION_FIELD, SID_FIELD};

use crate::error::Result;

// ============================================
// Session
// ============================================

/// Authenticated context for one management server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    endpoint: ServerEndpoint,
    session_id: SessionId,
    api_version: Option<String>,
}

impl Session {
    /// Creates a session from its parts.
    #[must_use]
    pub fn new(endpoint: ServerEndpoint, session_id: SessionId, api_version: Option<String>) -> Self {
        Self {
            endpoint,
            session_id,
            api_version,
        }
    }

    /// Builds the session opened by a successful login reply.
    ///
    /// # Errors
    /// Returns a protocol error if the reply carries no usable `sid`.
    pub fn from_login(endpoint: ServerEndpoint, response: &ApiResponse) -> Result<Self> {
        let sid = response
            .str_field(SID_FIELD)
            .ok_or_else(|| CoreError::missing_field(SID_FIELD))?;
        let session_id =
            SessionId::new(sid).map_err(|_| CoreError::malformed("login returned an empty sid"))?;
        let api_version = response.str_field(API_VERSION_FIELD).map(str::to_owned);

        Ok(Self::new(endpoint, session_id, api_version))
    }

    /// Server this session belongs to.
    #[must_use]
    pub const fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    /// Session id sent in the session header.
    #[must_use]
    pub const fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// API version reported at login.
    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }
}

// ============================================
// LoginOutcome
// ============================================

/// Result of a login call.
///
/// `session` is `None` when the server refused the login; `response` then
/// carries the server's error message.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Raw login reply.
    pub response: ApiResponse,
    /// Session opened by the login, if it succeeded.
    pub session: Option<Session>,
}

impl LoginOutcome {
    /// `true` if the login opened a session.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.session.is_some()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_login() {
        let endpoint = ServerEndpoint::with_default_port("mgmt");
        let reply = ApiResponse::from_parts(200, json!({"sid": "S1", "api-server-version": "1.9"})).unwrap();

        let session = Session::from_login(endpoint.clone(), &reply).unwrap();
        assert_eq!(session.session_id().as_str(), "S1");
        assert_eq!(session.api_version(), Some("1.9"));
        assert_eq!(session.endpoint(), &endpoint);
    }

    #[test]
    fn test_login_without_sid() {
        let endpoint = ServerEndpoint::with_default_port("mgmt");
        let missing = ApiResponse::from_parts(200, json!({"api-server-version": "1.9"})).unwrap();
        assert!(Session::from_login(endpoint.clone(), &missing).is_err());

        let empty = ApiResponse::from_parts(200, json!({"sid": ""})).unwrap();
        let err = Session::from_login(endpoint, &empty).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Protocol);
    }
}
