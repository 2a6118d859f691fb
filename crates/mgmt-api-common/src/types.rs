// ============================================
// File: crates/mgmt-api-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Creation Reason
//! Centralizes the identifiers every layer passes around: where the
//! management server lives and which session a call belongs to.
//!
//! ## Main Functionality
//! - `ServerEndpoint`: host + port of a management server
//! - `SessionId`: opaque session id handed out by `login`
//!
//! ## Main Logical Flow
//! 1. `ServerEndpoint` is parsed from configuration or the command line
//! 2. Its `store_key()` indexes the fingerprint file
//! 3. Its `authority()` builds request URLs
//! 4. `SessionId` is read from the login reply and sent as a header afterwards
//!
//! ## ⚠️ Important Note for Next Developer
//! - `store_key()` is `"{host}:{port}"` with the host exactly as given,
//!   no brackets and no case folding. Existing fingerprint files depend on it
//! - `SessionId` is a bearer credential: Debug/Display only show a prefix
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommonError;

// ============================================
// Constants
// ============================================

/// Default HTTPS port of the management server.
pub const DEFAULT_PORT: u16 = 443;

/// Number of leading session id characters shown in logs.
const SESSION_ID_VISIBLE: usize = 6;

// ============================================
// ServerEndpoint
// ============================================

/// Address of a management server.
///
/// # Example
/// ```
/// use mgmt_api_common::types::ServerEndpoint;
///
/// let endpoint: ServerEndpoint = "mgmt.example.com:4434".parse().unwrap();
/// assert_eq!(endpoint.store_key(), "mgmt.example.com:4434");
///
/// let default: ServerEndpoint = "10.0.0.1".parse().unwrap();
/// assert_eq!(default.port, 443);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerEndpoint {
    /// Hostname or IP literal.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl ServerEndpoint {
    /// Creates an endpoint from a host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Creates an endpoint on [`DEFAULT_PORT`].
    pub fn with_default_port(host: impl Into<String>) -> Self {
        Self::new(host, DEFAULT_PORT)
    }

    /// Key under which this endpoint's fingerprint is persisted.
    #[must_use]
    pub fn store_key(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `host:port` suitable for a URL, bracketing IPv6 literals.
    #[must_use]
    pub fn authority(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Checks that the endpoint can be connected to.
    ///
    /// # Errors
    /// Returns `InvalidInput` for an empty host or port 0.
    pub fn validate(&self) -> Result<(), CommonError> {
        if self.host.trim().is_empty() {
            return Err(CommonError::invalid_input("host", "cannot be empty"));
        }
        if self.port == 0 {
            return Err(CommonError::invalid_input("port", "cannot be 0"));
        }
        Ok(())
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.authority())
    }
}

impl FromStr for ServerEndpoint {
    type Err = CommonError;

    /// Accepts `host`, `host:port`, `[v6]` and `[v6]:port`.
    /// A bare IPv6 literal without brackets is taken as a host with no port.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| CommonError::invalid_input("endpoint", "unterminated '['"))?;
            let port = match tail {
                "" => DEFAULT_PORT,
                t => parse_port(t.strip_prefix(':').ok_or_else(|| {
                    CommonError::invalid_input("endpoint", "expected ':' after ']'")
                })?)?,
            };
            let endpoint = Self::new(host, port);
            endpoint.validate()?;
            return Ok(endpoint);
        }

        let endpoint = match s.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') => Self::new(host, parse_port(port)?),
            _ => Self::with_default_port(s),
        };
        endpoint.validate()?;
        Ok(endpoint)
    }
}

fn parse_port(s: &str) -> Result<u16, CommonError> {
    s.parse::<u16>()
        .map_err(|e| CommonError::invalid_input("port", format!("'{s}': {e}")))
}

// ============================================
// SessionId
// ============================================

/// Session id returned by a successful `login`.
///
/// The value is opaque to the client; it is sent back verbatim in the
/// session header of every later call.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a raw session id.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the id is empty.
    pub fn new(raw: impl Into<String>) -> Result<Self, CommonError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(CommonError::invalid_input("sid", "cannot be empty"));
        }
        Ok(Self(raw))
    }

    /// Full session id, for the wire only.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn visible_prefix(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(SESSION_ID_VISIBLE)
            .map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({}...)", self.visible_prefix())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}...", self.visible_prefix())
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_parse_host_and_port() {
        let ep: ServerEndpoint = "mgmt.local:4434".parse().unwrap();
        assert_eq!(ep.host, "mgmt.local");
        assert_eq!(ep.port, 4434);
        assert_eq!(ep.store_key(), "mgmt.local:4434");
    }

    #[test]
    fn test_endpoint_parse_default_port() {
        let ep: ServerEndpoint = "192.168.1.10".parse().unwrap();
        assert_eq!(ep.port, DEFAULT_PORT);
        assert_eq!(ep.to_string(), "192.168.1.10:443");
    }

    #[test]
    fn test_endpoint_ipv6() {
        let ep: ServerEndpoint = "[fe80::1]:8443".parse().unwrap();
        assert_eq!(ep.host, "fe80::1");
        assert_eq!(ep.port, 8443);
        assert_eq!(ep.authority(), "[fe80::1]:8443");
        assert_eq!(ep.store_key(), "fe80::1:8443");

        let bare: ServerEndpoint = "fe80::1".parse().unwrap();
        assert_eq!(bare.host, "fe80::1");
        assert_eq!(bare.port, DEFAULT_PORT);
    }

    #[test]
    fn test_endpoint_rejects_garbage() {
        assert!("".parse::<ServerEndpoint>().is_err());
        assert!("host:notaport".parse::<ServerEndpoint>().is_err());
        assert!("host:0".parse::<ServerEndpoint>().is_err());
        assert!("[::1".parse::<ServerEndpoint>().is_err());
    }

    #[test]
    fn test_session_id_is_truncated_in_output() {
        let sid = SessionId::new("S1abcdefghijklmnop").unwrap();
        assert_eq!(sid.as_str(), "S1abcdefghijklmnop");
        assert_eq!(format!("{sid:?}"), "SessionId(S1abcd...)");
        assert_eq!(sid.to_string(), "S1abcd...");

        let short = SessionId::new("S1").unwrap();
        assert_eq!(short.to_string(), "S1...");
    }

    #[test]
    fn test_session_id_rejects_empty() {
        assert!(SessionId::new("").is_err());
    }
}
