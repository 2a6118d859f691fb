// ============================================
// File: crates/mgmt-api-transport/src/error.rs
// ============================================
//! # Transport Error Types
//!
//! ## Creation Reason
//! Defines error types for a single request/response exchange with the
//! management server.
//!
//! ## Main Functionality
//! - `TransportError`: Primary error enum for transport operations
//! - Categorization by taxonomy (connection, certificate, protocol, store)
//!
//! ## Error Categories
//! 1. **Network Errors**: unreachable server, TLS/socket failure, timeout
//! 2. **Trust Errors**: certificate rejected by the pinning policy
//! 3. **Protocol Errors**: reply body is not JSON
//! 4. **Configuration Errors**: bad proxy string, unserializable payload
//!
//! ## ⚠️ Important Note for Next Developer
//! - Nothing here is retried automatically; callers decide
//! - Never put request payloads in messages (they may hold passwords)
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use mgmt_api_common::error::CommonError;
use mgmt_api_core::error::CoreError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

// ============================================
// TransportError
// ============================================

/// Transport layer error types.
#[derive(Error, Debug)]
pub enum TransportError {
    // ========================================
    // Network Errors
    // ========================================

    /// Handshake, socket I/O or reachability failure.
    #[error("Could not connect to {endpoint}: {reason}")]
    Connection {
        /// `host:port` of the server
        endpoint: String,
        /// Why the exchange failed
        reason: String,
    },

    /// Connect or read timeout elapsed.
    #[error("Timed out talking to {endpoint}: {operation}")]
    Timeout {
        /// `host:port` of the server
        endpoint: String,
        /// What timed out
        operation: String,
    },

    // ========================================
    // Protocol Errors
    // ========================================

    /// Reply body could not be decoded as JSON.
    #[error("Unparseable reply to '{command}' (HTTP {status}): {reason}")]
    Protocol {
        /// Command that was sent
        command: String,
        /// HTTP status of the reply
        status: u16,
        /// Decoder message
        reason: String,
    },

    // ========================================
    // Configuration Errors
    // ========================================

    /// Request could not be built.
    #[error("Invalid request: {reason}")]
    InvalidRequest {
        /// What's wrong with it
        reason: String,
    },

    /// Proxy setting string is malformed.
    #[error("Invalid proxy setting: {reason} (expected user:password@host:port, only host is mandatory)")]
    InvalidProxy {
        /// What's wrong with it
        reason: String,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Trust or store error from the core crate.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl TransportError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a `Connection` error.
    pub fn connection(endpoint: impl ToString, reason: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(endpoint: impl ToString, operation: impl Into<String>) -> Self {
        Self::Timeout {
            endpoint: endpoint.to_string(),
            operation: operation.into(),
        }
    }

    /// Creates a `Protocol` error.
    pub fn protocol(command: impl Into<String>, status: u16, reason: impl ToString) -> Self {
        Self::Protocol {
            command: command.into(),
            status,
            reason: reason.to_string(),
        }
    }

    /// Creates an `InvalidRequest` error.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidProxy` error.
    pub fn invalid_proxy(reason: impl Into<String>) -> Self {
        Self::InvalidProxy {
            reason: reason.into(),
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` for handshake, socket and timeout failures.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }

    /// Returns `true` if the server certificate was refused.
    #[must_use]
    pub const fn is_certificate_error(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_certificate_error())
    }

    /// Returns `true` if the fingerprint file is at fault.
    #[must_use]
    pub const fn is_store_error(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_store_error())
    }

    /// Returns `true` if the server's reply could not be understood.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    /// Returns `true` if the caller supplied bad settings.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. } | Self::InvalidProxy { .. } | Self::Common(_)
        )
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use mgmt_api_core::CertificateError;

    #[test]
    fn test_error_display() {
        let err = TransportError::connection("mgmt:443", "connection refused");
        assert!(err.to_string().contains("mgmt:443"));
        assert!(err.to_string().contains("connection refused"));

        let err = TransportError::protocol("show-hosts", 502, "expected value");
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_error_classification() {
        assert!(TransportError::timeout("mgmt:443", "read").is_connection_error());
        assert!(TransportError::invalid_proxy("too many '@'").is_configuration_error());

        let cert: TransportError = CoreError::from(CertificateError::NoCertificates).into();
        assert!(cert.is_certificate_error());
        assert!(!cert.is_connection_error());

        let store: TransportError = CoreError::store_malformed("/fp", "bad").into();
        assert!(store.is_store_error());
    }
}
