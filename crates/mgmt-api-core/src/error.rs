// ============================================
// File: crates/mgmt-api-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Defines error types for fingerprint handling, the fingerprint store
//! and the wire protocol model.
//!
//! ## Main Functionality
//! - `CoreError`: Primary error enum for core operations
//!
//! ## Error Categories
//! 1. **Trust Errors**: bad fingerprint text, rejected server certificate
//! 2. **Store Errors**: fingerprint file unreadable, unwritable or malformed
//! 3. **Protocol Errors**: response payload missing fields the client relies on
//!
//! ## ⚠️ Important Note for Next Developer
//! - Store errors carry the file path, never the file content
//! - `CertificateError` has its own type because it crosses the TLS layer
//!   inside a `rustls::Error::Other`
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::path::PathBuf;

use thiserror::Error;

use mgmt_api_common::error::CommonError;

use crate::crypto::CertificateError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// CoreError
// ============================================

/// Core error types for trust and protocol operations.
#[derive(Error, Debug)]
pub enum CoreError {
    // ========================================
    // Trust Errors
    // ========================================

    /// Fingerprint text is not 32 bytes of hex.
    #[error("Invalid fingerprint: {reason}")]
    InvalidFingerprint {
        /// What's wrong with it
        reason: String,
    },

    /// Server certificate rejected by the pinning policy.
    #[error(transparent)]
    Certificate(#[from] CertificateError),

    // ========================================
    // Store Errors
    // ========================================

    /// Fingerprint file could not be read or written.
    #[error("Fingerprint store I/O failed on {path}: {context}")]
    StoreIo {
        /// Backing file
        path: PathBuf,
        /// What was being done
        context: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Fingerprint file exists but is not a JSON object of strings.
    #[error("Fingerprint store {path} is malformed: {details}")]
    StoreMalformed {
        /// Backing file
        path: PathBuf,
        /// Parser message
        details: String,
    },

    // ========================================
    // Protocol Errors
    // ========================================

    /// Response payload does not have the expected shape.
    #[error("Malformed response: {reason}")]
    MalformedResponse {
        /// What's wrong with the payload
        reason: String,
    },

    /// Response payload is missing a field the caller named.
    #[error("Missing field '{field}' in response")]
    MissingField {
        /// Field name
        field: String,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl CoreError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates an `InvalidFingerprint` error.
    pub fn invalid_fingerprint(reason: impl Into<String>) -> Self {
        Self::InvalidFingerprint {
            reason: reason.into(),
        }
    }

    /// Creates a `StoreIo` error.
    pub fn store_io(
        path: impl Into<PathBuf>,
        context: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::StoreIo {
            path: path.into(),
            context: context.into(),
            source,
        }
    }

    /// Creates a `StoreMalformed` error.
    pub fn store_malformed(path: impl Into<PathBuf>, details: impl ToString) -> Self {
        Self::StoreMalformed {
            path: path.into(),
            details: details.to_string(),
        }
    }

    /// Creates a `MalformedResponse` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }

    /// Creates a `MissingField` error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if the fingerprint file is at fault.
    #[must_use]
    pub const fn is_store_error(&self) -> bool {
        matches!(self, Self::StoreIo { .. } | Self::StoreMalformed { .. })
    }

    /// Returns `true` if the server certificate was rejected.
    #[must_use]
    pub const fn is_certificate_error(&self) -> bool {
        matches!(self, Self::Certificate(_))
    }

    /// Returns `true` if a server payload did not match the model.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedResponse { .. } | Self::MissingField { .. }
        )
    }
}

// ============================================
// Tests
// ============================================
