// ============================================
// File: crates/mgmt-api-core/src/crypto/fingerprint.rs
// ============================================
//! # Certificate Fingerprints
//!
//! ## Creation Reason
//! A fingerprint is the identity the client pins instead of trusting a CA.
//!
//! ## Main Functionality
//! - `Fingerprint::of_der`: SHA-256 over the certificate DER, uppercase hex
//! - `Fingerprint::parse`: accepts what an operator pastes (any case, colons)
//! - `Fingerprint::matches`: case-insensitive compare with stored text
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::fmt;

use sha2::{Digest, Sha256};

use crate::error::{CoreError, Result};

/// Length of a SHA-256 fingerprint in hex characters.
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// SHA-256 fingerprint of a certificate, held as uppercase hex.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint of a DER-encoded certificate.
    #[must_use]
    pub fn of_der(der: &[u8]) -> Self {
        Self(hex::encode_upper(Sha256::digest(der)))
    }

    /// Parses operator-supplied text.
    ///
    /// Colons and surrounding whitespace are ignored, case is folded to upper.
    ///
    /// # Errors
    /// Returns `InvalidFingerprint` unless the remainder is 64 hex digits.
    pub fn parse(text: &str) -> Result<Self> {
        let compact: String = text.trim().chars().filter(|c| *c != ':').collect();
        if compact.len() != FINGERPRINT_HEX_LEN {
            return Err(CoreError::invalid_fingerprint(format!(
                "expected {FINGERPRINT_HEX_LEN} hex digits, got {}",
                compact.len()
            )));
        }
        if !compact.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::invalid_fingerprint("non-hex character"));
        }
        Ok(Self(compact.to_ascii_uppercase()))
    }

    /// Hex text as persisted in the fingerprint file.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Compares with stored text, ignoring case.
    #[must_use]
    pub fn matches(&self, stored: &str) -> bool {
        self.0.eq_ignore_ascii_case(stored.trim())
    }

    /// `AB:CD:...` form shown to an operator.
    #[must_use]
    pub fn colon_separated(&self) -> String {
        self.0
            .as_bytes()
            .chunks(2)
            .map(|pair| String::from_utf8_lossy(pair))
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.0)
    }
}

// ============================================
// Tests
// ============================================
