// ============================================
// File: crates/mgmt-api-core/src/crypto/mod.rs
// ============================================
//! # Certificate Pinning Module
//!
//! ## Creation Reason
//! The management server usually presents a self-signed certificate, so
//! CA validation is replaced by comparing the leaf certificate's SHA-256
//! fingerprint with a value the operator approved earlier.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`fingerprint`]: `Fingerprint` computation, parsing and comparison
//! - [`verifier`]: `PinnedCertVerifier` and the per-connection TLS config
//!
//! ## Handshake Decision
//! ```text
//!  server chain ──► empty? ──yes──► reject (NoCertificates)
//!                     │ no
//!                     ▼
//!              policy Unchecked ──► accept
//!              policy Capture   ──► record leaf fingerprint, accept
//!              policy Pinned    ──► store lookup
//!                                     ├─ absent   ──► reject (UnknownHost)
//!                                     ├─ differs  ──► reject (FingerprintChanged)
//!                                     └─ matches  ──► accept
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - A verifier is built per connection; there is no global trust state
//! - Rejections are written to the `HandshakeRecord` before rustls sees
//!   them, because reqwest flattens TLS errors into strings
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

pub mod fingerprint;
pub mod verifier;

pub use fingerprint::Fingerprint;
pub use verifier::{
    build_tls_config, CertificateError, HandshakeRecord, PinnedCertVerifier, TrustPolicy,
};
