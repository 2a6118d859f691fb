// ============================================
// File: crates/mgmt-api-core/src/lib.rs
// ============================================
//! # Management API Core - Trust & Protocol Library
//!
//! ## Creation Reason
//! Holds everything about the management API that does not need a socket:
//! how a server certificate is pinned, where pins are stored, and how the
//! server's JSON replies are interpreted.
//!
//! ## Main Functionality
//!
//! ### Crypto Module ([`crypto`])
//! - `Fingerprint`: SHA-256 of a certificate's DER encoding
//! - `PinnedCertVerifier`: rustls verifier that consults the store
//!
//! ### Store Module ([`store`])
//! - `FingerprintStore`: JSON file of `"host:port" -> fingerprint`
//!
//! ### Protocol Module ([`protocol`])
//! - `ApiResponse`: uniform result of every call
//! - Task model (`task-id`, `tasks`, `show-task`)
//! - Page model (`total`, `to`, item key)
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              mgmt-api-client                        │
//! │                    │                                │
//! │                    ▼                                │
//! │            mgmt-api-transport                       │
//! │                    │                                │
//! │                    ▼                                │
//! │   mgmt-api-core  ◄── You are here                   │
//! │                    │                                │
//! │                    ▼                                │
//! │             mgmt-api-common                         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The verifier never writes to the store; only the trust-on-first-use
//!   workflow in the client crate does
//! - Fingerprints compare case-insensitively; stored case is not normalized
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod crypto;
pub mod error;
pub mod protocol;
pub mod store;

// Re-export commonly used items
pub use crypto::{
    build_tls_config, CertificateError, Fingerprint, HandshakeRecord,
    PinnedCertVerifier, TrustPolicy,
};
pub use error::{CoreError, Result};
pub use protocol::{ApiResponse, Page, TaskStatus, TaskTrigger};
pub use store::FingerprintStore;
