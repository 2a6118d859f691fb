// ============================================
// File: crates/mgmt-api-transport/src/lib.rs
// ============================================
//! # Management API Transport - HTTPS Exchange Layer
//!
//! ## Creation Reason
//! Provides the single request/response exchange with a management
//! server: the fixed POST + JSON pattern, fingerprint-pinned TLS, the
//! optional proxy tunnel and the debug-log record of each call.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`traits`]: `ApiTransport` and `ApiRequest`
//! - [`https`]: reqwest + rustls implementation and `TransportConfig`
//! - [`proxy`]: `user:password@host:port` proxy settings
//! - [`log`]: `CallRecord` and the `CallLogSink` contract
//! - [`error`]: Transport-specific error types
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              mgmt-api-client                        │
//! │                    │                                │
//! │                    ▼                                │
//! │   mgmt-api-transport  ◄── You are here              │
//! │                    │                                │
//! │                    ▼                                │
//! │              mgmt-api-core                          │
//! │                    │                                │
//! │                    ▼                                │
//! │             mgmt-api-common                         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Always use the `ApiTransport` trait for testability
//! - Mock implementation available with the `mock` feature
//!
//! ## Last Modified
//! v0.1.0 - Initial transport layer implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod https;
pub mod log;
pub mod proxy;
pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(test)]
mod test_server;

// Re-exports
pub use error::{Result, TransportError};
pub use https::{HttpsTransport, TransportConfig};
pub use log::{CallLogSink, CallRecord};
pub use proxy::ProxySettings;
pub use traits::{ApiRequest, ApiTransport};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;
