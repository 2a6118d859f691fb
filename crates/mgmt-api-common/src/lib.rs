// ============================================
// File: crates/mgmt-api-common/src/lib.rs
// ============================================
//! # Management API Common - Shared Types Library
//!
//! ## Creation Reason
//! Provides the foundational types shared by every crate of the management
//! API client, so the fingerprint store, the transport and the session
//! façade agree on how a server is addressed and how a session is named.
//!
//! ## Main Functionality
//! - [`types`]: `ServerEndpoint` (host + port) and `SessionId`
//! - [`error`]: Common error types and result aliases
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
//! │              mgmt-api-core                          │
//! │                    │                                │
//! │                    ▼                                │
//! │             mgmt-api-common  ◄── You are here       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dependencies
//! - No internal crate dependencies (leaf node)
//!
//! ## ⚠️ Important Note for Next Developer
//! - This crate is the foundation - changes affect everything
//! - Keep dependencies minimal
//! - `ServerEndpoint::store_key` is the on-disk key format of the
//!   fingerprint file; changing it orphans every stored fingerprint
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{CommonError, Result};
pub use types::{ServerEndpoint, SessionId, DEFAULT_PORT};
