// ============================================
// File: crates/mgmt-api-client/src/lib.rs
// ============================================
//! # Management API Client Library
//!
//! ## Creation Reason
//! Provides the caller-facing session API for a management server's REST
//! interface, turning its task and paging conventions into single calls.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`client`]: `ApiClient` session façade
//! - [`session`]: `Session` and `LoginOutcome`
//! - [`services`]: Multi-call protocols
//!   - [`services::tasks`]: Task resolution by `show-task` polling
//!   - [`services::query`]: Paged query aggregation
//!   - [`services::trust`]: Trust-on-first-use for fingerprints
//! - [`config`]: Client configuration management
//! - [`debug_log`]: Debug file of every exchange
//! - [`error`]: Client-specific error types
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        mgmt-api-client                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────────┐    │
//! │  │   Config    │────►│  ApiClient  │────►│  DebugFileSink  │    │
//! │  └─────────────┘     └──────┬──────┘     └─────────────────┘    │
//! │                             │                                   │
//! │         ┌───────────────────┼───────────────────┐               │
//! │         ▼                   ▼                   ▼               │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────┐        │
//! │  │    Task     │     │    Query    │     │    Trust    │        │
//! │  │  Resolver   │     │ Aggregator  │     │  Workflow   │        │
//! │  └─────────────┘     └─────────────┘     └─────────────┘        │
//! │                                                                 │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                  mgmt-api-transport (HTTPS)                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```no_run
//! use mgmt_api_client::{ApiClient, ClientConfig};
//! use mgmt_api_common::types::ServerEndpoint;
//! use serde_json::json;
//!
//! # async fn run() -> mgmt_api_client::Result<()> {
//! let client = ApiClient::from_config(&ClientConfig::default())?;
//! let endpoint = ServerEndpoint::with_default_port("mgmt.example.com");
//!
//! let login = client
//!     .login(endpoint, json!({"user": "admin", "password": "secret"}))
//!     .await?;
//! if let Some(session) = login.session {
//!     let hosts = client.query(&session, "show-hosts", "objects", json!({})).await?;
//!     println!("{} hosts", hosts.payload()["objects"].as_array().map_or(0, Vec::len));
//!     client.logout(session).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Run the trust workflow (`establish_trust`) before the first login to a
//!   server, otherwise every call fails with a certificate error
//! - One session is used sequentially; share the client, not the session,
//!   across tasks
//!
//! ## Last Modified
//! v0.1.0 - Initial client implementation

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod debug_log;
pub mod error;
pub mod services;
pub mod session;

// Re-exports
pub use client::{ApiClient, CallOptions, ClientSettings};
pub use config::ClientConfig;
pub use debug_log::DebugFileSink;
pub use error::{ClientError, ErrorKind, Result};
pub use services::{
    ApprovalPrompt, FingerprintApprover, QueryAggregator, ResolveOptions, TaskResolver,
    TrustOutcome,
};
pub use session::{LoginOutcome, Session};
