// ============================================
// File: crates/mgmt-api-client/src/services/mod.rs
// ============================================
//! # Client Services
//!
//! ## Creation Reason
//! Holds the multi-call protocols layered on top of single exchanges,
//! separated from the session façade that drives them.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`tasks`]: waits for server-side tasks by polling `show-task`
//! - [`query`]: collects paged `show-*` results into one reply
//! - [`trust`]: trust-on-first-use for server fingerprints
//!
//! ## Service Interactions
//! 1. `ApiClient::call` hands task replies to `TaskResolver`
//! 2. `ApiClient::query` hands paged commands to `QueryAggregator`
//! 3. `ApiClient::establish_trust` runs the trust workflow before login
//!
//! ## ⚠️ Important Note for Next Developer
//! - Services borrow the client and session; they own no connection state
//! - Only the task resolver ever sleeps
//!
//! ## Last Modified
//! v0.1.0 - Initial services structure

pub mod query;
pub mod tasks;
pub mod trust;

// Re-export primary types
pub use query::QueryAggregator;
pub use tasks::{ResolveOptions, TaskResolver};
pub use trust::{ApprovalPrompt, FingerprintApprover, TrustOutcome};
