// ============================================
// File: crates/mgmt-api-core/src/protocol/mod.rs
// ============================================
//! # Protocol Module
//!
//! ## Creation Reason
//! Models the management server's web API: the fixed request shape, the
//! uniform response, and the two payload conventions the client folds
//! away for its callers (long-running tasks and paged collections).
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`response`]: `ApiResponse`
//! - [`task`]: task status, task triggers, `show-task` payloads
//! - [`page`]: one page of a paged query
//!
//! ## Protocol Overview
//! ```text
//! POST https://{host}:{port}/web_api/{command}
//!   User-Agent:   <client id>
//!   Accept:       application/json
//!   Content-Type: application/json
//!   X-chkp-sid:   <sid>          (every call except login)
//!   {json payload}
//!
//! 200       -> success, body is the result
//! otherwise -> failure, body carries code/message/errors/warnings
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

pub mod page;
pub mod response;
pub mod task;

pub use page::Page;
pub use response::ApiResponse;
pub use task::{TaskStatus, TaskTrigger};

// ============================================
// Wire Constants
// ============================================

/// Path prefix of every command URL.
pub const BASE_PATH: &str = "/web_api/";

/// Header carrying the session id.
pub const SESSION_HEADER: &str = "X-chkp-sid";

/// Default `User-Agent` value.
pub const DEFAULT_USER_AGENT: &str = "mgmt-api-rust";

/// Content type of requests and responses.
pub const JSON_CONTENT_TYPE: &str = "application/json";

// ============================================
// Command Names
// ============================================

/// Opens a session.
pub const LOGIN_COMMAND: &str = "login";

/// Closes a session.
pub const LOGOUT_COMMAND: &str = "logout";

/// Reports the status of one or more tasks.
pub const SHOW_TASK_COMMAND: &str = "show-task";

// ============================================
// Payload Field Names
// ============================================

/// Session id in the login reply.
pub const SID_FIELD: &str = "sid";

/// Server API version in the login reply.
pub const API_VERSION_FIELD: &str = "api-server-version";

/// Password in the login request.
pub const PASSWORD_FIELD: &str = "password";

/// Placeholder that replaces the password in logs.
pub const REDACTED_PASSWORD: &str = "****";

/// Builds the URL path for `command`.
#[must_use]
pub fn command_path(command: &str) -> String {
    format!("{BASE_PATH}{}", command.trim_start_matches('/'))
}

/// Replaces the password of a login payload with [`REDACTED_PASSWORD`].
///
/// Payloads without a password are returned unchanged.
#[must_use]
pub fn redact_login_payload(payload: &serde_json::Value) -> serde_json::Value {
    let mut redacted = payload.clone();
    if let Some(password) = redacted
        .as_object_mut()
        .and_then(|map| map.get_mut(PASSWORD_FIELD))
    {
        *password = serde_json::Value::String(REDACTED_PASSWORD.to_owned());
    }
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_path() {
        assert_eq!(command_path("show-hosts"), "/web_api/show-hosts");
        assert_eq!(command_path("/login"), "/web_api/login");
    }

    #[test]
    fn test_redact_login_payload() {
        let payload = json!({"user": "a", "password": "p", "api-key": "k"});
        let redacted = redact_login_payload(&payload);
        assert_eq!(redacted["password"], "****");
        assert_eq!(redacted["user"], "a");
        assert_eq!(payload["password"], "p");

        let no_password = json!({"api-key": "k"});
        assert_eq!(redact_login_payload(&no_password), no_password);
    }
}
