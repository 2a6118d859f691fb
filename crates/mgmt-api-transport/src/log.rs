// ============================================
// File: crates/mgmt-api-transport/src/log.rs
// ============================================
//! # Call Log Records
//!
//! ## Creation Reason
//! Operators debugging an automation want every request and reply on disk.
//! This module defines the record shape and the sink contract; the file
//! sink itself lives with the application.
//!
//! ## Record Shape
//! ```text
//! {
//!   "request":  { "url": ..., "payload": ..., "headers": { User-Agent, Accept,
//!                 Content-Type, Content-Length } },
//!   "response": { "data": ..., "status": ... }
//! }
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `CallRecord::new` redacts the login password; never build a record
//!   from a raw login payload any other way
//! - The session header is deliberately not part of the record
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use serde::Serialize;
use serde_json::{Map, Value};

use mgmt_api_core::protocol::{redact_login_payload, ApiResponse, JSON_CONTENT_TYPE};

use crate::error::Result;
use crate::traits::ApiRequest;

// ============================================
// CallRecord
// ============================================

/// Request half of a [`CallRecord`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedRequest {
    /// Request URL.
    pub url: String,
    /// Request body, login password masked.
    pub payload: Value,
    /// Fixed request headers.
    pub headers: RecordedHeaders,
}

/// Headers of a [`RecordedRequest`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedHeaders {
    /// Client identifier.
    #[serde(rename = "User-Agent")]
    pub user_agent: String,
    /// Always `application/json`.
    #[serde(rename = "Accept")]
    pub accept: String,
    /// Always `application/json`.
    #[serde(rename = "Content-Type")]
    pub content_type: String,
    /// Length of the body actually sent.
    #[serde(rename = "Content-Length")]
    pub content_length: usize,
}

/// Response half of a [`CallRecord`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedResponse {
    /// Decoded reply body.
    pub data: Map<String, Value>,
    /// HTTP status.
    pub status: u16,
}

/// One request/response exchange, as written to a debug log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecord {
    /// What was sent.
    pub request: RecordedRequest,
    /// What came back.
    pub response: RecordedResponse,
}

impl CallRecord {
    /// Builds a record of `request` and its `response`.
    ///
    /// The login password is replaced with `****`.
    #[must_use]
    pub fn new(request: &ApiRequest, user_agent: &str, response: &ApiResponse) -> Self {
        let content_length = serde_json::to_vec(&request.payload).map_or(0, |body| body.len());
        let payload = if request.is_login() {
            redact_login_payload(&request.payload)
        } else {
            request.payload.clone()
        };

        Self {
            request: RecordedRequest {
                url: request.url(),
                payload,
                headers: RecordedHeaders {
                    user_agent: user_agent.to_owned(),
                    accept: JSON_CONTENT_TYPE.to_owned(),
                    content_type: JSON_CONTENT_TYPE.to_owned(),
                    content_length,
                },
            },
            response: RecordedResponse {
                data: response.payload().clone(),
                status: response.status_code(),
            },
        }
    }
}

// ============================================
// CallLogSink Trait
// ============================================

/// Receives a record of every exchange.
pub trait CallLogSink: Send + Sync {
    /// Stores one record.
    ///
    /// # Errors
    /// Returns an error if the record could not be written.
    fn record(&self, record: &CallRecord) -> Result<()>;
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use mgmt_api_common::types::ServerEndpoint;
    use serde_json::json;

    #[test]
    fn test_login_record_is_redacted() {
        let payload = json!({"user": "a", "password": "p", "api-key": "k"});
        let request = ApiRequest::new(ServerEndpoint::new("mgmt", 443), "login", payload.clone());
        let response = ApiResponse::from_parts(200, json!({"sid": "S1"})).unwrap();

        let record = CallRecord::new(&request, "mgmt-api-rust", &response);
        assert_eq!(record.request.payload["password"], "****");
        assert_eq!(record.request.payload["user"], "a");
        assert_eq!(
            record.request.headers.content_length,
            serde_json::to_vec(&payload).unwrap().len()
        );
        assert_eq!(record.response.status, 200);

        // the request itself still carries the real password
        assert_eq!(request.payload["password"], "p");
    }

    #[test]
    fn test_record_serialization() {
        let request = ApiRequest::new(
            ServerEndpoint::new("mgmt", 443),
            "show-hosts",
            json!({"password": "not-a-login"}),
        );
        let response = ApiResponse::from_parts(404, json!({"message": "nope"})).unwrap();
        let record = CallRecord::new(&request, "ua", &response);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["request"]["url"], "https://mgmt:443/web_api/show-hosts");
        assert_eq!(value["request"]["payload"]["password"], "not-a-login");
        assert_eq!(value["request"]["headers"]["User-Agent"], "ua");
        assert_eq!(value["request"]["headers"]["Accept"], "application/json");
        assert_eq!(value["response"]["data"]["message"], "nope");
        assert_eq!(value["response"]["status"], 404);
    }
}
