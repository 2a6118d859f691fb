// ============================================
// File: crates/mgmt-api-core/src/protocol/response.rs
// ============================================
//! # API Response
//!
//! Uniform result of every call. `success` starts as `status_code == 200`;
//! the failure details (`errors`, `warnings`, `message`) are only read from
//! the payload when the call failed.
//!
//! The task resolver may later clear `success` on a 200 reply whose tasks
//! failed; the status code and payload are left as the server sent them.

use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// Status code of a successful call.
pub const HTTP_OK: u16 = 200;

/// Result of one management API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    status_code: u16,
    success: bool,
    payload: Map<String, Value>,
    errors: Option<Vec<Value>>,
    warnings: Option<Vec<Value>>,
    error_message: Option<String>,
}

impl ApiResponse {
    /// Builds a response from the HTTP status and decoded JSON body.
    ///
    /// # Errors
    /// Returns `MalformedResponse` unless the body is a JSON object.
    pub fn from_parts(status_code: u16, body: Value) -> Result<Self> {
        match body {
            Value::Object(payload) => Ok(Self::new(status_code, payload)),
            other => Err(CoreError::malformed(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Builds a response from the HTTP status and the body object.
    #[must_use]
    pub fn new(status_code: u16, payload: Map<String, Value>) -> Self {
        let success = status_code == HTTP_OK;
        let (errors, warnings, error_message) = if success {
            (None, None, None)
        } else {
            (
                payload.get("errors").and_then(Value::as_array).cloned(),
                payload.get("warnings").and_then(Value::as_array).cloned(),
                payload
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
            )
        };

        Self {
            status_code,
            success,
            payload,
            errors,
            warnings,
            error_message,
        }
    }

    /// HTTP status code of the (last) reply.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Whether the call, and any tasks it started, succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// Overrides the success flag.
    pub fn set_success(&mut self, success: bool) {
        self.success = success;
    }

    /// Decoded JSON body.
    #[must_use]
    pub const fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Mutable access to the body.
    pub fn payload_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.payload
    }

    /// Consumes the response, returning the body.
    #[must_use]
    pub fn into_payload(self) -> Map<String, Value> {
        self.payload
    }

    /// Reads a top-level string field.
    #[must_use]
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.payload.get(name).and_then(Value::as_str)
    }

    /// `errors` of a failed call.
    #[must_use]
    pub fn errors(&self) -> Option<&[Value]> {
        self.errors.as_deref()
    }

    /// `warnings` of a failed call.
    #[must_use]
    pub fn warnings(&self) -> Option<&[Value]> {
        self.warnings.as_deref()
    }

    /// `message` of a failed call.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_response() {
        let resp = ApiResponse::from_parts(200, json!({"sid": "S1", "message": "ignored"})).unwrap();
        assert!(resp.is_success());
        assert_eq!(resp.str_field("sid"), Some("S1"));
        assert_eq!(resp.error_message(), None);
        assert!(resp.errors().is_none());
    }

    #[test]
    fn test_failure_response_extracts_details() {
        let resp = ApiResponse::from_parts(
            400,
            json!({
                "code": "generic_err_invalid_parameter",
                "message": "Invalid parameter",
                "errors": [{"message": "bad name"}],
                "warnings": [{"message": "deprecated"}]
            }),
        )
        .unwrap();
        assert!(!resp.is_success());
        assert_eq!(resp.status_code(), 400);
        assert_eq!(resp.error_message(), Some("Invalid parameter"));
        assert_eq!(resp.errors().map(<[Value]>::len), Some(1));
        assert_eq!(resp.warnings().map(<[Value]>::len), Some(1));
    }

    #[test]
    fn test_set_success_keeps_payload_and_status() {
        let mut resp = ApiResponse::from_parts(200, json!({"tasks": []})).unwrap();
        resp.set_success(false);
        assert!(!resp.is_success());
        assert_eq!(resp.status_code(), 200);
        assert!(resp.payload().contains_key("tasks"));
    }

    #[test]
    fn test_non_object_body_is_rejected() {
        let err = ApiResponse::from_parts(200, Value::Null).unwrap_err();
        assert!(err.is_protocol_error());
        assert!(err.to_string().contains("null"));

        let err = ApiResponse::from_parts(200, json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("an array"));
        assert!(ApiResponse::from_parts(500, json!("oops")).is_err());
    }
}
