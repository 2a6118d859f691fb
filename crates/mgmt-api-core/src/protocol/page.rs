// ============================================
// File: crates/mgmt-api-core/src/protocol/page.rs
// ============================================
//! # Page Model
//!
//! One page of a `show-*` collection reply. The server reports the slice
//! it returned with `from`/`to` (1-based, inclusive) and the collection
//! size with `total`; the items live under a command-specific key such as
//! `objects` or `hosts`.

use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// Collection size field.
pub const TOTAL_FIELD: &str = "total";

/// Index of the first item on the page.
pub const FROM_FIELD: &str = "from";

/// Index of the last item on the page.
pub const TO_FIELD: &str = "to";

/// Page size request field.
pub const LIMIT_FIELD: &str = "limit";

/// Page start request field.
pub const OFFSET_FIELD: &str = "offset";

/// Parsed page of a paged reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Size of the whole collection.
    pub total: u64,
    /// Cumulative count reached by this page, absent on empty collections.
    pub to: Option<u64>,
    /// Items on this page.
    pub items: Vec<Value>,
}

impl Page {
    /// Reads a page whose items are stored under `item_key`.
    ///
    /// # Errors
    /// - `MissingField` if `item_key` or `total` is absent
    /// - `MalformedResponse` if they have the wrong type
    pub fn parse(payload: &Map<String, Value>, item_key: &str) -> Result<Self> {
        let items = payload
            .get(item_key)
            .ok_or_else(|| CoreError::missing_field(item_key))?;
        let total = payload
            .get(TOTAL_FIELD)
            .ok_or_else(|| CoreError::missing_field(TOTAL_FIELD))?;

        let total = count(total)
            .ok_or_else(|| CoreError::malformed(format!("'{TOTAL_FIELD}' is not a count")))?;
        let to = match payload.get(TO_FIELD) {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                count(v)
                    .ok_or_else(|| CoreError::malformed(format!("'{TO_FIELD}' is not a count")))?,
            ),
        };
        let items = match items {
            Value::Array(items) => items.clone(),
            _ => {
                return Err(CoreError::malformed(format!(
                    "'{item_key}' is not an array"
                )))
            }
        };

        Ok(Self { total, to, items })
    }

    /// `true` once this page reaches the end of the collection.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.to.is_some_and(|to| to >= self.total)
    }
}

/// Copy of `base` with `limit` and `offset` set for one page.
#[must_use]
pub fn windowed_payload(base: &Map<String, Value>, limit: u32, offset: u64) -> Map<String, Value> {
    let mut payload = base.clone();
    payload.insert(LIMIT_FIELD.to_owned(), Value::from(limit));
    payload.insert(OFFSET_FIELD.to_owned(), Value::from(offset));
    payload
}

fn count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
