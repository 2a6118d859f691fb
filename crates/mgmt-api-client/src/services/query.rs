// ============================================
// File: crates/mgmt-api-client/src/services/query.rs
// ============================================
//! # Query Aggregator
//!
//! ## Creation Reason
//! `show-*` commands return collections one page at a time. This service
//! walks the pages with `limit`/`offset` and hands back a single reply
//! holding every item.
//!
//! ## Main Functionality
//! - `QueryAggregator::aggregate`: page loop, item merge, bookkeeping cleanup
//!
//! ## ⚠️ Important Note for Next Developer
//! - The loop ends when a page's `to` reaches `total`; `max_pages` stops a
//!   server whose counts never get there
//! - A failed page is returned as-is; items gathered so far are dropped
//! - The merged reply is the last page's payload minus `from`/`to`, with
//!   the item array replaced by every item collected
//!
//! ## Last Modified
//! v0.1.0 - Initial query aggregator

use serde_json::{Map, Value};
use tracing::debug;

use mgmt_api_core::error::CoreError;
use mgmt_api_core::protocol::page::{windowed_payload, FROM_FIELD, TO_FIELD};
use mgmt_api_core::protocol::{ApiResponse, Page};

use crate::client::ApiClient;
use crate::error::{ClientError, Result};
use crate::session::Session;

/// Collects every page of a paged command.
#[derive(Debug, Clone, Copy)]
pub struct QueryAggregator {
    limit: u32,
    max_pages: u32,
}

impl QueryAggregator {
    /// Creates an aggregator fetching `limit` items per page, at most
    /// `max_pages` times.
    #[must_use]
    pub const fn new(limit: u32, max_pages: u32) -> Self {
        Self { limit, max_pages }
    }

    /// Runs `command` page by page and merges the items under `item_key`.
    ///
    /// # Errors
    /// - `ConfigInvalid` for a zero limit
    /// - `NoItemsToCollect` if a page lacks `item_key` or `total`
    /// - `InconsistentPaging` if the counts cannot be read
    /// - `PageLimitExceeded` if `to` never reaches `total`
    /// - Transport errors
    pub async fn aggregate(
        &self,
        client: &ApiClient,
        session: &Session,
        command: &str,
        item_key: &str,
        base: &Map<String, Value>,
    ) -> Result<ApiResponse> {
        if self.limit == 0 {
            return Err(ClientError::config_invalid("query.limit", "must be at least 1"));
        }

        let mut items: Vec<Value> = Vec::new();
        let mut offset = 0u64;

        for _ in 0..self.max_pages {
            let payload = windowed_payload(base, self.limit, offset);
            let mut response = client
                .session_call(session, command, Value::Object(payload))
                .await?;
            if !response.is_success() {
                return Ok(response);
            }

            let page = Page::parse(response.payload(), item_key).map_err(|e| match e {
                CoreError::MissingField { .. } => ClientError::no_items(item_key),
                other => ClientError::inconsistent_paging(command, other),
            })?;
            if page.total == 0 {
                return Ok(response);
            }

            let last = page.is_last();
            let Some(to) = page.to else {
                return Err(ClientError::inconsistent_paging(
                    command,
                    format!("non-empty page without '{TO_FIELD}'"),
                ));
            };
            items.extend(page.items);
            debug!(command, offset, to, total = page.total, "Collected page");

            if last {
                let merged = response.payload_mut();
                merged.remove(FROM_FIELD);
                merged.remove(TO_FIELD);
                merged.insert(item_key.to_owned(), Value::Array(items));
                return Ok(response);
            }
            offset += u64::from(self.limit);
        }

        Err(ClientError::PageLimitExceeded {
            command: command.to_owned(),
            max_pages: self.max_pages,
        })
    }
}

// ============================================
// Tests
// ============================================
