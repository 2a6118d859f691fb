// ============================================
// File: crates/mgmt-api-client/src/debug_log.rs
// ============================================
//! # Debug File Sink
//!
//! ## Creation Reason
//! Writes every API exchange to a file so an operator can replay what an
//! automation sent and received.
//!
//! ## File Format
//! Records are JSON objects separated by `,`, so wrapping the file in
//! `[` `]` yields a JSON array:
//! ```text
//! {"request":{...},"response":{...}},{"request":{...},"response":{...}}
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The file is truncated when the sink is created
//! - Login passwords are already masked in `CallRecord`
//!
//! ## Last Modified
//! v0.1.0 - Initial debug file sink

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use mgmt_api_common::error::CommonError;
use mgmt_api_transport::{CallLogSink, CallRecord};

use crate::error::{ClientError, Result};

struct SinkState {
    file: File,
    empty: bool,
}

/// [`CallLogSink`] appending records to a file.
pub struct DebugFileSink {
    path: PathBuf,
    state: Mutex<SinkState>,
}

impl DebugFileSink {
    /// Creates (or truncates) the debug file at `path`.
    ///
    /// # Errors
    /// Returns `DebugLog` if the file cannot be created.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(ClientError::config_invalid(
                "logging.debug_file",
                "file name is empty",
            ));
        }
        let file = File::create(&path).map_err(|source| ClientError::DebugLog {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            path,
            state: Mutex::new(SinkState { file, empty: true }),
        })
    }

    /// Path of the debug file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CallLogSink for DebugFileSink {
    fn record(&self, record: &CallRecord) -> mgmt_api_transport::Result<()> {
        let json = serde_json::to_string(record)
            .map_err(|e| CommonError::encoding("call record", e))?;

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let separator = if state.empty { "" } else { "," };
        write!(state.file, "{separator}{json}")
            .and_then(|()| state.file.flush())
            .map_err(|e| CommonError::io("failed writing to the debug file", e))?;
        state.empty = false;
        Ok(())
    }
}

impl std::fmt::Debug for DebugFileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugFileSink")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================
