// ============================================
// File: crates/mgmt-api-client/src/error.rs
// ============================================
//! # Client Error Types
//!
//! ## Last Modified
//! v0.1.0 - Initial client errors and taxonomy mapping

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use mgmt_api_common::error::CommonError;
use mgmt_api_core::error::CoreError;
use mgmt_api_transport::error::TransportError;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client error types.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        path: String,
        reason: String,
    },

    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        field: String,
        reason: String,
    },

    #[error("No items to collect, check your key value ('{key}')")]
    NoItemsToCollect {
        key: String,
    },

    #[error("Inconsistent paging from '{command}': {reason}")]
    InconsistentPaging {
        command: String,
        reason: String,
    },

    #[error("Paging of '{command}' did not finish within {max_pages} pages")]
    PageLimitExceeded {
        command: String,
        max_pages: u32,
    },

    #[error("Invalid payload: {reason}")]
    InvalidPayload {
        reason: String,
    },

    #[error("Failed to resolve task {task_id}: {reason}")]
    TaskResolution {
        task_id: String,
        reason: String,
        #[source]
        source: Option<TransportError>,
    },

    #[error("Waiting for task {task_id} was cancelled")]
    Cancelled {
        task_id: String,
    },

    #[error("Task {task_id} still in progress after {waited:?}")]
    DeadlineExceeded {
        task_id: String,
        waited: Duration,
    },

    #[error("{message}: {endpoint} (fingerprint {fingerprint})")]
    FingerprintRejected {
        endpoint: String,
        fingerprint: String,
        message: String,
    },

    #[error("Failed to open debug file '{}'", path.display())]
    DebugLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Common(#[from] CommonError),
}

/// Failure category reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Handshake, socket or timeout failure.
    Connection,
    /// Server certificate not trusted.
    Certificate,
    /// Server reply not understood.
    Protocol,
    /// Fingerprint file unreadable or unwritable.
    StoreIo,
    /// A status check failed while waiting for a task.
    TaskResolution,
    /// Caller misuse: bad key name, bad settings, missing fields.
    Configuration,
}

impl ClientError {
    pub fn config_load(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn no_items(key: impl Into<String>) -> Self {
        Self::NoItemsToCollect { key: key.into() }
    }

    pub fn inconsistent_paging(command: impl Into<String>, reason: impl ToString) -> Self {
        Self::InconsistentPaging {
            command: command.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_payload(reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            reason: reason.into(),
        }
    }

    pub fn task_resolution(task_id: impl Into<String>, reason: impl ToString) -> Self {
        Self::TaskResolution {
            task_id: task_id.into(),
            reason: reason.to_string(),
            source: None,
        }
    }

    pub fn task_poll_failed(task_id: impl Into<String>, source: TransportError) -> Self {
        Self::TaskResolution {
            task_id: task_id.into(),
            reason: "status check failed".to_string(),
            source: Some(source),
        }
    }

    /// Classifies the error into the caller-facing taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TaskResolution { .. } | Self::Cancelled { .. } | Self::DeadlineExceeded { .. } => {
                ErrorKind::TaskResolution
            }
            Self::FingerprintRejected { .. } => ErrorKind::Certificate,
            Self::InconsistentPaging { .. } => ErrorKind::Protocol,
            Self::ConfigLoad { .. }
            | Self::ConfigInvalid { .. }
            | Self::NoItemsToCollect { .. }
            | Self::PageLimitExceeded { .. }
            | Self::InvalidPayload { .. }
            | Self::DebugLog { .. }
            | Self::Common(_) => ErrorKind::Configuration,
            Self::Transport(e) => transport_kind(e),
            Self::Core(e) => core_kind(e),
        }
    }

    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        self.kind() == ErrorKind::Connection
    }

    #[must_use]
    pub fn is_certificate_error(&self) -> bool {
        self.kind() == ErrorKind::Certificate
    }

    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

fn transport_kind(error: &TransportError) -> ErrorKind {
    if error.is_connection_error() {
        ErrorKind::Connection
    } else if error.is_certificate_error() {
        ErrorKind::Certificate
    } else if error.is_store_error() {
        ErrorKind::StoreIo
    } else if error.is_configuration_error() {
        ErrorKind::Configuration
    } else {
        ErrorKind::Protocol
    }
}

fn core_kind(error: &CoreError) -> ErrorKind {
    if error.is_store_error() {
        ErrorKind::StoreIo
    } else if error.is_certificate_error() {
        ErrorKind::Certificate
    } else if error.is_protocol_error() {
        ErrorKind::Protocol
    } else {
        ErrorKind::Configuration
    }
}
