// ============================================
// File: crates/mgmt-api-client/src/services/trust.rs
// ============================================
//! # Trust on First Use
//!
//! ## Creation Reason
//! The transport only accepts servers whose fingerprint is already in the
//! fingerprint store. This workflow fills the store: it reads the
//! fingerprint the server presents and, if it is new or has changed, asks
//! an approver before saving it.
//!
//! ## Main Functionality
//! - `FingerprintApprover`: the yes/no decision (interactive in the CLI)
//! - `ApprovalPrompt`: what the approver is asked
//! - `establish_trust`: probe, compare, ask, store
//! - `check_fingerprint`: probe and compare without touching the store
//!
//! ## ⚠️ Important Note for Next Developer
//! - The probe trusts any certificate; it must never carry credentials
//! - A refusal leaves the store untouched and fails with
//!   `FingerprintRejected`
//!
//! ## Last Modified
//! v0.1.0 - Initial trust workflow

use mgmt_api_common::types::ServerEndpoint;
use mgmt_api_core::crypto::Fingerprint;
use mgmt_api_core::store::FingerprintStore;
use mgmt_api_transport::ApiTransport;
use tracing::{info, warn};

use crate::error::{ClientError, Result};

// ============================================
// Approval
// ============================================

/// Question put to a [`FingerprintApprover`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalPrompt {
    /// Nothing is stored for this server yet.
    FirstContact {
        /// Server being contacted.
        endpoint: ServerEndpoint,
        /// Fingerprint it presented.
        fingerprint: Fingerprint,
    },
    /// The server presents a different fingerprint than the stored one.
    Changed {
        /// Server being contacted.
        endpoint: ServerEndpoint,
        /// Fingerprint on file.
        stored: String,
        /// Fingerprint it presented.
        presented: Fingerprint,
    },
}

impl ApprovalPrompt {
    /// Text shown to a person deciding on the prompt.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::FirstContact {
                endpoint,
                fingerprint,
            } => format!(
                "First connection to the server {endpoint} \n\n\
                 To verify server identity, compare the following fingerprint with \
                 the one reported by the server's administrator.\n\n\
                 SHA-256 Fingerprint = {}\n\n",
                fingerprint.colon_separated()
            ),
            Self::Changed {
                endpoint,
                presented,
                ..
            } => format!(
                "Fingerprint of server {endpoint} was changed.\n\n\
                 To protect server against impersonation, compare the following \
                 fingerprint with the one reported by the server's administrator.\n\n\
                 SHA-256 Fingerprint = {}\n\n",
                presented.colon_separated()
            ),
        }
    }

    /// Fingerprint the server presented.
    #[must_use]
    pub const fn presented(&self) -> &Fingerprint {
        match self {
            Self::FirstContact { fingerprint, .. } => fingerprint,
            Self::Changed { presented, .. } => presented,
        }
    }

    fn refusal(&self) -> &'static str {
        match self {
            Self::FirstContact { .. } => {
                "First connection to the server and the fingerprint wasn't approved"
            }
            Self::Changed { .. } => {
                "Fingerprint of server was changed and the new fingerprint wasn't approved"
            }
        }
    }
}

/// Decides whether a new or changed fingerprint may be stored.
pub trait FingerprintApprover: Send + Sync {
    /// `true` to store the presented fingerprint.
    fn approve(&self, prompt: &ApprovalPrompt) -> bool;
}

impl<F> FingerprintApprover for F
where
    F: Fn(&ApprovalPrompt) -> bool + Send + Sync,
{
    fn approve(&self, prompt: &ApprovalPrompt) -> bool {
        self(prompt)
    }
}

/// What `establish_trust` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustOutcome {
    /// The stored fingerprint already matched.
    AlreadyTrusted(Fingerprint),
    /// First contact; the fingerprint was approved and stored.
    Stored(Fingerprint),
    /// A changed fingerprint was approved and replaced the old one.
    Replaced {
        /// Fingerprint that was on file.
        previous: String,
        /// Fingerprint now on file.
        current: Fingerprint,
    },
}

// ============================================
// Workflow
// ============================================

/// Reads `endpoint`'s fingerprint and stores it if `approver` agrees.
///
/// # Errors
/// - `FingerprintRejected` if a new or changed fingerprint is refused
/// - Connection errors if no certificate could be read
/// - Store errors
pub async fn establish_trust(
    transport: &dyn ApiTransport,
    store: &FingerprintStore,
    endpoint: &ServerEndpoint,
    approver: &dyn FingerprintApprover,
) -> Result<TrustOutcome> {
    endpoint.validate()?;
    let presented = transport.probe_fingerprint(endpoint).await?;
    let stored = store.get(&endpoint.host, endpoint.port)?;

    let prompt = match stored {
        Some(stored) if presented.matches(&stored) => {
            info!(endpoint = %endpoint, "Server fingerprint already trusted");
            return Ok(TrustOutcome::AlreadyTrusted(presented));
        }
        Some(stored) => ApprovalPrompt::Changed {
            endpoint: endpoint.clone(),
            stored,
            presented,
        },
        None => ApprovalPrompt::FirstContact {
            endpoint: endpoint.clone(),
            fingerprint: presented,
        },
    };

    if !approver.approve(&prompt) {
        warn!(endpoint = %endpoint, "Server fingerprint not approved");
        return Err(ClientError::FingerprintRejected {
            endpoint: endpoint.to_string(),
            fingerprint: prompt.presented().to_string(),
            message: prompt.refusal().to_owned(),
        });
    }

    store.put(&endpoint.host, endpoint.port, prompt.presented().as_hex())?;
    info!(endpoint = %endpoint, fingerprint = %prompt.presented(), "Server fingerprint stored");

    Ok(match prompt {
        ApprovalPrompt::FirstContact { fingerprint, .. } => TrustOutcome::Stored(fingerprint),
        ApprovalPrompt::Changed {
            stored, presented, ..
        } => TrustOutcome::Replaced {
            previous: stored,
            current: presented,
        },
    })
}

/// `true` if `endpoint` presents the fingerprint on file.
///
/// Returns `false` when nothing is stored for the server.
///
/// # Errors
/// Connection errors if no certificate could be read, or store errors.
pub async fn check_fingerprint(
    transport: &dyn ApiTransport,
    store: &FingerprintStore,
    endpoint: &ServerEndpoint,
) -> Result<bool> {
    let Some(stored) = store.get(&endpoint.host, endpoint.port)? else {
        return Ok(false);
    };
    let presented = transport.probe_fingerprint(endpoint).await?;
    Ok(presented.matches(&stored))
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use mgmt_api_transport::MockTransport;

    use super::*;
    use crate::error::ErrorKind;

    fn setup() -> (tempfile::TempDir, MockTransport, FingerprintStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerprintStore::open(dir.path().join("fp.txt")).unwrap();
        (dir, MockTransport::new(), store)
    }

    fn endpoint() -> ServerEndpoint {
        ServerEndpoint::new("10.0.0.5", 443)
    }

    #[tokio::test]
    async fn test_first_contact_approved() {
        let (_dir, mock, store) = setup();
        let fp = Fingerprint::of_der(b"server-cert");
        mock.set_fingerprint(fp.clone());

        let asked = AtomicUsize::new(0);
        let approver = |prompt: &ApprovalPrompt| {
            asked.fetch_add(1, Ordering::SeqCst);
            assert!(prompt.message().starts_with("First connection to the server 10.0.0.5:443"));
            assert!(prompt.message().contains(&fp.colon_separated()));
            true
        };

        let outcome = establish_trust(&mock, &store, &endpoint(), &approver)
            .await
            .unwrap();
        assert_eq!(outcome, TrustOutcome::Stored(fp.clone()));
        assert_eq!(asked.load(Ordering::SeqCst), 1);
        assert_eq!(store.get("10.0.0.5", 443).unwrap().as_deref(), Some(fp.as_hex()));
    }

    #[tokio::test]
    async fn test_first_contact_refused() {
        let (_dir, mock, store) = setup();
        mock.set_fingerprint(Fingerprint::of_der(b"server-cert"));

        let err = establish_trust(&mock, &store, &endpoint(), &|_: &ApprovalPrompt| false)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Certificate);
        assert!(err
            .to_string()
            .starts_with("First connection to the server and the fingerprint wasn't approved"));
        assert!(store.get("10.0.0.5", 443).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_matching_fingerprint_needs_no_approval() {
        let (_dir, mock, store) = setup();
        let fp = Fingerprint::of_der(b"server-cert");
        mock.set_fingerprint(fp.clone());
        store
            .put("10.0.0.5", 443, &fp.as_hex().to_ascii_lowercase())
            .unwrap();

        let outcome = establish_trust(&mock, &store, &endpoint(), &|_: &ApprovalPrompt| -> bool {
            panic!("approver must not be asked")
        })
        .await
        .unwrap();
        assert_eq!(outcome, TrustOutcome::AlreadyTrusted(fp));
    }

    #[tokio::test]
    async fn test_changed_fingerprint() {
        let (_dir, mock, store) = setup();
        let old = Fingerprint::of_der(b"old-cert");
        let new = Fingerprint::of_der(b"new-cert");
        store.put("10.0.0.5", 443, old.as_hex()).unwrap();
        mock.set_fingerprint(new.clone());

        let err = establish_trust(&mock, &store, &endpoint(), &|p: &ApprovalPrompt| {
            assert!(matches!(p, ApprovalPrompt::Changed { .. }));
            assert!(p.message().starts_with("Fingerprint of server 10.0.0.5:443 was changed."));
            false
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("wasn't approved"));
        assert_eq!(store.get("10.0.0.5", 443).unwrap().as_deref(), Some(old.as_hex()));

        let outcome = establish_trust(&mock, &store, &endpoint(), &|_: &ApprovalPrompt| true)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            TrustOutcome::Replaced {
                previous: old.as_hex().to_owned(),
                current: new.clone(),
            }
        );
        assert_eq!(store.get("10.0.0.5", 443).unwrap().as_deref(), Some(new.as_hex()));
    }

    #[tokio::test]
    async fn test_probe_failure_propagates() {
        let (_dir, mock, store) = setup();
        let err = establish_trust(&mock, &store, &endpoint(), &|_: &ApprovalPrompt| true)
            .await
            .unwrap_err();
        assert!(err.is_connection_error());
    }

    #[tokio::test]
    async fn test_check_fingerprint() {
        let (_dir, mock, store) = setup();
        let fp = Fingerprint::of_der(b"server-cert");
        mock.set_fingerprint(fp.clone());

        assert!(!check_fingerprint(&mock, &store, &endpoint()).await.unwrap());

        store.put("10.0.0.5", 443, fp.as_hex()).unwrap();
        assert!(check_fingerprint(&mock, &store, &endpoint()).await.unwrap());

        store
            .put("10.0.0.5", 443, Fingerprint::of_der(b"other").as_hex())
            .unwrap();
        assert!(!check_fingerprint(&mock, &store, &endpoint()).await.unwrap());
    }
}
