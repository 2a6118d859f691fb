// ============================================
// File: crates/mgmt-api-core/src/crypto/verifier.rs
// ============================================
//! # Pinned Certificate Verifier
//!
//! ## Creation Reason
//! Replaces CA chain validation with fingerprint pinning. One verifier is
//! built for every connection attempt and carries that connection's trust
//! policy, so two sessions with different policies never interfere.
//!
//! ## Main Functionality
//! - `TrustPolicy`: what to do with the presented leaf certificate
//! - `PinnedCertVerifier::evaluate`: the pure accept/reject decision
//! - `HandshakeRecord`: what the verifier saw, readable after the handshake
//! - `build_tls_config`: rustls `ClientConfig` wired to the verifier
//!
//! ## Main Logical Flow
//! 1. Transport creates a `HandshakeRecord` and calls `build_tls_config`
//! 2. rustls calls `verify_server_cert` during the handshake
//! 3. The decision and observed fingerprint are written to the record
//! 4. A rejection becomes a TLS alert; the transport reads the typed
//!    reason back from the record
//!
//! ## ⚠️ Important Note for Next Developer
//! - Signature checks still run: pinning replaces chain trust, not the
//!   proof that the peer owns the certificate's key
//! - No client certificate is ever offered (`with_no_client_auth`)
//! - The verifier only reads the store
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::sync::Arc;

use parking_lot::Mutex;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use thiserror::Error;
use tracing::{debug, warn};

use mgmt_api_common::error::CommonError;
use mgmt_api_common::types::ServerEndpoint;

use super::fingerprint::Fingerprint;
use crate::error::{CoreError, Result};
use crate::store::FingerprintStore;

// ============================================
// CertificateError
// ============================================

/// Reasons a server certificate is refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CertificateError {
    /// The server sent an empty certificate chain.
    #[error("Server presented no certificate")]
    NoCertificates,

    /// No fingerprint is stored for this server.
    #[error("Unknown host {endpoint}: no trusted fingerprint stored (server presented {observed})")]
    UnknownHost {
        /// `host:port` of the server
        endpoint: String,
        /// Fingerprint the server presented
        observed: String,
    },

    /// The stored fingerprint differs from the presented one.
    #[error("Fingerprint of server {endpoint} changed: trusted {expected}, presented {observed}")]
    FingerprintChanged {
        /// `host:port` of the server
        endpoint: String,
        /// Fingerprint in the store
        expected: String,
        /// Fingerprint the server presented
        observed: String,
    },
}

// ============================================
// TrustPolicy
// ============================================

/// How the verifier treats the server's leaf certificate.
#[derive(Debug, Clone)]
pub enum TrustPolicy {
    /// Accept only the fingerprint stored for the endpoint.
    Pinned(Arc<FingerprintStore>),
    /// Accept any certificate (fingerprint checking disabled).
    Unchecked,
    /// Accept any certificate and record its fingerprint.
    Capture,
}

// ============================================
// HandshakeRecord
// ============================================

#[derive(Debug, Default)]
struct HandshakeState {
    observed: Option<Fingerprint>,
    failure: Option<CoreError>,
}

/// Per-connection outcome of certificate verification.
///
/// Cloning shares the same record; the transport keeps one clone and hands
/// the other to the verifier.
#[derive(Debug, Clone, Default)]
pub struct HandshakeRecord(Arc<Mutex<HandshakeState>>);

impl HandshakeRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaf fingerprint seen during the last handshake, if any.
    #[must_use]
    pub fn observed(&self) -> Option<Fingerprint> {
        self.0.lock().observed.clone()
    }

    /// Removes and returns the reason the handshake was refused.
    #[must_use]
    pub fn take_failure(&self) -> Option<CoreError> {
        self.0.lock().failure.take()
    }

    fn set_observed(&self, fingerprint: Fingerprint) {
        self.0.lock().observed = Some(fingerprint);
    }

    fn set_failure(&self, error: CoreError) {
        self.0.lock().failure = Some(error);
    }
}

// ============================================
// PinnedCertVerifier
// ============================================

/// rustls server certificate verifier backed by fingerprint pinning.
#[derive(Debug)]
pub struct PinnedCertVerifier {
    endpoint: ServerEndpoint,
    policy: TrustPolicy,
    record: HandshakeRecord,
    provider: Arc<CryptoProvider>,
}

impl PinnedCertVerifier {
    /// Creates a verifier for one connection to `endpoint`.
    #[must_use]
    pub fn new(
        endpoint: ServerEndpoint,
        policy: TrustPolicy,
        record: HandshakeRecord,
        provider: Arc<CryptoProvider>,
    ) -> Self {
        Self {
            endpoint,
            policy,
            record,
            provider,
        }
    }

    /// Decides whether the presented chain is trusted.
    ///
    /// Only the first (leaf) certificate is fingerprinted.
    ///
    /// # Errors
    /// - `Certificate` for an empty chain, unknown host or changed fingerprint
    /// - Store errors if the fingerprint file cannot be read
    pub fn evaluate(&self, chain: &[CertificateDer<'_>]) -> Result<Fingerprint> {
        let leaf = chain.first().ok_or(CertificateError::NoCertificates)?;
        let observed = Fingerprint::of_der(leaf.as_ref());

        match &self.policy {
            TrustPolicy::Unchecked | TrustPolicy::Capture => Ok(observed),
            TrustPolicy::Pinned(store) => {
                match store.get(&self.endpoint.host, self.endpoint.port)? {
                    None => Err(CertificateError::UnknownHost {
                        endpoint: self.endpoint.store_key(),
                        observed: observed.to_string(),
                    }
                    .into()),
                    Some(expected) if !observed.matches(&expected) => {
                        Err(CertificateError::FingerprintChanged {
                            endpoint: self.endpoint.store_key(),
                            expected,
                            observed: observed.to_string(),
                        }
                        .into())
                    }
                    Some(_) => Ok(observed),
                }
            }
        }
    }
}

impl ServerCertVerifier for PinnedCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        let leaf = std::slice::from_ref(end_entity);
        match self.evaluate(leaf) {
            Ok(fingerprint) => {
                debug!(
                    endpoint = %self.endpoint,
                    fingerprint = %fingerprint,
                    "Server certificate accepted"
                );
                self.record.set_observed(fingerprint);
                Ok(ServerCertVerified::assertion())
            }
            Err(err) => {
                warn!(endpoint = %self.endpoint, error = %err, "Server certificate rejected");
                self.record.set_observed(Fingerprint::of_der(end_entity.as_ref()));
                let tls_error = if err.is_certificate_error() {
                    rustls::Error::InvalidCertificate(
                        rustls::CertificateError::ApplicationVerificationFailure,
                    )
                } else {
                    rustls::Error::General(err.to_string())
                };
                self.record.set_failure(err);
                Err(tls_error)
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

// ============================================
// TLS Configuration
// ============================================

/// Builds a TLS client configuration for one connection to `endpoint`.
///
/// TLS 1.2 and 1.3 are offered; no client certificate is sent.
///
/// # Errors
/// Returns `Internal` if the crypto provider rejects the protocol versions.
pub fn build_tls_config(
    endpoint: ServerEndpoint,
    policy: TrustPolicy,
    record: HandshakeRecord,
) -> Result<ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = Arc::new(PinnedCertVerifier::new(
        endpoint,
        policy,
        record,
        Arc::clone(&provider),
    ));

    let config = ClientConfig::builder_with_provider(provider)
        .with_protocol_versions(&[&rustls::version::TLS12, &rustls::version::TLS13])
        .map_err(|e| CoreError::from(CommonError::internal(format!("TLS setup: {e}"))))?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();

    Ok(config)
}

// ============================================
// Tests
// ============================================
