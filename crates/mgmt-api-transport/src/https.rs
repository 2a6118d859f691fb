// ============================================
// File: crates/mgmt-api-transport/src/https.rs
// ============================================
//! # HTTPS Transport Implementation
//!
//! ## Creation Reason
//! Performs one `POST /web_api/{command}` exchange with a management
//! server, pinning the server certificate by fingerprint.
//!
//! ## Main Functionality
//! - `TransportConfig`: timeouts, user agent, fingerprint policy, proxy
//! - `HttpsTransport`: `ApiTransport` over reqwest + rustls
//!
//! ## Main Logical Flow
//! 1. Build a fresh `reqwest::Client` whose rustls config carries a
//!    verifier for this call only (policy, endpoint, store handle)
//! 2. POST the JSON payload with the fixed headers (+ session header)
//! 3. Decode the body as a JSON object whatever the status
//! 4. Drop the client, closing the connection
//!
//! ## Design Choices
//! - No connection reuse: idle pool size is 0 and the client lives for
//!   one call, so every exit path tears the connection down
//! - Redirects are not followed
//! - A rejected certificate is reported from the `HandshakeRecord`, not
//!   from reqwest's stringly TLS error
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never log request payloads here; login payloads hold the password
//! - The trust policy is per call; do not cache the client across calls
//!
//! ## Last Modified
//! v0.1.0 - Initial HTTPS transport implementation

use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use mgmt_api_common::types::ServerEndpoint;
use mgmt_api_core::crypto::{build_tls_config, Fingerprint, HandshakeRecord, TrustPolicy};
use mgmt_api_core::protocol::{
    command_path, ApiResponse, DEFAULT_USER_AGENT, JSON_CONTENT_TYPE, SESSION_HEADER,
};
use mgmt_api_core::store::FingerprintStore;

use crate::error::{Result, TransportError};
use crate::proxy::ProxySettings;
use crate::traits::{ApiRequest, ApiTransport};

// ============================================
// TransportConfig
// ============================================

/// Settings for [`HttpsTransport`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransportConfig {
    /// TCP + TLS connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// `User-Agent` header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Pin server certificates against the fingerprint store.
    #[serde(default = "default_check_fingerprint")]
    pub check_fingerprint: bool,

    /// `user:password@host:port` of an outbound proxy.
    #[serde(default)]
    pub proxy: Option<String>,
}

fn default_connect_timeout() -> u64 {
    180
}

fn default_read_timeout() -> u64 {
    300
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_check_fingerprint() -> bool {
    true
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            user_agent: default_user_agent(),
            check_fingerprint: default_check_fingerprint(),
            proxy: None,
        }
    }
}

impl TransportConfig {
    /// Connect timeout as a `Duration`.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Read timeout as a `Duration`.
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Parsed proxy setting, if one is configured.
    ///
    /// # Errors
    /// Returns `InvalidProxy` for a malformed proxy string.
    pub fn proxy_settings(&self) -> Result<Option<ProxySettings>> {
        self.proxy
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse)
            .transpose()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns error if any value is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_secs == 0 {
            return Err(TransportError::invalid_request(
                "connect_timeout_secs must be greater than 0",
            ));
        }
        if self.read_timeout_secs == 0 {
            return Err(TransportError::invalid_request(
                "read_timeout_secs must be greater than 0",
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(TransportError::invalid_request("user_agent cannot be empty"));
        }
        self.proxy_settings()?;
        Ok(())
    }
}

// ============================================
// HttpsTransport
// ============================================

/// `ApiTransport` over HTTPS with fingerprint pinning.
pub struct HttpsTransport {
    config: TransportConfig,
    proxy: Option<ProxySettings>,
    store: Arc<FingerprintStore>,
}

impl HttpsTransport {
    /// Creates a transport that pins against `store`.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid.
    pub fn new(config: TransportConfig, store: Arc<FingerprintStore>) -> Result<Self> {
        config.validate()?;
        let proxy = config.proxy_settings()?;
        if let Some(p) = &proxy {
            info!(proxy = %p.url(), "Management API calls will use a proxy");
        }
        Ok(Self {
            config,
            proxy,
            store,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn call_policy(&self) -> TrustPolicy {
        if self.config.check_fingerprint {
            TrustPolicy::Pinned(Arc::clone(&self.store))
        } else {
            TrustPolicy::Unchecked
        }
    }

    /// Builds a single-use client for one exchange with `endpoint`.
    fn build_client(
        &self,
        endpoint: &ServerEndpoint,
        policy: TrustPolicy,
        record: HandshakeRecord,
    ) -> Result<reqwest::Client> {
        let tls = build_tls_config(endpoint.clone(), policy, record)?;

        let mut builder = reqwest::Client::builder()
            .use_preconfigured_tls(tls)
            .connect_timeout(self.config.connect_timeout())
            .read_timeout(self.config.read_timeout())
            .user_agent(self.config.user_agent.clone())
            .pool_max_idle_per_host(0)
            .redirect(reqwest::redirect::Policy::none());

        builder = match &self.proxy {
            Some(proxy) => builder.proxy(proxy.to_reqwest()?),
            None => builder.no_proxy(),
        };

        builder
            .build()
            .map_err(|e| TransportError::invalid_request(format!("HTTP client setup: {e}")))
    }

    /// Maps a reqwest failure, preferring the verifier's typed reason.
    fn classify(
        endpoint: &ServerEndpoint,
        record: &HandshakeRecord,
        err: &reqwest::Error,
    ) -> TransportError {
        if let Some(failure) = record.take_failure() {
            return failure.into();
        }
        if err.is_timeout() {
            let operation = if err.is_connect() { "connect" } else { "read" };
            return TransportError::timeout(endpoint, operation);
        }
        TransportError::connection(endpoint, error_chain(err))
    }
}

#[async_trait]
impl ApiTransport for HttpsTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let endpoint = &request.endpoint;
        let record = HandshakeRecord::new();
        let client = self.build_client(endpoint, self.call_policy(), record.clone())?;

        let body = serde_json::to_vec(&request.payload)
            .map_err(|e| TransportError::invalid_request(format!("payload: {e}")))?;

        debug!(
            endpoint = %endpoint,
            command = %request.command,
            has_session = request.session_id.is_some(),
            "Sending management API request"
        );

        let mut builder = client
            .post(request.url())
            .header(ACCEPT, JSON_CONTENT_TYPE)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body);
        if let Some(sid) = &request.session_id {
            builder = builder.header(SESSION_HEADER, sid.as_str());
        }

        let reply = builder
            .send()
            .await
            .map_err(|e| Self::classify(endpoint, &record, &e))?;
        let status = reply.status().as_u16();
        let bytes = reply
            .bytes()
            .await
            .map_err(|e| Self::classify(endpoint, &record, &e))?;

        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::protocol(&request.command, status, e))?;
        let response = ApiResponse::from_parts(status, body)
            .map_err(|e| TransportError::protocol(&request.command, status, e))?;
        if response.is_success() {
            debug!(command = %request.command, status, "Management API call succeeded");
        } else {
            warn!(
                command = %request.command,
                status,
                reason = response.error_message().unwrap_or_default(),
                "Management API call failed"
            );
        }
        Ok(response)
    }

    async fn probe_fingerprint(&self, endpoint: &ServerEndpoint) -> Result<Fingerprint> {
        let record = HandshakeRecord::new();
        let client = self.build_client(endpoint, TrustPolicy::Capture, record.clone())?;
        let url = format!("https://{}{}", endpoint.authority(), command_path(""));

        debug!(endpoint = %endpoint, "Probing server fingerprint");
        let outcome = client
            .post(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body("{}")
            .send()
            .await;

        // Any HTTP status is fine once the handshake has shown the leaf.
        if let Some(fingerprint) = record.observed() {
            return Ok(fingerprint);
        }
        match outcome {
            Err(e) => Err(Self::classify(endpoint, &record, &e)),
            Ok(_) => Err(TransportError::connection(
                endpoint,
                "server did not present a certificate",
            )),
        }
    }

    fn user_agent(&self) -> &str {
        &self.config.user_agent
    }
}

impl std::fmt::Debug for HttpsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpsTransport")
            .field("check_fingerprint", &self.config.check_fingerprint)
            .field("proxy", &self.proxy.as_ref().map(ProxySettings::url))
            .field("store", &self.store.path())
            .finish()
    }
}

/// Joins an error and its sources into one line.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::TestServer;
    use mgmt_api_common::types::SessionId;
    use mgmt_api_core::{CertificateError, CoreError};
    use serde_json::json;

    fn temp_store() -> (tempfile::TempDir, Arc<FingerprintStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerprintStore::open(dir.path().join("fingerprints.txt")).unwrap();
        (dir, Arc::new(store))
    }

    #[test]
    fn test_config_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.connect_timeout(), Duration::from_secs(180));
        assert_eq!(config.read_timeout(), Duration::from_secs(300));
        assert_eq!(config.user_agent, "mgmt-api-rust");
        assert!(config.check_fingerprint);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = TransportConfig {
            read_timeout_secs: 0,
            ..TransportConfig::default()
        };
        assert!(config.validate().is_err());

        let config = TransportConfig {
            proxy: Some("a@b@c".into()),
            ..TransportConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TransportError::InvalidProxy { .. })
        ));

        let config = TransportConfig {
            proxy: Some("   ".into()),
            ..TransportConfig::default()
        };
        assert_eq!(config.proxy_settings().unwrap(), None);
    }

    #[test]
    fn test_call_policy_follows_config() {
        let (_dir, store) = temp_store();
        let pinned = HttpsTransport::new(TransportConfig::default(), Arc::clone(&store)).unwrap();
        assert!(matches!(pinned.call_policy(), TrustPolicy::Pinned(_)));

        let unchecked = HttpsTransport::new(
            TransportConfig {
                check_fingerprint: false,
                ..TransportConfig::default()
            },
            store,
        )
        .unwrap();
        assert!(matches!(unchecked.call_policy(), TrustPolicy::Unchecked));
    }

    #[test]
    fn test_build_client_with_proxy() {
        let (_dir, store) = temp_store();
        let transport = HttpsTransport::new(
            TransportConfig {
                proxy: Some("bob:secret@127.0.0.1:3128".into()),
                ..TransportConfig::default()
            },
            store,
        )
        .unwrap();
        let client = transport.build_client(
            &ServerEndpoint::new("mgmt.local", 443),
            TrustPolicy::Capture,
            HandshakeRecord::new(),
        );
        assert!(client.is_ok());
        assert!(!format!("{transport:?}").contains("secret"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        let (_dir, store) = temp_store();
        let transport = HttpsTransport::new(
            TransportConfig {
                connect_timeout_secs: 2,
                ..TransportConfig::default()
            },
            store,
        )
        .unwrap();

        // Port 1 on localhost refuses connections.
        let request = ApiRequest::new(ServerEndpoint::new("127.0.0.1", 1), "login", json!({}));
        let err = transport.send(&request).await.unwrap_err();
        assert!(err.is_connection_error(), "unexpected error: {err}");
    }

    #[test]
    fn test_classify_prefers_handshake_record() {
        // Drive the verifier directly so the record holds a rejection.
        use rustls::client::danger::ServerCertVerifier;
        use rustls::pki_types::{CertificateDer, ServerName, UnixTime};

        let (_dir, store) = temp_store();
        let endpoint = ServerEndpoint::new("mgmt.local", 443);
        let record = HandshakeRecord::new();
        let verifier = mgmt_api_core::PinnedCertVerifier::new(
            endpoint.clone(),
            TrustPolicy::Pinned(store),
            record.clone(),
            Arc::new(rustls::crypto::ring::default_provider()),
        );
        let name = ServerName::try_from("mgmt.local").unwrap();
        let _ = verifier.verify_server_cert(
            &CertificateDer::from(&b"der"[..]),
            &[],
            &name,
            &[],
            UnixTime::now(),
        );

        let failure = record.take_failure().unwrap();
        let err: TransportError = failure.into();
        assert!(err.is_certificate_error());
        assert!(matches!(
            err,
            TransportError::Core(mgmt_api_core::CoreError::Certificate(
                CertificateError::UnknownHost { .. }
            ))
        ));
    }

    // ========================================
    // Exchanges with a local TLS server
    // ========================================

    fn local_transport(store: Arc<FingerprintStore>) -> HttpsTransport {
        HttpsTransport::new(
            TransportConfig {
                connect_timeout_secs: 5,
                read_timeout_secs: 5,
                ..TransportConfig::default()
            },
            store,
        )
        .unwrap()
    }

    fn pin(store: &FingerprintStore, server: &TestServer, fingerprint: &Fingerprint) {
        store
            .put(&server.endpoint.host, server.endpoint.port, fingerprint.as_hex())
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_host_is_rejected_during_handshake() {
        let (_dir, store) = temp_store();
        let server = TestServer::start(vec![(200, r#"{"sid":"S1"}"#)]);
        let transport = local_transport(store);

        let request = ApiRequest::new(server.endpoint.clone(), "login", json!({"user": "a"}));
        let err = transport.send(&request).await.unwrap_err();

        assert!(err.is_certificate_error(), "unexpected error: {err}");
        match err {
            TransportError::Core(CoreError::Certificate(CertificateError::UnknownHost {
                observed,
                ..
            })) => assert_eq!(observed, server.fingerprint.to_string()),
            other => panic!("unexpected error: {other}"),
        }
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_changed_fingerprint_is_rejected_during_handshake() {
        let (_dir, store) = temp_store();
        let server = TestServer::start(vec![(200, r#"{"sid":"S1"}"#)]);
        pin(&store, &server, &Fingerprint::of_der(b"previous certificate"));
        let transport = local_transport(store);

        let request = ApiRequest::new(server.endpoint.clone(), "login", json!({}));
        let err = transport.send(&request).await.unwrap_err();

        assert!(matches!(
            err,
            TransportError::Core(CoreError::Certificate(
                CertificateError::FingerprintChanged { .. }
            ))
        ));
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_pinned_login_then_session_call() {
        let (_dir, store) = temp_store();
        let server = TestServer::start(vec![
            (200, r#"{"sid":"S1","api-server-version":"1.9"}"#),
            (200, r#"{"objects":[],"total":0}"#),
        ]);
        pin(&store, &server, &server.fingerprint);
        let transport = local_transport(store);

        let login = ApiRequest::new(
            server.endpoint.clone(),
            "login",
            json!({"user": "admin", "password": "secret"}),
        );
        let reply = transport.send(&login).await.unwrap();
        assert!(reply.is_success());
        assert_eq!(reply.str_field("sid"), Some("S1"));

        let call = ApiRequest::new(server.endpoint.clone(), "show-hosts", json!({"limit": 50}))
            .with_session(SessionId::new("S1").unwrap());
        let reply = transport.send(&call).await.unwrap();
        assert_eq!(reply.payload()["total"], 0);

        let seen = server.requests();
        assert_eq!(seen.len(), 2);

        assert_eq!(seen[0].request_line(), "POST /web_api/login HTTP/1.1");
        assert_eq!(seen[0].header(SESSION_HEADER), None);
        assert_eq!(seen[0].header("content-type"), Some(JSON_CONTENT_TYPE));
        assert_eq!(seen[0].header("accept"), Some(JSON_CONTENT_TYPE));
        assert_eq!(seen[0].header("user-agent"), Some(DEFAULT_USER_AGENT));
        let body: Value = serde_json::from_slice(&seen[0].body).unwrap();
        assert_eq!(body["password"], "secret");

        assert_eq!(seen[1].request_line(), "POST /web_api/show-hosts HTTP/1.1");
        assert_eq!(seen[1].header(SESSION_HEADER), Some("S1"));
        assert_eq!(
            seen[1].header("content-length"),
            Some(seen[1].body.len().to_string().as_str())
        );
    }

    #[tokio::test]
    async fn test_error_reply_is_decoded() {
        let (_dir, store) = temp_store();
        let server = TestServer::start(vec![(
            400,
            r#"{"code":"generic_err_invalid_parameter","message":"Invalid parameter","errors":[{"message":"bad name"}]}"#,
        )]);
        pin(&store, &server, &server.fingerprint);
        let transport = local_transport(store);

        let request = ApiRequest::new(server.endpoint.clone(), "add-host", json!({}))
            .with_session(SessionId::new("S1").unwrap());
        let reply = transport.send(&request).await.unwrap();

        assert!(!reply.is_success());
        assert_eq!(reply.status_code(), 400);
        assert_eq!(reply.error_message(), Some("Invalid parameter"));
        assert_eq!(reply.errors().map(<[Value]>::len), Some(1));
    }

    #[tokio::test]
    async fn test_body_must_be_a_json_object() {
        let (_dir, store) = temp_store();
        let server = TestServer::start(vec![(200, ""), (200, "[1,2]"), (502, "<html>")]);
        pin(&store, &server, &server.fingerprint);
        let transport = local_transport(store);

        let request = ApiRequest::new(server.endpoint.clone(), "show-hosts", json!({}))
            .with_session(SessionId::new("S1").unwrap());
        for expected_status in [200, 200, 502] {
            let err = transport.send(&request).await.unwrap_err();
            assert!(err.is_protocol_error(), "unexpected error: {err}");
            assert!(matches!(
                err,
                TransportError::Protocol { status, .. } if status == expected_status
            ));
        }
        assert_eq!(server.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_unchecked_policy_accepts_any_certificate() {
        let (_dir, store) = temp_store();
        let server = TestServer::start(vec![(200, r#"{"message":"OK"}"#)]);
        let transport = HttpsTransport::new(
            TransportConfig {
                check_fingerprint: false,
                connect_timeout_secs: 5,
                read_timeout_secs: 5,
                ..TransportConfig::default()
            },
            store,
        )
        .unwrap();

        let request = ApiRequest::new(server.endpoint.clone(), "keepalive", json!({}));
        assert!(transport.send(&request).await.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_fingerprint_of_presented_leaf() {
        let (_dir, store) = temp_store();
        let server = TestServer::start(vec![(404, r#"{"message":"not found"}"#)]);
        let transport = local_transport(Arc::clone(&store));

        let fingerprint = transport.probe_fingerprint(&server.endpoint).await.unwrap();
        assert_eq!(fingerprint, server.fingerprint);
        assert!(store.entries().unwrap().is_empty());
    }
}
