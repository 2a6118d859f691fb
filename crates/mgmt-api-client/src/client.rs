// ============================================
// File: crates/mgmt-api-client/src/client.rs
// ============================================
//! # Management API Client
//!
//! ## Creation Reason
//! The façade callers use for a whole interaction with a management
//! server: log in, issue commands, collect paged results, log out.
//!
//! ## Main Functionality
//! - `login` opens a [`Session`]
//! - `call` issues one command and, if the server answers with a task,
//!   waits for the task before returning
//! - `query` collects every page of a paged command into one reply
//! - `logout` closes the session
//! - `establish_trust` / `check_fingerprint` manage the pinned fingerprint
//!
//! ## Call Flow
//! ```text
//! caller ──► ApiClient::call ──► exchange ──► ApiTransport::send
//!                 │                  └──► CallLogSink::record
//!                 ▼
//!        TaskTrigger::detect ──► TaskResolver (show-task polling)
//!
//! caller ──► ApiClient::query ──► QueryAggregator (limit/offset loop)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Calls on one session are strictly sequential; nothing is pipelined
//! - A failing call-log sink fails the call; the server reply is dropped
//! - `show-task` replies are never themselves treated as task triggers
//!
//! ## Last Modified
//! v0.1.0 - Initial session façade

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use mgmt_api_common::types::ServerEndpoint;
use mgmt_api_core::protocol::{
    redact_login_payload, ApiResponse, TaskTrigger, LOGIN_COMMAND, LOGOUT_COMMAND,
    SHOW_TASK_COMMAND,
};
use mgmt_api_core::store::FingerprintStore;
use mgmt_api_transport::{
    ApiRequest, ApiTransport, CallLogSink, CallRecord, HttpsTransport,
};

use crate::config::ClientConfig;
use crate::debug_log::DebugFileSink;
use crate::error::{ClientError, Result};
use crate::services::query::QueryAggregator;
use crate::services::tasks::{ResolveOptions, TaskResolver};
use crate::services::trust::{self, FingerprintApprover, TrustOutcome};
use crate::session::{LoginOutcome, Session};

// ============================================
// Settings
// ============================================

/// Behaviour shared by every call of an [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Wait for tasks started by a call.
    pub wait_for_tasks: bool,
    /// How tasks are polled.
    pub resolve: ResolveOptions,
    /// Items per page in `query`.
    pub query_limit: u32,
    /// Page ceiling in `query`.
    pub max_pages: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

impl ClientSettings {
    /// Settings taken from the `[tasks]` and `[query]` sections.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            wait_for_tasks: config.tasks.wait,
            resolve: ResolveOptions {
                poll_interval: config.tasks.poll_interval(),
                deadline: config.tasks.deadline(),
                cancel: None,
            },
            query_limit: config.query.limit,
            max_pages: config.query.max_pages,
        }
    }
}

/// Per-call overrides for [`ApiClient::call_with`].
#[derive(Debug, Clone)]
pub struct CallOptions {
    /// Wait for a task started by this call.
    pub wait_for_tasks: bool,
    /// How the task is polled.
    pub resolve: ResolveOptions,
}

impl CallOptions {
    /// Options that return as soon as the server answers.
    #[must_use]
    pub fn no_wait() -> Self {
        Self {
            wait_for_tasks: false,
            resolve: ResolveOptions::default(),
        }
    }
}

// ============================================
// ApiClient
// ============================================

/// Session façade over an [`ApiTransport`].
pub struct ApiClient {
    transport: Arc<dyn ApiTransport>,
    store: Arc<FingerprintStore>,
    settings: ClientSettings,
    call_log: Option<Arc<dyn CallLogSink>>,
}

impl ApiClient {
    /// Creates a client over `transport`.
    ///
    /// `store` is the same fingerprint store the transport pins against.
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        store: Arc<FingerprintStore>,
        settings: ClientSettings,
    ) -> Self {
        Self {
            transport,
            store,
            settings,
            call_log: None,
        }
    }

    /// Records every exchange to `sink`.
    #[must_use]
    pub fn with_call_log(mut self, sink: Arc<dyn CallLogSink>) -> Self {
        self.call_log = Some(sink);
        self
    }

    /// Builds an HTTPS client from configuration.
    ///
    /// Opens (or creates) the fingerprint file and, when configured, the
    /// debug file.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or a file cannot be
    /// opened.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(FingerprintStore::open(&config.fingerprint.file)?);
        let transport = HttpsTransport::new(config.transport.clone(), Arc::clone(&store))?;
        let mut client = Self::new(
            Arc::new(transport),
            store,
            ClientSettings::from_config(config),
        );

        if let Some(path) = &config.logging.debug_file {
            let sink = DebugFileSink::create(path)?;
            info!(path = %path.display(), "Recording API calls to debug file");
            client = client.with_call_log(Arc::new(sink));
        }

        Ok(client)
    }

    /// Fingerprint store shared with the transport.
    #[must_use]
    pub fn fingerprint_store(&self) -> &Arc<FingerprintStore> {
        &self.store
    }

    /// Active settings.
    #[must_use]
    pub const fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    // ========================================
    // Session Lifecycle
    // ========================================

    /// Logs in with `payload` (e.g. `{"user", "password"}` or `{"api-key"}`).
    ///
    /// A refused login is not an error: the outcome then has no session and
    /// its response carries the server's message.
    ///
    /// # Errors
    /// - Configuration error if `payload` is not a JSON object
    /// - Transport errors (connection, certificate, protocol)
    /// - Protocol error if a successful reply has no `sid`
    pub async fn login(&self, endpoint: ServerEndpoint, payload: Value) -> Result<LoginOutcome> {
        endpoint.validate()?;
        if !payload.is_object() {
            return Err(ClientError::invalid_payload("login payload must be a JSON object"));
        }

        info!(endpoint = %endpoint, "Logging in to management server");
        debug!(payload = %redact_login_payload(&payload), "Login payload");

        let request = ApiRequest::new(endpoint.clone(), LOGIN_COMMAND, payload);
        let response = self.exchange(&request).await?;
        if !response.is_success() {
            warn!(
                endpoint = %endpoint,
                status = response.status_code(),
                "Login refused"
            );
            return Ok(LoginOutcome {
                response,
                session: None,
            });
        }

        let session = Session::from_login(endpoint, &response)?;
        info!(
            session = %session.session_id(),
            api_version = session.api_version().unwrap_or("unknown"),
            "Logged in"
        );
        Ok(LoginOutcome {
            response,
            session: Some(session),
        })
    }

    /// Logs out and consumes the session.
    ///
    /// # Errors
    /// Returns transport errors.
    pub async fn logout(&self, session: Session) -> Result<ApiResponse> {
        let response = self
            .session_call(&session, LOGOUT_COMMAND, Value::Object(Map::new()))
            .await?;
        info!(session = %session.session_id(), "Logged out");
        Ok(response)
    }

    // ========================================
    // Calls
    // ========================================

    /// Issues `command`, waiting for any task it starts.
    ///
    /// # Errors
    /// Returns transport errors, or task resolution errors while waiting.
    pub async fn call(&self, session: &Session, command: &str, payload: Value) -> Result<ApiResponse> {
        let options = CallOptions {
            wait_for_tasks: self.settings.wait_for_tasks,
            resolve: self.settings.resolve.clone(),
        };
        self.call_with(session, command, payload, &options).await
    }

    /// Issues `command` with explicit task options.
    ///
    /// # Errors
    /// Returns transport errors, or task resolution errors while waiting.
    pub async fn call_with(
        &self,
        session: &Session,
        command: &str,
        payload: Value,
        options: &CallOptions,
    ) -> Result<ApiResponse> {
        let response = self.session_call(session, command, payload).await?;

        if !options.wait_for_tasks || !response.is_success() || command == SHOW_TASK_COMMAND {
            return Ok(response);
        }
        match TaskTrigger::detect(response.payload()) {
            Some(trigger) => {
                debug!(command, tasks = ?trigger.ids(), "Command started tasks, waiting");
                TaskResolver::new(self, session, &options.resolve)
                    .resolve(&trigger)
                    .await
            }
            None => Ok(response),
        }
    }

    /// Collects every page of `command` into one reply.
    ///
    /// `item_key` names the array holding each page's items.
    ///
    /// # Errors
    /// - `NoItemsToCollect` if a page lacks `item_key` or `total`
    /// - `PageLimitExceeded` if paging never reaches `total`
    /// - Transport errors
    pub async fn query(
        &self,
        session: &Session,
        command: &str,
        item_key: &str,
        payload: Value,
    ) -> Result<ApiResponse> {
        self.query_with_limit(session, command, item_key, payload, self.settings.query_limit)
            .await
    }

    /// [`Self::query`] with an explicit page size.
    ///
    /// # Errors
    /// See [`Self::query`].
    pub async fn query_with_limit(
        &self,
        session: &Session,
        command: &str,
        item_key: &str,
        payload: Value,
        limit: u32,
    ) -> Result<ApiResponse> {
        let base = match payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => {
                return Err(ClientError::invalid_payload(
                    "query payload must be a JSON object",
                ))
            }
        };
        QueryAggregator::new(limit, self.settings.max_pages)
            .aggregate(self, session, command, item_key, &base)
            .await
    }

    /// Waits for one task and returns its final `show-task` reply.
    ///
    /// # Errors
    /// Returns task resolution errors.
    pub async fn resolve_task(&self, session: &Session, task_id: &str) -> Result<ApiResponse> {
        TaskResolver::new(self, session, &self.settings.resolve)
            .resolve(&TaskTrigger::Single(task_id.to_owned()))
            .await
    }

    /// Waits for several tasks and returns one combined `show-task` reply.
    ///
    /// # Errors
    /// Returns task resolution errors.
    pub async fn resolve_tasks(&self, session: &Session, task_ids: &[String]) -> Result<ApiResponse> {
        TaskResolver::new(self, session, &self.settings.resolve)
            .resolve(&TaskTrigger::Multiple(task_ids.to_vec()))
            .await
    }

    // ========================================
    // Trust
    // ========================================

    /// Reads the server's fingerprint and stores it if `approver` agrees.
    ///
    /// # Errors
    /// - `FingerprintRejected` if a new or changed fingerprint is refused
    /// - Connection errors if no certificate could be read
    /// - Store errors
    pub async fn establish_trust(
        &self,
        endpoint: &ServerEndpoint,
        approver: &dyn FingerprintApprover,
    ) -> Result<TrustOutcome> {
        trust::establish_trust(self.transport.as_ref(), &self.store, endpoint, approver).await
    }

    /// `true` if the server presents the stored fingerprint.
    ///
    /// # Errors
    /// Connection errors if no certificate could be read, or store errors.
    pub async fn check_fingerprint(&self, endpoint: &ServerEndpoint) -> Result<bool> {
        trust::check_fingerprint(self.transport.as_ref(), &self.store, endpoint).await
    }

    // ========================================
    // Exchange
    // ========================================

    /// One command on `session`, without task or page handling.
    pub(crate) async fn session_call(
        &self,
        session: &Session,
        command: &str,
        payload: Value,
    ) -> mgmt_api_transport::Result<ApiResponse> {
        let request = ApiRequest::new(session.endpoint().clone(), command, payload)
            .with_session(session.session_id().clone());
        self.exchange(&request).await
    }

    async fn exchange(&self, request: &ApiRequest) -> mgmt_api_transport::Result<ApiResponse> {
        let response = self.transport.send(request).await?;

        if let Some(sink) = &self.call_log {
            let record = CallRecord::new(request, self.transport.user_agent(), &response);
            sink.record(&record).map_err(|e| {
                warn!(command = %request.command, error = %e, "Failed to record API call");
                e
            })?;
        }
        Ok(response)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("fingerprint_file", &self.store.path())
            .field("settings", &self.settings)
            .field("call_log", &self.call_log.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================
