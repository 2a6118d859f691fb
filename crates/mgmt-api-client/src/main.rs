// ============================================
// File: crates/mgmt-api-client/src/main.rs
// ============================================
//! # mgmt-api Command Line Entry Point
//!
//! ## Creation Reason
//! Command line front end for the management API client: trust a server,
//! manage stored fingerprints, run one command or one aggregated query.
//!
//! ## Main Functionality
//! - CLI argument parsing with clap
//! - Logging initialization with tracing
//! - Configuration loading with command line overrides
//! - Interactive fingerprint approval
//!
//! ## Usage
//! ```bash
//! # Step 1: Trust the server's certificate fingerprint
//! mgmt-api --server mgmt.example.com trust
//!
//! # Step 2: Run commands (credentials from flags or environment)
//! export MGMT_API_USER=admin MGMT_API_PASSWORD=secret
//! mgmt-api --server mgmt.example.com call add-host --payload '{"name":"h1","ip-address":"10.0.0.1"}'
//! mgmt-api --server mgmt.example.com call publish
//! mgmt-api --server mgmt.example.com query show-hosts objects
//!
//! # Fingerprint housekeeping
//! mgmt-api --server mgmt.example.com fingerprint show
//! mgmt-api --server mgmt.example.com fingerprint forget
//! mgmt-api fingerprint list
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Only command output goes to stdout; logs go to stderr
//! - `call` and `query` run the trust workflow first unless fingerprint
//!   checking is disabled
//! - The session is always logged out, even when the command failed
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mgmt_api_client::{
    ApiClient, ApprovalPrompt, CallOptions, ClientConfig, FingerprintApprover, Session,
    TrustOutcome,
};
use mgmt_api_common::types::ServerEndpoint;
use mgmt_api_core::protocol::ApiResponse;

// ============================================
// CLI Definition
// ============================================

/// Management server REST API client
///
/// Quick Start:
///   1. Run: mgmt-api --server <HOST> trust
///   2. Run: mgmt-api --server <HOST> call <COMMAND> --payload '<JSON>'
#[derive(Parser, Debug)]
#[command(name = "mgmt-api")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Management server, `host` or `host:port`
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Management server port (overrides the one in --server)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Fingerprint file
    #[arg(long, global = true)]
    fingerprint_file: Option<PathBuf>,

    /// Accept any server certificate
    #[arg(long, global = true)]
    no_check_fingerprint: bool,

    /// Outbound proxy, `user:password@host:port`
    #[arg(long, global = true)]
    proxy: Option<String>,

    /// Write every request and reply to this file
    #[arg(long, global = true)]
    debug_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct Credentials {
    /// User name
    #[arg(short, long, env = "MGMT_API_USER")]
    user: Option<String>,

    /// Password
    #[arg(long, env = "MGMT_API_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// API key (used instead of user and password)
    #[arg(long, env = "MGMT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Domain to log in to
    #[arg(long)]
    domain: Option<String>,

    /// Open a read-only session
    #[arg(long)]
    read_only: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read the server's certificate fingerprint and store it after approval
    Trust {
        /// Approve without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Inspect or edit the fingerprint file
    Fingerprint {
        #[command(subcommand)]
        action: FingerprintAction,
    },

    /// Run one API command, waiting for any task it starts
    Call {
        /// Command name, e.g. `add-host`
        command: String,

        /// JSON payload
        #[arg(short, long)]
        payload: Option<String>,

        /// Return as soon as the server answers, without waiting for tasks
        #[arg(long)]
        no_wait: bool,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// Run a paged `show-*` command and print every item
    Query {
        /// Command name, e.g. `show-hosts`
        command: String,

        /// Field holding the items, e.g. `objects`
        key: String,

        /// JSON payload
        #[arg(short, long)]
        payload: Option<String>,

        /// Items per page
        #[arg(long)]
        limit: Option<u32>,

        #[command(flatten)]
        credentials: Credentials,
    },
}

#[derive(Subcommand, Debug)]
enum FingerprintAction {
    /// Compare the stored fingerprint with the one the server presents
    Show,
    /// Remove the stored fingerprint of the server
    Forget,
    /// List every stored fingerprint
    List,
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Execute command
    if let Err(e) = run(cli).await {
        init_logging("info");
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli.global).await?;
    init_logging(cli.global.log_level.as_deref().unwrap_or(&config.logging.level));

    match cli.command {
        Commands::Trust { yes } => cmd_trust(&config, yes).await,
        Commands::Fingerprint { action } => cmd_fingerprint(&config, action).await,
        Commands::Call {
            command,
            payload,
            no_wait,
            credentials,
        } => cmd_call(&config, &command, payload.as_deref(), no_wait, &credentials).await,
        Commands::Query {
            command,
            key,
            payload,
            limit,
            credentials,
        } => cmd_query(&config, &command, &key, payload.as_deref(), limit, &credentials).await,
    }
}

// ============================================
// Commands
// ============================================

/// Stores the server's fingerprint after approval.
async fn cmd_trust(config: &ClientConfig, assume_yes: bool) -> anyhow::Result<()> {
    let endpoint = require_endpoint(config)?;
    let client = ApiClient::from_config(config)?;

    match client
        .establish_trust(&endpoint, &TerminalApprover { assume_yes })
        .await?
    {
        TrustOutcome::AlreadyTrusted(fp) => {
            println!("✅ {endpoint} is already trusted");
            println!("   Fingerprint: {}", fp.colon_separated());
        }
        TrustOutcome::Stored(fp) => {
            println!("✅ Fingerprint of {endpoint} stored");
            println!("   Fingerprint: {}", fp.colon_separated());
        }
        TrustOutcome::Replaced { previous, current } => {
            println!("⚠️  Fingerprint of {endpoint} replaced");
            println!("   Previous: {previous}");
            println!("   Current:  {}", current.colon_separated());
        }
    }
    Ok(())
}

/// Shows, forgets or lists stored fingerprints.
async fn cmd_fingerprint(config: &ClientConfig, action: FingerprintAction) -> anyhow::Result<()> {
    let client = ApiClient::from_config(config)?;
    let store = client.fingerprint_store();

    match action {
        FingerprintAction::Show => {
            let endpoint = require_endpoint(config)?;
            let stored = store.get(&endpoint.host, endpoint.port)?;
            let matches = client.check_fingerprint(&endpoint).await?;

            println!("Server:       {endpoint}");
            println!("Stored:       {}", stored.as_deref().unwrap_or("(none)"));
            match (stored.is_some(), matches) {
                (false, _) => println!("Status:       ❌ Not trusted, run 'mgmt-api trust'"),
                (true, true) => println!("Status:       ✅ Server presents the stored fingerprint"),
                (true, false) => println!("Status:       ⚠️  Server presents a DIFFERENT fingerprint"),
            }
        }
        FingerprintAction::Forget => {
            let endpoint = require_endpoint(config)?;
            store.delete(&endpoint.host, endpoint.port)?;
            println!("Fingerprint of {endpoint} removed from {}", store.path().display());
        }
        FingerprintAction::List => {
            let entries = store.entries()?;
            if entries.is_empty() {
                println!("No fingerprints in {}", store.path().display());
            }
            for (server, fingerprint) in entries {
                println!("{server:<30} {fingerprint}");
            }
        }
    }
    Ok(())
}

/// Runs one command.
async fn cmd_call(
    config: &ClientConfig,
    command: &str,
    payload: Option<&str>,
    no_wait: bool,
    credentials: &Credentials,
) -> anyhow::Result<()> {
    let payload = parse_payload(payload)?;
    let (client, session) = open_session(config, credentials).await?;

    let options = if no_wait {
        CallOptions::no_wait()
    } else {
        CallOptions {
            wait_for_tasks: true,
            resolve: client.settings().resolve.clone(),
        }
    };
    let result = client.call_with(&session, command, payload, &options).await;
    close_session(&client, session).await;

    report(command, &result?)
}

/// Runs one aggregated query.
async fn cmd_query(
    config: &ClientConfig,
    command: &str,
    key: &str,
    payload: Option<&str>,
    limit: Option<u32>,
    credentials: &Credentials,
) -> anyhow::Result<()> {
    let payload = parse_payload(payload)?;
    let (client, session) = open_session(config, credentials).await?;

    let limit = limit.unwrap_or(client.settings().query_limit);
    let result = client
        .query_with_limit(&session, command, key, payload, limit)
        .await;
    close_session(&client, session).await;

    report(command, &result?)
}

// ============================================
// Helpers
// ============================================

/// Initializes the tracing subscriber; later calls are no-ops.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}

/// Loads the configuration file (if any) and applies command line overrides.
async fn load_config(args: &GlobalArgs) -> anyhow::Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path).await?,
        None => ClientConfig::default(),
    };

    if let Some(server) = &args.server {
        let endpoint: ServerEndpoint = server
            .parse()
            .with_context(|| format!("invalid --server '{server}'"))?;
        config.server.host = endpoint.host;
        config.server.port = endpoint.port;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(path) = &args.fingerprint_file {
        config.fingerprint.file.clone_from(path);
    }
    if args.no_check_fingerprint {
        config.transport.check_fingerprint = false;
    }
    if let Some(proxy) = &args.proxy {
        config.transport.proxy = Some(proxy.clone());
    }
    if let Some(path) = &args.debug_file {
        config.logging.debug_file = Some(path.clone());
    }

    config.validate()?;
    Ok(config)
}

fn require_endpoint(config: &ClientConfig) -> anyhow::Result<ServerEndpoint> {
    match config.server.endpoint() {
        Some(endpoint) => Ok(endpoint),
        None => bail!("no management server given, use --server or [server] host"),
    }
}

fn parse_payload(payload: Option<&str>) -> anyhow::Result<Value> {
    match payload {
        None => Ok(Value::Object(Map::new())),
        Some(text) => {
            let value: Value = serde_json::from_str(text).context("--payload is not valid JSON")?;
            if !value.is_object() {
                bail!("--payload must be a JSON object");
            }
            Ok(value)
        }
    }
}

fn login_payload(credentials: &Credentials) -> anyhow::Result<Value> {
    let mut payload = Map::new();
    match (&credentials.api_key, &credentials.user, &credentials.password) {
        (Some(key), _, _) => {
            payload.insert("api-key".into(), Value::from(key.as_str()));
        }
        (None, Some(user), Some(password)) => {
            payload.insert("user".into(), Value::from(user.as_str()));
            payload.insert("password".into(), Value::from(password.as_str()));
        }
        _ => bail!("credentials required: --api-key, or --user and --password"),
    }
    if let Some(domain) = &credentials.domain {
        payload.insert("domain".into(), Value::from(domain.as_str()));
    }
    if credentials.read_only {
        payload.insert("read-only".into(), Value::Bool(true));
    }
    Ok(Value::Object(payload))
}

/// Trusts the server (unless checking is off) and logs in.
async fn open_session(
    config: &ClientConfig,
    credentials: &Credentials,
) -> anyhow::Result<(ApiClient, Session)> {
    let endpoint = require_endpoint(config)?;
    let payload = login_payload(credentials)?;
    let client = ApiClient::from_config(config)?;

    if config.transport.check_fingerprint {
        client
            .establish_trust(&endpoint, &TerminalApprover { assume_yes: false })
            .await?;
    }

    let outcome = client.login(endpoint.clone(), payload).await?;
    match outcome.session {
        Some(session) => Ok((client, session)),
        None => bail!(
            "login to {endpoint} failed: {}",
            outcome.response.error_message().unwrap_or("no message")
        ),
    }
}

async fn close_session(client: &ApiClient, session: Session) {
    match client.logout(session).await {
        Ok(reply) if reply.is_success() => info!("Session closed"),
        Ok(reply) => warn!(status = reply.status_code(), "Logout refused"),
        Err(e) => warn!("Logout failed: {}", e),
    }
}

/// Prints the reply payload; fails if the reply was unsuccessful.
fn report(command: &str, response: &ApiResponse) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(response.payload())?);
    if !response.is_success() {
        bail!(
            "'{command}' failed (status {}): {}",
            response.status_code(),
            response.error_message().unwrap_or("a task did not succeed")
        );
    }
    Ok(())
}

// ============================================
// Interactive Approval
// ============================================

/// Asks on the terminal before storing a fingerprint.
struct TerminalApprover {
    assume_yes: bool,
}

impl FingerprintApprover for TerminalApprover {
    fn approve(&self, prompt: &ApprovalPrompt) -> bool {
        println!("{}", prompt.message());
        if self.assume_yes {
            println!("Fingerprint accepted (--yes)");
            return true;
        }
        ask_yes_no("Do you accept the fingerprint?")
    }
}

fn ask_yes_no(question: &str) -> bool {
    prompt_blocking(std::io::stdin().lock(), question)
}

/// Reads the answer on the runtime thread without stalling other tasks.
fn prompt_blocking(input: impl BufRead, question: &str) -> bool {
    tokio::task::block_in_place(|| read_yes_no(input, question))
}

fn read_yes_no(mut input: impl BufRead, question: &str) -> bool {
    let mut line = String::new();
    loop {
        print!("{question} [y/n] ");
        if std::io::stdout().flush().is_err() {
            return false;
        }

        line.clear();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => return false,
            Ok(_) => {}
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return true,
            "n" | "no" => return false,
            _ => println!("Please answer 'y' or 'n'."),
        }
    }
}

// ============================================
// Tests
// ============================================
