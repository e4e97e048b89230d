//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use flowsync_config::ConfigError;
use flowsync_core::CoreError;

/// Process exit codes.
#[allow(dead_code)]
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PARTIAL: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(dead_code, unused_assignments)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(flowsync::connection_failed),
        help(
            "Check that the controller is running and its RESTCONF port is reachable.\n\
             URL: {url}\n\
             Try: flowsync nodes --insecure"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(flowsync::timeout),
        help("Increase timeout with --timeout or check controller responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Controller rejected the credentials (HTTP {status})")]
    #[diagnostic(
        code(flowsync::auth_failed),
        help(
            "Verify the username and password of the access record.\n\
             Run: flowsync config set-password --profile {profile}"
        )
    )]
    AuthFailed { status: u16, profile: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(flowsync::no_credentials),
        help(
            "Add an [profiles.{profile}.access.https] entry to the config file,\n\
             or pass --controller and --username and set FLOWSYNC_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    #[error("No access record for equipment '{equipment}'")]
    #[diagnostic(
        code(flowsync::invalid_access),
        help("The profile needs an https or http access entry for this equipment.")
    )]
    InvalidAccess { equipment: String },

    // ── Controller ───────────────────────────────────────────────────
    #[error("No switches found in controller inventory")]
    #[diagnostic(
        code(flowsync::inventory_empty),
        help("The topology flow:1 lists no nodes. Check that switches are connected, or pass --node.")
    )]
    InventoryEmpty,

    #[error("Controller returned HTTP {status}: {body}")]
    #[diagnostic(code(flowsync::http_status))]
    HttpStatus { status: u16, body: String },

    #[error("{message}")]
    #[diagnostic(code(flowsync::command_failed))]
    CommandFailed { message: String },

    #[error("Reconciliation failed on {failed} of {total} nodes")]
    #[diagnostic(
        code(flowsync::reconcile_partial),
        help("Nodes are independent: completed nodes keep their changes. Rerun to retry.")
    )]
    ReconcileFailed { failed: usize, total: usize },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(flowsync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(flowsync::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(flowsync::no_config),
        help(
            "Create a profile in {path},\n\
             or pass --controller and --username and set FLOWSYNC_PASSWORD."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(flowsync::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(flowsync::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(flowsync::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(flowsync::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } | Self::InvalidAccess { .. } => {
                exit_code::AUTH
            }
            Self::InventoryEmpty | Self::ProfileNotFound { .. } | Self::NoConfig { .. } => {
                exit_code::NOT_FOUND
            }
            Self::ReconcileFailed { .. } => exit_code::PARTIAL,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { profile } => CliError::ProfileNotFound {
                name: profile,
                available: "(none)".into(),
            },
            other => CliError::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::Timeout => CliError::Timeout,

            CoreError::HttpStatus { status, .. } if status == 401 || status == 403 => {
                CliError::AuthFailed {
                    status,
                    profile: "current".into(),
                }
            }

            CoreError::HttpStatus { status, body } => CliError::HttpStatus { status, body },

            CoreError::ControllerInventoryEmpty => CliError::InventoryEmpty,

            CoreError::InvalidEquipmentAccess { equipment } => {
                CliError::InvalidAccess { equipment }
            }

            CoreError::CommandError { message } => CliError::CommandFailed { message },

            CoreError::InvalidVersion { version, supported } => CliError::Validation {
                field: "version".into(),
                reason: format!("'{version}' is not one of {supported}"),
            },

            CoreError::UnsupportedFlowType { flow_type } => CliError::Validation {
                field: "flow type".into(),
                reason: format!("'{flow_type}' is not supported"),
            },

            CoreError::InvalidArgument { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
