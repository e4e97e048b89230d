// ── Core error types ──
//
// User-facing errors from flowsync-core. Consumers see one message per
// failure; controller status codes stop at the `CommandError` boundary.
// `CoreError::command` is the error translator used by every flow
// operation, `From<flowsync_api::Error>` is the plain mapping used by
// topology discovery.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Caller errors ────────────────────────────────────────────────
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Invalid controller version '{version}' (supported: {supported})")]
    InvalidVersion { version: String, supported: String },

    #[error("Unsupported flow type: {flow_type}")]
    UnsupportedFlowType { flow_type: String },

    // ── Inventory / access ───────────────────────────────────────────
    #[error("No nodes found in controller inventory")]
    ControllerInventoryEmpty,

    #[error("No usable access record for equipment '{equipment}'")]
    InvalidEquipmentAccess { equipment: String },

    // ── Controller errors ────────────────────────────────────────────
    /// Raw non-2xx response outside a flow operation (topology discovery).
    #[error("Controller returned HTTP {status}")]
    HttpStatus { status: u16, body: String },

    /// A failed flow operation, translated into a single message.
    #[error("{message}")]
    CommandError { message: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Controller request timed out")]
    Timeout,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns `true` for malformed call parameters of any kind.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. }
                | Self::InvalidVersion { .. }
                | Self::UnsupportedFlowType { .. }
        )
    }

    /// Translate a failed flow operation into a `CommandError`.
    ///
    /// Controller error documents are flattened into one message. A body
    /// that is not such a document falls back to status plus raw body.
    /// Connection-level failures keep their own variants.
    pub fn command(err: flowsync_api::Error) -> Self {
        match err {
            flowsync_api::Error::HttpStatus { status, ref body } => {
                let message = err.controller_message().unwrap_or_else(|_| {
                    let raw = body.trim();
                    if raw.is_empty() {
                        format!("HTTP {status}")
                    } else {
                        format!("HTTP {status}: {raw}")
                    }
                });
                Self::CommandError { message }
            }
            flowsync_api::Error::Transport(ref e) if e.is_timeout() || e.is_connect() => {
                Self::from(err)
            }
            other => Self::CommandError {
                message: other.to_string(),
            },
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<flowsync_api::Error> for CoreError {
    fn from(err: flowsync_api::Error) -> Self {
        match err {
            flowsync_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::CommandError {
                        message: e.to_string(),
                    }
                }
            }
            flowsync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            flowsync_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            flowsync_api::Error::HttpStatus { status, body } => {
                CoreError::HttpStatus { status, body }
            }
            flowsync_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            flowsync_api::Error::InvalidArgument(message) => CoreError::InvalidArgument { message },
        }
    }
}
