use thiserror::Error;

use crate::models::ControllerErrors;

/// Top-level error type for the `flowsync-api` crate.
///
/// Covers every failure mode of the RESTCONF surface: transport,
/// non-2xx responses, and payload decoding. `flowsync-core` maps these
/// into the reconciliation error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Controller ──────────────────────────────────────────────────
    /// Non-2xx response. Carries the status and the raw body so callers
    /// can decide whether a 404 is tolerated and translate the payload.
    #[error("Controller returned HTTP {status}")]
    HttpStatus { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Malformed call parameters (unknown method or content tag, etc.)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// HTTP status of a controller response, if this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Translate a controller error payload carried by an `HttpStatus`
    /// error into a single message.
    ///
    /// Fails with `Deserialization` when the body is not a RESTCONF error
    /// document, and with `InvalidArgument` for errors without a body.
    pub fn controller_message(&self) -> Result<String, Error> {
        match self {
            Self::HttpStatus { body, .. } => Ok(ControllerErrors::from_body(body)?.message()),
            other => Err(Self::InvalidArgument(format!(
                "no controller error payload in: {other}"
            ))),
        }
    }
}
