// ── Runtime controller configuration ──
//
// These types describe *which* controller to drive and how to reach it.
// Credentials are not carried here: they come from an `AccessStore`
// keyed by equipment name. The CLI constructs a `ControllerConfig` and
// hands it in; core never reads config files.

use std::time::Duration;

use flowsync_api::transport::DEFAULT_TIMEOUT;
use flowsync_api::{TlsMode, TransportConfig};

use crate::model::Environment;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs). Default for lab controllers.
    #[default]
    DangerAcceptInvalid,
}

impl TlsVerification {
    pub(crate) fn to_tls_mode(&self) -> TlsMode {
        match self {
            Self::SystemDefaults => TlsMode::System,
            Self::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            Self::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Configuration for driving a single controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Equipment name used to look up access records.
    pub equipment: String,
    /// Release family tag, e.g. `"BORON"`. Validated by `FlowController::new`.
    pub version: String,
    /// Environment whose ACL is being synchronized.
    pub environment: Environment,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Number of nodes reconciled at once. 1 means strictly sequential.
    pub reconcile_concurrency: usize,
}

impl ControllerConfig {
    pub fn new(equipment: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            equipment: equipment.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.to_tls_mode(),
            timeout: self.timeout,
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            equipment: String::new(),
            version: "BORON".into(),
            environment: Environment::default(),
            tls: TlsVerification::default(),
            timeout: DEFAULT_TIMEOUT,
            reconcile_concurrency: 1,
        }
    }
}
