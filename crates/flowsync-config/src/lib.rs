//! Profile configuration for flowsync.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation into a `flowsync_core::ControllerConfig` plus the
//! access records the controller is reached through. The CLI layers its
//! flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use flowsync_core::{
    ControllerConfig, Environment, EquipmentAccess, Scheme, StaticAccessStore, TlsVerification,
};

/// Keyring service name; entries are `{profile}/{scheme}/password`.
pub const KEYRING_SERVICE: &str = "flowsync";

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "FLOWSYNC_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_concurrency")]
    pub reconcile_concurrency: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            reconcile_concurrency: default_concurrency(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_concurrency() -> usize {
    1
}
fn default_version() -> String {
    "BORON".into()
}

/// A named controller profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Equipment name the access records belong to. Defaults to the
    /// profile name.
    pub equipment: Option<String>,

    /// Controller base URI used when an access entry has no `fqdn`.
    pub controller: Option<String>,

    /// Controller release family: BERYLLIUM, BORON or CARBON.
    #[serde(default = "default_version")]
    pub version: String,

    /// Environment whose ACL this profile synchronizes.
    #[serde(default)]
    pub environment_id: u64,

    pub environment_name: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification. Defaults to true: controllers ship
    /// self-signed certificates.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Nodes reconciled at once.
    pub reconcile_concurrency: Option<usize>,

    /// Access records keyed by scheme (`https`, `http`).
    #[serde(default)]
    pub access: BTreeMap<String, AccessEntry>,
}

impl Profile {
    pub fn equipment_name<'a>(&'a self, profile_name: &'a str) -> &'a str {
        self.equipment.as_deref().unwrap_or(profile_name)
    }
}

/// Credentials and address for one scheme.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AccessEntry {
    /// Base URI for this scheme, e.g. `https://odl.example:8443`.
    pub fqdn: Option<String>,

    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `FLOWSYNC_CONFIG`, then XDG / platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("org", "flowsync", "flowsync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("flowsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, merged with `FLOWSYNC_` variables
/// (`FLOWSYNC_DEFAULTS__TIMEOUT=60` sets `defaults.timeout`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FLOWSYNC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_user(profile_name: &str, scheme: Scheme) -> String {
    format!("{profile_name}/{scheme}/password")
}

/// Resolve the password for one access entry.
///
/// Order: the entry's `password_env`, `FLOWSYNC_PASSWORD`, the system
/// keyring, plaintext in the file.
pub fn resolve_password(
    entry: &AccessEntry,
    profile_name: &str,
    scheme: Scheme,
) -> Result<SecretString, ConfigError> {
    // 1. Entry-specific env var, then the global one
    let env_names = entry
        .password_env
        .iter()
        .map(String::as_str)
        .chain(std::iter::once("FLOWSYNC_PASSWORD"));
    for name in env_names {
        if let Ok(pw) = std::env::var(name) {
            return Ok(SecretString::from(pw));
        }
    }

    // 2. Keyring
    if let Ok(keyring_entry) =
        keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name, scheme))
    {
        if let Ok(pw) = keyring_entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = entry.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a password in the system keyring for `profile_name`/`scheme`.
pub fn store_password(profile_name: &str, scheme: Scheme, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name, scheme))
        .and_then(|e| e.set_password(password))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

fn validate_uri(field: &str, raw: &str) -> Result<String, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: format!("expected http or https URL, got {raw}"),
        });
    }
    Ok(raw.to_owned())
}

/// Build the access store for a profile: one record per configured
/// scheme, each with a resolved password.
pub fn profile_access(profile: &Profile, profile_name: &str) -> Result<StaticAccessStore, ConfigError> {
    let equipment = profile.equipment_name(profile_name);
    let mut store = StaticAccessStore::new();

    for (key, entry) in &profile.access {
        let scheme: Scheme = key.parse().map_err(|_| ConfigError::Validation {
            field: format!("access.{key}"),
            reason: "expected https or http".into(),
        })?;
        let field = format!("access.{scheme}.fqdn");
        let fqdn = entry
            .fqdn
            .as_deref()
            .or(profile.controller.as_deref())
            .ok_or_else(|| ConfigError::Validation {
                field: field.clone(),
                reason: "no fqdn and no profile controller".into(),
            })?;
        let fqdn = validate_uri(&field, fqdn)?;
        let username = entry
            .username
            .clone()
            .or_else(|| std::env::var("FLOWSYNC_USERNAME").ok())
            .ok_or_else(|| ConfigError::NoCredentials {
                profile: profile_name.into(),
            })?;
        let password = resolve_password(entry, profile_name, scheme)?;

        store.insert(EquipmentAccess {
            equipment: equipment.to_owned(),
            scheme,
            fqdn,
            username,
            password,
        });
    }

    Ok(store)
}

/// TLS strategy for a profile.
pub fn profile_tls(profile: &Profile) -> TlsVerification {
    if profile.insecure == Some(true) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else if profile.insecure == Some(false) {
        TlsVerification::SystemDefaults
    } else {
        TlsVerification::DangerAcceptInvalid // lab controllers are typically self-signed
    }
}

/// Build a `ControllerConfig` from a profile, no CLI flag overrides.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> ControllerConfig {
    let environment = Environment::new(
        profile.environment_id,
        profile.environment_name.clone().unwrap_or_default(),
    );

    ControllerConfig {
        equipment: profile.equipment_name(profile_name).to_owned(),
        version: profile.version.clone(),
        environment,
        tls: profile_tls(profile),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        reconcile_concurrency: profile
            .reconcile_concurrency
            .unwrap_or(defaults.reconcile_concurrency)
            .max(1),
    }
}
