//! CLI configuration: thin wrapper around `flowsync_config` shared types.
//!
//! Adds the resolution step that layers `GlobalOpts` flag overrides
//! (--controller, --username, --version-tag, ...) over the active profile.

use std::io::IsTerminal;
use std::time::Duration;

use secrecy::SecretString;

use flowsync_core::{
    ControllerConfig, EquipmentAccess, Scheme, StaticAccessStore, TlsVerification,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use flowsync_config::{
    Config, Profile, config_path, load_config_or_default, save_config, store_password,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the controller configuration and access records for this run.
///
/// A matching profile supplies the baseline; flags override it. Without a
/// profile, `--controller` and `--username` must describe the controller
/// completely.
pub fn resolve(
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(ControllerConfig, StaticAccessStore), CliError> {
    let profile_name = active_profile_name(global, cfg);

    let (mut controller, access) = if let Some(profile) = cfg.profiles.get(&profile_name) {
        let controller =
            flowsync_config::profile_to_controller_config(profile, &profile_name, &cfg.defaults);
        let access = if global.controller.is_some() {
            flag_access(global, &controller.equipment, &profile_name, Some(profile))?
        } else {
            profile_access_with_flags(profile, &profile_name, global)?
        };
        (controller, access)
    } else if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(cfg),
        });
    } else {
        if global.controller.is_none() {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
        let mut controller = ControllerConfig::new(profile_name.clone(), "BORON");
        controller.timeout = Duration::from_secs(cfg.defaults.timeout);
        controller.reconcile_concurrency = cfg.defaults.reconcile_concurrency.max(1);
        let access = flag_access(global, &controller.equipment, &profile_name, None)?;
        (controller, access)
    };

    apply_overrides(&mut controller, global);

    if access.is_empty() {
        return Err(CliError::NoCredentials {
            profile: profile_name,
        });
    }
    Ok((controller, access))
}

fn apply_overrides(controller: &mut ControllerConfig, global: &GlobalOpts) {
    if let Some(ref version) = global.version_tag {
        controller.version.clone_from(version);
    }
    if let Some(id) = global.environment {
        controller.environment.id = id;
    }
    if global.insecure {
        controller.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        controller.timeout = Duration::from_secs(secs);
    }
}

/// Profile access records, with `--username` replacing every entry's user.
fn profile_access_with_flags(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<StaticAccessStore, CliError> {
    let Some(ref username) = global.username else {
        return Ok(flowsync_config::profile_access(profile, profile_name)?);
    };
    let mut overridden = Profile {
        equipment: profile.equipment.clone(),
        controller: profile.controller.clone(),
        access: profile.access.clone(),
        ..Profile::default()
    };
    for entry in overridden.access.values_mut() {
        entry.username = Some(username.clone());
    }
    Ok(flowsync_config::profile_access(&overridden, profile_name)?)
}

/// A single access record built from `--controller`.
fn flag_access(
    global: &GlobalOpts,
    equipment: &str,
    profile_name: &str,
    profile: Option<&Profile>,
) -> Result<StaticAccessStore, CliError> {
    let raw = global.controller.as_deref().unwrap_or_default();
    let url: url::Url = raw.parse().map_err(|_| CliError::Validation {
        field: "controller".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    let scheme: Scheme = url.scheme().parse().map_err(|_| CliError::Validation {
        field: "controller".into(),
        reason: format!("expected http or https URL, got {raw}"),
    })?;

    let entry = profile.and_then(|p| p.access.get(&scheme.to_string()));
    let username = global
        .username
        .clone()
        .or_else(|| entry.and_then(|e| e.username.clone()))
        .ok_or_else(|| CliError::NoCredentials {
            profile: profile_name.into(),
        })?;
    let password = match entry {
        Some(entry) => flowsync_config::resolve_password(entry, profile_name, scheme)
            .or_else(|_| prompt_password(profile_name))?,
        None => std::env::var("FLOWSYNC_PASSWORD")
            .map(SecretString::from)
            .or_else(|_| prompt_password(profile_name))?,
    };

    Ok(StaticAccessStore::new().with(EquipmentAccess {
        equipment: equipment.to_owned(),
        scheme,
        fqdn: raw.trim_end_matches('/').to_owned(),
        username,
        password,
    }))
}

fn prompt_password(profile_name: &str) -> Result<SecretString, CliError> {
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NoCredentials {
            profile: profile_name.into(),
        });
    }
    let pw = rpassword::prompt_password("Controller password: ")?;
    Ok(SecretString::from(pw))
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["flowsync"];
        argv.extend_from_slice(args);
        argv.push("nodes");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn sample() -> Config {
        toml::from_str(
            r#"
            default_profile = "lab"

            [profiles.lab]
            equipment = "odl-lab"
            controller = "http://odl.lab:8181"
            version = "CARBON"
            environment_id = 12
            insecure = false

            [profiles.lab.access.http]
            username = "admin"
            password = "secret"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn profile_values_survive_without_flags() {
        let (controller, access) = resolve(&global(&[]), &sample()).unwrap();
        assert_eq!(controller.equipment, "odl-lab");
        assert_eq!(controller.version, "CARBON");
        assert_eq!(controller.environment.id, 12);
        assert_eq!(controller.tls, TlsVerification::SystemDefaults);
        assert!(!access.is_empty());
    }

    #[test]
    fn flags_override_profile() {
        let g = global(&["--version-tag", "boron", "-e", "99", "-k", "--timeout", "5"]);
        let (controller, _) = resolve(&g, &sample()).unwrap();
        assert_eq!(controller.version, "boron");
        assert_eq!(controller.environment.id, 99);
        assert_eq!(controller.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(controller.timeout, Duration::from_secs(5));
    }

    #[test]
    fn unknown_explicit_profile_lists_available() {
        let err = resolve(&global(&["-p", "prod"]), &sample()).unwrap_err();
        match err {
            CliError::ProfileNotFound { name, available } => {
                assert_eq!(name, "prod");
                assert_eq!(available, "lab");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn no_profile_and_no_controller_is_no_config() {
        let cfg: Config = toml::from_str("").unwrap();
        let err = resolve(&global(&[]), &cfg).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }

    #[test]
    fn controller_flag_rejects_other_schemes() {
        let cfg: Config = toml::from_str("").unwrap();
        let g = global(&["-c", "ftp://odl:21", "-u", "admin"]);
        let err = resolve(&g, &cfg).unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));
    }
}
