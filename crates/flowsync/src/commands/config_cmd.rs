//! Config subcommand handlers.

use std::fmt::Write;

use serde_json::Value;

use flowsync_core::Scheme;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, SchemeArg};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output::{self, Printer};

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking passwords.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(
        out,
        "reconcile_concurrency = {}",
        cfg.defaults.reconcile_concurrency
    );

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        if let Some(ref equipment) = p.equipment {
            let _ = writeln!(out, "equipment = \"{equipment}\"");
        }
        if let Some(ref controller) = p.controller {
            let _ = writeln!(out, "controller = \"{controller}\"");
        }
        let _ = writeln!(out, "version = \"{}\"", p.version);
        let _ = writeln!(out, "environment_id = {}", p.environment_id);
        if let Some(ref env_name) = p.environment_name {
            let _ = writeln!(out, "environment_name = \"{env_name}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(n) = p.reconcile_concurrency {
            let _ = writeln!(out, "reconcile_concurrency = {n}");
        }

        for (scheme, entry) in &p.access {
            let _ = writeln!(out);
            let _ = writeln!(out, "[profiles.{name}.access.{scheme}]");
            if let Some(ref fqdn) = entry.fqdn {
                let _ = writeln!(out, "fqdn = \"{fqdn}\"");
            }
            if let Some(ref u) = entry.username {
                let _ = writeln!(out, "username = \"{u}\"");
            }
            if entry.password.is_some() {
                let _ = writeln!(out, "password = \"{MASK}\"");
            }
            if let Some(ref env) = entry.password_env {
                let _ = writeln!(out, "password_env = \"{env}\"");
            }
        }
    }

    out
}

/// Structured form of the config with every access password masked.
fn redacted_value(cfg: &Config) -> Result<Value, CliError> {
    let mut value = serde_json::to_value(cfg)?;
    let profiles = value
        .get_mut("profiles")
        .and_then(Value::as_object_mut)
        .into_iter()
        .flat_map(|m| m.values_mut());
    for profile in profiles {
        let entries = profile
            .get_mut("access")
            .and_then(Value::as_object_mut)
            .into_iter()
            .flat_map(|m| m.values_mut());
        for entry in entries {
            if let Some(pw) = entry.get_mut("password").filter(|pw| !pw.is_null()) {
                *pw = Value::String(MASK.into());
            }
        }
    }
    Ok(value)
}

fn scheme_of(arg: SchemeArg) -> Scheme {
    match arg {
        SchemeArg::Https => Scheme::Https,
        SchemeArg::Http => Scheme::Http,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::emit(&config::config_path().display().to_string());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let redacted = redacted_value(&cfg)?;
            Printer::new(global).document(&redacted, || format_config_redacted(&cfg));
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = config::active_profile_name(global, &cfg);
            if cfg.profiles.is_empty() {
                eprintln!(
                    "No profiles configured. Add one to {}",
                    config::config_path().display()
                );
            } else {
                for name in cfg.profiles.keys() {
                    let marker = if *name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::SetPassword { profile, scheme } => {
            let cfg = config::load_config_or_default();
            let profile_name =
                profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name: profile_name,
                });
            }

            let scheme = scheme_of(scheme);
            let secret = rpassword::prompt_password(format!("{profile_name} {scheme} password: "))?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "cannot be empty".into(),
                });
            }
            config::store_password(&profile_name, scheme, &secret)?;
            if !global.quiet {
                eprintln!("✓ Password for '{profile_name}' ({scheme}) stored in system keyring");
            }
            Ok(())
        }
    }
}
