//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;

use flowsync_core::{NodeId, RuleSet};

use crate::cli::NodeArgs;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<serde_json::Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Read a rule set document.
pub fn read_rules(path: &Path) -> Result<RuleSet, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "rules".into(),
        reason: format!("{}: {e}", path.display()),
    })
}

/// `--node` values, or `None` to target every discovered switch.
pub fn node_selection(args: &NodeArgs) -> Option<Vec<NodeId>> {
    if args.nodes.is_empty() {
        None
    } else {
        Some(args.nodes.iter().map(|n| NodeId::from(n.as_str())).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_node_list_means_all() {
        assert!(node_selection(&NodeArgs { nodes: vec![] }).is_none());
        let picked = node_selection(&NodeArgs {
            nodes: vec!["openflow:1".into()],
        })
        .unwrap();
        assert_eq!(picked, vec![NodeId::from("openflow:1")]);
    }

    #[test]
    fn rules_file_is_parsed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"kind": "acl", "rules": [{{"id": 1, "action": "permit", "protocol": "ip", "source": "0.0.0.0/0", "destination": "10.0.0.0/8"}}]}}"#
        )
        .unwrap();
        let rules = read_rules(file.path()).unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn malformed_rules_are_a_validation_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = read_rules(file.path()).unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));
    }

    #[test]
    fn yes_flag_skips_prompt() {
        assert!(confirm("really?", "flush", true).unwrap());
    }
}
