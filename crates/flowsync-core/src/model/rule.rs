// ── Desired ACL rules ──
//
// The abstract rule set an environment should enforce. Field names follow
// the JSON documents operators hand in (`l4-options`, `src-port-op`, ...).
// Ids and ports are accepted as strings or numbers.

use std::collections::HashSet;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use flowsync_api::models::string_or_number;

/// Highest flow priority a controller accepts.
pub const MAX_PRIORITY: u16 = u16::MAX;

/// Priority of the rule at `position` when it sets none: earlier rules win.
pub fn default_priority(position: usize) -> u16 {
    let offset = u16::try_from(position).unwrap_or(MAX_PRIORITY);
    MAX_PRIORITY.saturating_sub(offset)
}

// ── Environment ─────────────────────────────────────────────────────

/// The network environment a rule set belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

impl Environment {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

// ── Rule vocabulary ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RuleAction {
    Permit,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Protocol {
    Ip,
    Icmp,
    Tcp,
    Udp,
}

impl Protocol {
    /// IANA protocol number, `None` for any IP traffic.
    pub fn number(self) -> Option<u8> {
        match self {
            Self::Ip => None,
            Self::Icmp => Some(1),
            Self::Tcp => Some(6),
            Self::Udp => Some(17),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortOp {
    Eq,
    Range,
}

/// Transport-layer match for TCP/UDP rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct L4Options {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_port_op: Option<PortOp>,
    #[serde(default, deserialize_with = "opt_port", skip_serializing_if = "Option::is_none")]
    pub src_port_start: Option<u16>,
    #[serde(default, deserialize_with = "opt_port", skip_serializing_if = "Option::is_none")]
    pub src_port_end: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_port_op: Option<PortOp>,
    #[serde(default, deserialize_with = "opt_port", skip_serializing_if = "Option::is_none")]
    pub dest_port_start: Option<u16>,
    #[serde(default, deserialize_with = "opt_port", skip_serializing_if = "Option::is_none")]
    pub dest_port_end: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IcmpOptions {
    #[serde(default, deserialize_with = "opt_u8", skip_serializing_if = "Option::is_none")]
    pub icmp_type: Option<u8>,
    #[serde(default, deserialize_with = "opt_u8", skip_serializing_if = "Option::is_none")]
    pub icmp_code: Option<u8>,
}

// ── Rule ────────────────────────────────────────────────────────────

/// One abstract ACL entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Rule {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub action: RuleAction,
    pub protocol: Protocol,
    pub source: String,
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l4_options: Option<L4Options>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmp_options: Option<IcmpOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
}

/// Ordered desired rules for one environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { kind: None, rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Copy of this set keeping only rules whose id is in `ids`, in order.
    ///
    /// Rule ids are compared as strings, so `10` and `"10"` match.
    pub fn retain_ids<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Self {
        let keep: HashSet<&str> = ids.into_iter().collect();
        Self {
            kind: self.kind.clone(),
            rules: self
                .rules
                .iter()
                .filter(|r| keep.contains(r.id.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Copy of this set where every rule carries the priority its position
    /// gives it. Filtering the result keeps each rule's priority stable.
    #[must_use]
    pub fn with_explicit_priorities(&self) -> Self {
        let rules = self
            .rules
            .iter()
            .enumerate()
            .map(|(pos, r)| Rule {
                priority: Some(r.priority.unwrap_or_else(|| default_priority(pos))),
                ..r.clone()
            })
            .collect();
        Self {
            kind: self.kind.clone(),
            rules,
        }
    }
}

// ── Serde helpers ───────────────────────────────────────────────────

fn opt_number<'de, D>(deserializer: D, max: u64, what: &str) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let n = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(other) => {
            return Err(de::Error::custom(format!(
                "expected {what} as string or number, got {other}"
            )));
        }
    };
    match n {
        Some(n) if n <= max => Ok(Some(n)),
        _ => Err(de::Error::custom(format!("invalid {what}"))),
    }
}

fn opt_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    opt_number(deserializer, u64::from(u16::MAX), "port")?
        .map(|n| u16::try_from(n).map_err(de::Error::custom))
        .transpose()
}

fn opt_u8<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    opt_number(deserializer, u64::from(u8::MAX), "icmp field")?
        .map(|n| u8::try_from(n).map_err(de::Error::custom))
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rules() -> RuleSet {
        serde_json::from_value(json!({
            "kind": "default#acl",
            "rules": [
                {"id": 1, "action": "permit", "protocol": "tcp",
                 "source": "10.0.0.0/24", "destination": "0.0.0.0/0",
                 "l4-options": {"dest-port-op": "eq", "dest-port-start": "443"}},
                {"id": "2", "action": "deny", "protocol": "icmp",
                 "source": "0.0.0.0/0", "destination": "10.0.0.1/32",
                 "icmp-options": {"icmp-type": 8, "icmp-code": "0"}},
                {"id": "3", "action": "permit", "protocol": "ip",
                 "source": "0.0.0.0/0", "destination": "0.0.0.0/0", "priority": 10}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn rules_accept_string_or_numeric_fields() {
        let set = rules();
        assert_eq!(set.len(), 3);
        assert_eq!(set.rules[0].id, "1");
        let l4 = set.rules[0].l4_options.as_ref().unwrap();
        assert_eq!(l4.dest_port_op, Some(PortOp::Eq));
        assert_eq!(l4.dest_port_start, Some(443));
        let icmp = set.rules[1].icmp_options.as_ref().unwrap();
        assert_eq!((icmp.icmp_type, icmp.icmp_code), (Some(8), Some(0)));
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        let res: Result<L4Options, _> =
            serde_json::from_value(json!({"src-port-op": "eq", "src-port-start": 70000}));
        assert!(res.is_err());
    }

    #[test]
    fn unknown_action_is_rejected() {
        let res: Result<Rule, _> = serde_json::from_value(json!({
            "id": 1, "action": "reject", "protocol": "ip",
            "source": "0.0.0.0/0", "destination": "0.0.0.0/0"
        }));
        assert!(res.is_err());
    }

    #[test]
    fn retain_ids_keeps_order() {
        let set = rules().retain_ids(["3", "1"]);
        let ids: Vec<_> = set.rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
        assert_eq!(set.kind.as_deref(), Some("default#acl"));
    }

    #[test]
    fn explicit_priorities_follow_position() {
        let set = rules().with_explicit_priorities();
        let prios: Vec<_> = set.rules.iter().map(|r| r.priority).collect();
        assert_eq!(prios, [Some(65535), Some(65534), Some(10)]);
    }

    #[test]
    fn default_priority_saturates() {
        assert_eq!(default_priority(0), 65535);
        assert_eq!(default_priority(100_000), 0);
    }

    #[test]
    fn protocol_numbers() {
        assert_eq!(Protocol::Ip.number(), None);
        assert_eq!(Protocol::Udp.number(), Some(17));
        assert_eq!("TCP".parse::<Protocol>().unwrap(), Protocol::Tcp);
    }
}
