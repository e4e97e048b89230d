// ── Flow builders ──
//
// Turn an abstract rule set into controller-native flow records for
// table 0. Builders are pure: the same rules and environment always
// produce the same flows, which is what lets reconciliation compare
// desired against installed state.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use serde_json::{Map, Value, json};
use strum::{Display, EnumString, VariantNames};

use crate::error::CoreError;
use crate::model::{
    Environment, Flow, FlowTable, L4Options, PortOp, Protocol, Rule, RuleAction, RuleSet,
    default_priority,
};

/// Upper bound on flows generated from one rule by port ranges.
pub const MAX_EXPANSION: usize = 1024;

const ETHERTYPE_IPV4: u16 = 0x0800;
const OUTPUT_NORMAL: &str = "NORMAL";
const MAX_OUTPUT_LENGTH: u16 = 65535;

/// Kinds of flows the controller can be asked to install.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, VariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FlowType {
    #[default]
    Acl,
}

impl FlowType {
    pub fn from_tag(tag: &str) -> Result<Self, CoreError> {
        tag.parse().map_err(|_| CoreError::UnsupportedFlowType {
            flow_type: tag.to_owned(),
        })
    }
}

/// Translates rules into flow tables.
pub trait FlowBuilder: Send + Sync {
    fn build(&self, rules: &RuleSet, env: &Environment) -> Result<Vec<FlowTable>, CoreError>;
}

/// Builds OpenFlow ACL entries: IPv4 match on addresses, protocol and
/// ports; `permit` forwards normally, `deny` drops.
#[derive(Debug, Clone, Copy, Default)]
pub struct AclFlowBuilder;

impl FlowBuilder for AclFlowBuilder {
    fn build(&self, rules: &RuleSet, env: &Environment) -> Result<Vec<FlowTable>, CoreError> {
        let mut flows = Vec::new();
        let mut seen = HashSet::new();
        for (pos, rule) in rules.rules.iter().enumerate() {
            validate_rule_id(&rule.id)?;
            if !seen.insert(rule.id.as_str()) {
                return Err(CoreError::invalid_argument(format!(
                    "duplicate rule id '{}'",
                    rule.id
                )));
            }
            flows.extend(build_rule(rule, pos, env)?);
        }
        Ok(vec![FlowTable::new(flows)])
    }
}

fn build_rule(rule: &Rule, position: usize, env: &Environment) -> Result<Vec<Flow>, CoreError> {
    let mut base = Map::new();
    base.insert(
        "ethernet-match".into(),
        json!({ "ethernet-type": { "type": ETHERTYPE_IPV4 } }),
    );
    if let Some(src) = match_cidr(&rule.source)? {
        base.insert("ipv4-source".into(), Value::String(src));
    }
    if let Some(dst) = match_cidr(&rule.destination)? {
        base.insert("ipv4-destination".into(), Value::String(dst));
    }
    if let Some(proto) = rule.protocol.number() {
        base.insert("ip-match".into(), json!({ "ip-protocol": proto }));
    }
    if rule.protocol == Protocol::Icmp {
        if let Some(icmp) = &rule.icmp_options {
            let mut m = Map::new();
            if let Some(t) = icmp.icmp_type {
                m.insert("icmpv4-type".into(), json!(t));
            }
            if let Some(c) = icmp.icmp_code {
                m.insert("icmpv4-code".into(), json!(c));
            }
            if !m.is_empty() {
                base.insert("icmpv4-match".into(), Value::Object(m));
            }
        }
    }

    let ports = port_combinations(rule)?;
    let exploded = ports.len() > 1 || rule.l4_options.as_ref().is_some_and(has_range);
    let priority = rule.priority.unwrap_or_else(|| default_priority(position));

    let flows = ports
        .into_iter()
        .enumerate()
        .map(|(n, (src_port, dst_port))| {
            let mut matcher = base.clone();
            let prefix = match rule.protocol {
                Protocol::Tcp => "tcp",
                _ => "udp",
            };
            if let Some(p) = src_port {
                matcher.insert(format!("{prefix}-source-port"), json!(p));
            }
            if let Some(p) = dst_port {
                matcher.insert(format!("{prefix}-destination-port"), json!(p));
            }
            let id = if exploded {
                format!("{}_{n}", rule.id)
            } else {
                rule.id.clone()
            };
            Flow::new(id, flow_body(rule, env, priority, matcher))
        })
        .collect();
    Ok(flows)
}

fn flow_body(rule: &Rule, env: &Environment, priority: u16, matcher: Map<String, Value>) -> Map<String, Value> {
    let action = match rule.action {
        RuleAction::Permit => json!({
            "order": 0,
            "output-action": {
                "output-node-connector": OUTPUT_NORMAL,
                "max-length": MAX_OUTPUT_LENGTH
            }
        }),
        RuleAction::Deny => json!({ "order": 0, "drop-action": {} }),
    };

    let mut body = Map::new();
    body.insert("flow-name".into(), json!(format!("ACL.{}.{}", env.id, rule.id)));
    body.insert("table_id".into(), json!(0));
    body.insert("priority".into(), json!(priority));
    body.insert("cookie".into(), json!(env.id));
    body.insert("match".into(), Value::Object(matcher));
    body.insert(
        "instructions".into(),
        json!({
            "instruction": [{
                "order": 0,
                "apply-actions": { "action": [action] }
            }]
        }),
    );
    body
}

/// `true` for a positive decimal integer written without sign or leading
/// zeros, so two ids name the same rule exactly when they are equal.
pub(crate) fn is_rule_id(id: &str) -> bool {
    !id.is_empty() && !id.starts_with('0') && id.bytes().all(|b| b.is_ascii_digit())
}

fn validate_rule_id(id: &str) -> Result<(), CoreError> {
    if is_rule_id(id) {
        Ok(())
    } else {
        Err(CoreError::invalid_argument(format!(
            "rule id must be a positive integer, got '{id}'"
        )))
    }
}

fn has_range(l4: &L4Options) -> bool {
    l4.src_port_op == Some(PortOp::Range) || l4.dest_port_op == Some(PortOp::Range)
}

/// Every (source, destination) port pair the rule matches. A rule
/// without port matching yields one pair of `None`s.
fn port_combinations(rule: &Rule) -> Result<Vec<(Option<u16>, Option<u16>)>, CoreError> {
    let Some(l4) = &rule.l4_options else {
        return Ok(vec![(None, None)]);
    };
    if !matches!(rule.protocol, Protocol::Tcp | Protocol::Udp) {
        if l4.src_port_op.is_some() || l4.dest_port_op.is_some() {
            return Err(CoreError::invalid_argument(format!(
                "rule {}: port matching requires tcp or udp, got {}",
                rule.id, rule.protocol
            )));
        }
        return Ok(vec![(None, None)]);
    }

    let src = port_values(&rule.id, "source", l4.src_port_op, l4.src_port_start, l4.src_port_end)?;
    let dst = port_values(&rule.id, "destination", l4.dest_port_op, l4.dest_port_start, l4.dest_port_end)?;

    let total = src.len().saturating_mul(dst.len());
    if total > MAX_EXPANSION {
        return Err(CoreError::invalid_argument(format!(
            "rule {} expands to {total} flows (limit {MAX_EXPANSION})",
            rule.id
        )));
    }

    Ok(src
        .iter()
        .flat_map(|s| dst.iter().map(move |d| (*s, *d)))
        .collect())
}

fn port_values(
    rule_id: &str,
    side: &str,
    op: Option<PortOp>,
    start: Option<u16>,
    end: Option<u16>,
) -> Result<Vec<Option<u16>>, CoreError> {
    match op {
        None => Ok(vec![None]),
        Some(PortOp::Eq) => {
            let port = start.ok_or_else(|| {
                CoreError::invalid_argument(format!("rule {rule_id}: {side} port missing"))
            })?;
            Ok(vec![Some(port)])
        }
        Some(PortOp::Range) => {
            let (Some(lo), Some(hi)) = (start, end) else {
                return Err(CoreError::invalid_argument(format!(
                    "rule {rule_id}: {side} port range needs start and end"
                )));
            };
            if lo > hi {
                return Err(CoreError::invalid_argument(format!(
                    "rule {rule_id}: {side} port range {lo}-{hi} is reversed"
                )));
            }
            if usize::from(hi - lo) >= MAX_EXPANSION {
                return Err(CoreError::invalid_argument(format!(
                    "rule {rule_id}: {side} port range {lo}-{hi} exceeds {MAX_EXPANSION} ports"
                )));
            }
            Ok((lo..=hi).map(Some).collect())
        }
    }
}

/// Canonical match value for a CIDR, `None` for "any".
///
/// Host bits are cleared so the value matches what the controller
/// stores back.
fn match_cidr(cidr: &str) -> Result<Option<String>, CoreError> {
    let (addr, prefix) = parse_ipv4_cidr(cidr)?;
    if prefix == 0 {
        return Ok(None);
    }
    let mask = u32::MAX << (32 - u32::from(prefix));
    let network = Ipv4Addr::from(u32::from(addr) & mask);
    Ok(Some(format!("{network}/{prefix}")))
}

fn parse_ipv4_cidr(cidr: &str) -> Result<(Ipv4Addr, u8), CoreError> {
    let (host, prefix) = cidr
        .trim()
        .split_once('/')
        .ok_or_else(|| CoreError::invalid_argument(format!("invalid ipv4 host/prefix value '{cidr}'")))?;
    let host_ip = host
        .parse::<Ipv4Addr>()
        .map_err(|_| CoreError::invalid_argument(format!("invalid IPv4 host address '{host}'")))?;
    let prefix_len = prefix
        .parse::<u8>()
        .map_err(|_| CoreError::invalid_argument(format!("invalid IPv4 prefix length '{prefix}'")))?;
    if prefix_len > 32 {
        return Err(CoreError::invalid_argument(format!(
            "IPv4 prefix length must be <= 32, got {prefix_len}"
        )));
    }
    Ok((host_ip, prefix_len))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn env() -> Environment {
        Environment::new(42, "prod")
    }

    fn rule(value: Value) -> RuleSet {
        serde_json::from_value(json!({ "rules": [value] })).unwrap()
    }

    fn build(set: &RuleSet) -> Vec<Flow> {
        let mut tables = AclFlowBuilder.build(set, &env()).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].id, 0);
        tables.remove(0).flow
    }

    #[test]
    fn permit_tcp_eq_builds_full_record() {
        let flows = build(&rule(json!({
            "id": 5, "action": "permit", "protocol": "tcp",
            "source": "10.0.0.7/24", "destination": "0.0.0.0/0",
            "l4-options": {"dest-port-op": "eq", "dest-port-start": 22}
        })));

        assert_eq!(flows.len(), 1);
        assert_eq!(
            flows[0].to_value(),
            json!({
                "id": "5",
                "flow-name": "ACL.42.5",
                "table_id": 0,
                "priority": 65535,
                "cookie": 42,
                "match": {
                    "ethernet-match": {"ethernet-type": {"type": 2048}},
                    "ipv4-source": "10.0.0.0/24",
                    "ip-match": {"ip-protocol": 6},
                    "tcp-destination-port": 22
                },
                "instructions": {"instruction": [{
                    "order": 0,
                    "apply-actions": {"action": [{
                        "order": 0,
                        "output-action": {"output-node-connector": "NORMAL", "max-length": 65535}
                    }]}
                }]}
            })
        );
    }

    #[test]
    fn deny_icmp_drops() {
        let flows = build(&rule(json!({
            "id": "9", "action": "deny", "protocol": "icmp",
            "source": "0.0.0.0/0", "destination": "192.168.1.1/32",
            "icmp-options": {"icmp-type": 8}
        })));

        let body = &flows[0].body;
        assert_eq!(body["match"]["icmpv4-match"], json!({"icmpv4-type": 8}));
        assert_eq!(body["match"]["ipv4-destination"], json!("192.168.1.1/32"));
        assert_eq!(
            body["instructions"]["instruction"][0]["apply-actions"]["action"][0]["drop-action"],
            json!({})
        );
    }

    #[test]
    fn udp_range_explodes_with_suffixes() {
        let flows = build(&rule(json!({
            "id": 3, "action": "permit", "protocol": "udp",
            "source": "0.0.0.0/0", "destination": "0.0.0.0/0",
            "l4-options": {"dest-port-op": "range", "dest-port-start": 5000, "dest-port-end": 5002}
        })));

        let ids: Vec<_> = flows.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["3_0", "3_1", "3_2"]);
        assert!(flows.iter().all(|f| f.base_id() == "3"));
        assert_eq!(flows[2].body["match"]["udp-destination-port"], json!(5002));
    }

    #[test]
    fn priorities_follow_rule_order() {
        let set: RuleSet = serde_json::from_value(json!({"rules": [
            {"id": 1, "action": "permit", "protocol": "ip", "source": "0.0.0.0/0", "destination": "0.0.0.0/0"},
            {"id": 2, "action": "deny", "protocol": "ip", "source": "0.0.0.0/0", "destination": "0.0.0.0/0"},
            {"id": 3, "action": "deny", "protocol": "ip", "source": "0.0.0.0/0", "destination": "0.0.0.0/0", "priority": 7}
        ]}))
        .unwrap();
        let prios: Vec<_> = build(&set).iter().map(|f| f.body["priority"].clone()).collect();
        assert_eq!(prios, [json!(65535), json!(65534), json!(7)]);
    }

    #[test]
    fn build_is_deterministic() {
        let set = rule(json!({
            "id": 1, "action": "permit", "protocol": "tcp",
            "source": "10.1.0.0/16", "destination": "10.2.0.0/16",
            "l4-options": {"src-port-op": "range", "src-port-start": 1, "src-port-end": 4}
        }));
        assert_eq!(build(&set), build(&set));
    }

    #[test]
    fn oversized_expansion_is_rejected() {
        let set = rule(json!({
            "id": 1, "action": "permit", "protocol": "tcp",
            "source": "0.0.0.0/0", "destination": "0.0.0.0/0",
            "l4-options": {
                "src-port-op": "range", "src-port-start": 1, "src-port-end": 100,
                "dest-port-op": "range", "dest-port-start": 1, "dest-port-end": 100
            }
        }));
        let err = AclFlowBuilder.build(&set, &env()).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn malformed_input_is_rejected() {
        for bad in [
            json!({"id": 1, "action": "permit", "protocol": "ip", "source": "10.0.0.0", "destination": "0.0.0.0/0"}),
            json!({"id": 1, "action": "permit", "protocol": "ip", "source": "10.0.0.0/33", "destination": "0.0.0.0/0"}),
            json!({"id": "", "action": "permit", "protocol": "ip", "source": "0.0.0.0/0", "destination": "0.0.0.0/0"}),
            json!({"id": "+5", "action": "permit", "protocol": "ip", "source": "0.0.0.0/0", "destination": "0.0.0.0/0"}),
            json!({"id": "007", "action": "permit", "protocol": "ip", "source": "0.0.0.0/0", "destination": "0.0.0.0/0"}),
            json!({"id": 1, "action": "permit", "protocol": "icmp", "source": "0.0.0.0/0", "destination": "0.0.0.0/0",
                   "l4-options": {"dest-port-op": "eq", "dest-port-start": 80}}),
            json!({"id": 1, "action": "permit", "protocol": "tcp", "source": "0.0.0.0/0", "destination": "0.0.0.0/0",
                   "l4-options": {"dest-port-op": "range", "dest-port-start": 90, "dest-port-end": 80}}),
        ] {
            let err = AclFlowBuilder.build(&rule(bad.clone()), &env()).unwrap_err();
            assert!(err.is_invalid_argument(), "accepted {bad}");
        }
    }

    #[test]
    fn duplicate_rule_ids_are_rejected() {
        let set: RuleSet = serde_json::from_value(json!({"rules": [
            {"id": 1, "action": "permit", "protocol": "ip", "source": "0.0.0.0/0", "destination": "0.0.0.0/0"},
            {"id": "1", "action": "deny", "protocol": "ip", "source": "0.0.0.0/0", "destination": "0.0.0.0/0"}
        ]}))
        .unwrap();
        let err = AclFlowBuilder.build(&set, &env()).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("duplicate rule id '1'"), "{err}");
    }

    #[test]
    fn flow_type_parses() {
        assert_eq!(FlowType::from_tag("ACL").unwrap(), FlowType::Acl);
        let err = FlowType::from_tag("qos").unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedFlowType { .. }));
        assert!(err.is_invalid_argument());
    }
}
