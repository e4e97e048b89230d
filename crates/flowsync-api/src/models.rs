// RESTCONF wire models
//
// Topology, flow inventory and error documents as the controller
// serializes them. Flow payloads are kept verbatim: match and
// instruction trees are compared structurally, never interpreted here.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

/// Node id the controller uses for its own management channel.
/// Never a switch; excluded from every node list.
pub const CONTROLLER_NODE_ID: &str = "controller-config";

/// The only flow table this client reads or writes.
pub const FLOW_TABLE_ID: u8 = 0;

// ── Topology ─────────────────────────────────────────────────────────

/// `network-topology:network-topology/topology/flow:1/` document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopologyResponse {
    #[serde(default)]
    pub topology: Vec<Topology>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(rename = "topology-id", default)]
    pub topology_id: Option<String>,
    /// Absent when the controller knows no switches yet.
    #[serde(default)]
    pub node: Option<Vec<TopologyNode>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopologyNode {
    #[serde(rename = "node-id")]
    pub node_id: String,
}

// ── Flow inventory ───────────────────────────────────────────────────

/// A single flow entry.
///
/// Only `id` is typed; everything else (priority, match, instructions,
/// cookie, ...) lives in `body` exactly as sent or received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl Flow {
    pub fn new(id: impl Into<String>, body: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }

    /// Id of the logical rule this entry was generated from.
    pub fn base_id(&self) -> &str {
        base_id(&self.id)
    }

    /// The whole record, `id` included, as a JSON object.
    pub fn to_value(&self) -> Value {
        let mut obj = self.body.clone();
        obj.insert("id".into(), Value::String(self.id.clone()));
        Value::Object(obj)
    }
}

/// Strip an exploded-entry suffix: `"10_a"` becomes `"10"`.
///
/// Ids without an underscore, or starting with one, are returned as-is,
/// so collapsing twice yields the same id.
pub fn base_id(id: &str) -> &str {
    match id.find('_') {
        Some(pos) if pos > 0 => &id[..pos],
        _ => id,
    }
}

/// One flow table with its entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowTable {
    #[serde(default)]
    pub id: u8,
    #[serde(default)]
    pub flow: Vec<Flow>,
}

impl FlowTable {
    pub fn new(flow: Vec<Flow>) -> Self {
        Self {
            id: FLOW_TABLE_ID,
            flow,
        }
    }
}

/// `flow-node-inventory:table/0/` document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableResponse {
    #[serde(rename = "flow-node-inventory:table", default)]
    pub table: Vec<FlowTable>,
}

/// Body of a single-flow PUT: `{"flow": [ <flow> ]}`.
#[derive(Debug, Clone, Serialize)]
pub struct FlowEnvelope<'a> {
    pub flow: [&'a Flow; 1],
}

// ── Errors ───────────────────────────────────────────────────────────

/// RESTCONF error document: `{"errors": {"error": [ ... ]}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerErrors {
    pub errors: ControllerErrorList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControllerErrorList {
    #[serde(default)]
    pub error: Vec<ControllerErrorEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControllerErrorEntry {
    #[serde(rename = "error-type", default)]
    pub error_type: Option<String>,
    #[serde(rename = "error-tag", default)]
    pub error_tag: Option<String>,
    #[serde(rename = "error-message")]
    pub error_message: String,
}

impl ControllerErrors {
    pub fn from_body(body: &str) -> Result<Self, Error> {
        serde_json::from_str(body).map_err(|e| Error::Deserialization {
            message: format!("not a controller error document: {e}"),
            body: body.to_owned(),
        })
    }

    /// All `error-message` values joined with `". "`.
    pub fn message(&self) -> String {
        self.errors
            .error
            .iter()
            .map(|e| e.error_message.as_str())
            .collect::<Vec<_>>()
            .join(". ")
    }
}

// ── Serde helpers ────────────────────────────────────────────────────

/// Accept `"10"` or `10` for identifier fields.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn base_id_strips_suffix() {
        assert_eq!(base_id("10_a"), "10");
        assert_eq!(base_id("10_a_b"), "10");
        assert_eq!(base_id("10"), "10");
    }

    #[test]
    fn base_id_is_idempotent() {
        for id in ["10_a", "_x", "rule1_b", "42"] {
            assert_eq!(base_id(base_id(id)), base_id(id));
        }
    }

    #[test]
    fn base_id_keeps_leading_underscore() {
        assert_eq!(base_id("_x"), "_x");
    }

    #[test]
    fn flow_accepts_numeric_id() {
        let flow: Flow = serde_json::from_value(json!({"id": 7, "priority": 10})).unwrap();
        assert_eq!(flow.id, "7");
        assert_eq!(flow.body["priority"], json!(10));
    }

    #[test]
    fn table_without_flows_deserializes_empty() {
        let resp: TableResponse =
            serde_json::from_value(json!({"flow-node-inventory:table": [{"id": 0}]})).unwrap();
        assert_eq!(resp.table.len(), 1);
        assert!(resp.table[0].flow.is_empty());
    }

    #[test]
    fn error_messages_are_joined() {
        let body = json!({
            "errors": {"error": [
                {"error-type": "application", "error-tag": "data-missing", "error-message": "Flow missing"},
                {"error-message": "Node unknown"}
            ]}
        })
        .to_string();
        let errors = ControllerErrors::from_body(&body).unwrap();
        assert_eq!(errors.message(), "Flow missing. Node unknown");
    }

    #[test]
    fn error_translation_fails_on_foreign_payload() {
        assert!(matches!(
            ControllerErrors::from_body("<html>502</html>"),
            Err(Error::Deserialization { .. })
        ));
    }

    #[test]
    fn envelope_wraps_single_flow() {
        let flow = Flow::new("3", Map::new());
        let body = serde_json::to_value(FlowEnvelope { flow: [&flow] }).unwrap();
        assert_eq!(body, json!({"flow": [{"id": "3"}]}));
    }
}
