// ── Flow diff ──
//
// Compares the flows installed on one node with the desired flows and
// names the rules that have to go and the rules that have to be
// (re)installed. Operations are keyed by base id, so exploded entries
// collapse onto the rule they came from.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::{Flow, FlowTable, base_id};

/// One corrective step, keyed by base id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "id", rename_all = "lowercase")]
pub enum Operation {
    Delete(String),
    Update(String),
}

/// Corrective steps for one node. Each list is duplicate-free and
/// ordered by first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlowDiff {
    pub delete: Vec<String>,
    pub update: Vec<String>,
}

impl FlowDiff {
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.update.is_empty()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.delete
            .iter()
            .cloned()
            .map(Operation::Delete)
            .chain(self.update.iter().cloned().map(Operation::Update))
            .collect()
    }
}

fn index(tables: &[FlowTable]) -> IndexMap<&str, &Flow> {
    tables
        .iter()
        .flat_map(|t| t.flow.iter())
        .map(|f| (f.id.as_str(), f))
        .collect()
}

/// Compute the operations that turn `current` into `desired`.
pub fn diff(current: &[FlowTable], desired: &[FlowTable]) -> FlowDiff {
    let desired = index(desired);
    let current = index(current);

    let mut delete = IndexSet::new();
    let mut update = IndexSet::new();

    let ids = desired
        .keys()
        .chain(current.keys().filter(|id| !desired.contains_key(*id)))
        .copied();

    for id in ids {
        match (desired.get(id), current.get(id)) {
            (None, _) => {
                delete.insert(base_id(id).to_owned());
            }
            (Some(_), None) => {
                update.insert(base_id(id).to_owned());
            }
            (Some(want), Some(have)) => {
                if !flows_equal(want, have) {
                    update.insert(base_id(id).to_owned());
                }
            }
        }
    }

    FlowDiff {
        delete: delete.into_iter().collect(),
        update: update.into_iter().collect(),
    }
}

fn flows_equal(a: &Flow, b: &Flow) -> bool {
    objects_equal(&a.body, &b.body)
}

/// Structural equality that ignores how scalars are typed: `10`, `"10"`
/// compare equal, as do `true` and `"true"`.
///
/// Both sides must have the same keys; objects recurse and arrays compare
/// element by element.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => objects_equal(x, y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(_) | Value::Array(_), _) | (_, Value::Object(_) | Value::Array(_)) => false,
        _ => scalar_text(a) == scalar_text(b),
    }
}

fn objects_equal(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(k, v)| b.get(k).is_some_and(|w| values_equal(v, w)))
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(_) | Value::Array(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn flow(value: Value) -> Flow {
        match serde_json::from_value(value) {
            Ok(f) => f,
            Err(e) => panic!("bad fixture: {e}"),
        }
    }

    fn table(flows: Vec<Value>) -> Vec<FlowTable> {
        vec![FlowTable::new(flows.into_iter().map(flow).collect())]
    }

    #[test]
    fn identical_flows_produce_nothing() {
        let d = diff(
            &table(vec![json!({"id": "10", "action": "drop"})]),
            &table(vec![json!({"id": "10", "action": "drop"})]),
        );
        assert_eq!(d, FlowDiff::default());
        assert!(d.is_empty());
    }

    #[test]
    fn changed_flow_is_updated() {
        let d = diff(
            &table(vec![json!({"id": "10", "action": "drop"})]),
            &table(vec![json!({"id": "10", "action": "allow"})]),
        );
        assert_eq!(d.delete, Vec::<String>::new());
        assert_eq!(d.update, ["10"]);
    }

    #[test]
    fn exploded_leftovers_collapse_to_one_delete() {
        let d = diff(
            &table(vec![json!({"id": "10_a"}), json!({"id": "10_b"})]),
            &[],
        );
        assert_eq!(d.delete, ["10"]);
        assert!(d.update.is_empty());
    }

    #[test]
    fn missing_exploded_entries_collapse_to_one_update() {
        let d = diff(&[], &table(vec![json!({"id": "3_0"}), json!({"id": "3_1"}), json!({"id": "4"})]));
        assert_eq!(d.update, ["3", "4"]);
        assert_eq!(
            d.operations(),
            [Operation::Update("3".into()), Operation::Update("4".into())]
        );
    }

    #[test]
    fn desired_ids_come_first() {
        let d = diff(
            &table(vec![json!({"id": "9"}), json!({"id": "1", "priority": 1})]),
            &table(vec![json!({"id": "1", "priority": 2}), json!({"id": "2"})]),
        );
        assert_eq!(d.update, ["1", "2"]);
        assert_eq!(d.delete, ["9"]);
    }

    #[test]
    fn numbers_match_their_string_form() {
        let d = diff(
            &table(vec![json!({"id": "10", "priority": "100", "match": {"ip-match": {"ip-protocol": "6"}}})]),
            &table(vec![json!({"id": 10, "priority": 100, "match": {"ip-match": {"ip-protocol": 6}}})]),
        );
        assert!(d.is_empty());
    }

    #[test]
    fn extra_keys_on_either_side_differ() {
        let a = json!({"x": 1});
        let b = json!({"x": 1, "y": 2});
        assert!(!values_equal(&a, &b));
        assert!(!values_equal(&b, &a));
    }

    #[test]
    fn arrays_compare_elementwise() {
        assert!(values_equal(&json!([1, {"a": "2"}]), &json!(["1", {"a": 2}])));
        assert!(!values_equal(&json!([1, 2]), &json!([2, 1])));
        assert!(!values_equal(&json!([1]), &json!([1, 1])));
    }

    #[test]
    fn containers_never_equal_scalars() {
        assert!(!values_equal(&json!({}), &json!("{}")));
        assert!(!values_equal(&json!(null), &json!("null")));
        assert!(values_equal(&json!(null), &json!(null)));
    }
}
