// ── Node identity ──

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::CONTROLLER_NODE_ID;

/// Controller-assigned switch identifier, e.g. `openflow:1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The controller's own management node; never a switch.
    pub fn is_controller(&self) -> bool {
        self.0 == CONTROLLER_NODE_ID
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_order_lexically() {
        let mut ids: Vec<NodeId> = ["openflow:2", "openflow:10", "openflow:1"]
            .into_iter()
            .map(NodeId::from)
            .collect();
        ids.sort();
        let ids: Vec<_> = ids.iter().map(NodeId::as_str).collect();
        assert_eq!(ids, ["openflow:1", "openflow:10", "openflow:2"]);
    }

    #[test]
    fn controller_node_is_recognized() {
        assert!(NodeId::from("controller-config").is_controller());
        assert!(!NodeId::from("openflow:1").is_controller());
    }
}
