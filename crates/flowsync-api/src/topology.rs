// Topology discovery
//
// Switches are listed in two views of topology `flow:1`: `config` (what
// was provisioned) and `operational` (what is connected). Both are read
// and merged, because depending on the release a switch may only show up
// in one of them.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::client::{ContentType, Method, OdlClient};
use crate::error::Error;
use crate::models::{CONTROLLER_NODE_ID, TopologyResponse};

/// Which datastore view of the topology to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyView {
    Config,
    Operational,
}

impl TopologyView {
    pub fn path(self) -> &'static str {
        match self {
            Self::Config => "/restconf/config/network-topology:network-topology/topology/flow:1/",
            Self::Operational => {
                "/restconf/operational/network-topology:network-topology/topology/flow:1/"
            }
        }
    }
}

impl OdlClient {
    /// Node ids of one topology view, without the controller's own node.
    ///
    /// A 404 means the view does not exist yet and yields an empty list.
    pub async fn topology_nodes(&self, view: TopologyView) -> Result<Vec<String>, Error> {
        let value = match self
            .request(Method::Get, view.path(), None, ContentType::Json)
            .await
        {
            Ok(value) => value,
            Err(e) if e.is_not_found() => {
                warn!(?view, "topology view not found, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let doc: TopologyResponse = Self::decode(value)?;
        let nodes = doc
            .topology
            .into_iter()
            .next()
            .and_then(|t| t.node)
            .unwrap_or_default()
            .into_iter()
            .map(|n| n.node_id)
            .filter(|id| id != CONTROLLER_NODE_ID)
            .collect();
        Ok(nodes)
    }

    /// All switch node ids known to the controller: config and operational
    /// views merged, deduplicated and sorted ascending.
    ///
    /// An empty result is not an error here; callers that need at least one
    /// node decide that.
    pub async fn node_ids(&self) -> Result<Vec<String>, Error> {
        let mut ids = BTreeSet::new();
        for view in [TopologyView::Config, TopologyView::Operational] {
            ids.extend(self.topology_nodes(view).await?);
        }
        debug!(count = ids.len(), "discovered nodes");
        Ok(ids.into_iter().collect())
    }
}
