//! Node command handler.

use serde::Serialize;
use tabled::Tabled;

use flowsync_core::{FlowController, NodeId};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{Listing, Printer};

#[derive(Serialize)]
struct NodeView {
    id: NodeId,
}

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Node")]
    id: String,
}

impl Listing for NodeView {
    type Row = NodeRow;

    fn row(&self, _color: bool) -> NodeRow {
        NodeRow {
            id: self.id.to_string(),
        }
    }

    fn line(&self) -> String {
        self.id.to_string()
    }
}

pub async fn handle(controller: &FlowController, global: &GlobalOpts) -> Result<(), CliError> {
    let nodes: Vec<NodeView> = controller
        .discover_nodes()
        .await?
        .into_iter()
        .map(|id| NodeView { id })
        .collect();

    Printer::new(global).list(&nodes);
    Ok(())
}
