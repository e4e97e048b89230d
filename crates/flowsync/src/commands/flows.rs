//! Flow command handlers.

use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use flowsync_core::{Flow, FlowController, FlowType, NodeId, NodeResponse};

use crate::cli::{FlowsArgs, FlowsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{Listing, Printer};

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct InstalledFlow {
    node: NodeId,
    #[serde(flatten)]
    flow: Flow,
}

#[derive(Tabled)]
struct FlowRow {
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Flow")]
    id: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Name")]
    name: String,
}

impl Listing for InstalledFlow {
    type Row = FlowRow;

    fn row(&self, _color: bool) -> FlowRow {
        let field = |key: &str| self.flow.body.get(key).map(scalar).unwrap_or_default();
        FlowRow {
            node: self.node.to_string(),
            id: self.flow.id.clone(),
            priority: field("priority"),
            name: field("flow-name"),
        }
    }

    fn line(&self) -> String {
        format!("{}\t{}", self.node, self.flow.id)
    }
}

#[derive(Tabled)]
struct ResponseRow {
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Response")]
    body: String,
}

/// One node's reply to a single-flow request.
#[derive(Serialize)]
#[serde(transparent)]
struct Reply(NodeResponse);

impl Listing for Reply {
    type Row = ResponseRow;

    fn row(&self, _color: bool) -> ResponseRow {
        ResponseRow {
            node: self.0.node.to_string(),
            body: self
                .0
                .body
                .as_ref()
                .map_or_else(|| "(empty)".into(), ToString::to_string),
        }
    }

    fn line(&self) -> String {
        let body = self.0.body.as_ref().map(ToString::to_string).unwrap_or_default();
        format!("{}\t{body}", self.0.node)
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn print_responses(responses: Vec<NodeResponse>, global: &GlobalOpts) {
    let replies: Vec<Reply> = responses.into_iter().map(Reply).collect();
    Printer::new(global).list(&replies);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &FlowController,
    args: FlowsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        FlowsCommand::List(nodes) => {
            let selection = util::node_selection(&nodes);
            let snapshot = controller.get_flows(selection.as_deref()).await?;
            let installed: Vec<InstalledFlow> = snapshot
                .into_iter()
                .flat_map(|(node, tables)| {
                    tables
                        .into_iter()
                        .flat_map(|t| t.flow)
                        .map(move |flow| InstalledFlow {
                            node: node.clone(),
                            flow,
                        })
                })
                .collect();
            Printer::new(global).list(&installed);
            Ok(())
        }

        FlowsCommand::Get { id, nodes } => {
            let selection = util::node_selection(&nodes);
            let responses = controller.get_flow(&id, selection.as_deref()).await?;
            print_responses(responses, global);
            Ok(())
        }

        FlowsCommand::Put {
            id,
            from_file,
            nodes,
        } => {
            let data = util::read_json_file(&from_file)?;
            let selection = util::node_selection(&nodes);
            let responses = controller.put_flow(&id, &data, selection.as_deref()).await?;
            if !global.quiet {
                eprintln!("Flow {id} written to {} node(s)", responses.len());
            }
            Ok(())
        }

        FlowsCommand::Delete { id, nodes } => {
            let target = if nodes.nodes.is_empty() {
                "every switch".to_owned()
            } else {
                nodes.nodes.join(", ")
            };
            if !util::confirm(
                &format!("Delete flow {id} from {target}?"),
                "flows delete",
                global.yes,
            )? {
                return Ok(());
            }
            let selection = util::node_selection(&nodes);
            let responses = controller.delete_flow(&id, selection.as_deref()).await?;
            if !global.quiet {
                eprintln!("Flow {id} deleted from {} node(s)", responses.len());
            }
            Ok(())
        }

        FlowsCommand::Flush(nodes) => {
            if !util::confirm(
                "Remove every flow in table 0? This is destructive.",
                "flows flush",
                global.yes,
            )? {
                return Ok(());
            }
            let selection = util::node_selection(&nodes);
            controller.flush_flows(selection.as_deref()).await?;
            if !global.quiet {
                eprintln!("Flow tables flushed");
            }
            Ok(())
        }

        FlowsCommand::Add { rules, flow_type } => {
            let flow_type = FlowType::from_tag(&flow_type)?;
            let rule_set = util::read_rules(&rules.rules)?;
            let selection = util::node_selection(&rules.nodes);
            let sent = controller
                .add_flows(&rule_set, flow_type, selection.as_deref())
                .await?;
            if !global.quiet {
                eprintln!("{sent} {flow_type} flow(s) installed");
            }
            Ok(())
        }
    }
}
