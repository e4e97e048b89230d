//! Diff and reconcile handlers.

use serde::Serialize;
use tabled::Tabled;

use flowsync_core::{FlowController, FlowDiff, NodeId, NodeOutcome};

use crate::cli::{GlobalOpts, ReconcileArgs, RulesArgs};
use crate::error::CliError;
use crate::output::{self, Listing, Printer};

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct NodePlan {
    node: NodeId,
    #[serde(flatten)]
    diff: FlowDiff,
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Delete")]
    delete: String,
    #[tabled(rename = "Update")]
    update: String,
}

impl Listing for NodePlan {
    type Row = PlanRow;

    fn row(&self, _color: bool) -> PlanRow {
        PlanRow {
            node: self.node.to_string(),
            delete: self.diff.delete.join(", "),
            update: self.diff.update.join(", "),
        }
    }

    fn line(&self) -> String {
        format!("{}\t{}", self.node, plain_summary(Some(&self.diff)))
    }
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Deleted")]
    deleted: String,
    #[tabled(rename = "Updated")]
    updated: String,
    #[tabled(rename = "Error")]
    error: String,
}

/// One node's line in the reconciliation report.
#[derive(Serialize)]
#[serde(transparent)]
struct Outcome(NodeOutcome);

impl Listing for Outcome {
    type Row = OutcomeRow;

    fn row(&self, color: bool) -> OutcomeRow {
        let o = &self.0;
        let status = match (&o.error, &o.diff) {
            (Some(_), _) => output::failed("failed", color),
            (None, Some(d)) if d.is_empty() => output::ok("in sync", color),
            (None, _) => output::changed("changed", color),
        };
        let (deleted, updated) = o
            .diff
            .as_ref()
            .map(|d| (d.delete.join(", "), d.update.join(", ")))
            .unwrap_or_default();
        OutcomeRow {
            node: o.node.to_string(),
            status,
            deleted,
            updated,
            error: o.error.clone().unwrap_or_default(),
        }
    }

    fn line(&self) -> String {
        let status = if self.0.is_success() { "ok" } else { "failed" };
        format!("{}\t{status}\t{}", self.0.node, plain_summary(self.0.diff.as_ref()))
    }
}

fn plain_summary(diff: Option<&FlowDiff>) -> String {
    diff.map_or_else(String::new, |d| {
        format!("delete={} update={}", d.delete.join(","), d.update.join(","))
    })
}

// ── Handlers ────────────────────────────────────────────────────────

/// Show each node's plan without touching the switches.
pub async fn diff(
    controller: &FlowController,
    args: RulesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let rules = util::read_rules(&args.rules)?;
    let selection = util::node_selection(&args.nodes);
    let plans: Vec<NodePlan> = controller
        .plan(&rules, selection.as_deref())
        .await?
        .into_iter()
        .map(|(node, diff)| NodePlan { node, diff })
        .collect();

    Printer::new(global).list(&plans);
    Ok(())
}

pub async fn reconcile(
    controller: &FlowController,
    args: ReconcileArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let rules = util::read_rules(&args.rules.rules)?;
    let selection = util::node_selection(&args.rules.nodes);

    let report = if args.strict {
        controller
            .reconcile_all_strict(&rules, selection.as_deref())
            .await?
    } else {
        controller
            .reconcile_all(&rules, selection.as_deref())
            .await?
    };

    let total = report.outcomes.len();
    let failed = report.failures().count();
    let noop = report.is_noop();
    let outcomes: Vec<Outcome> = report.outcomes.into_iter().map(Outcome).collect();
    Printer::new(global).list(&outcomes);

    if failed > 0 {
        return Err(CliError::ReconcileFailed { failed, total });
    }
    if !global.quiet && noop {
        eprintln!("All {total} node(s) already in sync");
    }
    Ok(())
}
