// ── Flow controller ──
//
// Facade over one OpenDaylight controller: node discovery, per-flow CRUD,
// bulk install/flush, and reconciliation of a desired rule set against
// table 0 of every switch. Node lists are resolved once at the top of each
// operation and passed down explicitly.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::Value;
use strum::VariantNames;
use tracing::{debug, error, info, warn};

use flowsync_api::{ControllerVersion, Credentials, Method, OdlClient};

use crate::access::{AccessStore, resolve_access};
use crate::builder::{AclFlowBuilder, FlowBuilder, FlowType, is_rule_id};
use crate::config::ControllerConfig;
use crate::diff::{FlowDiff, diff};
use crate::error::CoreError;
use crate::model::{Environment, FlowTable, NodeId, RuleSet, base_id};

// ── Results ─────────────────────────────────────────────────────────

/// Decoded controller reply for one node of a single-flow call.
#[derive(Debug, Clone, Serialize)]
pub struct NodeResponse {
    pub node: NodeId,
    pub body: Option<Value>,
}

/// What reconciliation did on one node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeOutcome {
    pub node: NodeId,
    /// Operations computed for the node; absent when its flows could not
    /// be fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<FlowDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-node outcomes of one reconciliation run, in node order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    pub outcomes: Vec<NodeOutcome>,
}

impl ReconcileReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(NodeOutcome::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &NodeOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// `true` when every node was already in sync.
    pub fn is_noop(&self) -> bool {
        self.is_success()
            && self
                .outcomes
                .iter()
                .all(|o| o.diff.as_ref().is_none_or(FlowDiff::is_empty))
    }

    /// Turn node failures into one `CommandError`.
    pub fn into_result(self) -> Result<Self, CoreError> {
        let failures: Vec<String> = self
            .failures()
            .map(|o| format!("{}: {}", o.node, o.error.as_deref().unwrap_or_default()))
            .collect();
        if failures.is_empty() {
            Ok(self)
        } else {
            Err(CoreError::CommandError {
                message: failures.join("; "),
            })
        }
    }
}

// ── Controller ──────────────────────────────────────────────────────

/// Flow management for one controller.
pub struct FlowController {
    client: OdlClient,
    version: ControllerVersion,
    environment: Environment,
    reconcile_concurrency: usize,
    acl_builder: Arc<dyn FlowBuilder>,
}

impl FlowController {
    /// Validate the version, resolve the equipment's access record and
    /// build the HTTP client. No request is sent.
    pub fn new(config: ControllerConfig, access: &dyn AccessStore) -> Result<Self, CoreError> {
        let version = config.version.parse::<ControllerVersion>().map_err(|_| {
            CoreError::InvalidVersion {
                version: config.version.clone(),
                supported: ControllerVersion::VARIANTS.join(", "),
            }
        })?;

        let record = resolve_access(access, &config.equipment)?;
        let credentials = Credentials::new(record.username, record.password);
        let client = OdlClient::new(&record.fqdn, credentials, &config.transport())?;

        debug!(
            equipment = %config.equipment,
            %version,
            url = %client.base_url(),
            "flow controller ready"
        );

        Ok(Self {
            client,
            version,
            environment: config.environment,
            reconcile_concurrency: config.reconcile_concurrency.max(1),
            acl_builder: Arc::new(AclFlowBuilder),
        })
    }

    /// Replace the builder used for ACL flows.
    #[must_use]
    pub fn with_builder(mut self, builder: impl FlowBuilder + 'static) -> Self {
        self.acl_builder = Arc::new(builder);
        self
    }

    pub fn version(&self) -> ControllerVersion {
        self.version
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn client(&self) -> &OdlClient {
        &self.client
    }

    fn builder(&self, flow_type: FlowType) -> &dyn FlowBuilder {
        match flow_type {
            FlowType::Acl => self.acl_builder.as_ref(),
        }
    }

    // ── Nodes ────────────────────────────────────────────────────────

    /// Every switch in the controller's topology, sorted.
    pub async fn discover_nodes(&self) -> Result<Vec<NodeId>, CoreError> {
        let ids = self.client.node_ids().await?;
        Ok(ids.into_iter().map(NodeId::from).collect())
    }

    /// The explicit node list if one is given, otherwise discovery.
    /// Fails when that leaves no node at all.
    pub async fn resolve_nodes(&self, nodes: Option<&[NodeId]>) -> Result<Vec<NodeId>, CoreError> {
        let nodes = match nodes {
            Some(n) if !n.is_empty() => n.to_vec(),
            _ => self.discover_nodes().await?,
        };
        if nodes.is_empty() {
            return Err(CoreError::ControllerInventoryEmpty);
        }
        Ok(nodes)
    }

    // ── Single flows ─────────────────────────────────────────────────

    /// Send one single-flow request to every node.
    pub async fn flow(
        &self,
        method: Method,
        flow_id: &str,
        body: Option<&Value>,
        nodes: Option<&[NodeId]>,
    ) -> Result<Vec<NodeResponse>, CoreError> {
        validate_flow_id(flow_id)?;
        let payload = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| CoreError::invalid_argument(format!("unserializable flow body: {e}")))?;
        let nodes = self.resolve_nodes(nodes).await?;

        let mut responses = Vec::with_capacity(nodes.len());
        for node in nodes {
            let body = self
                .client
                .flow(method, node.as_str(), flow_id, payload.as_deref())
                .await
                .map_err(|e| {
                    error!(%node, flow_id, %method, "flow request failed: {e}");
                    CoreError::command(e)
                })?;
            responses.push(NodeResponse { node, body });
        }
        Ok(responses)
    }

    pub async fn get_flow(
        &self,
        flow_id: &str,
        nodes: Option<&[NodeId]>,
    ) -> Result<Vec<NodeResponse>, CoreError> {
        self.flow(Method::Get, flow_id, None, nodes).await
    }

    /// PUT `data` verbatim as the flow's document.
    pub async fn put_flow(
        &self,
        flow_id: &str,
        data: &Value,
        nodes: Option<&[NodeId]>,
    ) -> Result<Vec<NodeResponse>, CoreError> {
        self.flow(Method::Put, flow_id, Some(data), nodes).await
    }

    pub async fn delete_flow(
        &self,
        flow_id: &str,
        nodes: Option<&[NodeId]>,
    ) -> Result<Vec<NodeResponse>, CoreError> {
        self.flow(Method::Delete, flow_id, None, nodes).await
    }

    // ── Tables ───────────────────────────────────────────────────────

    /// Build flows for `rules` and install every one of them on each node.
    /// Returns the number of flows sent.
    pub async fn add_flows(
        &self,
        rules: &RuleSet,
        flow_type: FlowType,
        nodes: Option<&[NodeId]>,
    ) -> Result<usize, CoreError> {
        let tables = self.builder(flow_type).build(rules, &self.environment)?;
        let nodes = self.resolve_nodes(nodes).await?;

        let mut sent = 0;
        for node in &nodes {
            for flow in tables.iter().flat_map(|t| t.flow.iter()) {
                self.client
                    .put_flow(node.as_str(), flow)
                    .await
                    .map_err(|e| {
                        error!(%node, flow_id = %flow.id, "flow install failed: {e}");
                        CoreError::command(e)
                    })?;
                sent += 1;
            }
        }
        info!(%flow_type, nodes = nodes.len(), flows = sent, "flows installed");
        Ok(sent)
    }

    /// Remove table 0 from each node. A node without a table is skipped.
    pub async fn flush_flows(&self, nodes: Option<&[NodeId]>) -> Result<(), CoreError> {
        let nodes = self.resolve_nodes(nodes).await?;
        for node in &nodes {
            match self.client.delete_table(node.as_str()).await {
                Ok(()) => info!(%node, "flow table flushed"),
                Err(e) if e.is_not_found() => warn!(%node, "no flow table to flush"),
                Err(e) => {
                    error!(%node, "flush failed: {e}");
                    return Err(CoreError::command(e));
                }
            }
        }
        Ok(())
    }

    /// Installed flows of each node. A node without a table maps to an
    /// empty list.
    pub async fn get_flows(
        &self,
        nodes: Option<&[NodeId]>,
    ) -> Result<BTreeMap<NodeId, Vec<FlowTable>>, CoreError> {
        let nodes = self.resolve_nodes(nodes).await?;
        let mut snapshot = BTreeMap::new();
        for node in nodes {
            let tables = self.node_flows(&node).await?;
            snapshot.insert(node, tables);
        }
        Ok(snapshot)
    }

    async fn node_flows(&self, node: &NodeId) -> Result<Vec<FlowTable>, CoreError> {
        match self.client.get_table(node.as_str()).await {
            Ok(tables) => Ok(tables),
            Err(e) if e.is_not_found() => {
                warn!(%node, "flow table not found, treating as empty");
                Ok(Vec::new())
            }
            Err(e) => Err(CoreError::command(e)),
        }
    }

    // ── Reconciliation ───────────────────────────────────────────────

    /// The flows `rules` should produce, as reconciliation sees them.
    pub fn build_flows(&self, rules: &RuleSet) -> Result<Vec<FlowTable>, CoreError> {
        self.builder(FlowType::Acl)
            .build(&rules.with_explicit_priorities(), &self.environment)
    }

    /// Compute each node's diff without changing anything.
    pub async fn plan(
        &self,
        rules: &RuleSet,
        nodes: Option<&[NodeId]>,
    ) -> Result<BTreeMap<NodeId, FlowDiff>, CoreError> {
        let desired = self.build_flows(rules)?;
        let snapshot = self.get_flows(nodes).await?;
        Ok(snapshot
            .into_iter()
            .map(|(node, current)| {
                let d = diff(&current, &desired);
                (node, d)
            })
            .collect())
    }

    /// Bring every node in line with `rules`.
    ///
    /// Nodes are independent: a failing node is recorded in the report and
    /// the others still run. Nothing is rolled back.
    pub async fn reconcile_all(
        &self,
        rules: &RuleSet,
        nodes: Option<&[NodeId]>,
    ) -> Result<ReconcileReport, CoreError> {
        let rules = rules.with_explicit_priorities();
        let desired = self.builder(FlowType::Acl).build(&rules, &self.environment)?;
        let nodes = self.resolve_nodes(nodes).await?;
        info!(
            nodes = nodes.len(),
            rules = rules.len(),
            concurrency = self.reconcile_concurrency,
            "reconciling"
        );

        let rules = &rules;
        let desired = &desired;
        let outcomes = stream::iter(nodes)
            .map(|node| async move {
                match self.reconcile_node(&node, rules, desired).await {
                    Ok(d) => NodeOutcome {
                        node,
                        diff: Some(d),
                        error: None,
                    },
                    Err(NodeFailure { diff, error: e }) => {
                        error!(%node, "reconciliation failed: {e}");
                        NodeOutcome {
                            node,
                            diff,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .buffered(self.reconcile_concurrency)
            .collect::<Vec<_>>()
            .await;

        Ok(ReconcileReport { outcomes })
    }

    /// Like [`reconcile_all`](Self::reconcile_all), but nodes run one at a
    /// time and the first failure aborts the run.
    pub async fn reconcile_all_strict(
        &self,
        rules: &RuleSet,
        nodes: Option<&[NodeId]>,
    ) -> Result<ReconcileReport, CoreError> {
        let rules = rules.with_explicit_priorities();
        let desired = self.builder(FlowType::Acl).build(&rules, &self.environment)?;
        let nodes = self.resolve_nodes(nodes).await?;

        let mut outcomes = Vec::with_capacity(nodes.len());
        for node in nodes {
            let d = self
                .reconcile_node(&node, &rules, &desired)
                .await
                .map_err(|f| {
                    error!(%node, "reconciliation aborted: {}", f.error);
                    f.error
                })?;
            outcomes.push(NodeOutcome {
                node,
                diff: Some(d),
                error: None,
            });
        }
        Ok(ReconcileReport { outcomes })
    }

    /// Delete what should not be there, then reinstall changed rules.
    async fn reconcile_node(
        &self,
        node: &NodeId,
        rules: &RuleSet,
        desired: &[FlowTable],
    ) -> Result<FlowDiff, NodeFailure> {
        let current = self.node_flows(node).await.map_err(NodeFailure::before_diff)?;
        let d = diff(&current, desired);
        if d.is_empty() {
            debug!(%node, "in sync");
            return Ok(d);
        }
        info!(%node, delete = d.delete.len(), update = d.update.len(), "applying diff");

        let desired_ids: HashSet<&str> = desired
            .iter()
            .flat_map(|t| t.flow.iter())
            .map(|f| f.id.as_str())
            .collect();
        let doomed = current
            .iter()
            .flat_map(|t| t.flow.iter())
            .filter(|f| !desired_ids.contains(f.id.as_str()));

        for flow in doomed {
            debug!(%node, flow_id = %flow.id, "deleting flow");
            if let Err(e) = self
                .client
                .flow(Method::Delete, node.as_str(), &flow.id, None)
                .await
            {
                return Err(NodeFailure::after_diff(&d, CoreError::command(e)));
            }
        }

        let changed = rules.retain_ids(d.update.iter().map(String::as_str));
        if !changed.is_empty() {
            self.add_flows(&changed, FlowType::Acl, Some(std::slice::from_ref(node)))
                .await
                .map_err(|e| NodeFailure::after_diff(&d, e))?;
        }
        Ok(d)
    }
}

/// A node's reconciliation error, with the diff if it got that far.
struct NodeFailure {
    diff: Option<FlowDiff>,
    error: CoreError,
}

impl NodeFailure {
    fn before_diff(error: CoreError) -> Self {
        Self { diff: None, error }
    }

    fn after_diff(diff: &FlowDiff, error: CoreError) -> Self {
        Self {
            diff: Some(diff.clone()),
            error,
        }
    }
}

/// Flow ids are a rule id, optionally followed by `_<n>` for entries
/// exploded from one rule.
fn validate_flow_id(id: &str) -> Result<(), CoreError> {
    let suffix_ok = match id.split_once('_') {
        None => true,
        Some((_, n)) => !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()),
    };
    if suffix_ok && is_rule_id(base_id(id)) {
        Ok(())
    } else {
        Err(CoreError::invalid_argument(format!(
            "flow id must be a positive integer, got '{id}'"
        )))
    }
}
