//! Flow reconciliation between a desired ACL and OpenDaylight switches.
//!
//! This crate owns the domain logic on top of `flowsync-api`:
//!
//! - **[`FlowController`]**: Facade for one controller. Resolves the
//!   equipment's access record, discovers switches, exposes per-flow CRUD
//!   ([`get_flow`](FlowController::get_flow), [`put_flow`](FlowController::put_flow),
//!   [`delete_flow`](FlowController::delete_flow)), bulk
//!   [`add_flows`](FlowController::add_flows) / [`flush_flows`](FlowController::flush_flows),
//!   and [`reconcile_all`](FlowController::reconcile_all).
//!
//! - **[`FlowBuilder`]**: Pure translation of a [`RuleSet`] into table-0
//!   flow records. [`AclFlowBuilder`] is the shipped implementation.
//!
//! - **[`diff()`]**: Base-id keyed delete/update plan between installed and
//!   desired flows, using type-tolerant structural equality.
//!
//! - **[`AccessStore`]**: Lookup of controller URI and credentials per
//!   equipment, `https` preferred over `http`.

pub mod access;
pub mod builder;
pub mod config;
pub mod controller;
pub mod diff;
pub mod error;
pub mod model;

// ── Primary re-exports ──────────────────────────────────────────────
pub use access::{AccessStore, EquipmentAccess, Scheme, StaticAccessStore, resolve_access};
pub use builder::{AclFlowBuilder, FlowBuilder, FlowType};
pub use config::{ControllerConfig, TlsVerification};
pub use controller::{FlowController, NodeOutcome, NodeResponse, ReconcileReport};
pub use diff::{FlowDiff, Operation, diff, values_equal};
pub use error::CoreError;

pub use flowsync_api::{ControllerVersion, Method};

pub use model::{
    CONTROLLER_NODE_ID, Environment, Flow, FlowTable, IcmpOptions, L4Options, NodeId, PortOp,
    Protocol, Rule, RuleAction, RuleSet, base_id,
};
