// ── Domain model ──
//
// Node identity, desired ACL rule sets and the environment they belong
// to. Flow records themselves are wire types from flowsync-api and are
// re-exported here unchanged.

pub mod node;
pub mod rule;

pub use flowsync_api::{CONTROLLER_NODE_ID, Flow, FlowTable, base_id};
pub use node::NodeId;
pub use rule::{
    Environment, IcmpOptions, L4Options, PortOp, Protocol, Rule, RuleAction, RuleSet,
    default_priority,
};
