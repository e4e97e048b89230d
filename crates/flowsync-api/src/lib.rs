// flowsync-api: Async Rust client for the OpenDaylight RESTCONF northbound API

pub mod auth;
pub mod client;
pub mod error;
pub mod flows;
pub mod models;
pub mod topology;
pub mod transport;

pub use auth::{ControllerVersion, Credentials};
pub use client::{ContentType, Method, OdlClient};
pub use error::Error;
pub use models::{CONTROLLER_NODE_ID, ControllerErrors, Flow, FlowTable, base_id};
pub use topology::TopologyView;
pub use transport::{TlsMode, TransportConfig};
