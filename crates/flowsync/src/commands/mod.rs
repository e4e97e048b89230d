//! Command dispatch: bridges CLI args -> controller calls -> output formatting.

pub mod config_cmd;
pub mod flows;
pub mod nodes;
pub mod reconcile;
pub mod util;

use flowsync_core::FlowController;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a controller-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &FlowController,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Nodes => nodes::handle(controller, global).await,
        Command::Flows(args) => flows::handle(controller, args, global).await,
        Command::Diff(args) => reconcile::diff(controller, args, global).await,
        Command::Reconcile(args) => reconcile::reconcile(controller, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
