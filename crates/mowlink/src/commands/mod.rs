//! Command dispatch: bridges CLI args -> coordinator calls -> output formatting.

pub mod config_cmd;
pub mod mode;
pub mod status;
pub mod watch;

use mowlink_core::{Coordinator, RobotClient};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a robot-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: &Command,
    coordinator: &Coordinator<RobotClient>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let result = match cmd {
        Command::Status => status::handle(coordinator, global).await,
        Command::Refresh => status::refresh(coordinator, global).await,
        Command::Watch => watch::handle(coordinator, global).await,
        Command::Mode(_) | Command::Start | Command::Dock => match cmd.requested_mode() {
            Some(requested) => mode::handle(coordinator, requested, global).await,
            None => Ok(()),
        },
        // Config is handled before dispatch
        Command::Config(_) => unreachable!(),
    };

    coordinator.shutdown().await;
    result
}
