//! Mode change handlers: `mode`, `start` and `dock`.

use serde::Serialize;

use mowlink_core::{CommandOutcome, Coordinator, Mode, RobotClient};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct CommandReport<'a> {
    robot: &'a str,
    mode: Mode,
    confirmed: bool,
}

pub async fn handle(
    coordinator: &Coordinator<RobotClient>,
    mode: Mode,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if matches!(global.output, OutputFormat::Table) && !global.quiet {
        eprintln!("{}: requesting {mode}", coordinator.device_id());
    }

    match coordinator.issue_command(mode).await? {
        CommandOutcome::Confirmed => {}
        CommandOutcome::Failed { reason } => return Err(CliError::CommandFailed { mode, reason }),
        CommandOutcome::TimedOut => {
            return Err(CliError::Timeout {
                seconds: coordinator.settings().command_timeout.as_secs(),
            });
        }
    }

    let report = CommandReport {
        robot: coordinator.device_id().as_str(),
        mode,
        confirmed: true,
    };
    let out = output::render_single(global.output, &report, |r| {
        format!("{}: mode set to {}", r.robot, r.mode)
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
