//! One-shot status handlers: `status` and `refresh`.

use mowlink_core::{Coordinator, MowerView, RobotClient, force_refresh};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(
    coordinator: &Coordinator<RobotClient>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    coordinator.tick().await?;
    print_view(coordinator, global)
}

pub async fn refresh(
    coordinator: &Coordinator<RobotClient>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    force_refresh(coordinator).await?;
    print_view(coordinator, global)
}

fn print_view(coordinator: &Coordinator<RobotClient>, global: &GlobalOpts) -> Result<(), CliError> {
    let view = MowerView::capture(coordinator);
    if !view.available {
        return Err(CliError::Unavailable {
            robot: view.device_id.to_string(),
            failures: view.failure_count,
            reason: "no status received".into(),
        });
    }

    let color = output::should_color(global.color);
    let out = output::render_single(global.output, &view, |v| output::mower_detail(v, color))?;
    output::print_output(&out, global.quiet);
    Ok(())
}
