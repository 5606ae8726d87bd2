//! `watch`: run the coordinator and print a line per event.

use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use mowlink_core::{Coordinator, CoordinatorEvent, MowerView, RobotClient};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    coordinator: &Coordinator<RobotClient>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut events = coordinator.subscribe();
    coordinator.start().await;

    let color = output::should_color(global.color);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                return Ok(());
            }
            event = events.recv() => {
                let event = match event {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "event receiver lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => return Ok(()),
                };

                if let CoordinatorEvent::AuthFailed { .. } = event {
                    return Err(CliError::AuthFailed {
                        message: "backend rejected credentials while watching".into(),
                    });
                }

                let view = MowerView::capture(coordinator);
                let line = match global.output {
                    OutputFormat::Table => output::mower_line(&view, color),
                    OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(&view)?,
                };
                output::print_output(&line, global.quiet);
            }
        }
    }
}
