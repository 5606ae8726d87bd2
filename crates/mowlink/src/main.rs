mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mowlink_api::{CONFIRM_INTERVAL, EchoClient};
use mowlink_core::{Coordinator, CoreError, RobotClient};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a robot
        Command::Config(args) => commands::config_cmd::handle(&args, &cli.global),

        cmd => {
            let coordinator = build_coordinator(&cli.global)?;

            tracing::debug!(command = ?cmd, robot = %coordinator.device_id(), "dispatching command");
            commands::dispatch(&cmd, &coordinator, &cli.global).await
        }
    }
}

/// Build a coordinator for the selected profile, applying CLI overrides.
fn build_coordinator(global: &GlobalOpts) -> Result<Coordinator<RobotClient>, CliError> {
    let cfg = mowlink_config::load_config()?;
    let (profile_name, profile) = mowlink_config::select_profile(&cfg, global.profile.as_deref())?;

    let mut profile = profile.clone();
    if let Some(ref robot) = global.robot {
        profile.robot_id.clone_from(robot);
    }

    let settings = mowlink_config::profile_to_settings(&cfg.defaults, &profile, &profile_name)?;
    let confirm_attempts = settings.confirm_attempts();
    let api = EchoClient::new(settings.base_url, &settings.credentials, &settings.transport)
        .map_err(CoreError::from)?
        .with_confirm_policy(CONFIRM_INTERVAL, confirm_attempts);

    let client = RobotClient::new(api, settings.device_id.clone());
    Ok(Coordinator::new(
        settings.device_id,
        client,
        settings.coordinator,
    ))
}
