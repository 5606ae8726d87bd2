//! Clap derive structures for the `mowlink` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

use mowlink_core::{LawnMowerAction, Mode};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// mowlink -- watch and steer an Echorobotics robotic mower
#[derive(Debug, Parser)]
#[command(
    name = "mowlink",
    version,
    about = "Monitor and control Echorobotics robotic mowers",
    long_about = "Polls a robot's status through the Echorobotics cloud, tracks\n\
        availability across flaky fetches, and issues mode changes with\n\
        immediate pending-state feedback.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Robot profile to use
    #[arg(long, short = 'p', env = "MOWLINK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Robot id (overrides profile)
    #[arg(long, short = 'r', env = "MOWLINK_ROBOT", global = true)]
    pub robot: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MOWLINK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the robot's status once and print it
    #[command(alias = "st")]
    Status,

    /// Poll on the configured interval and print every change until Ctrl-C
    Watch,

    /// Change the operating mode
    Mode(ModeArgs),

    /// Leave the station and mow (mode `work`)
    Start,

    /// Return to the station and stay there (mode `chargeAndStay`)
    Dock,

    /// Force an immediate refresh and print the result
    Refresh,

    /// Inspect the configuration file
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct ModeArgs {
    /// Mode to switch to
    pub mode: ModeArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Leave the station and mow
    Work,
    /// Charge, then resume the mowing schedule
    ChargeAndWork,
    /// Return to the station and stay there
    ChargeAndStay,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Work => Mode::Work,
            ModeArg::ChargeAndWork => Mode::ChargeAndWork,
            ModeArg::ChargeAndStay => Mode::ChargeAndStay,
        }
    }
}

impl Command {
    /// The mode a command-issuing subcommand asks for.
    pub fn requested_mode(&self) -> Option<Mode> {
        match self {
            Self::Mode(args) => Some(args.mode.into()),
            Self::Start => Some(LawnMowerAction::StartMowing.mode()),
            Self::Dock => Some(LawnMowerAction::Dock.mode()),
            _ => None,
        }
    }
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,
    /// Print the effective configuration (tokens redacted)
    Show,
}
