//! Output formatting: table or JSON.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`
//! with one key/value row per field; JSON formats use serde.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use mowlink_core::{LawnMowerActivity, MowerView};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

fn paint_state(view: &MowerView, color: bool) -> String {
    let label = view.state_label();
    if !color {
        return label;
    }
    match view.activity {
        _ if !view.available => label.dimmed().to_string(),
        Some(LawnMowerActivity::Error) => label.red().bold().to_string(),
        Some(LawnMowerActivity::Mowing) => label.green().to_string(),
        Some(LawnMowerActivity::Docked) => label.cyan().to_string(),
        None => label,
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views are laid
/// out as key/value rows rather than through a `Tabled` derive.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(data)?),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Mower detail ─────────────────────────────────────────────────────

#[derive(Tabled)]
struct DetailRow {
    #[tabled(rename = "Field")]
    key: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| v.to_string())
}

/// Key/value table for one robot.
pub fn mower_detail(view: &MowerView, color: bool) -> String {
    let rows = vec![
        DetailRow {
            key: "Robot",
            value: view.device_id.to_string(),
        },
        DetailRow {
            key: "State",
            value: paint_state(view, color),
        },
        DetailRow {
            key: "Activity",
            value: or_dash(view.activity),
        },
        DetailRow {
            key: "Auto mow",
            value: if view.auto_mow { "on" } else { "off" }.to_owned(),
        },
        DetailRow {
            key: "Pending mode",
            value: or_dash(view.pending_mode),
        },
        DetailRow {
            key: "Mode",
            value: or_dash(view.guessed_mode),
        },
        DetailRow {
            key: "Battery",
            value: or_dash(view.battery_level.map(|b| format!("{b:.0}%"))),
        },
        DetailRow {
            key: "Position",
            value: or_dash(
                view.position
                    .map(|p| format!("{:.5}, {:.5}", p.latitude, p.longitude)),
            ),
        },
        DetailRow {
            key: "Firmware",
            value: or_dash(view.brain_version.as_deref()),
        },
        DetailRow {
            key: "Failed fetches",
            value: view.failure_count.to_string(),
        },
        DetailRow {
            key: "Fetched at",
            value: or_dash(view.fetched_at.map(|t| t.to_rfc3339())),
        },
    ];

    Table::new(rows).with(Style::rounded()).to_string()
}

/// One-line summary used by `watch`.
pub fn mower_line(view: &MowerView, color: bool) -> String {
    let mut line = format!("{}  {}", view.device_id, paint_state(view, color));
    if let Some(pending) = view.pending_mode {
        line.push_str(&format!("  pending={pending}"));
    }
    if let Some(battery) = view.battery_level {
        line.push_str(&format!("  battery={battery:.0}%"));
    }
    line
}
