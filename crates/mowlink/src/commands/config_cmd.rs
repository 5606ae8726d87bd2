//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&mowlink_config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
        ConfigCommand::Show => {
            let cfg = mowlink_config::load_config()?;
            let rendered = mowlink_config::render_redacted(&cfg)?;
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }
    }
}
