//! Main application entry point and CLI dispatch.
//!
//! Argument parsing happens here; everything after that is delegated to
//! the `Dozr` coordinator in the library.

use anyhow::Result;

use dozr::Dozr;
use dozr::args::{self, CliAction, ParsedArgs};
use dozr::config;
use dozr::constants::EXIT_FAILURE;

fn main() -> Result<()> {
    let parsed_args = ParsedArgs::from_env();

    match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help_message();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help_message();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
            dry_run,
        } => {
            if let Some(dir) = config_dir {
                config::set_config_dir(Some(dir))?;
            }

            let runner = Dozr::new(debug_enabled);
            let runner = if dry_run { runner.dry_run() } else { runner };
            runner.run()
        }
    }
}
