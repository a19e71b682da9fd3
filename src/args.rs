//! Command-line argument parsing and processing.
//!
//! Supports the standard help, version, and debug flags while gracefully
//! handling unknown options.

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the controller with these settings
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        dry_run: bool,
    },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse the process's own arguments.
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }

    /// Parse command-line arguments into a structured result.
    ///
    /// Help and version requests win over everything else; an unknown
    /// argument turns the run into a help display with a failure exit.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut dry_run = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut unknown_arg_found = false;
        let mut config_dir: Option<String> = None;

        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut i = 0;
        while i < args_vec.len() {
            match args_vec[i].as_str() {
                "--debug" | "-d" => debug_enabled = true,
                "--dry-run" | "-n" => dry_run = true,
                "--help" | "-h" => display_help = true,
                "--version" | "-V" => display_version = true,
                "--config" | "-c" => {
                    if i + 1 < args_vec.len() {
                        config_dir = Some(args_vec[i + 1].clone());
                        i += 1;
                    } else {
                        log_warning!("--config requires a directory argument");
                        unknown_arg_found = true;
                    }
                }
                unknown => {
                    log_warning!("Unknown argument: {unknown}");
                    unknown_arg_found = true;
                }
            }
            i += 1;
        }

        let action = if display_help {
            CliAction::ShowHelp
        } else if display_version {
            CliAction::ShowVersion
        } else if unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else {
            CliAction::Run {
                debug_enabled,
                config_dir,
                dry_run,
            }
        };

        ParsedArgs { action }
    }
}

/// Display help information for the application.
pub fn display_help_message() {
    log_version!();
    log_block_start!("Usage: dozr [OPTIONS]");
    log_block_start!("Options:");
    log_indented!("-c, --config <DIR>  Use configuration from the given directory");
    log_indented!("-d, --debug         Enable verbose probe and waiter logging");
    log_indented!("-n, --dry-run       Log suspend decisions without executing rtcwake");
    log_indented!("-h, --help          Show this help message");
    log_indented!("-V, --version       Show version information");
    log_block_start!("Configuration:");
    log_indented!("~/.config/dozr/dozr.toml (created on first run)");
    log_end!();
}

/// Display version information for the application.
pub fn display_version_info() {
    log_version!();
    log_block_start!("A connectivity-driven sleep scheduler");
    log_indented!("Watches the network during configured night/morning phases");
    log_indented!("and suspends the machine when the link goes quiet");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliAction {
        ParsedArgs::parse(args.iter().copied()).action
    }

    #[test]
    fn bare_invocation_runs_with_defaults() {
        assert_eq!(
            parse(&["dozr"]),
            CliAction::Run {
                debug_enabled: false,
                config_dir: None,
                dry_run: false,
            }
        );
    }

    #[test]
    fn flags_combine() {
        assert_eq!(
            parse(&["dozr", "--debug", "--dry-run", "--config", "/tmp/conf"]),
            CliAction::Run {
                debug_enabled: true,
                config_dir: Some("/tmp/conf".to_string()),
                dry_run: true,
            }
        );
    }

    #[test]
    fn short_flags_are_accepted() {
        assert_eq!(
            parse(&["dozr", "-d", "-n"]),
            CliAction::Run {
                debug_enabled: true,
                config_dir: None,
                dry_run: true,
            }
        );
    }

    #[test]
    fn help_wins_over_other_flags() {
        assert_eq!(parse(&["dozr", "--debug", "--help"]), CliAction::ShowHelp);
        assert_eq!(parse(&["dozr", "-V"]), CliAction::ShowVersion);
    }

    #[test]
    fn unknown_argument_triggers_error_help() {
        assert_eq!(parse(&["dozr", "--bogus"]), CliAction::ShowHelpDueToError);
    }

    #[test]
    fn config_without_directory_is_an_error() {
        assert_eq!(parse(&["dozr", "--config"]), CliAction::ShowHelpDueToError);
    }
}
