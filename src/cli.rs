//! CLI argument parsing using clap derive macros

use std::ffi::OsString;
use std::path::Path;

use anyhow::Result;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::Parser;

use crate::commands::launch::LaunchCommand;
use crate::utils::terminal::disable_colors;

/// Sokobee launcher - configure, build and run the game
///
/// Runs CMake for the requested build type, then starts the game from the
/// project root. Dependency directories missing from the CMake cache are
/// taken from the environment, Launch.toml, or an interactive prompt.
#[derive(Parser, Debug)]
#[command(name = "launch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(flatten)]
    pub launch: LaunchCommand,
}

impl Cli {
    /// Parse the process arguments, dropping flags the launcher does not know
    pub fn parse_lenient() -> Self {
        Self::try_parse_lenient_from(std::env::args_os()).unwrap_or_else(|err| err.exit())
    }

    /// Parse `args`, dropping unknown flags instead of rejecting them
    ///
    /// Unknown tokens carry no meaning for the launcher, so an invocation
    /// without a build mode still ends in the usage failure rather than a
    /// clap error.
    pub fn try_parse_lenient_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        loop {
            match Self::try_parse_from(args.iter().cloned()) {
                Err(err) if err.kind() == ErrorKind::UnknownArgument => {
                    let Some(index) = unknown_flag_index(&err, &args) else {
                        return Err(err);
                    };
                    args.remove(index);
                }
                result => return result,
            }
        }
    }

    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        if self.no_color {
            disable_colors();
        }

        self.launch.execute(&program_name())
    }
}

/// Position of the argument clap rejected as unknown, skipping argv[0]
fn unknown_flag_index(err: &clap::Error, args: &[OsString]) -> Option<usize> {
    let Some(ContextValue::String(flag)) = err.get(ContextKind::InvalidArg) else {
        return None;
    };

    args.iter()
        .skip(1)
        .position(|arg| {
            arg.to_str().is_some_and(|arg| {
                arg == flag
                    || arg
                        .strip_prefix(flag.as_str())
                        .is_some_and(|rest| rest.starts_with('='))
            })
        })
        .map(|index| index + 1)
}

/// Name the launcher was invoked as, for the usage line
fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "launch".to_string())
}
