//! Sokobee launcher
//!
//! Configures and builds the game with CMake, then runs it, optionally under
//! a memory leak diagnostics tool.
//!
//! ## Architecture
//!
//! ```text
//! launch CLI → commands/launch.rs → build/pipeline.rs → CMake → Build/Sokobee
//! ```

mod build;
mod cli;
mod commands;
mod config;
mod error;
mod exec;
mod utils;

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use cli::Cli;
use error::LaunchError;
use utils::terminal::print_error;

fn main() -> ExitCode {
    let cli = Cli::parse_lenient();
    init_logging(cli.verbose);

    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<LaunchError>() {
            Some(launch_err) => {
                launch_err.display_with_hints();
                ExitCode::from(launch_err.exit_code())
            }
            None => {
                print_error(&format!("{:#}", err));
                ExitCode::FAILURE
            }
        },
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or debug output with `--verbose`
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
