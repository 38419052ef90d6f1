//! Launch command implementation
//!
//! Validates the invocation, gathers tools and configuration, and hands off
//! to the build pipeline.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::build::pipeline::{LaunchContext, Launcher, Outcome};
use crate::build::resolve::{ChainResolver, ConfigResolver, EnvResolver, PromptResolver};
use crate::build::{LaunchRequest, Platform};
use crate::config::LaunchConfig;
use crate::exec::subprocess::SystemRunner;
use crate::utils::paths::find_launcher_root;
use crate::utils::terminal::{print_info, print_warning};
use crate::utils::tools::require_tool;

/// Configure, build and run the game
#[derive(Args, Debug)]
pub struct LaunchCommand {
    /// Build type: Debug or Release (the first one given wins)
    #[arg(value_name = "BUILD_TYPE")]
    pub tokens: Vec<OsString>,

    /// Delete the build directory before configuring
    #[arg(long)]
    pub clean: bool,

    /// Run under the memory leak diagnostics tool (Debug only)
    #[arg(long)]
    pub leaks: bool,

    /// Project root holding CMakeLists.txt (default: nearest one above the current directory)
    #[arg(long, env = "SOKOBEE_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,
}

impl LaunchCommand {
    /// Execute the launch command
    pub fn execute(self, program: &str) -> Result<()> {
        let tokens: Vec<_> = self.tokens.iter().map(|token| token.to_string_lossy()).collect();
        let request = LaunchRequest::from_tokens(program, &tokens, self.clean, self.leaks)?;

        let root = self.resolve_root()?;
        let config = LaunchConfig::load(&root)?;

        let cmake = require_tool("cmake", "configuring and building the game")?.path;
        let diagnostics_tool = if request.leaks {
            Some(require_tool(&config.diagnostics.program, "leak diagnostics")?.path)
        } else {
            None
        };

        let mut resolver = ChainResolver::new()
            .with(EnvResolver)
            .with(ConfigResolver::new(config.dependencies.clone()))
            .with(PromptResolver::new(io::stdin().lock(), io::stderr()));

        let context = LaunchContext {
            root,
            platform: Platform::host(),
            config,
            cmake,
            diagnostics_tool,
        };

        tracing::debug!(
            platform = %context.platform,
            root = %context.root.display(),
            cmake = %context.cmake.display(),
            "launch context ready"
        );

        let runner = SystemRunner;
        let outcome = Launcher::new(&context, &runner, &mut resolver).run(&request)?;

        match outcome {
            Outcome::Ran(code) => {
                tracing::debug!(exit_code = ?code, "game finished");
                if code != Some(0) {
                    print_info(&format!("Game exited with code: {:?}", code));
                }
            }
            Outcome::Diagnosed(run) => {
                tracing::debug!(?run, "diagnosed run finished");
                if !run.tool_attached {
                    print_warning("No diagnostics were collected");
                } else if run.tool_exit_code != Some(0) && !run.interrupted {
                    print_warning(&format!(
                        "Diagnostics tool exited with code: {:?}",
                        run.tool_exit_code
                    ));
                }
            }
            Outcome::BuildOnly => {}
        }

        Ok(())
    }

    fn resolve_root(&self) -> Result<PathBuf> {
        match &self.root {
            Some(root) if root.is_absolute() => Ok(root.clone()),
            Some(root) => Ok(std::env::current_dir()
                .context("Failed to get current directory")?
                .join(root)),
            None => find_launcher_root(),
        }
    }
}
