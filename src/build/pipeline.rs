//! The launch pipeline
//!
//! ```text
//! PrepareDirectory → Configure → Build → LocateArtifact → {Run | RunWithDiagnostics | Skip}
//! ```
//!
//! Each step returns a `Result` and the pipeline stops at the first error.
//! Nothing is retried.

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;

use super::artifact;
use super::cmake::{CMakeConfig, LEAKS_DEBUG_FLAGS, SANITIZER_DEBUG_FLAGS};
use super::cmake_cache::CMakeCache;
use super::diagnostics::{self, DiagnosedRun};
use super::resolve::{dependency_overrides, DependencyResolver};
use super::{LaunchRequest, Platform};
use crate::config::LaunchConfig;
use crate::error::LaunchError;
use crate::exec::subprocess::{CommandSpec, ProcessRunner};
use crate::utils::paths::{ensure_dir, format_size, remove_dir_if_exists};
use crate::utils::terminal::{print_info, print_step, print_success, print_warning};

/// Pipeline stage, for progress output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    PrepareDirectory,
    Configure,
    Build,
    Run,
    RunWithDiagnostics,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::PrepareDirectory => write!(f, "Preparing build directory"),
            Step::Configure => write!(f, "Configuring"),
            Step::Build => write!(f, "Building"),
            Step::Run => write!(f, "Running"),
            Step::RunWithDiagnostics => write!(f, "Running with leak diagnostics"),
        }
    }
}

/// How an invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The game ran; its exit code is informational only
    Ran(Option<i32>),
    /// The game ran under the diagnostics tool
    Diagnosed(DiagnosedRun),
    /// Build succeeded but produced nothing runnable
    BuildOnly,
}

/// Everything the pipeline needs that does not come from the command line
#[derive(Debug, Clone)]
pub struct LaunchContext {
    /// Directory holding the game's CMakeLists.txt; the game also runs from here
    pub root: PathBuf,
    /// Host platform
    pub platform: Platform,
    /// Parsed Launch.toml
    pub config: LaunchConfig,
    /// Resolved cmake executable
    pub cmake: PathBuf,
    /// Resolved diagnostics tool, required only for `--leaks`
    pub diagnostics_tool: Option<PathBuf>,
}

impl LaunchContext {
    pub fn build_dir(&self) -> PathBuf {
        self.root.join(&self.config.build.directory)
    }
}

/// Drives one invocation through the pipeline
pub struct Launcher<'a> {
    context: &'a LaunchContext,
    runner: &'a dyn ProcessRunner,
    resolver: &'a mut dyn DependencyResolver,
}

impl<'a> Launcher<'a> {
    pub fn new(
        context: &'a LaunchContext,
        runner: &'a dyn ProcessRunner,
        resolver: &'a mut dyn DependencyResolver,
    ) -> Self {
        Self {
            context,
            runner,
            resolver,
        }
    }

    /// Run every step for `request`
    pub fn run(&mut self, request: &LaunchRequest) -> Result<Outcome> {
        tracing::debug!(?request, root = %self.context.root.display(), "launch requested");

        self.prepare_directory(request)?;

        print_step(Step::Configure);
        let cmake = self.cmake_config(request)?;
        cmake.configure(self.runner, &self.context.cmake)?;

        print_step(Step::Build);
        cmake.build(self.runner, &self.context.cmake)?;

        self.run_artifact(request)
    }

    /// Wipe the build directory if asked to, then make sure it exists
    pub fn prepare_directory(&self, request: &LaunchRequest) -> Result<()> {
        print_step(Step::PrepareDirectory);
        let build_dir = self.context.build_dir();

        if request.wipes_build_dir() {
            if let Some(size) = remove_dir_if_exists(&build_dir)? {
                print_info(&format!(
                    "Removed {} ({})",
                    build_dir.display(),
                    format_size(size)
                ));
            }
        }

        ensure_dir(&build_dir)
    }

    /// Assemble the configure arguments for `request`
    ///
    /// Dependency variables already in the CMake cache are not overridden;
    /// the resolver is consulted once for each of the others, in order.
    pub fn cmake_config(&mut self, request: &LaunchRequest) -> Result<CMakeConfig> {
        let build_dir = self.context.build_dir();
        let mut cmake = CMakeConfig::new(self.context.root.clone(), build_dir.clone(), request.mode);

        let toolchain = &self.context.config.toolchain;
        let platform_default = self.context.platform.default_toolchain();
        let generator = toolchain
            .generator
            .clone()
            .or_else(|| platform_default.map(|(generator, _)| generator.to_string()));
        let compiler = toolchain
            .c_compiler
            .clone()
            .or_else(|| platform_default.map(|(_, compiler)| compiler.to_string()));
        if let Some(generator) = generator {
            cmake = cmake.generator(generator);
        }
        if let Some(compiler) = compiler {
            cmake = cmake.c_compiler(compiler);
        }

        if request.mode.is_debug() {
            let flags = if request.leaks {
                LEAKS_DEBUG_FLAGS
            } else {
                SANITIZER_DEBUG_FLAGS
            };
            cmake = cmake.variable("CMAKE_C_FLAGS_DEBUG", flags);
        }

        let cache = CMakeCache::load(&build_dir)?;
        let names = &self.context.config.build.dependency_variables;
        for (name, value) in dependency_overrides(names, &cache, &mut *self.resolver)? {
            cmake = cmake.variable(name, value);
        }

        Ok(cmake)
    }

    /// Run the produced executable, if there is one
    pub fn run_artifact(&self, request: &LaunchRequest) -> Result<Outcome> {
        let build_dir = self.context.build_dir();
        let artifact_name = &self.context.config.build.artifact;

        let Some(executable) = artifact::locate(&build_dir, artifact_name, self.context.platform)
        else {
            print_success("Build finished; no runnable artifact to launch");
            return Ok(Outcome::BuildOnly);
        };

        if request.leaks {
            print_step(Step::RunWithDiagnostics);
            let tool = self.context.diagnostics_tool.as_ref().ok_or_else(|| {
                LaunchError::missing_tool(
                    &self.context.config.diagnostics.program,
                    "leak diagnostics",
                    crate::error::hints::diagnostics_tool(),
                )
            })?;
            let run = diagnostics::run_diagnosed(
                self.runner,
                &executable,
                &self.context.root,
                tool,
                &self.context.config.diagnostics,
                &diagnostics::install_interrupt_guard,
            )?;
            return Ok(Outcome::Diagnosed(run));
        }

        print_step(Step::Run);
        let spec = CommandSpec::new(&executable).current_dir(&self.context.root);
        match self.runner.run(&spec) {
            Ok(result) => {
                tracing::info!(exit_code = ?result.exit_code, elapsed = ?result.duration, "game exited");
                Ok(Outcome::Ran(result.exit_code))
            }
            Err(err) => {
                tracing::warn!(error = %format!("{:#}", err), "game could not be started");
                print_warning(&format!("Could not start the game: {:#}", err));
                Ok(Outcome::Ran(None))
            }
        }
    }
}
