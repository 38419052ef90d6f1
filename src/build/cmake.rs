//! CMake configuration and execution
//!
//! This module builds the configure and build command lines and runs them
//! through a [`ProcessRunner`]. A non-zero exit from either step is fatal.

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::BuildMode;
use crate::error::LaunchError;
use crate::exec::subprocess::{CommandSpec, ProcessRunner};

/// Debug C flags that turn on AddressSanitizer
pub const SANITIZER_DEBUG_FLAGS: &str = "-fsanitize=address -fno-omit-frame-pointer";

/// Debug C flags for the leak-diagnostics build, which must not use ASan's allocator
pub const LEAKS_DEBUG_FLAGS: &str = "-g -fno-omit-frame-pointer";

/// CMake configuration builder
#[derive(Debug, Clone)]
pub struct CMakeConfig {
    /// Source directory (where CMakeLists.txt is located)
    source_dir: PathBuf,
    /// Build directory
    build_dir: PathBuf,
    /// Build type
    build_type: BuildMode,
    /// CMake variables (-D options)
    variables: Vec<(String, String)>,
    /// Generator (e.g., "Ninja", "Unix Makefiles")
    generator: Option<String>,
    /// C compiler override
    c_compiler: Option<String>,
}

impl CMakeConfig {
    /// Create a new CMake configuration
    pub fn new(source_dir: PathBuf, build_dir: PathBuf, build_type: BuildMode) -> Self {
        Self {
            source_dir,
            build_dir,
            build_type,
            variables: Vec::new(),
            generator: None,
            c_compiler: None,
        }
    }

    /// Set a CMake variable
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.push((name.into(), value.into()));
        self
    }

    /// Set the generator
    pub fn generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = Some(generator.into());
        self
    }

    /// Set the C compiler
    pub fn c_compiler(mut self, compiler: impl Into<String>) -> Self {
        self.c_compiler = Some(compiler.into());
        self
    }

    /// Command line for the configure step
    pub fn configure_command(&self, cmake: &Path) -> CommandSpec {
        let mut cmd = CommandSpec::new(cmake)
            .current_dir(&self.build_dir)
            .arg("-S")
            .arg(self.source_dir.display().to_string())
            .arg("-B")
            .arg(self.build_dir.display().to_string())
            .arg(format!("-DCMAKE_BUILD_TYPE={}", self.build_type));

        if let Some(generator) = &self.generator {
            cmd = cmd.arg("-G").arg(generator);
        }

        if let Some(compiler) = &self.c_compiler {
            cmd = cmd.arg(format!("-DCMAKE_C_COMPILER={}", compiler));
        }

        for (name, value) in &self.variables {
            cmd = cmd.arg(format!("-D{}={}", name, value));
        }

        cmd
    }

    /// Command line for the build step
    pub fn build_command(&self, cmake: &Path) -> CommandSpec {
        CommandSpec::new(cmake)
            .current_dir(&self.build_dir)
            .arg("--build")
            .arg(self.build_dir.display().to_string())
    }

    /// Run CMake configure step
    pub fn configure(&self, runner: &dyn ProcessRunner, cmake: &Path) -> Result<()> {
        let result = runner.run(&self.configure_command(cmake))?;
        if !result.success {
            return Err(LaunchError::command_failed("configure", result.exit_code).into());
        }
        tracing::debug!(elapsed = ?result.duration, "configure finished");
        Ok(())
    }

    /// Run CMake build step
    pub fn build(&self, runner: &dyn ProcessRunner, cmake: &Path) -> Result<()> {
        let result = runner.run(&self.build_command(cmake))?;
        if !result.success {
            return Err(LaunchError::command_failed("build", result.exit_code).into());
        }
        tracing::debug!(elapsed = ?result.duration, "build finished");
        Ok(())
    }
}
