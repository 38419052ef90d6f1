//! Launch.toml configuration parsing
//!
//! The file is optional and every field has a default, so a bare checkout of
//! the game launches without one.
//!
//! ```toml
//! [build]
//! directory = "Build"
//! artifact = "Sokobee"
//! dependency_variables = ["SDL2_DIR", "SDL2_ttf_DIR", "SDL2_mixer_DIR"]
//!
//! [dependencies]
//! SDL2_DIR = "/opt/homebrew/lib/cmake/SDL2"
//!
//! [toolchain]
//! generator = "Ninja"
//! c_compiler = "clang"
//!
//! [diagnostics]
//! program = "footprint"
//! args = ["--sample", "1", "--minSize", "{min_size}", "--hwm", "-p", "{pid}"]
//! min_size = 1024
//! env = { MallocStackLogging = "1" }
//! startup_delay_ms = 2000
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path};
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

use crate::build::{ARTIFACT_NAME, BUILD_DIR_NAME, DEPENDENCY_VARIABLES};
use crate::error::LaunchError;

/// Name of the optional configuration file at the launcher root
pub const CONFIG_FILE_NAME: &str = "Launch.toml";

/// Root configuration from Launch.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LaunchConfig {
    /// Build directory and artifact naming
    #[serde(default)]
    pub build: BuildSection,

    /// Dependency directory values, keyed by CMake variable name
    #[serde(default)]
    pub dependencies: HashMap<String, String>,

    /// Generator and compiler overrides
    #[serde(default)]
    pub toolchain: ToolchainSection,

    /// Leak-diagnostics run mode
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Build configuration from [build] section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Build directory, relative to the launcher root
    pub directory: String,

    /// Executable target name, without platform suffix
    pub artifact: String,

    /// Dependency directory variables, in prompt order
    pub dependency_variables: Vec<String>,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            directory: BUILD_DIR_NAME.to_string(),
            artifact: ARTIFACT_NAME.to_string(),
            dependency_variables: DEPENDENCY_VARIABLES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Toolchain overrides from [toolchain] section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolchainSection {
    /// CMake generator (-G)
    pub generator: Option<String>,

    /// CMAKE_C_COMPILER
    pub c_compiler: Option<String>,
}

/// Diagnostics tool configuration from [diagnostics] section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Sampling tool program
    pub program: String,

    /// Argument template; `{pid}` and `{min_size}` are substituted
    pub args: Vec<String>,

    /// Smallest allocation, in bytes, the tool reports
    pub min_size: u64,

    /// Variables added to the diagnosed game's environment
    pub env: BTreeMap<String, String>,

    /// Pause between starting the game and attaching the tool
    pub startup_delay_ms: u64,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        let mut env = BTreeMap::new();
        env.insert("MallocStackLogging".to_string(), "1".to_string());

        Self {
            program: "footprint".to_string(),
            args: ["--sample", "1", "--minSize", "{min_size}", "--hwm", "-p", "{pid}"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_size: 1024,
            env,
            startup_delay_ms: 2000,
        }
    }
}

impl DiagnosticsConfig {
    /// Tool arguments with placeholders filled in for a target process
    pub fn tool_args(&self, pid: u32) -> Vec<String> {
        let pid = pid.to_string();
        let min_size = self.min_size.to_string();
        self.args
            .iter()
            .map(|arg| arg.replace("{pid}", &pid).replace("{min_size}", &min_size))
            .collect()
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}

impl LaunchConfig {
    /// Load Launch.toml from the launcher root, or defaults when absent
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let config: LaunchConfig = toml::from_str(content).map_err(|e| {
            LaunchError::config_error_with_hint(
                e.to_string(),
                "Check quotes, brackets and commas; every section of Launch.toml is optional",
            )
        })?;
        Ok(config)
    }

    /// Reject values that would send the launcher outside the project
    pub fn validate(&self) -> Result<()> {
        let directory = Path::new(&self.build.directory);
        let escapes = directory
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if self.build.directory.trim().is_empty() || escapes {
            return Err(LaunchError::config_error_with_hint(
                format!("Invalid build directory '{}'", self.build.directory),
                "[build] directory must be a relative path inside the project, e.g. \"Build\"",
            )
            .into());
        }

        if self.build.artifact.trim().is_empty() {
            return Err(LaunchError::config_error_with_hint(
                "Artifact name cannot be empty",
                "Set [build] artifact to the CMake executable target name",
            )
            .into());
        }

        let valid_identifier = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
        for name in &self.build.dependency_variables {
            if !valid_identifier.is_match(name) {
                return Err(LaunchError::config_error_with_hint(
                    format!("Dependency variable '{}' is not a valid CMake variable name", name),
                    "Variable names contain only letters, digits and underscores, e.g. SDL2_DIR",
                )
                .into());
            }
        }

        if self.diagnostics.program.trim().is_empty() {
            return Err(LaunchError::config_error_with_hint(
                "Diagnostics program cannot be empty",
                "Set [diagnostics] program, or remove it to use the default",
            )
            .into());
        }

        Ok(())
    }
}
