//! Error types and helpers for user-friendly error messages
//!
//! Every failure the launcher reports on purpose is a [`LaunchError`]. Each
//! variant knows its own exit code and how to print itself with an actionable
//! hint. Anything else travels as a plain `anyhow::Error`.

use thiserror::Error;

/// Launcher errors with helpful context and exit codes
#[derive(Error, Debug)]
pub enum LaunchError {
    /// No build mode among the arguments
    #[error("Usage: {program} <Debug|Release> [--clean] [--leaks]")]
    Usage { program: String },

    /// `--leaks` combined with `Release`
    #[error("--leaks is only available for Debug builds")]
    LeaksRequiresDebug,

    /// An external build step exited unsuccessfully
    #[error("CMake {step} failed with exit code: {}", display_code(.code))]
    CommandFailed { step: String, code: Option<i32> },

    /// Tool/executable not found on PATH
    #[error("Missing tool: {tool}")]
    MissingTool {
        tool: String,
        required_for: String,
        hint: String,
    },

    /// A dependency directory variable that no resolver could supply
    #[error("No path supplied for dependency variable '{name}'")]
    UnresolvedDependency { name: String },

    /// Invalid `Launch.toml`
    #[error("Configuration error: {message}")]
    Config { message: String, hint: String },
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

impl LaunchError {
    /// Create a usage error for the given program name
    pub fn usage(program: impl Into<String>) -> Self {
        Self::Usage {
            program: program.into(),
        }
    }

    /// Create a command failure error
    pub fn command_failed(step: impl Into<String>, code: Option<i32>) -> Self {
        Self::CommandFailed {
            step: step.into(),
            code,
        }
    }

    /// Create a missing tool error
    pub fn missing_tool(
        tool: impl Into<String>,
        required_for: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::MissingTool {
            tool: tool.into(),
            required_for: required_for.into(),
            hint: hint.into(),
        }
    }

    /// Create an unresolved dependency error
    pub fn unresolved_dependency(name: impl Into<String>) -> Self {
        Self::UnresolvedDependency { name: name.into() }
    }

    /// Create a configuration error with a hint
    pub fn config_error_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Process exit code this error maps to
    ///
    /// A failing build step hands its own code through so the operator sees
    /// the same status CMake produced.
    pub fn exit_code(&self) -> u8 {
        match self {
            LaunchError::CommandFailed {
                code: Some(code), ..
            } => u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1),
            _ => 1,
        }
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self) {
        use console::style;

        match self {
            LaunchError::Usage { .. } => {
                println!("{}", self);
                return;
            }
            LaunchError::LeaksRequiresDebug => {
                eprintln!("{} {}", style("ERROR:").red().bold(), self);
                eprintln!(
                    "{} Run `launch Debug --leaks` instead.",
                    style("HINT:").yellow().bold()
                );
                return;
            }
            _ => {}
        }

        eprintln!("\n{} {}", style("ERROR:").red().bold(), self);

        match self {
            LaunchError::MissingTool {
                hint, required_for, ..
            } => {
                eprintln!("Required for: {}", required_for);
                eprintln!("\n{} {}", style("HINT:").yellow().bold(), hint);
            }
            LaunchError::UnresolvedDependency { name } => {
                eprintln!(
                    "\n{} {}",
                    style("HINT:").yellow().bold(),
                    hints::dependency_variable(name)
                );
            }
            LaunchError::Config { hint, .. } => {
                eprintln!("\n{} {}", style("HINT:").yellow().bold(), hint);
            }
            _ => {}
        }

        eprintln!();
    }
}

/// Common error hints
pub mod hints {
    /// Get hint for missing CMake
    pub fn cmake() -> &'static str {
        "Install CMake from https://cmake.org/ or use your package manager:\n\
         • macOS: brew install cmake\n\
         • Ubuntu: sudo apt install cmake\n\
         • Windows: winget install Kitware.CMake"
    }

    /// Get hint for a missing memory diagnostics tool
    pub fn diagnostics_tool() -> &'static str {
        "The leak-diagnostics run mode attaches a sampling tool to the game process.\n\
         • macOS: install the Xcode Command Line Tools (xcode-select --install)\n\
         • Elsewhere: set [diagnostics] program in Launch.toml to an available tool"
    }

    /// Get hint for an unresolved dependency directory
    pub fn dependency_variable(name: &str) -> String {
        format!(
            "Supply the directory containing the package's CMake config files:\n\
             • Export {name}=/path/to/dir before launching\n\
             • Or add it under [dependencies] in Launch.toml\n\
             • Or answer the interactive prompt with a non-empty path"
        )
    }
}
