//! Subprocess execution behind a swappable runner
//!
//! Every external program the launcher touches (CMake, the game, the
//! diagnostics tool) is described as a [`CommandSpec`] and handed to a
//! [`ProcessRunner`]. The system runner inherits the terminal so the operator
//! sees CMake output and can interrupt interactive tools.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

/// A fully described external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path
    pub program: PathBuf,

    /// Arguments in order
    pub args: Vec<String>,

    /// Working directory, inherited when `None`
    pub cwd: Option<PathBuf>,

    /// Extra environment variables layered over the inherited environment
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// File name of the program, for messages
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.envs {
            write!(f, "{}={} ", key, value)?;
        }
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Result of a finished subprocess
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,

    /// Process exit code, `None` when killed by a signal
    pub exit_code: Option<i32>,

    /// Execution duration
    pub duration: Duration,
}

impl CommandResult {
    /// Create a CommandResult from an exit status
    pub fn from_status(status: ExitStatus, duration: Duration) -> Self {
        Self {
            success: status.success(),
            exit_code: status.code(),
            duration,
        }
    }
}

/// A child process that is still running
pub trait RunningProcess {
    /// OS process id
    fn id(&self) -> u32;

    /// Poll without blocking; `Some` once the process has exited
    fn try_wait(&mut self) -> Result<Option<CommandResult>>;

    /// Block until the process exits
    fn wait(&mut self) -> Result<CommandResult>;

    /// Terminate the process and reap it
    fn kill(&mut self) -> Result<()>;
}

/// Starts external programs
pub trait ProcessRunner {
    /// Run a command to completion with inherited stdio
    fn run(&self, spec: &CommandSpec) -> Result<CommandResult>;

    /// Start a command and return without waiting
    fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn RunningProcess>>;
}

/// Runner backed by `std::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandResult> {
        let start = Instant::now();
        tracing::debug!(command = %spec, "running");

        let status = spec
            .to_command()
            .status()
            .with_context(|| format!("Failed to execute {}", spec.program_name()))?;

        Ok(CommandResult::from_status(status, start.elapsed()))
    }

    fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn RunningProcess>> {
        tracing::debug!(command = %spec, "spawning");

        let child = spec
            .to_command()
            .spawn()
            .with_context(|| format!("Failed to start {}", spec.program_name()))?;

        Ok(Box::new(SystemProcess {
            child,
            started: Instant::now(),
        }))
    }
}

struct SystemProcess {
    child: Child,
    started: Instant,
}

impl RunningProcess for SystemProcess {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn try_wait(&mut self) -> Result<Option<CommandResult>> {
        let status = self
            .child
            .try_wait()
            .context("Failed to poll child process")?;
        Ok(status.map(|status| CommandResult::from_status(status, self.started.elapsed())))
    }

    fn wait(&mut self) -> Result<CommandResult> {
        let status = self.child.wait().context("Failed to wait for child process")?;
        Ok(CommandResult::from_status(status, self.started.elapsed()))
    }

    fn kill(&mut self) -> Result<()> {
        if self.try_wait()?.is_none() {
            self.child.kill().context("Failed to stop child process")?;
        }
        self.child.wait().context("Failed to reap child process")?;
        Ok(())
    }
}

/// Resolve a program to a path, leaving explicit paths untouched
pub fn resolve_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }
    which::which(program).ok()
}
