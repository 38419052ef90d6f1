//! Leak-diagnostics run mode
//!
//! The game is started with allocation-stack logging enabled, given a moment
//! to initialize, and then a sampling tool is attached to its pid. The tool
//! runs until the operator interrupts it; afterwards the launcher waits for
//! the game itself to exit.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};

use crate::config::DiagnosticsConfig;
use crate::exec::subprocess::{CommandSpec, ProcessRunner, RunningProcess};
use crate::utils::terminal::{print_info, print_warning};

/// What happened during a diagnosed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosedRun {
    /// Whether the sampling tool was attached at all
    pub tool_attached: bool,

    /// Exit code of the sampling tool
    pub tool_exit_code: Option<i32>,

    /// Exit code of the game
    pub exit_code: Option<i32>,

    /// Ctrl-C arrived while the tool was attached
    pub interrupted: bool,
}

impl DiagnosedRun {
    fn detached(exit_code: Option<i32>) -> Self {
        Self {
            tool_attached: false,
            tool_exit_code: None,
            exit_code,
            interrupted: false,
        }
    }
}

/// Installs the Ctrl-C guard and hands back its flag
pub type InterruptGuard<'a> = &'a dyn Fn() -> Result<Arc<AtomicBool>>;

/// Command that starts the game with the diagnostics environment
pub fn target_command(executable: &Path, root: &Path, config: &DiagnosticsConfig) -> CommandSpec {
    config
        .env
        .iter()
        .fold(CommandSpec::new(executable).current_dir(root), |cmd, (key, value)| {
            cmd.env(key, value)
        })
}

/// Command that attaches the sampling tool to `pid`
pub fn tool_command(tool: &Path, pid: u32, config: &DiagnosticsConfig) -> CommandSpec {
    CommandSpec::new(tool).args(config.tool_args(pid))
}

/// Run the game under the sampling tool
///
/// The fixed startup delay is a guess at how long the game needs before the
/// tool can attach. If the game is already gone by then, the tool is skipped.
/// `guard` runs only once the tool is about to attach, so Ctrl-C keeps its
/// usual meaning through every earlier step. If anything fails after the game
/// started, the game is stopped before the error is returned.
pub fn run_diagnosed(
    runner: &dyn ProcessRunner,
    executable: &Path,
    root: &Path,
    tool: &Path,
    config: &DiagnosticsConfig,
    guard: InterruptGuard<'_>,
) -> Result<DiagnosedRun> {
    let mut target = match runner.spawn(&target_command(executable, root, config)) {
        Ok(target) => target,
        Err(err) => {
            print_warning(&format!("Could not start the game: {:#}", err));
            return Ok(DiagnosedRun::detached(None));
        }
    };
    let pid = target.id();
    tracing::debug!(pid, delay = ?config.startup_delay(), "game started for diagnostics");

    std::thread::sleep(config.startup_delay());

    let early_exit = target
        .try_wait()
        .map_err(|err| stop_target(target.as_mut(), err))?;
    if let Some(result) = early_exit {
        print_warning(&format!(
            "Game exited before the diagnostics tool could attach (exit code: {:?})",
            result.exit_code
        ));
        return Ok(DiagnosedRun::detached(result.exit_code));
    }

    let interrupted = guard().map_err(|err| stop_target(target.as_mut(), err))?;

    print_info(&format!(
        "Attaching {} to pid {} (press Ctrl-C to stop sampling)",
        config.program, pid
    ));
    let tool_result = runner
        .run(&tool_command(tool, pid, config))
        .map_err(|err| stop_target(target.as_mut(), err))?;
    tracing::debug!(exit_code = ?tool_result.exit_code, "diagnostics tool finished");

    let result = target.wait()?;

    Ok(DiagnosedRun {
        tool_attached: true,
        tool_exit_code: tool_result.exit_code,
        exit_code: result.exit_code,
        interrupted: interrupted.load(Ordering::SeqCst),
    })
}

/// Kill the game after a failure, keeping the original error
fn stop_target(target: &mut dyn RunningProcess, err: anyhow::Error) -> anyhow::Error {
    if let Err(kill_err) = target.kill() {
        tracing::warn!(error = %kill_err, "failed to stop the game");
    }
    err
}

static INTERRUPTED: Mutex<Option<Arc<AtomicBool>>> = Mutex::new(None);

/// Keep the launcher alive when the operator interrupts the sampling tool
///
/// Ctrl-C reaches the whole foreground process group. The tool stops and the
/// game gets its quit event, while the launcher only records the interrupt so
/// it can still wait for the game. The handler is installed once per process;
/// later calls reset and return the same flag.
pub fn install_interrupt_guard() -> Result<Arc<AtomicBool>> {
    let mut installed = INTERRUPTED
        .lock()
        .map_err(|_| anyhow!("Ctrl-C handler state is poisoned"))?;

    if let Some(flag) = installed.as_ref() {
        flag.store(false, Ordering::SeqCst);
        return Ok(Arc::clone(flag));
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("Failed to install Ctrl-C handler")?;
    *installed = Some(Arc::clone(&interrupted));
    Ok(interrupted)
}
