//! Recording process runner for tests

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Result};

use super::subprocess::{CommandResult, CommandSpec, ProcessRunner, RunningProcess};

/// Records every command instead of starting it
pub struct RecordingRunner {
    /// Commands passed to `run`, in order
    pub ran: RefCell<Vec<CommandSpec>>,
    /// Commands passed to `spawn`, in order
    pub spawned: RefCell<Vec<CommandSpec>>,
    /// Commands whose first argument matches exit with this code
    pub fail_when: Option<(&'static str, i32)>,
    /// File written (and made executable) when the build step runs
    pub create_on_build: Option<PathBuf>,
    /// Spawned processes report having exited on the first poll
    pub child_exits_early: bool,
    /// Pid handed out to spawned processes
    pub pid: u32,
    /// Programs with this file stem fail to start at all
    pub unstartable: Option<&'static str>,
    /// Number of spawned processes that were killed
    pub killed: Rc<Cell<u32>>,
}

impl Default for RecordingRunner {
    fn default() -> Self {
        Self {
            ran: RefCell::new(Vec::new()),
            spawned: RefCell::new(Vec::new()),
            fail_when: None,
            create_on_build: None,
            child_exits_early: false,
            pid: 4242,
            unstartable: None,
            killed: Rc::new(Cell::new(0)),
        }
    }
}

impl RecordingRunner {
    pub fn ran(&self) -> Vec<CommandSpec> {
        self.ran.borrow().clone()
    }

    pub fn spawned(&self) -> Vec<CommandSpec> {
        self.spawned.borrow().clone()
    }

    pub fn killed(&self) -> u32 {
        self.killed.get()
    }

    fn check_startable(&self, spec: &CommandSpec) -> Result<()> {
        let stem = spec.program.file_stem().and_then(|stem| stem.to_str());
        if self.unstartable.is_some() && self.unstartable == stem {
            bail!("Failed to execute {}: Exec format error", spec.program_name());
        }
        Ok(())
    }

    fn exit_code_for(&self, spec: &CommandSpec) -> i32 {
        match self.fail_when {
            Some((marker, code)) if spec.args.first().map(String::as_str) == Some(marker) => code,
            _ => 0,
        }
    }
}

pub fn finished(code: Option<i32>) -> CommandResult {
    CommandResult {
        success: code == Some(0),
        exit_code: code,
        duration: Duration::ZERO,
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandResult> {
        self.ran.borrow_mut().push(spec.clone());
        self.check_startable(spec)?;
        let code = self.exit_code_for(spec);

        if code == 0 && spec.args.first().map(String::as_str) == Some("--build") {
            if let Some(path) = &self.create_on_build {
                std::fs::write(path, "#!/bin/sh\nexit 0\n")?;
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
                }
            }
        }

        Ok(finished(Some(code)))
    }

    fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn RunningProcess>> {
        self.spawned.borrow_mut().push(spec.clone());
        self.check_startable(spec)?;
        Ok(Box::new(FakeProcess {
            pid: self.pid,
            exits_early: self.child_exits_early,
            killed: Rc::clone(&self.killed),
        }))
    }
}

struct FakeProcess {
    pid: u32,
    exits_early: bool,
    killed: Rc<Cell<u32>>,
}

impl RunningProcess for FakeProcess {
    fn id(&self) -> u32 {
        self.pid
    }

    fn try_wait(&mut self) -> Result<Option<CommandResult>> {
        Ok(self.exits_early.then(|| finished(Some(7))))
    }

    fn wait(&mut self) -> Result<CommandResult> {
        Ok(finished(Some(if self.exits_early { 7 } else { 0 })))
    }

    fn kill(&mut self) -> Result<()> {
        self.killed.set(self.killed.get() + 1);
        Ok(())
    }
}
