//! Everything the shell asks of the operating system about processes.
//!
//! [`UnixHost`] performs the real calls. The dispatcher, launcher, job control and reaper
//! only ever see the [`ProcessHost`] trait, so they can be driven by a scripted host in
//! tests without a process tree.

use std::os::unix::io::RawFd;

use nix::fcntl::{self, OFlag};
use nix::sys::signal::{self, Signal};
use nix::sys::stat::Mode;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::{self, Pid};
use tracing::debug;

use crate::errors::{Result, ShellError};
use crate::exec::{self, Launch};

pub trait ProcessHost {
    /// Checks that `path` exists and is readable, before anything is forked.
    fn probe(&mut self, path: &str) -> Result<()>;

    /// Forks and execs `launch` in a new process group, returning the child pid.
    fn spawn(&mut self, launch: &Launch) -> Result<Pid>;

    /// Makes `pgid` the terminal's foreground process group.
    fn give_terminal(&mut self, pgid: Pid) -> Result<()>;

    /// Makes the shell's own group the terminal's foreground process group again.
    fn reclaim_terminal(&mut self) -> Result<()>;

    /// Sends SIGCONT to every process in the group `pgid`.
    fn resume(&mut self, pgid: Pid) -> Result<()>;

    /// Blocks until `pid` exits, is killed, or stops.
    fn wait_for(&mut self, pid: Pid) -> Result<WaitStatus>;

    /// Collects one pending status change of any child without blocking.
    /// `StillAlive` means nothing is pending; `ECHILD` means there are no children.
    fn poll_children(&mut self) -> nix::Result<WaitStatus>;
}

/// The host backed by the running process.
#[derive(Debug, Clone, Copy)]
pub struct UnixHost {
    /// Controlling terminal, if the shell has one. Without it ownership transfers are
    /// no-ops.
    terminal: Option<RawFd>,
}

impl UnixHost {
    /// Uses standard input as the controlling terminal when it is one.
    pub fn for_stdin() -> Self {
        let fd = nix::libc::STDIN_FILENO;
        let terminal = unistd::isatty(fd).unwrap_or(false).then_some(fd);
        debug!(?terminal, "process host ready");
        UnixHost { terminal }
    }

    /// A host that never touches the terminal, for drivers and tests.
    pub fn detached() -> Self {
        UnixHost { terminal: None }
    }

    pub fn terminal(&self) -> Option<RawFd> {
        self.terminal
    }
}

impl ProcessHost for UnixHost {
    fn probe(&mut self, path: &str) -> Result<()> {
        let fd = fcntl::open(path, OFlag::O_RDONLY, Mode::empty())
            .map_err(|e| ShellError::sys("error opening file", e))?;
        unistd::close(fd).map_err(|e| ShellError::sys("error closing file", e))
    }

    fn spawn(&mut self, launch: &Launch) -> Result<Pid> {
        exec::fork_and_exec(launch, self.terminal)
    }

    fn give_terminal(&mut self, pgid: Pid) -> Result<()> {
        if let Some(fd) = self.terminal {
            debug!(%pgid, "giving terminal to job");
            unistd::tcsetpgrp(fd, pgid)
                .map_err(|e| ShellError::sys("error transferring terminal control", e))?;
        }
        Ok(())
    }

    fn reclaim_terminal(&mut self) -> Result<()> {
        if let Some(fd) = self.terminal {
            let shell_pgid = unistd::getpgrp();
            debug!(%shell_pgid, "reclaiming terminal");
            unistd::tcsetpgrp(fd, shell_pgid)
                .map_err(|e| ShellError::sys("error reclaiming terminal control", e))?;
        }
        Ok(())
    }

    fn resume(&mut self, pgid: Pid) -> Result<()> {
        signal::kill(Pid::from_raw(-pgid.as_raw()), Signal::SIGCONT)
            .map_err(|e| ShellError::sys("error sending signal", e))
    }

    fn wait_for(&mut self, pid: Pid) -> Result<WaitStatus> {
        let status = wait::waitpid(pid, Some(WaitPidFlag::WUNTRACED))
            .map_err(|e| ShellError::sys("waitpid", e))?;
        debug!(?status, "foreground wait returned");
        Ok(status)
    }

    fn poll_children(&mut self) -> nix::Result<WaitStatus> {
        wait::waitpid(
            None,
            Some(WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED),
        )
    }
}
