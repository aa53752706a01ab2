use std::ffi::CString;
use std::os::unix::io::RawFd;

use nix::fcntl::{self, OFlag};
use nix::libc::{STDIN_FILENO, STDOUT_FILENO};
use nix::sys::stat::Mode;
use nix::sys::wait::WaitStatus;
use nix::unistd::{self, ForkResult, Pid};
use tracing::{debug, warn};

use crate::errors::{ParseError, Result, ShellError};
use crate::host::ProcessHost;
use crate::jobs::JobState;
use crate::parser::{Command, OutputMode};
use crate::report::{self, Event, JobNotice};
use crate::shell::Shell;
use crate::signals;

/// Exit status of a child whose exec failed.
const EXEC_FAILED: i32 = 127;
/// Exit status of a child that failed before exec.
const SETUP_FAILED: i32 = 1;

/// Everything the child needs, converted before the fork so the child only has to make
/// system calls.
#[derive(Debug, Clone)]
pub struct Launch {
    /// Program to exec, exactly as typed.
    pub path: CString,
    /// The child's argument vector: directory prefix trimmed from the first entry and,
    /// for a background launch, the trailing `&` dropped.
    pub argv: Vec<CString>,
    pub background: bool,
    pub infile: Option<CString>,
    pub outfile: Option<(CString, OutputMode)>,
}

impl Launch {
    /// Builds the child's copy of `cmd`. `cmd` itself is left untouched.
    pub fn prepare(cmd: &Command) -> Result<Launch> {
        let background = cmd.is_background();
        let args = cmd.args();
        let args = if background {
            &args[..args.len().saturating_sub(1)]
        } else {
            args
        };
        let argv = std::iter::once(cmd.program_name())
            .chain(args.iter().map(String::as_str))
            .map(cstring)
            .collect::<Result<Vec<_>>>()?;

        Ok(Launch {
            path: cstring(cmd.path())?,
            argv,
            background,
            infile: cmd.infile.as_deref().map(cstring).transpose()?,
            outfile: match &cmd.outfile {
                Some(path) => Some((cstring(path)?, cmd.mode)),
                None => None,
            },
        })
    }
}

fn cstring(s: &str) -> Result<CString> {
    CString::new(s).map_err(|_| ShellError::Parse(ParseError::InteriorNul))
}

/// Forks; the child becomes its own group leader and execs `launch`.
pub(crate) fn fork_and_exec(launch: &Launch, terminal: Option<RawFd>) -> Result<Pid> {
    match unsafe { unistd::fork() }.map_err(|e| ShellError::sys("fork", e))? {
        ForkResult::Parent { child } => {
            // The child does the same; whichever runs first wins and the other sees
            // EACCES (child already exec'd) or EPERM.
            if let Err(e) = unistd::setpgid(child, child) {
                debug!(%child, error = %e, "parent setpgid raced with child");
            }
            debug!(%child, background = launch.background, "forked");
            Ok(child)
        }
        ForkResult::Child => exec_child(launch, terminal),
    }
}

fn exec_child(launch: &Launch, terminal: Option<RawFd>) -> ! {
    let pid = unistd::getpid();
    if let Err(e) = unistd::setpgid(pid, pid) {
        child_abort("error setting process group", e, SETUP_FAILED);
    }

    // SIGTTOU is still ignored here, so a background group may take the terminal.
    if !launch.background {
        if let Some(fd) = terminal {
            if let Err(e) = unistd::tcsetpgrp(fd, pid) {
                child_abort("error transferring terminal control", e, SETUP_FAILED);
            }
        }
    }

    if let Err(e) = signals::restore_default_signals() {
        child_abort("error restoring signal handlers", e, SETUP_FAILED);
    }

    if let Some(path) = &launch.infile {
        if let Err(e) = reopen(STDIN_FILENO, path, OFlag::O_RDONLY) {
            child_abort("error opening file for reading", e, SETUP_FAILED);
        }
    }

    if let Some((path, mode)) = &launch.outfile {
        let flags = OFlag::O_WRONLY
            | OFlag::O_CREAT
            | match mode {
                OutputMode::Truncate => OFlag::O_TRUNC,
                OutputMode::Append => OFlag::O_APPEND,
            };
        if let Err(e) = reopen(STDOUT_FILENO, path, flags) {
            child_abort("error opening file for writing", e, SETUP_FAILED);
        }
    }

    match unistd::execv(&launch.path, &launch.argv) {
        Ok(never) => match never {},
        Err(e) => child_abort("error executing file", e, EXEC_FAILED),
    }
}

/// Closes `target` and opens `path` in its place.
fn reopen(target: RawFd, path: &CString, flags: OFlag) -> nix::Result<()> {
    let _ = unistd::close(target);
    let mode = Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IROTH;
    let fd = fcntl::open(path.as_c_str(), flags, mode)?;
    if fd != target {
        unistd::dup2(fd, target)?;
        unistd::close(fd)?;
    }
    Ok(())
}

fn child_abort(context: &str, err: nix::Error, code: i32) -> ! {
    report::child_error(context, err);
    // Skip the parent's atexit handlers and buffered output.
    unsafe { nix::libc::_exit(code) }
}

impl<H: ProcessHost> Shell<H> {
    /// Runs an external program: existence probe, fork/exec, then either register it
    /// as a background job or wait for it in the foreground.
    pub(crate) fn launch(&mut self, cmd: &Command) -> Result<()> {
        self.host.probe(cmd.path())?;
        let launch = Launch::prepare(cmd)?;
        let pid = self.host.spawn(&launch)?;

        if launch.background {
            let id = self.register_job(pid, JobState::Running, cmd.path())?;
            self.reporter.status(JobNotice::new(id, pid, Event::Launched))
        } else {
            self.wait_foreground(cmd, pid)
        }
    }

    /// The child took the terminal itself; whatever the wait returns, the shell takes it
    /// back before returning.
    fn wait_foreground(&mut self, cmd: &Command, pid: Pid) -> Result<()> {
        let waited = match self.host.wait_for(pid) {
            Ok(status) => self.settle_launched(cmd, status),
            Err(e) => Err(e),
        };
        let reclaimed = self.host.reclaim_terminal();
        if let Err(e) = waited {
            self.report(e)?;
        }
        if let Err(e) = reclaimed {
            self.report(e)?;
        }
        Ok(())
    }

    fn settle_launched(&mut self, cmd: &Command, status: WaitStatus) -> Result<()> {
        let id = self.peek_job_id();
        match status {
            WaitStatus::Stopped(pid, sig) => {
                self.reporter
                    .status(JobNotice::new(id, pid, Event::Suspended(sig)))?;
                self.register_job(pid, JobState::Stopped, cmd.path())?;
            }
            WaitStatus::Signaled(pid, sig, _) => {
                self.reporter
                    .status(JobNotice::new(id, pid, Event::Signaled(sig)))?;
            }
            WaitStatus::Exited(pid, code) => {
                debug!(%pid, code, "foreground program exited");
            }
            other => warn!(?other, "unexpected foreground wait status"),
        }
        Ok(())
    }
}
