//! The one place the shell writes to the user.
//!
//! Status lines go to stdout and error messages to stderr, each followed by a newline
//! and a flush. A failed write is a [`ShellError::WriteOutput`], which is fatal.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use nix::sys::signal::Signal;
use nix::unistd::Pid;

use crate::errors::{Result, ShellError};
use crate::jobs::JobId;

pub const SHELL_NAME: &str = "jobsh";

/// What happened to a job, as announced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Launched,
    Signaled(Signal),
    Suspended(Signal),
    Exited(i32),
    Resumed,
}

/// One `[<job_id>] (<pid>) ...` status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobNotice {
    pub id: JobId,
    pub pid: Pid,
    pub event: Event,
}

impl JobNotice {
    pub fn new(id: JobId, pid: Pid, event: Event) -> Self {
        JobNotice { id, pid, event }
    }
}

impl fmt::Display for JobNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ({})", self.id, self.pid)?;
        match self.event {
            Event::Launched => Ok(()),
            Event::Signaled(sig) => write!(f, " terminated by signal {}", sig as i32),
            Event::Suspended(sig) => write!(f, " suspended by signal {}", sig as i32),
            Event::Exited(code) => write!(f, " terminated with exit status {}", code),
            Event::Resumed => write!(f, " resumed"),
        }
    }
}

pub struct Reporter {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
}

impl Reporter {
    pub fn new(out: impl Write + 'static, err: impl Write + 'static) -> Self {
        Reporter {
            out: Box::new(out),
            err: Box::new(err),
        }
    }

    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }

    /// Writes one status line to stdout.
    pub fn status(&mut self, line: impl fmt::Display) -> Result<()> {
        writeln!(self.out, "{}", line)
            .and_then(|()| self.out.flush())
            .map_err(ShellError::WriteOutput)
    }

    /// Writes `jobsh: <message>` to stderr.
    pub fn error(&mut self, err: &ShellError) -> Result<()> {
        writeln!(self.err, "{}: {}", SHELL_NAME, err)
            .and_then(|()| self.err.flush())
            .map_err(ShellError::WriteOutput)
    }

    /// Direct access to stdout for multi-line listings.
    pub fn out(&mut self) -> &mut dyn Write {
        &mut *self.out
    }
}

/// Error output for a forked child that has not exec'd yet. It shares no buffers with
/// the parent's reporter.
pub(crate) fn child_error(context: &str, err: impl fmt::Display) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "{}: {}: {}", SHELL_NAME, context, err);
    let _ = stderr.flush();
}

/// An in-memory writer whose contents stay readable after it is handed to a
/// [`Reporter`].
#[derive(Debug, Clone, Default)]
pub struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn notice_formats() {
        let pid = Pid::from_raw(4242);
        let id = JobId(3);
        let line = |event| JobNotice::new(id, pid, event).to_string();
        assert_eq!(line(Event::Launched), "[3] (4242)");
        assert_eq!(
            line(Event::Signaled(Signal::SIGKILL)),
            "[3] (4242) terminated by signal 9"
        );
        assert_eq!(
            line(Event::Suspended(Signal::SIGTSTP)),
            "[3] (4242) suspended by signal 20"
        );
        assert_eq!(
            line(Event::Exited(2)),
            "[3] (4242) terminated with exit status 2"
        );
        assert_eq!(line(Event::Resumed), "[3] (4242) resumed");
    }

    #[test]
    fn routes_status_and_errors() {
        let out = Capture::new();
        let err = Capture::new();
        let mut reporter = Reporter::new(out.clone(), err.clone());
        reporter.status("[1] (10)").unwrap();
        reporter.error(&ShellError::BuiltinArgs("cd")).unwrap();
        assert_eq!(out.contents(), "[1] (10)\n");
        assert_eq!(err.contents(), "jobsh: cd: syntax error\n");
    }

    #[test]
    fn write_failure_is_fatal() {
        let mut reporter = Reporter::new(Broken, Broken);
        let err = reporter.status("x").unwrap_err();
        assert!(matches!(err, ShellError::WriteOutput(_)));
        assert!(err.is_fatal());
        assert!(reporter.error(&ShellError::BuiltinArgs("rm")).unwrap_err().is_fatal());
    }
}
