//! Error types for the shell core.
//!
//! Every failure a command can hit maps to one [`ShellError`] variant. Only the
//! read/write failures in [`ShellError::is_fatal`] end the shell; everything else is
//! reported and the shell goes back to the prompt.

use std::io;

use nix::errno::Errno;
use nix::unistd::Pid;
use thiserror::Error;

use crate::jobs::JobId;
use crate::parser::{MAX_ARGS, MAX_LINE, MAX_TOKENS};

pub type Result<T> = std::result::Result<T, ShellError>;

/// A malformed command line. The line is dropped and nothing is launched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line longer than {} bytes", MAX_LINE)]
    LineTooLong,
    #[error("line contains a NUL byte")]
    InteriorNul,
    #[error("too many tokens (limit {})", MAX_TOKENS)]
    TooManyTokens,
    #[error("too many arguments (limit {})", MAX_ARGS)]
    TooManyArgs,
    #[error("no redirect file specified")]
    MissingRedirectFile,
    #[error("two consecutive redirect symbols")]
    ConsecutiveRedirects,
    #[error("syntax error: multiple input files")]
    MultipleInputs,
    #[error("syntax error: multiple output files")]
    MultipleOutputs,
    #[error("no command")]
    NoCommand,
}

/// Why the job table refused an insertion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobTableError {
    #[error("job table full ({0} jobs)")]
    Full(usize),
    #[error("job [{0}] already exists")]
    DuplicateId(JobId),
    #[error("process {0} already belongs to a job")]
    DuplicatePid(Pid),
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Wrong arity or a malformed `%<job-id>` argument.
    #[error("{0}: syntax error")]
    BuiltinArgs(&'static str),

    #[error("%{0}: job not found")]
    NoSuchJob(JobId),

    #[error("({0}): job not found")]
    NoJobForPid(Pid),

    #[error("error adding job: {0}")]
    JobTable(#[from] JobTableError),

    #[error("{context}: {source}")]
    Sys {
        context: &'static str,
        #[source]
        source: Errno,
    },

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("read error: {0}")]
    ReadInput(#[source] io::Error),

    #[error("write error: {0}")]
    WriteOutput(#[source] io::Error),
}

impl ShellError {
    pub(crate) fn sys(context: &'static str, source: Errno) -> Self {
        ShellError::Sys { context, source }
    }

    pub(crate) fn io(context: &'static str, source: io::Error) -> Self {
        ShellError::Io { context, source }
    }

    /// Input and output failures take the whole shell down.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShellError::ReadInput(_) | ShellError::WriteOutput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_io_failures_are_fatal() {
        assert!(ShellError::ReadInput(io::Error::from(io::ErrorKind::BrokenPipe)).is_fatal());
        assert!(ShellError::WriteOutput(io::Error::from(io::ErrorKind::BrokenPipe)).is_fatal());
        assert!(!ShellError::sys("waitpid", Errno::EINVAL).is_fatal());
        assert!(!ShellError::BuiltinArgs("cd").is_fatal());
        assert!(!ShellError::from(ParseError::NoCommand).is_fatal());
    }

    #[test]
    fn messages() {
        assert_eq!(ShellError::BuiltinArgs("fg").to_string(), "fg: syntax error");
        assert_eq!(ShellError::NoSuchJob(JobId(7)).to_string(), "%7: job not found");
        assert_eq!(
            ShellError::NoJobForPid(Pid::from_raw(99)).to_string(),
            "(99): job not found"
        );
        assert_eq!(
            ShellError::from(ParseError::MultipleInputs).to_string(),
            "syntax error: multiple input files"
        );
        assert_eq!(
            ShellError::from(JobTableError::Full(64)).to_string(),
            "error adding job: job table full (64 jobs)"
        );
    }
}
