use std::fs;

use nix::unistd;
use tracing::debug;

use crate::errors::{Result, ShellError};
use crate::host::ProcessHost;
use crate::jobs::JobId;
use crate::parser::Command;
use crate::shell::{Flow, Shell};

/// Commands implemented inside the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Ln,
    Rm,
    Exit,
    Fg,
    Bg,
    Jobs,
}

impl Builtin {
    /// Matches the first argument exactly as typed, so `/bin/rm` is not the builtin.
    pub fn from_name(name: &str) -> Option<Builtin> {
        let builtin = match name {
            "cd" => Builtin::Cd,
            "ln" => Builtin::Ln,
            "rm" => Builtin::Rm,
            "exit" => Builtin::Exit,
            "fg" => Builtin::Fg,
            "bg" => Builtin::Bg,
            "jobs" => Builtin::Jobs,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Cd => "cd",
            Builtin::Ln => "ln",
            Builtin::Rm => "rm",
            Builtin::Exit => "exit",
            Builtin::Fg => "fg",
            Builtin::Bg => "bg",
            Builtin::Jobs => "jobs",
        }
    }

    /// Number of arguments after the name.
    fn arity(self) -> usize {
        match self {
            Builtin::Exit | Builtin::Jobs => 0,
            Builtin::Cd | Builtin::Rm | Builtin::Fg | Builtin::Bg => 1,
            Builtin::Ln => 2,
        }
    }
}

/// Parses `%<job-id>`.
fn parse_job_spec(builtin: Builtin, arg: &str) -> Result<JobId> {
    arg.strip_prefix('%')
        .and_then(|digits| digits.parse::<u32>().ok())
        .filter(|&id| id > 0)
        .map(JobId)
        .ok_or(ShellError::BuiltinArgs(builtin.name()))
}

impl<H: ProcessHost> Shell<H> {
    /// Runs `cmd` as a builtin if it names one, otherwise launches it.
    pub(crate) fn dispatch(&mut self, cmd: &Command) -> Result<Flow> {
        match Builtin::from_name(cmd.path()) {
            Some(builtin) => self.run_builtin(builtin, cmd.args()),
            None => {
                self.launch(cmd)?;
                Ok(Flow::Continue)
            }
        }
    }

    fn run_builtin(&mut self, builtin: Builtin, args: &[String]) -> Result<Flow> {
        if args.len() != builtin.arity() {
            return Err(ShellError::BuiltinArgs(builtin.name()));
        }
        debug!(builtin = builtin.name(), ?args, "running builtin");

        match builtin {
            Builtin::Cd => unistd::chdir(args[0].as_str())
                .map_err(|e| ShellError::sys("error opening directory", e))?,
            Builtin::Ln => fs::hard_link(&args[0], &args[1])
                .map_err(|e| ShellError::io("error linking file", e))?,
            Builtin::Rm => unistd::unlink(args[0].as_str())
                .map_err(|e| ShellError::sys("error unlinking file", e))?,
            Builtin::Exit => return Ok(Flow::Exit(0)),
            Builtin::Fg => self.foreground(parse_job_spec(builtin, &args[0])?)?,
            Builtin::Bg => self.background(parse_job_spec(builtin, &args[0])?)?,
            Builtin::Jobs => self
                .jobs
                .print_all(self.reporter.out())
                .map_err(ShellError::WriteOutput)?,
        }
        Ok(Flow::Continue)
    }
}
