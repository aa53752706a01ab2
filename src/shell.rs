use std::io::{self, BufRead};
use std::path::PathBuf;

use nix::unistd::Pid;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, warn};

use crate::config::Options;
use crate::errors::{Result, ShellError};
use crate::host::{ProcessHost, UnixHost};
use crate::jobs::{JobId, JobState, JobTable};
use crate::parser::parse_command_line;
use crate::report::Reporter;

/// Prompt shown by the interactive line editor.
pub static PROMPT: &str = "jobsh> ";

/// What the REPL should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(i32),
}

/// The shell's whole mutable state: jobs, the job id counter, the process host and the
/// output channel. It is threaded through the dispatcher, launcher, job control and
/// reaper.
pub struct Shell<H> {
    pub(crate) jobs: JobTable,
    /// Id the next created job receives. Starts at 1 and only grows.
    next_job_id: u32,
    pub(crate) host: H,
    pub(crate) reporter: Reporter,
}

impl<H: ProcessHost> Shell<H> {
    pub fn new(host: H, reporter: Reporter) -> Self {
        Shell {
            jobs: JobTable::new(),
            next_job_id: 1,
            host,
            reporter,
        }
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Parses and runs one line. Command failures are reported here and the shell
    /// carries on; only fatal errors come back as `Err`.
    pub fn execute_line(&mut self, line: &str) -> Result<Flow> {
        let cmd = match parse_command_line(line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => return Ok(Flow::Continue),
            Err(e) => {
                self.report(e.into())?;
                return Ok(Flow::Continue);
            }
        };
        debug!(argv = ?cmd.argv, "dispatching");
        match self.dispatch(&cmd) {
            Ok(flow) => Ok(flow),
            Err(e) => {
                self.report(e)?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Prints a non-fatal error; a fatal one is handed back instead.
    pub(crate) fn report(&mut self, err: ShellError) -> Result<()> {
        if err.is_fatal() {
            return Err(err);
        }
        self.reporter.error(&err)
    }

    pub(crate) fn peek_job_id(&self) -> JobId {
        JobId(self.next_job_id)
    }

    /// Inserts a job under the next id and advances the counter. A refused insertion
    /// leaves the counter where it was.
    pub(crate) fn register_job(&mut self, pid: Pid, state: JobState, name: &str) -> Result<JobId> {
        let id = self.peek_job_id();
        self.jobs.insert(id, pid, state, name)?;
        self.next_job_id += 1;
        Ok(id)
    }

    /// Releases the job table. Called once, on the way out.
    pub fn shutdown(self) {
        self.jobs.destroy();
    }
}

/// Where input lines come from.
enum LineReader {
    /// Interactive: prompt, line editing and history.
    Editor {
        editor: DefaultEditor,
        history: Option<PathBuf>,
    },
    /// Plain buffered stdin, no prompt.
    Plain(io::StdinLock<'static>),
}

impl LineReader {
    fn new(options: &Options, interactive: bool) -> Self {
        if options.emit_prompt() && interactive {
            match DefaultEditor::new() {
                Ok(mut editor) => {
                    let history = options.history_path();
                    if let Some(path) = &history {
                        if let Err(e) = editor.load_history(path) {
                            debug!(path = %path.display(), error = %e, "no history loaded");
                        }
                    }
                    return LineReader::Editor { editor, history };
                }
                Err(e) => warn!(error = %e, "line editor unavailable, reading plain stdin"),
            }
        }
        LineReader::Plain(io::stdin().lock())
    }

    /// Returns `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        match self {
            LineReader::Editor { editor, .. } => match editor.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        if let Err(e) = editor.add_history_entry(line.as_str()) {
                            debug!(error = %e, "history entry not added");
                        }
                    }
                    Ok(Some(line))
                }
                Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
                Err(ReadlineError::Eof) => Ok(None),
                Err(ReadlineError::Io(e)) => Err(ShellError::ReadInput(e)),
                Err(e) => Err(ShellError::ReadInput(io::Error::new(
                    io::ErrorKind::Other,
                    e.to_string(),
                ))),
            },
            LineReader::Plain(stdin) => {
                let mut line = String::new();
                match stdin.read_line(&mut line) {
                    Ok(0) => Ok(None),
                    Ok(_) => Ok(Some(line)),
                    Err(e) => Err(ShellError::ReadInput(e)),
                }
            }
        }
    }

    fn save_history(&mut self) {
        if let LineReader::Editor {
            editor,
            history: Some(path),
        } = self
        {
            if let Err(e) = editor.save_history(path) {
                warn!(path = %path.display(), error = %e, "failed to save history");
            }
        }
    }
}

/// Runs the main shell loop: reap, read a line, execute it. Returns the process exit
/// status: 0 after `exit` or end of input, 1 after a fatal error.
pub fn run_shell(options: &Options) -> i32 {
    let host = UnixHost::for_stdin();
    let mut reader = LineReader::new(options, host.terminal().is_some());
    let mut shell = Shell::new(host, Reporter::stdio());

    let status = loop {
        if let Err(e) = shell.reap() {
            break fatal(e);
        }
        let line = match reader.read_line() {
            Ok(Some(line)) => line,
            Ok(None) => break 0,
            Err(e) => break fatal(e),
        };
        match shell.execute_line(&line) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit(code)) => break code,
            Err(e) => break fatal(e),
        }
    };

    reader.save_history();
    shell.shutdown();
    debug!(status, "shell exiting");
    status
}

fn fatal(err: ShellError) -> i32 {
    // The reporter may be the thing that failed.
    eprintln!("{}: {}", crate::report::SHELL_NAME, err);
    1
}
