//! The execution core of a small job-control shell.
//!
//! One input line holds one command with at most one input and one output
//! redirection and an optional trailing `&`. [`shell::Shell`] parses it, runs a builtin
//! or forks the program into its own process group, and tracks stopped and background
//! jobs until the [reaper](shell::Shell::reap) sees them end.

pub mod builtins;
pub mod config;
pub mod errors;
pub mod exec;
pub mod host;
pub mod job_control;
pub mod jobs;
pub mod parser;
pub mod reap;
pub mod report;
pub mod shell;
pub mod signals;

pub use errors::{ParseError, Result, ShellError};
pub use host::{ProcessHost, UnixHost};
pub use jobs::{Job, JobId, JobState, JobTable};
pub use report::{Capture, Reporter};
pub use shell::{Flow, Shell};
