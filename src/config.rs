use std::path::PathBuf;

use clap::Parser;

/// History file kept in the home directory when `--history` is not given.
pub const HISTORY_FILE_NAME: &str = ".jobsh_history";

/// Environment variable holding a log filter, e.g. `JOBSH_LOG=jobsh=debug`.
pub const LOG_ENV: &str = "JOBSH_LOG";

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "jobsh", version, about = "A tiny job-control shell")]
pub struct Options {
    /// Log lifecycle events (forks, waits, terminal hand-offs) to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not print a command prompt; read plain lines from stdin
    #[arg(short = 'p', long = "no-prompt")]
    pub no_prompt: bool,

    /// Line editor history file [default: ~/.jobsh_history]
    #[arg(long, value_name = "FILE")]
    pub history: Option<PathBuf>,
}

impl Options {
    pub fn emit_prompt(&self) -> bool {
        !self.no_prompt
    }

    pub fn history_path(&self) -> Option<PathBuf> {
        self.history
            .clone()
            .or_else(|| dirs_next::home_dir().map(|home| home.join(HISTORY_FILE_NAME)))
    }

    /// Log filter used when `JOBSH_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        let options = Options::try_parse_from(["jobsh", "-v", "-p"]).unwrap();
        assert!(options.verbose);
        assert!(!options.emit_prompt());
        assert_eq!(options.default_log_filter(), "debug");

        let options = Options::try_parse_from(["jobsh"]).unwrap();
        assert!(options.emit_prompt());
        assert_eq!(options.default_log_filter(), "warn");
    }

    #[test]
    fn explicit_history_wins() {
        let options = Options::try_parse_from(["jobsh", "--history", "/tmp/h"]).unwrap();
        assert_eq!(options.history_path(), Some(PathBuf::from("/tmp/h")));
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(Options::try_parse_from(["jobsh", "-x"]).is_err());
    }
}
