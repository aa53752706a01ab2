use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobsh::config::{Options, LOG_ENV};
use jobsh::{shell, signals};

fn init_tracing(options: &Options) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(options.default_log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup() -> Result<Options> {
    // Parse command-line arguments.
    let options = Options::parse();
    init_tracing(&options);

    // Keystrokes must reach the foreground job, not the shell.
    signals::ignore_job_control_signals().context("failed to ignore job-control signals")?;
    signals::install_quit_handler().context("failed to install SIGQUIT handler")?;
    Ok(options)
}

fn main() {
    let options = match setup() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("jobsh: {:#}", e);
            process::exit(1);
        }
    };

    // Run the main shell loop with the options.
    process::exit(shell::run_shell(&options));
}
