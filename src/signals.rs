use std::io;
use std::process;
use std::thread;

use nix::sys::signal::{self, SigHandler, Signal};
use signal_hook::{consts::signal::SIGQUIT, iterator::Signals};
use tracing::debug;

/// Signals the shell ignores so that terminal keystrokes only reach the foreground job.
/// A forked child puts them back to their defaults before exec.
pub const SHELL_IGNORED: [Signal; 3] = [Signal::SIGINT, Signal::SIGTSTP, Signal::SIGTTOU];

pub fn ignore_job_control_signals() -> nix::Result<()> {
    set_disposition(SigHandler::SigIgn)
}

pub fn restore_default_signals() -> nix::Result<()> {
    set_disposition(SigHandler::SigDfl)
}

fn set_disposition(handler: SigHandler) -> nix::Result<()> {
    for sig in SHELL_IGNORED {
        // Only SigIgn and SigDfl are installed here, never a Rust handler.
        unsafe { signal::signal(sig, handler) }?;
    }
    Ok(())
}

/// Installs the SIGQUIT handler: print a message and exit.
///
/// Handlers installed this way revert to the default in a child at exec.
pub fn install_quit_handler() -> io::Result<()> {
    let mut signals = Signals::new([SIGQUIT])?;
    thread::Builder::new()
        .name("sigquit".into())
        .spawn(move || {
            if signals.forever().next().is_some() {
                debug!("SIGQUIT received");
                println!("Terminating after receipt of SIGQUIT signal");
                process::exit(0);
            }
        })?;
    Ok(())
}
