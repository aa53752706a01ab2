/*
 * mystop.rs - stops its own process group, the way Ctrl-Z would
 *
 * usage: mystop <secs>
 * Sleeps for <secs> (fractions allowed), sends SIGTSTP to its process group,
 * and exits 0 once it is continued.
 */

use nix::sys::signal::{self, Signal};
use nix::unistd;
use std::env;
use std::process;
use std::thread;
use std::time::Duration;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <secs>", args[0]);
        process::exit(2);
    }

    let secs = args[1].parse::<f64>().unwrap_or_else(|_| {
        eprintln!("mystop: <secs> must be a non-negative number");
        process::exit(2);
    });
    thread::sleep(Duration::from_secs_f64(secs.max(0.0)));

    // Negative pid: the whole group, which jobsh made this process the leader of.
    let group = unistd::Pid::from_raw(-unistd::getpgrp().as_raw());
    if let Err(err) = signal::kill(group, Signal::SIGTSTP) {
        eprintln!("mystop: kill (tstp) error: {}", err);
        process::exit(1);
    }

    process::exit(0);
}
