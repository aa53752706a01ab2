/*
 * myint.rs - interrupts itself, the way Ctrl-C would
 *
 * usage: myint <secs>
 * Sleeps for <secs> (fractions allowed) and sends SIGINT to itself.
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
        eprintln!("myint: <secs> must be a non-negative number");
        process::exit(2);
    });
    thread::sleep(Duration::from_secs_f64(secs.max(0.0)));

    if let Err(err) = signal::kill(unistd::getpid(), Signal::SIGINT) {
        eprintln!("myint: kill (int) error: {}", err);
    }

    // Only reached if SIGINT was ignored or blocked.
    process::exit(1);
}
