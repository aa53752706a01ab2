/*
 * myspin.rs - spins in the foreground or background of jobsh
 *
 * usage: myspin <secs> [status]
 * Sleeps for <secs> (fractions allowed), then exits with [status] (default 0).
 */

use std::env;
use std::process;
use std::thread;
use std::time::Duration;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <secs> [status]", args[0]);
        process::exit(2);
    }

    let secs = args[1].parse::<f64>().unwrap_or_else(|_| {
        eprintln!("myspin: <secs> must be a non-negative number");
        process::exit(2);
    });
    let status = match args.get(2) {
        Some(raw) => raw.parse::<i32>().unwrap_or_else(|_| {
            eprintln!("myspin: [status] must be an integer");
            process::exit(2);
        }),
        None => 0,
    };

    thread::sleep(Duration::from_secs_f64(secs.max(0.0)));
    process::exit(status);
}
