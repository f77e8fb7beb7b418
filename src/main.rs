//! civiq CLI entry point.
//!
//! All logic lives in the cli module; this only dispatches and sets
//! the exit code.

use civiq::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
