// CLASSIFICATION: COMMUNITY
// Filename: main.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

//! Entry point for the `devboot` binary.

use devboot::cli;

fn main() {
    env_logger::init();
    if let Err(err) = cli::run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
