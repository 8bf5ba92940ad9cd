//! scaffold-gate - Generation governance for scaffolded services
//!
//! Classifies project maturity, resolves service names, and gates generated
//! source against per-level quality thresholds.

use clap::Parser;
use scaffold_gate::cli;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit code for configuration errors, bad input and cancellation.
const EXIT_ERROR: i32 = 2;

fn main() {
    // Parse CLI args first so --log-level can seed the filter
    let cli = cli::Cli::parse();

    // Initialize logging; RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("scaffold_gate={}", cli.log_level)));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();

    match cli::run(cli) {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(EXIT_ERROR);
        }
    }
}
