/// Coinload - concurrent load generator for the coin shop HTTP API.
///
/// Simulates users that register, check their balance, transfer coins to each
/// other, and buy items, then reports per-endpoint latency and success rates.
mod cli;
mod error;
mod http;
mod report;
mod simulator;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
