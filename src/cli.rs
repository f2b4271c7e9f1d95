/// CLI argument parsing and command execution.
use crate::error::AppError;
use crate::http::client::ClientConfig;
use crate::http::rest::RestClient;
use crate::report::Summary;
use crate::simulator::config::SimulatorConfig;
use crate::simulator::simulator::Simulator;
use clap::{Parser, ValueEnum};
use std::sync::Arc;
use std::time::Duration;

/// Coinload - concurrent load generator for the coin shop API.
#[derive(Parser, Debug)]
#[command(name = "coinload")]
#[command(about = "Simulate concurrent users against the coin shop HTTP API")]
#[command(
    long_about = r#"Coinload - concurrent load generator for the coin shop API

Each simulated user registers itself with a random username via POST /api/auth,
then repeatedly runs one of three weighted tasks:
  - fetch account info (GET /api/info), weight 3
  - transfer coins to a random already-registered user (POST /api/sendCoin), weight 1
  - buy an item (GET /api/buy/<item>), weight 2

A user whose login fails stays idle for the rest of the run; there is no retry.

EXAMPLES:
  # 50 users, 200 tasks each, against a local server
  coinload --target http://localhost:8080 --users 50 --iterations 200

  # Randomized pacing and machine-readable output
  coinload --target http://localhost:8080 --wait-time 250-750ms --format json

  # Check the configuration without sending requests
  coinload --target http://localhost:8080 --dry-run"#
)]
#[command(version)]
pub struct Cli {
    /// Base URL of the target API (e.g. http://localhost:8080)
    #[arg(short, long)]
    pub target: String,

    /// Number of concurrent simulated users
    #[arg(short, long, default_value = "10")]
    pub users: usize,

    /// Weighted tasks each user runs after logging in
    #[arg(short, long, default_value = "100")]
    pub iterations: usize,

    /// Wait time between tasks (e.g. "1s" or "250-750ms")
    #[arg(short, long, default_value = "1s")]
    pub wait_time: String,

    /// Length of generated usernames
    #[arg(long, default_value = "8")]
    pub username_length: usize,

    /// Password sent with every login
    #[arg(long, default_value = "password")]
    pub password: String,

    /// Coins sent per transfer
    #[arg(long, default_value = "10")]
    pub amount: i64,

    /// Item bought by the purchase task
    #[arg(long, default_value = "pen")]
    pub item: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Plan the run without making API calls
    #[arg(long)]
    pub dry_run: bool,
}

/// Output format options.
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
    /// CSV output
    Csv,
}

impl Cli {
    /// Execute the CLI command.
    pub fn run(self) -> Result<(), AppError> {
        let mut config = SimulatorConfig::new(self.users, self.iterations);
        config.username_length = self.username_length;
        config.password = self.password.clone();
        config.send_amount = self.amount;
        config.item = self.item.clone();
        config.timeout = Duration::from_secs(self.timeout);
        config.dry_run = self.dry_run;
        config.wait_time =
            Some(SimulatorConfig::parse_wait_time(&self.wait_time).map_err(AppError::Config)?);
        config.validate().map_err(AppError::Config)?;

        let client_config = ClientConfig {
            base_url: self.target.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        };
        let client = Arc::new(RestClient::new(client_config)?);

        if self.dry_run {
            eprintln!("Dry run mode: no API calls will be made");
        } else {
            eprintln!(
                "Starting load test against {} with {} users x {} iterations",
                self.target, self.users, self.iterations
            );
        }

        let simulator = Simulator::new(config);

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| AppError::Config(format!("Failed to create async runtime: {}", e)))?;

        // One bar tick per iteration, plus the login each user performs first.
        let progress_bar = if !self.dry_run {
            let total = (self.users * (self.iterations + 1)) as u64;
            let pb = indicatif::ProgressBar::new(total);
            pb.set_style(
                indicatif::ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
                    .expect("valid progress bar template")
                    .progress_chars("#>-"),
            );
            pb.set_message("Starting load test...");
            Some(Arc::new(pb))
        } else {
            None
        };

        let samples = rt.block_on(simulator.run_with_progress(client, progress_bar))?;

        let summary = Summary::from_samples(&samples);
        match self.format {
            OutputFormat::Text => println!("{}", summary.render_text()),
            OutputFormat::Json => println!("{}", summary.render_json()?),
            OutputFormat::Csv => print!("{}", summary.render_csv()),
        }

        Ok(())
    }
}
