/// Simulator configuration.
use std::time::Duration;

/// Wait time range applied between tasks, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTime {
    pub min_ms: u64,
    pub max_ms: u64,
}

/// Load testing simulator configuration.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Number of concurrent simulated users
    pub users: usize,
    /// Weighted tasks each user runs after logging in
    pub iterations: usize,
    /// Wait time between tasks (None runs tasks back to back)
    pub wait_time: Option<WaitTime>,
    /// Length of generated usernames
    pub username_length: usize,
    /// Password sent with every login
    pub password: String,
    /// Coins sent per transfer
    pub send_amount: i64,
    /// Item bought by the purchase task
    pub item: String,
    /// Request timeout
    pub timeout: Duration,
    /// Skip network calls and produce synthetic results
    pub dry_run: bool,
}

impl SimulatorConfig {
    /// Create a new configuration with the original script's defaults.
    pub fn new(users: usize, iterations: usize) -> Self {
        Self {
            users,
            iterations,
            wait_time: Some(WaitTime {
                min_ms: 1000,
                max_ms: 1000,
            }),
            username_length: 8,
            password: "password".to_string(),
            send_amount: 10,
            item: "pen".to_string(),
            timeout: Duration::from_secs(30),
            dry_run: false,
        }
    }

    /// Check the configuration for values the simulator cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.users == 0 {
            return Err("At least one simulated user is required".to_string());
        }
        if self.iterations == 0 {
            return Err("At least one iteration per user is required".to_string());
        }
        if self.username_length == 0 {
            return Err("Username length must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Parse a wait time string like "500ms", "1s", or "250-750ms".
    pub fn parse_wait_time(input: &str) -> Result<WaitTime, String> {
        let trimmed = input.trim();
        let (number_part, unit_ms) = if let Some(stripped) = trimmed.strip_suffix("ms") {
            (stripped, 1)
        } else if let Some(stripped) = trimmed.strip_suffix('s') {
            (stripped, 1000)
        } else {
            return Err(format!(
                "Invalid wait time '{}': expected an 'ms' or 's' suffix",
                trimmed
            ));
        };

        let mut parts = number_part.splitn(2, '-');
        let min: u64 = parts
            .next()
            .unwrap_or("")
            .trim()
            .parse()
            .map_err(|_| format!("Invalid wait time '{}'", trimmed))?;
        let max: u64 = match parts.next() {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| format!("Invalid wait time '{}'", trimmed))?,
            None => min,
        };

        if max < min {
            return Err(format!(
                "Invalid wait time '{}': range maximum is below the minimum",
                trimmed
            ));
        }

        let min_ms = min
            .checked_mul(unit_ms)
            .ok_or_else(|| format!("Invalid wait time '{}'", trimmed))?;
        let max_ms = max
            .checked_mul(unit_ms)
            .ok_or_else(|| format!("Invalid wait time '{}'", trimmed))?;

        Ok(WaitTime { min_ms, max_ms })
    }
}
