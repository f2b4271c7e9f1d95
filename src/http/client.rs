/// Client abstraction for the coin shop API.
use crate::error::AppError;
use std::time::Duration;

/// Outcome of an authentication attempt that completed at the HTTP level.
///
/// Transport failures (connect errors, timeouts) are reported as
/// `AppError::Http` instead; these three variants cover every response the
/// server actually produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Success response carrying a token.
    Granted { token: String },
    /// Non-success status; the body is kept for logging.
    Rejected { status: u16, body: String },
    /// Success status whose body did not parse as `{"token": ...}`.
    MalformedBody { status: u16, body: String },
}

/// Status of a fire-and-forget API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallStatus {
    pub status: u16,
}

impl CallStatus {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for coin shop API clients.
#[async_trait::async_trait]
pub trait ShopApi: Send + Sync {
    /// Log in (registering the user on first sight) and obtain a bearer token.
    async fn authenticate(&self, username: &str, password: &str) -> Result<AuthOutcome, AppError>;

    /// Fetch the account info of the authenticated user.
    async fn account_info(&self, token: &str) -> Result<CallStatus, AppError>;

    /// Transfer `amount` coins to another user.
    async fn send_coin(&self, token: &str, to_user: &str, amount: i64)
        -> Result<CallStatus, AppError>;

    /// Buy an item from the shop by name.
    async fn buy_item(&self, token: &str, item: &str) -> Result<CallStatus, AppError>;
}

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the target API, without a trailing slash
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}
