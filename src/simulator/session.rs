/// A single simulated user session.
use crate::error::AppError;
use crate::http::client::{AuthOutcome, CallStatus, ShopApi};
use crate::simulator::config::SimulatorConfig;
use crate::simulator::registry::UsernameRegistry;
use std::sync::Arc;
use std::time::Instant;

/// API endpoint exercised by a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Auth,
    Info,
    SendCoin,
    BuyItem,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Auth => "auth",
            Endpoint::Info => "info",
            Endpoint::SendCoin => "sendCoin",
            Endpoint::BuyItem => "buy",
        }
    }
}

/// Result of a single request issued by a session.
#[derive(Debug, Clone)]
pub struct RequestSample {
    /// Endpoint the request targeted
    pub endpoint: Endpoint,
    /// Success status
    pub success: bool,
    /// HTTP status code, when a response was received
    pub status: Option<u16>,
    /// Latency in milliseconds
    pub latency_ms: u64,
    /// Error message (if failed)
    pub error: Option<String>,
}

/// Weighted tasks a session can run, matching the original 3/1/2 split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    GetInfo,
    SendCoin,
    BuyItem,
}

fn pick_task() -> Task {
    task_for_roll(fastrand::u32(..6))
}

// get_info:send_coin:buy_item = 3:1:2
fn task_for_roll(roll: u32) -> Task {
    match roll {
        0..=2 => Task::GetInfo,
        3 => Task::SendCoin,
        _ => Task::BuyItem,
    }
}

/// One simulated user: a generated username plus the token from its login.
pub struct UserSession<C: ShopApi> {
    client: Arc<C>,
    config: SimulatorConfig,
    registry: Arc<UsernameRegistry>,
    username: String,
    token: Option<String>,
}

impl<C: ShopApi> UserSession<C> {
    pub fn new(client: Arc<C>, config: SimulatorConfig, registry: Arc<UsernameRegistry>) -> Self {
        let username = registry.generate(config.username_length);
        Self {
            client,
            config,
            registry,
            username,
            token: None,
        }
    }

    #[allow(dead_code)]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[allow(dead_code)]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Log in once. Any handled failure leaves the session unauthenticated
    /// for its whole lifetime; there is no retry.
    pub async fn start(&mut self) -> RequestSample {
        if self.config.dry_run {
            self.token = Some("dry-run-token".to_string());
            self.registry.claim(self.username.clone());
            return dry_run_sample(Endpoint::Auth);
        }

        let start = Instant::now();
        match self
            .client
            .authenticate(&self.username, &self.config.password)
            .await
        {
            Ok(AuthOutcome::Granted { token }) => {
                self.token = Some(token);
                self.registry.claim(self.username.clone());
                RequestSample {
                    endpoint: Endpoint::Auth,
                    success: true,
                    status: Some(200),
                    latency_ms: start.elapsed().as_millis() as u64,
                    error: None,
                }
            }
            Ok(AuthOutcome::Rejected { status, body }) => {
                eprintln!(
                    "Authentication failed for {}: {} {}",
                    self.username, status, body
                );
                RequestSample {
                    endpoint: Endpoint::Auth,
                    success: false,
                    status: Some(status),
                    latency_ms: start.elapsed().as_millis() as u64,
                    error: Some(format!("auth rejected with status {}", status)),
                }
            }
            Ok(AuthOutcome::MalformedBody { status, body }) => {
                eprintln!(
                    "Failed to parse auth response for {}: {}",
                    self.username, body
                );
                RequestSample {
                    endpoint: Endpoint::Auth,
                    success: false,
                    status: Some(status),
                    latency_ms: start.elapsed().as_millis() as u64,
                    error: Some("auth response did not contain a token".to_string()),
                }
            }
            Err(e) => RequestSample {
                endpoint: Endpoint::Auth,
                success: false,
                status: None,
                latency_ms: start.elapsed().as_millis() as u64,
                error: Some(e.to_string()),
            },
        }
    }

    /// Run one weighted task. Returns None when the task's guard skipped it
    /// without issuing a request.
    pub async fn run_task(&self) -> Option<RequestSample> {
        match pick_task() {
            Task::GetInfo => self.get_info().await,
            Task::SendCoin => self.send_coin().await,
            Task::BuyItem => self.buy_item().await,
        }
    }

    async fn get_info(&self) -> Option<RequestSample> {
        let token = self.token.as_deref()?;
        if self.config.dry_run {
            return Some(dry_run_sample(Endpoint::Info));
        }

        let start = Instant::now();
        Some(match self.client.account_info(token).await {
            Ok(status) => sample_from_status(Endpoint::Info, status, start),
            Err(e) => transport_failure(Endpoint::Info, e, start),
        })
    }

    async fn send_coin(&self) -> Option<RequestSample> {
        let token = self.token.as_deref()?;
        let to_user = self.registry.random_peer(&self.username)?;
        if self.config.dry_run {
            return Some(dry_run_sample(Endpoint::SendCoin));
        }

        let start = Instant::now();
        Some(
            match self
                .client
                .send_coin(token, &to_user, self.config.send_amount)
                .await
            {
                Ok(status) => sample_from_status(Endpoint::SendCoin, status, start),
                Err(e) => transport_failure(Endpoint::SendCoin, e, start),
            },
        )
    }

    async fn buy_item(&self) -> Option<RequestSample> {
        let token = self.token.as_deref()?;
        if self.config.dry_run {
            return Some(dry_run_sample(Endpoint::BuyItem));
        }

        let start = Instant::now();
        Some(match self.client.buy_item(token, &self.config.item).await {
            Ok(status) => sample_from_status(Endpoint::BuyItem, status, start),
            Err(e) => transport_failure(Endpoint::BuyItem, e, start),
        })
    }
}

fn sample_from_status(endpoint: Endpoint, status: CallStatus, start: Instant) -> RequestSample {
    let success = status.is_success();
    RequestSample {
        endpoint,
        success,
        status: Some(status.status),
        latency_ms: start.elapsed().as_millis() as u64,
        error: if success {
            None
        } else {
            Some(format!("{} returned status {}", endpoint.as_str(), status.status))
        },
    }
}

fn transport_failure(endpoint: Endpoint, error: AppError, start: Instant) -> RequestSample {
    RequestSample {
        endpoint,
        success: false,
        status: None,
        latency_ms: start.elapsed().as_millis() as u64,
        error: Some(error.to_string()),
    }
}

fn dry_run_sample(endpoint: Endpoint) -> RequestSample {
    RequestSample {
        endpoint,
        success: true,
        status: Some(200),
        latency_ms: 0,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct MockApi {
        auth_outcomes: Mutex<VecDeque<Result<AuthOutcome, AppError>>>,
        task_status: u16,
        auth_calls: AtomicUsize,
        info_calls: AtomicUsize,
        send_calls: AtomicUsize,
        buy_calls: AtomicUsize,
        sent_to: Mutex<Vec<String>>,
    }

    impl MockApi {
        fn new(auth_outcomes: Vec<Result<AuthOutcome, AppError>>) -> Self {
            Self {
                auth_outcomes: Mutex::new(VecDeque::from(auth_outcomes)),
                task_status: 200,
                auth_calls: AtomicUsize::new(0),
                info_calls: AtomicUsize::new(0),
                send_calls: AtomicUsize::new(0),
                buy_calls: AtomicUsize::new(0),
                sent_to: Mutex::new(Vec::new()),
            }
        }

        fn task_calls(&self) -> usize {
            self.info_calls.load(Ordering::SeqCst)
                + self.send_calls.load(Ordering::SeqCst)
                + self.buy_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ShopApi for MockApi {
        async fn authenticate(
            &self,
            _username: &str,
            _password: &str,
        ) -> Result<AuthOutcome, AppError> {
            self.auth_calls.fetch_add(1, Ordering::SeqCst);
            self.auth_outcomes
                .lock()
                .expect("auth outcomes mutex poisoned")
                .pop_front()
                .unwrap_or_else(|| {
                    Ok(AuthOutcome::Granted {
                        token: "mock-token".into(),
                    })
                })
        }

        async fn account_info(&self, _token: &str) -> Result<CallStatus, AppError> {
            self.info_calls.fetch_add(1, Ordering::SeqCst);
            Ok(CallStatus {
                status: self.task_status,
            })
        }

        async fn send_coin(
            &self,
            _token: &str,
            to_user: &str,
            _amount: i64,
        ) -> Result<CallStatus, AppError> {
            self.send_calls.fetch_add(1, Ordering::SeqCst);
            self.sent_to
                .lock()
                .expect("sent_to mutex poisoned")
                .push(to_user.to_string());
            Ok(CallStatus {
                status: self.task_status,
            })
        }

        async fn buy_item(&self, _token: &str, _item: &str) -> Result<CallStatus, AppError> {
            self.buy_calls.fetch_add(1, Ordering::SeqCst);
            Ok(CallStatus {
                status: self.task_status,
            })
        }
    }

    fn test_config() -> SimulatorConfig {
        let mut config = SimulatorConfig::new(1, 1);
        config.wait_time = None;
        config
    }

    #[tokio::test]
    async fn successful_auth_stores_token_and_claims_username() {
        let client = Arc::new(MockApi::new(vec![Ok(AuthOutcome::Granted {
            token: "jwt".into(),
        })]));
        let registry = Arc::new(UsernameRegistry::new());
        let mut session = UserSession::new(client, test_config(), registry.clone());

        let sample = session.start().await;

        assert!(sample.success);
        assert_eq!(sample.endpoint, Endpoint::Auth);
        assert!(session.is_authenticated());
        assert!(registry.contains(session.username()));
    }

    #[tokio::test]
    async fn rejected_auth_leaves_session_unauthenticated() {
        let client = Arc::new(MockApi::new(vec![Ok(AuthOutcome::Rejected {
            status: 401,
            body: "{\"errors\":\"User unauthorized\"}".into(),
        })]));
        let registry = Arc::new(UsernameRegistry::new());
        let mut session = UserSession::new(client, test_config(), registry.clone());

        let sample = session.start().await;

        assert!(!sample.success);
        assert_eq!(sample.status, Some(401));
        assert!(!session.is_authenticated());
        assert!(registry.is_empty(), "failed login must not claim a username");
    }

    #[tokio::test]
    async fn malformed_auth_body_leaves_session_unauthenticated() {
        let client = Arc::new(MockApi::new(vec![Ok(AuthOutcome::MalformedBody {
            status: 200,
            body: "not json".into(),
        })]));
        let registry = Arc::new(UsernameRegistry::new());
        let mut session = UserSession::new(client, test_config(), registry);

        let sample = session.start().await;

        assert!(!sample.success);
        assert_eq!(sample.status, Some(200));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn transport_error_during_auth_is_a_failed_sample() {
        let client = Arc::new(MockApi::new(vec![Err(AppError::Http(
            "connection refused".into(),
        ))]));
        let registry = Arc::new(UsernameRegistry::new());
        let mut session = UserSession::new(client, test_config(), registry);

        let sample = session.start().await;

        assert!(!sample.success);
        assert_eq!(sample.status, None);
        assert!(sample.error.as_deref().unwrap().contains("connection refused"));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn unauthenticated_session_never_issues_requests() {
        let client = Arc::new(MockApi::new(vec![Ok(AuthOutcome::Rejected {
            status: 500,
            body: "boom".into(),
        })]));
        let registry = Arc::new(UsernameRegistry::new());
        registry.claim("peer".to_string());
        let mut session = UserSession::new(client.clone(), test_config(), registry);

        session.start().await;
        for _ in 0..30 {
            assert!(session.run_task().await.is_none());
        }

        assert_eq!(client.task_calls(), 0);
    }

    #[tokio::test]
    async fn send_coin_skips_without_claimed_peers() {
        let client = Arc::new(MockApi::new(Vec::new()));
        let registry = Arc::new(UsernameRegistry::new());
        let session = UserSession {
            client: client.clone(),
            config: test_config(),
            registry,
            username: "me".to_string(),
            token: Some("jwt".to_string()),
        };

        assert!(session.send_coin().await.is_none());
        assert_eq!(client.send_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn send_coin_targets_a_claimed_peer() {
        let client = Arc::new(MockApi::new(Vec::new()));
        let registry = Arc::new(UsernameRegistry::new());
        registry.claim("me".to_string());
        registry.claim("peer1".to_string());
        let session = UserSession {
            client: client.clone(),
            config: test_config(),
            registry,
            username: "me".to_string(),
            token: Some("jwt".to_string()),
        };

        let sample = session.send_coin().await.expect("task should fire");

        assert!(sample.success);
        assert_eq!(sample.endpoint, Endpoint::SendCoin);
        let sent_to = client.sent_to.lock().unwrap();
        assert_eq!(sent_to.as_slice(), ["peer1"]);
    }

    #[tokio::test]
    async fn task_failures_record_the_http_status() {
        let mut client = MockApi::new(Vec::new());
        client.task_status = 500;
        let client = Arc::new(client);
        let registry = Arc::new(UsernameRegistry::new());
        let session = UserSession {
            client,
            config: test_config(),
            registry,
            username: "me".to_string(),
            token: Some("jwt".to_string()),
        };

        let sample = session.get_info().await.expect("task should fire");

        assert!(!sample.success);
        assert_eq!(sample.status, Some(500));
        assert!(sample.error.as_deref().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn dry_run_session_avoids_network_calls() {
        let client = Arc::new(MockApi::new(Vec::new()));
        let registry = Arc::new(UsernameRegistry::new());
        let mut config = test_config();
        config.dry_run = true;
        let mut session = UserSession::new(client.clone(), config, registry);

        let auth = session.start().await;
        assert!(auth.success);
        assert!(session.is_authenticated());

        for _ in 0..10 {
            let sample = session.run_task().await.expect("dry run tasks always fire");
            assert!(sample.success);
        }

        assert_eq!(client.auth_calls.load(Ordering::SeqCst), 0);
        assert_eq!(client.task_calls(), 0);
    }

    #[test]
    fn task_weights_follow_the_three_one_two_split() {
        let picks: Vec<Task> = (0..6).map(task_for_roll).collect();
        assert_eq!(picks.iter().filter(|t| **t == Task::GetInfo).count(), 3);
        assert_eq!(picks.iter().filter(|t| **t == Task::SendCoin).count(), 1);
        assert_eq!(picks.iter().filter(|t| **t == Task::BuyItem).count(), 2);
    }

    #[test]
    fn pick_task_covers_every_weighted_task() {
        let mut seen_info = false;
        let mut seen_send = false;
        let mut seen_buy = false;
        for _ in 0..600 {
            match pick_task() {
                Task::GetInfo => seen_info = true,
                Task::SendCoin => seen_send = true,
                Task::BuyItem => seen_buy = true,
            }
        }
        assert!(seen_info && seen_send && seen_buy);
    }
}
