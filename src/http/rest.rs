/// reqwest-backed implementation of the coin shop API client.
use crate::error::AppError;
use crate::http::client::{AuthOutcome, CallStatus, ClientConfig, ShopApi};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// REST client for the coin shop API.
pub struct RestClient {
    client: Client,
    config: ClientConfig,
}

impl RestClient {
    /// Create a new REST client.
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }
}

#[async_trait::async_trait]
impl ShopApi for RestClient {
    async fn authenticate(&self, username: &str, password: &str) -> Result<AuthOutcome, AppError> {
        let request = AuthRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self
            .client
            .post(self.url("/api/auth"))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Http(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Ok(AuthOutcome::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        match serde_json::from_str::<AuthResponse>(&body) {
            Ok(AuthResponse { token: Some(token) }) => Ok(AuthOutcome::Granted { token }),
            _ => Ok(AuthOutcome::MalformedBody {
                status: status.as_u16(),
                body,
            }),
        }
    }

    async fn account_info(&self, token: &str) -> Result<CallStatus, AppError> {
        let response = self
            .client
            .get(self.url("/api/info"))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| AppError::Http(format!("Request failed: {}", e)))?;

        Ok(CallStatus {
            status: response.status().as_u16(),
        })
    }

    async fn send_coin(
        &self,
        token: &str,
        to_user: &str,
        amount: i64,
    ) -> Result<CallStatus, AppError> {
        let request = SendCoinRequest {
            to_user: to_user.to_string(),
            amount,
        };

        let response = self
            .client
            .post(self.url("/api/sendCoin"))
            .header("Authorization", format!("Bearer {}", token))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Http(format!("Request failed: {}", e)))?;

        Ok(CallStatus {
            status: response.status().as_u16(),
        })
    }

    async fn buy_item(&self, token: &str, item: &str) -> Result<CallStatus, AppError> {
        let response = self
            .client
            .get(self.url(&format!("/api/buy/{}", item)))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| AppError::Http(format!("Request failed: {}", e)))?;

        Ok(CallStatus {
            status: response.status().as_u16(),
        })
    }
}

#[derive(Debug, Serialize)]
struct AuthRequest {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize, Default)]
struct AuthResponse {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendCoinRequest {
    #[serde(rename = "toUser")]
    to_user: String,
    amount: i64,
}
