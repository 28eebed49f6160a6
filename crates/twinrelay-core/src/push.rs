//! Push provider seam and the Expo push API client.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use twinrelay_types::{PushMessage, PushResponse, PushTicket};

pub const DEFAULT_EXPO_ENDPOINT: &str = "https://exp.host/--/api/v2/push/send";

/// Push provider error types.
#[derive(Error, Debug)]
pub enum PushError {
    #[error("Invalid push token: {0}")]
    InvalidToken(String),

    #[error("Push request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Push provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse push response: {0}")]
    Decode(String),

    #[error("Push provider error: {code} - {message}")]
    Api { code: String, message: String },

    #[error("Push provider returned no tickets")]
    NoTickets,
}

/// External push-notification provider.
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Publish one message and return a ticket per recipient.
    async fn publish(&self, message: &PushMessage) -> Result<Vec<PushTicket>, PushError>;
}

/// Whether `token` looks like an Expo push token.
pub fn is_expo_push_token(token: &str) -> bool {
    (token.starts_with("ExponentPushToken[") || token.starts_with("ExpoPushToken["))
        && token.ends_with(']')
}

/// Client for the Expo push service.
pub struct ExpoPushClient {
    endpoint: String,
    access_token: Option<String>,
    http_client: reqwest::Client,
}

impl ExpoPushClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `endpoint` - send endpoint URL
    /// * `access_token` - optional bearer token for enhanced push security
    /// * `timeout` - per-request timeout
    pub fn new(
        endpoint: impl Into<String>,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PushError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            access_token,
            http_client,
        })
    }
}

#[async_trait]
impl PushProvider for ExpoPushClient {
    async fn publish(&self, message: &PushMessage) -> Result<Vec<PushTicket>, PushError> {
        if let Some(bad) = message.to.iter().find(|t| !is_expo_push_token(t)) {
            return Err(PushError::InvalidToken(bad.clone()));
        }

        let mut request = self
            .http_client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .json(&[message]);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(PushError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(&body)
    }
}

/// Decode a send-endpoint body into tickets.
fn parse_response(body: &str) -> Result<Vec<PushTicket>, PushError> {
    let parsed: PushResponse =
        serde_json::from_str(body).map_err(|e| PushError::Decode(e.to_string()))?;

    if let Some(err) = parsed.errors.into_iter().next() {
        return Err(PushError::Api {
            code: err.code,
            message: err.message,
        });
    }
    if parsed.data.is_empty() {
        return Err(PushError::NoTickets);
    }
    Ok(parsed.data)
}
