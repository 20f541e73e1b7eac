use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The chat endpoint answered with a non-success status
    #[error("chat endpoint returned {status}")]
    Communication { status: StatusCode },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("request task failed: {0}")]
    Task(String),
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub response: String,
}

/// The backend as seen by the controller
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_message(&self, message: &str) -> Result<ChatResponse, ApiError>;

    async fn check_health(&self) -> Result<serde_json::Value, ApiError>;
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    chat_url: String,
    health_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            chat_url: config.chat_url(),
            health_url: config.health_url(),
        }
    }
}

#[async_trait]
impl ChatApi for ApiClient {
    async fn send_message(&self, message: &str) -> Result<ChatResponse, ApiError> {
        let response = self
            .client
            .post(&self.chat_url)
            .json(&ChatRequest { message })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Communication {
                status: response.status(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn check_health(&self) -> Result<serde_json::Value, ApiError> {
        let response = self.client.get(&self.health_url).send().await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
