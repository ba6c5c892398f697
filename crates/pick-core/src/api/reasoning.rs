//! Reasoning judgment client.
//!
//! Sends a structured analysis prompt to the external LLM service and
//! returns its raw text output. The caller owns parsing; output from this
//! service is untrusted and may be malformed.

use crate::config::ReasoningConfig;
use crate::rate_limit::RateLimiter;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration as StdDuration;

/// Rate-limiter key for the reasoning service.
pub const REASONING_SERVICE: &str = "reasoning";

/// Produces a judgment text for an analysis prompt.
#[async_trait]
pub trait Judge: Send + Sync {
    async fn judge(&self, prompt: &str) -> Result<String>;
}

/// HTTP client for an Anthropic-style messages endpoint.
pub struct ReasoningClient {
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
}

impl ReasoningClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";

    /// Fails when no API key is configured; the scorer is a write-mode
    /// operation and must not start without credentials.
    pub fn from_config(config: &ReasoningConfig, rate_limiter: Arc<RateLimiter>) -> Result<Self> {
        let api_key = config.require_key()?.to_string();
        let http_client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(60))
            .connect_timeout(StdDuration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Ok(Self {
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string()),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            http_client,
            rate_limiter,
        })
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl Judge for ReasoningClient {
    async fn judge(&self, prompt: &str) -> Result<String> {
        self.rate_limiter.wait(REASONING_SERVICE).await;

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Api {
                message: format!("Reasoning service error: {}", response.status()),
                status: Some(response.status().as_u16()),
            });
        }

        let body: MessagesResponse = response.json().await?;
        let text = body
            .content
            .first()
            .map(|block| block.text.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::Judgment("Empty judgment response".to_string()));
        }

        Ok(text)
    }
}
