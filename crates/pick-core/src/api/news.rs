//! News context lookup.
//!
//! Best-effort enrichment for the conviction prompt: returns a short text
//! digest for a market question, or an empty string on any failure. Never
//! blocks pipeline progress.

use crate::config::NewsConfig;
use crate::rate_limit::RateLimiter;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::warn;

/// Rate-limiter key for the news service.
pub const NEWS_SERVICE: &str = "news";

#[async_trait]
pub trait NewsContext: Send + Sync {
    /// Short news digest for a market question; empty on any failure.
    async fn context(&self, question: &str) -> String;
}

/// HTTP client for a chat-completions style news service.
pub struct NewsClient {
    api_key: Option<String>,
    base_url: String,
    model: String,
    max_tokens: u32,
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
}

impl NewsClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.perplexity.ai";

    const SYSTEM_PROMPT: &'static str = "Provide brief, factual news context relevant to this \
        prediction market question. Focus on recent developments that could affect the outcome. \
        Be concise (max 200 words).";

    pub fn from_config(config: &NewsConfig, rate_limiter: Arc<RateLimiter>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(15))
            .connect_timeout(StdDuration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            api_key: config.api_key.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string()),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            http_client,
            rate_limiter,
        }
    }

    async fn fetch(&self, api_key: &str, question: &str) -> Option<String> {
        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage<'a>>,
            max_tokens: u32,
        }

        #[derive(Serialize)]
        struct ChatMessage<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMessage,
        }

        #[derive(Deserialize)]
        struct ChoiceMessage {
            content: String,
        }

        self.rate_limiter.wait(NEWS_SERVICE).await;

        let user_prompt = format!("What are the latest developments relevant to: {}", question);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: Self::SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            max_tokens: self.max_tokens,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        let body: ChatResponse = response.json().await.ok()?;
        body.choices.into_iter().next().map(|c| c.message.content)
    }
}

#[async_trait]
impl NewsContext for NewsClient {
    async fn context(&self, question: &str) -> String {
        let Some(api_key) = self.api_key.clone() else {
            return String::new();
        };

        match self.fetch(&api_key, question).await {
            Some(digest) => digest,
            None => {
                warn!(question = question, "News context lookup failed");
                String::new()
            }
        }
    }
}
