use std::time::Duration;

use crate::types::{ChatMessage, CompletionRequest, CompletionResponse};
use crate::{LlmError, Result};

// ─── ClientConfig ─────────────────────────────────────────────────────────

/// Connection and sampling settings for a [`ChatClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL up to and including the API version, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub model: String,
    /// Sent as a bearer token when present. Local gateways often need none.
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            temperature: Some(0.5),
            max_tokens: Some(4000),
            timeout: Duration::from_secs(60),
        }
    }
}

impl ClientConfig {
    /// Resolve `api_key` from the environment variable `var`.
    ///
    /// Returns [`LlmError::MissingApiKey`] when the variable is unset or empty.
    pub fn with_api_key_env(mut self, var: &str) -> Result<Self> {
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => {
                self.api_key = Some(key);
                Ok(self)
            }
            _ => Err(LlmError::MissingApiKey(var.to_string())),
        }
    }
}

// ─── ChatClient ───────────────────────────────────────────────────────────

/// Thin async client over `POST {base_url}/chat/completions`.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Single-turn completion: optional system prompt plus one user prompt.
    /// Returns the trimmed text of the first choice.
    pub async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(sp) = system {
            messages.push(ChatMessage::system(sp));
        }
        messages.push(ChatMessage::user(prompt));
        let response = self.send(messages).await?;
        response
            .first_text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyResponse)
    }

    /// Send an arbitrary message list and return the decoded response.
    pub async fn send(&self, messages: Vec<ChatMessage>) -> Result<CompletionResponse> {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let mut builder = self.http.post(&url).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        tracing::debug!(model = %self.config.model, %url, "sending completion request");
        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "completion request failed");
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&body).map_err(|source| LlmError::Parse { body, source })?;
        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion finished"
            );
        }
        Ok(parsed)
    }
}
