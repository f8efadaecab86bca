//! The completion seam between the pipeline and a language model.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use llm_client::{ChatClient, ClientConfig};

use crate::config::{Config, LlmConfig};
use crate::error::Result;

/// Text completion from an optional system prompt and one user prompt.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String>;
}

#[async_trait]
impl Completer for ChatClient {
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String> {
        Ok(ChatClient::complete(self, system, prompt).await?)
    }
}

pub fn client_config(llm: &LlmConfig) -> ClientConfig {
    ClientConfig {
        base_url: llm.base_url.clone(),
        model: llm.model.clone(),
        api_key: None,
        temperature: Some(llm.temperature),
        max_tokens: Some(llm.max_tokens),
        timeout: Duration::from_secs(llm.timeout_secs),
    }
}

/// Build the configured completer, if any.
///
/// A configured model whose API key variable is unset leaves the copilot
/// running templated-only; the problem is logged, not raised.
pub fn build_completer(config: &Config) -> Option<Arc<dyn Completer>> {
    let llm = config.llm.as_ref()?;
    let mut client_cfg = client_config(llm);
    if let Some(var) = llm.api_key_env.as_deref() {
        client_cfg = match client_cfg.with_api_key_env(var) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "language model disabled");
                return None;
            }
        };
    }
    match ChatClient::new(client_cfg) {
        Ok(client) => {
            tracing::info!(model = client.model(), "language model enabled");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "language model disabled");
            None
        }
    }
}
