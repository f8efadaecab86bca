//! `llm-client`: async driver for OpenAI-compatible chat completion APIs.
//!
//! The copilot consumes a language model only as an opaque
//! `complete(prompt) -> text` capability. This crate implements that
//! capability against any server that speaks the `/chat/completions`
//! protocol (OpenAI, Azure-style gateways, vLLM, Ollama's OpenAI shim).
//!
//! # Architecture
//!
//! ```text
//! ClientConfig
//!     │
//!     ▼
//! ChatClient      ← holds a pooled reqwest::Client + resolved API key
//!     │              POST {base_url}/chat/completions
//!     ▼
//! CompletionResponse → first choice's message content
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use llm_client::{ChatClient, ClientConfig};
//!
//! let client = ChatClient::new(ClientConfig {
//!     api_key: Some(std::env::var("OPENAI_API_KEY")?),
//!     ..Default::default()
//! })?;
//! let text = client.complete(Some("You are terse."), "Say hello.").await?;
//! ```

pub mod client;
pub mod error;
pub mod types;


pub use client::{ChatClient, ClientConfig};
pub use error::LlmError;
pub use types::{ChatMessage, CompletionRequest, CompletionResponse, Role, TokenUsage};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, LlmError>;
