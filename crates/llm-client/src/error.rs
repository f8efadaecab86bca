use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse completion response: {source}\n  body: {body}")]
    Parse {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("completion response contained no message content")]
    EmptyResponse,

    #[error("no API key configured (set {0})")]
    MissingApiKey(String),
}
