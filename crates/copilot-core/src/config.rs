use crate::error::{CopilotError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Hard ceiling on semantic snippets per query, whatever the config says.
pub const MAX_SNIPPETS: usize = 5;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// RetrievalConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_snippet_limit")]
    pub snippet_limit: usize,
    /// Cumulative character budget for snippets (about 4 chars per token).
    #[serde(default = "default_snippet_char_budget")]
    pub snippet_char_budget: usize,
}

fn default_snippet_limit() -> usize {
    MAX_SNIPPETS
}

fn default_snippet_char_budget() -> usize {
    8000
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            snippet_limit: default_snippet_limit(),
            snippet_char_budget: default_snippet_char_budget(),
        }
    }
}

impl RetrievalConfig {
    pub fn effective_limit(&self) -> usize {
        self.snippet_limit.min(MAX_SNIPPETS)
    }
}

// ---------------------------------------------------------------------------
// RecordingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key. `None` sends no key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> Option<String> {
    Some("OPENAI_API_KEY".to_string())
}

fn default_temperature() -> f32 {
    0.5
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    /// Absent means no language model: every reply is templated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmConfig>,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            retrieval: RetrievalConfig::default(),
            recording: RecordingConfig::default(),
            llm: None,
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        if !paths::is_initialized(root) {
            return Err(CopilotError::NotInitialized);
        }
        let data = std::fs::read_to_string(paths::config_path(root))?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.retrieval.snippet_limit > MAX_SNIPPETS {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "retrieval.snippet_limit {} exceeds the maximum of {MAX_SNIPPETS}; \
                     {MAX_SNIPPETS} will be used",
                    self.retrieval.snippet_limit
                ),
            });
        }

        if self.retrieval.snippet_char_budget == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "retrieval.snippet_char_budget is 0: no snippets will reach replies"
                    .to_string(),
            });
        }

        if let Some(llm) = &self.llm {
            if llm.base_url.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "llm.base_url is empty".to_string(),
                });
            }
            if llm.model.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "llm.model is empty".to_string(),
                });
            }
            if !(0.0..=2.0).contains(&llm.temperature) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "llm.temperature {} is outside 0.0-2.0",
                        llm.temperature
                    ),
                });
            }
        }

        if self.server.port == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "server.port is 0: an ephemeral port will be chosen".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
