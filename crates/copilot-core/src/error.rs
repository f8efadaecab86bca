use thiserror::Error;

#[derive(Debug, Error)]
pub enum CopilotError {
    #[error("not initialized: run 'copilot init'")]
    NotInitialized,

    #[error("project not found: {0}")]
    ProjectNotFound(u64),

    #[error("phase not found: {0}")]
    PhaseNotFound(u64),

    #[error("phase {phase_id} does not belong to project {project_id}")]
    PhaseOutsideProject { phase_id: u64, project_id: u64 },

    #[error("invalid scope: {0}")]
    InvalidScope(String),

    #[error("invalid status '{0}'")]
    InvalidStatus(String),

    #[error("invalid phase number {0}: expected 1-6")]
    InvalidPhaseNumber(u8),

    #[error("invalid memory kind '{0}'")]
    InvalidMemoryKind(String),

    #[error("invalid document kind '{0}': expected prd or brd")]
    InvalidDocumentKind(String),

    #[error("invalid severity '{0}': expected high, medium or low")]
    InvalidSeverity(String),

    #[error("artifact store error: {0}")]
    Store(String),

    #[error("memory index error: {0}")]
    Index(String),

    #[error("background task failed: {0}")]
    Join(String),

    #[error(transparent)]
    Llm(#[from] llm_client::LlmError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CopilotError>;
