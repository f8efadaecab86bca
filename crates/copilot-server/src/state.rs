use std::path::{Path, PathBuf};
use std::sync::Arc;

use copilot_core::{ChatService, Result, Workspace};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub workspace: Arc<Workspace>,
    pub chat: Arc<ChatService>,
}

impl AppState {
    /// Open the workspace at `root` and build the chat service once.
    pub fn open(root: &Path) -> Result<Self> {
        let workspace = Workspace::open(root)?;
        let chat = workspace.chat_service();
        Ok(Self {
            root: root.to_path_buf(),
            workspace: Arc::new(workspace),
            chat: Arc::new(chat),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copilot_core::CopilotError;

    #[test]
    fn open_requires_init() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            AppState::open(dir.path()),
            Err(CopilotError::NotInitialized)
        ));
        Workspace::init(dir.path()).unwrap();
        let state = AppState::open(dir.path()).unwrap();
        assert_eq!(state.root, dir.path());
        assert!(!state.chat.llm_enabled());
    }
}
