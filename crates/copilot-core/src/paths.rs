use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const COPILOT_DIR: &str = ".copilot";
pub const CONFIG_FILE: &str = ".copilot/config.yaml";
pub const ARTIFACTS_DB: &str = ".copilot/artifacts.redb";
pub const MEMORIES_DB: &str = ".copilot/memories.redb";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn copilot_dir(root: &Path) -> PathBuf {
    root.join(COPILOT_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn artifacts_db_path(root: &Path) -> PathBuf {
    root.join(ARTIFACTS_DB)
}

pub fn memories_db_path(root: &Path) -> PathBuf {
    root.join(MEMORIES_DB)
}

pub fn is_initialized(root: &Path) -> bool {
    config_path(root).exists()
}
