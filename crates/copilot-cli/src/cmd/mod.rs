pub mod analyze;
pub mod approvals;
pub mod ask;
pub mod doc;
pub mod init;
pub mod memory;
pub mod phase;
pub mod project;
pub mod serve;

use anyhow::Context;
use copilot_core::Workspace;
use std::path::Path;

/// Open the workspace, pointing at `copilot init` when it is missing.
pub fn open(root: &Path) -> anyhow::Result<Workspace> {
    Workspace::open(root).with_context(|| format!("failed to open {}", root.display()))
}

/// Current-thread runtime for commands that await the pipeline.
pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}
