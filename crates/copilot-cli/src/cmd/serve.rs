use anyhow::Context;
use copilot_core::config::Config;
use std::path::Path;

pub fn run(root: &Path, port: Option<u16>) -> anyhow::Result<()> {
    let port = match port {
        Some(p) => p,
        None => {
            Config::load(root)
                .with_context(|| format!("failed to load config from {}", root.display()))?
                .server
                .port
        }
    };
    let rt = tokio::runtime::Runtime::new()?;
    let root = root.to_path_buf();

    rt.block_on(async move {
        tokio::select! {
            res = copilot_server::serve(&root, port) => res,
            _ = tokio::signal::ctrl_c() => Ok(()),
        }
    })
}
