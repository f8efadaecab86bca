use crate::output::print_json;
use anyhow::Context;
use copilot_core::{paths, Workspace};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let outcome = Workspace::init(root)
        .with_context(|| format!("failed to initialize {}", root.display()))?;

    if json {
        return print_json(&serde_json::json!({
            "root": root,
            "created_config": outcome.created_config,
        }));
    }

    println!("Initializing copilot in: {}", root.display());
    let verb = if outcome.created_config {
        "created:"
    } else {
        "exists: "
    };
    println!("  {verb} {}", paths::CONFIG_FILE);
    println!("  ready:   {}", paths::ARTIFACTS_DB);
    println!("  ready:   {}", paths::MEMORIES_DB);
    Ok(())
}
