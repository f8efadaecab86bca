use crate::output::print_json;
use copilot_core::types::{PhaseId, ProjectId};
use copilot_core::ChatRequest;
use std::path::Path;

pub fn run(
    root: &Path,
    query: &str,
    project: Option<ProjectId>,
    phase: Option<PhaseId>,
    json: bool,
) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let chat = ws.chat_service();
    let request = match project {
        Some(project_id) => ChatRequest::project(query, project_id, phase),
        None => ChatRequest::dashboard(query),
    };

    // The recording is awaited so it lands before the process exits.
    let response = super::runtime()?.block_on(chat.handle_inline(request))?;

    if json {
        return print_json(&response);
    }
    println!("{}", response.response);
    println!();
    let sources: Vec<&str> = response.sources.iter().map(|s| s.as_str()).collect();
    println!(
        "[{} | confidence {} | sources: {}]",
        response.intent,
        response.confidence_score,
        sources.join(", ")
    );
    Ok(())
}
