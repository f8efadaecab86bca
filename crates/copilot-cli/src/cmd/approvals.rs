use crate::output::{print_json, print_table};
use std::path::Path;

/// List phases waiting for sign-off.
pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let pending = super::runtime()?.block_on(ws.pending_approvals())?;

    if json {
        return print_json(&pending);
    }
    if pending.is_empty() {
        println!("No phases are waiting for approval.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = pending
        .iter()
        .map(|p| {
            vec![
                p.phase_id.to_string(),
                p.project_name.clone(),
                format!("{}. {}", p.phase_number, p.phase_name),
                p.submitted_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();
    print_table(&["PHASE ID", "PROJECT", "PHASE", "SUBMITTED"], rows);
    println!("\nApprove or reject with: copilot phase set-status <PHASE ID> approved|rejected");
    Ok(())
}
