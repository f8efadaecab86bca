use crate::output::{print_json, print_table};
use clap::Subcommand;
use copilot_core::types::{MemoryKind, PhaseId, ProjectId};
use std::path::Path;

#[derive(Subcommand)]
pub enum MemorySubcommand {
    /// Store a memory (requirement, document, chat, note, project_summary)
    Add {
        #[arg(long)]
        project: ProjectId,
        #[arg(long)]
        phase: Option<PhaseId>,
        #[arg(long, default_value = "note")]
        kind: String,
        content: String,
    },
    /// Count stored memories by kind
    Stats {
        #[arg(long)]
        project: Option<ProjectId>,
    },
}

pub fn run(root: &Path, subcmd: MemorySubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        MemorySubcommand::Add {
            project,
            phase,
            kind,
            content,
        } => add(root, project, phase, &kind, &content, json),
        MemorySubcommand::Stats { project } => stats(root, project, json),
    }
}

fn add(
    root: &Path,
    project: ProjectId,
    phase: Option<PhaseId>,
    kind: &str,
    content: &str,
    json: bool,
) -> anyhow::Result<()> {
    let kind: MemoryKind = kind.parse()?;
    if content.trim().is_empty() {
        anyhow::bail!("memory content must not be empty");
    }
    let ws = super::open(root)?;
    let memory = ws.add_memory(project, phase, kind, content)?;

    if json {
        return print_json(&memory);
    }
    println!("Stored {} memory {}", memory.kind, memory.id);
    Ok(())
}

fn stats(root: &Path, project: Option<ProjectId>, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let stats = ws.index.stats(project)?;

    if json {
        return print_json(&stats);
    }
    println!("Total memories: {}", stats.total_memories);
    if stats.by_kind.is_empty() {
        return Ok(());
    }
    println!();
    let rows = stats
        .by_kind
        .iter()
        .map(|(kind, n)| vec![kind.clone(), n.to_string()])
        .collect();
    print_table(&["KIND", "COUNT"], rows);
    if let Some(by_project) = &stats.by_project {
        if !by_project.is_empty() {
            println!();
            let rows = by_project
                .iter()
                .map(|(pid, n)| vec![pid.to_string(), n.to_string()])
                .collect();
            print_table(&["PROJECT", "COUNT"], rows);
        }
    }
    Ok(())
}
