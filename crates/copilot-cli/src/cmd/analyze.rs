use crate::output::{print_json, print_table, truncate};
use anyhow::{bail, Context};
use clap::Subcommand;
use copilot_core::types::{PhaseId, ProjectId};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum AnalyzeSubcommand {
    /// Extract user-story requirements from text into phase 1
    Requirements {
        #[arg(long)]
        project: ProjectId,
        /// Requirement text
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        /// Read the requirement text from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Derive risks from the project's requirements and record them on a phase
    Risks { phase: PhaseId },
}

pub fn run(root: &Path, subcmd: AnalyzeSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        AnalyzeSubcommand::Requirements {
            project,
            text,
            file,
        } => requirements(root, project, text, file, json),
        AnalyzeSubcommand::Risks { phase } => risks(root, phase, json),
    }
}

fn requirements(
    root: &Path,
    project: ProjectId,
    text: Option<String>,
    file: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => bail!("provide --text or --file"),
    };
    let ws = super::open(root)?;
    let extracted = super::runtime()?.block_on(ws.extract_requirements(project, &text))?;

    if json {
        return print_json(&extracted);
    }
    if extracted.items.is_empty() {
        println!("No requirements found.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = extracted
        .items
        .iter()
        .map(|r| {
            vec![
                truncate(&r.feature, 40),
                r.priority.clone(),
                truncate(&r.user_story(), 60),
            ]
        })
        .collect();
    print_table(&["FEATURE", "PRIORITY", "USER STORY"], rows);
    note_fallback(extracted.fallback);
    Ok(())
}

fn risks(root: &Path, phase: PhaseId, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let analyzed = super::runtime()?.block_on(ws.analyze_risks(phase))?;

    if json {
        return print_json(&analyzed);
    }
    if analyzed.items.is_empty() {
        println!("No new risks for phase {phase}.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = analyzed
        .items
        .iter()
        .map(|r| {
            vec![
                truncate(&r.risk, 50),
                r.severity.to_string(),
                truncate(r.mitigation.as_deref().unwrap_or("TBD"), 60),
            ]
        })
        .collect();
    print_table(&["RISK", "SEVERITY", "MITIGATION"], rows);
    note_fallback(analyzed.fallback);
    Ok(())
}

fn note_fallback(fallback: bool) {
    if fallback {
        eprintln!("note: no language model configured; used keyword heuristics");
    }
}
