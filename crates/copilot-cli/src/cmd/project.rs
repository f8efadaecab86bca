use crate::output::{print_json, print_table, truncate};
use anyhow::Context;
use clap::Subcommand;
use copilot_core::context::Progress;
use copilot_core::types::{ProjectId, ProjectStatus};
use copilot_core::CopilotError;
use std::path::Path;

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// Create a project with its six phases
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List all projects
    List,
    /// Show a project and its phases
    Show { id: ProjectId },
    /// Set a project's status (active, on_hold, completed, cancelled)
    SetStatus { id: ProjectId, status: String },
}

pub fn run(root: &Path, subcmd: ProjectSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ProjectSubcommand::Create { name, description } => create(root, &name, &description, json),
        ProjectSubcommand::List => list(root, json),
        ProjectSubcommand::Show { id } => show(root, id, json),
        ProjectSubcommand::SetStatus { id, status } => set_status(root, id, &status, json),
    }
}

fn create(root: &Path, name: &str, description: &str, json: bool) -> anyhow::Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("project name must not be empty");
    }
    let ws = super::open(root)?;
    let (project, phases) = ws
        .store
        .create_project(name, description)
        .context("failed to create project")?;

    if json {
        return print_json(&serde_json::json!({ "project": project, "phases": phases }));
    }
    println!("Created project {} '{}'", project.id, project.name);
    for phase in &phases {
        println!("  phase {} (id {}): {}", phase.phase_number, phase.id, phase.phase_name);
    }
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let projects = ws.store.projects().context("failed to list projects")?;

    if json {
        return print_json(&projects);
    }
    if projects.is_empty() {
        println!("No projects yet. Create one with `copilot project create <name>`.");
        return Ok(());
    }
    let rows = projects
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.name.clone(),
                p.status.to_string(),
                p.current_phase.to_string(),
                truncate(&p.description, 40),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "STATUS", "PHASE", "DESCRIPTION"], rows);
    Ok(())
}

fn show(root: &Path, id: ProjectId, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let project = ws.store.project(id)?.ok_or(CopilotError::ProjectNotFound(id))?;
    let phases = ws.store.phases_for(id)?;

    if json {
        return print_json(&serde_json::json!({ "project": project, "phases": phases }));
    }

    let progress = Progress::of(&phases);
    println!("Project {}: {}   Status: {}", project.id, project.name, project.status);
    if !project.description.is_empty() {
        println!("{}", project.description);
    }
    println!(
        "Progress: {}% ({}/{} phases completed)",
        progress.percent(),
        progress.completed,
        progress.total_phases
    );
    println!();
    let rows = phases
        .iter()
        .map(|ph| {
            vec![
                ph.phase_number.to_string(),
                ph.id.to_string(),
                ph.phase_name.clone(),
                ph.status.to_string(),
                ph.data.risks().len().to_string(),
                ph.data.stakeholders().len().to_string(),
            ]
        })
        .collect();
    print_table(&["#", "ID", "PHASE", "STATUS", "RISKS", "STAKEHOLDERS"], rows);
    Ok(())
}

fn set_status(root: &Path, id: ProjectId, status: &str, json: bool) -> anyhow::Result<()> {
    let status: ProjectStatus = status.parse()?;
    let ws = super::open(root)?;
    let project = ws.store.set_project_status(id, status)?;

    if json {
        return print_json(&project);
    }
    println!("Project {} is now {}", project.id, project.status);
    Ok(())
}
