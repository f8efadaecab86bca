use crate::output::print_json;
use clap::Subcommand;
use copilot_core::documents::DocumentKind;
use copilot_core::types::ProjectId;
use std::path::Path;

#[derive(Subcommand)]
pub enum DocSubcommand {
    /// Product Requirements Document
    Prd {
        #[arg(long)]
        project: ProjectId,
    },
    /// Business Requirements Document
    Brd {
        #[arg(long)]
        project: ProjectId,
    },
}

pub fn run(root: &Path, subcmd: DocSubcommand, json: bool) -> anyhow::Result<()> {
    let (kind, project) = match subcmd {
        DocSubcommand::Prd { project } => (DocumentKind::Prd, project),
        DocSubcommand::Brd { project } => (DocumentKind::Brd, project),
    };
    let ws = super::open(root)?;
    let doc = super::runtime()?.block_on(ws.generate_document(project, kind))?;

    if json {
        return print_json(&doc);
    }
    println!("{}", doc.content);
    if doc.fallback {
        eprintln!("note: no language model configured; wrote the {kind} template");
    }
    Ok(())
}
