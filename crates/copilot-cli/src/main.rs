mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    analyze::AnalyzeSubcommand, doc::DocSubcommand, memory::MemorySubcommand,
    phase::PhaseSubcommand, project::ProjectSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "copilot",
    about = "SDLC copilot: track projects through six delivery phases and ask about them",
    version,
    propagate_version = true
)]
struct Cli {
    /// Copilot root (default: nearest directory containing .copilot/, else cwd)
    #[arg(long, global = true, env = "COPILOT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .copilot/ with a default config and empty databases
    Init,

    /// Manage projects
    Project {
        #[command(subcommand)]
        subcommand: ProjectSubcommand,
    },

    /// Update phase status and review data
    Phase {
        #[command(subcommand)]
        subcommand: PhaseSubcommand,
    },

    /// Store memories and inspect the memory index
    Memory {
        #[command(subcommand)]
        subcommand: MemorySubcommand,
    },

    /// Ask the copilot a question
    Ask {
        query: String,
        /// Project id (omit for the dashboard)
        #[arg(long)]
        project: Option<u64>,
        /// Phase id within the project
        #[arg(long, requires = "project")]
        phase: Option<u64>,
    },

    /// Draft a PRD or BRD from phase-1 requirements
    Doc {
        #[command(subcommand)]
        subcommand: DocSubcommand,
    },

    /// Extract requirements or analyze risks
    Analyze {
        #[command(subcommand)]
        subcommand: AnalyzeSubcommand,
    },

    /// List phases waiting for approval
    Approvals,

    /// Serve the HTTP API
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::Project { subcommand } => cmd::project::run(&root, subcommand, cli.json),
        Commands::Phase { subcommand } => cmd::phase::run(&root, subcommand, cli.json),
        Commands::Memory { subcommand } => cmd::memory::run(&root, subcommand, cli.json),
        Commands::Ask {
            query,
            project,
            phase,
        } => cmd::ask::run(&root, &query, project, phase, cli.json),
        Commands::Doc { subcommand } => cmd::doc::run(&root, subcommand, cli.json),
        Commands::Analyze { subcommand } => cmd::analyze::run(&root, subcommand, cli.json),
        Commands::Approvals => cmd::approvals::run(&root, cli.json),
        Commands::Serve { port } => cmd::serve::run(&root, port),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
