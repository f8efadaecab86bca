use crate::output::print_json;
use clap::Subcommand;
use copilot_core::phase::{Requirement, Risk, Severity, Stakeholder};
use copilot_core::project::Phase;
use copilot_core::types::{PhaseId, PhaseStatus};
use std::path::Path;

#[derive(Subcommand)]
pub enum PhaseSubcommand {
    /// Set a phase's status (not_started, pending, in_progress, pending_approval, ...)
    SetStatus { id: PhaseId, status: String },
    /// Record a risk on a phase
    AddRisk {
        id: PhaseId,
        risk: String,
        #[arg(long, default_value = "medium")]
        severity: String,
        #[arg(long)]
        mitigation: Option<String>,
    },
    /// Record a stakeholder on a phase
    AddStakeholder {
        id: PhaseId,
        name: String,
        role: String,
        /// Approval state, e.g. approved or pending
        #[arg(long)]
        status: Option<String>,
    },
    /// Add a user-story requirement to a phase-1 record
    AddRequirement {
        id: PhaseId,
        #[arg(long)]
        feature: String,
        #[arg(long, default_value = "")]
        as_a: String,
        #[arg(long, default_value = "")]
        i_want: String,
        #[arg(long, default_value = "")]
        so_that: String,
        #[arg(long, default_value = "Medium")]
        priority: String,
    },
}

pub fn run(root: &Path, subcmd: PhaseSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let (phase, message) = match subcmd {
        PhaseSubcommand::SetStatus { id, status } => {
            let status: PhaseStatus = status.parse()?;
            let phase = ws.store.set_phase_status(id, status)?;
            let message = format!("Phase {} is now {}", phase.id, phase.status);
            (phase, message)
        }
        PhaseSubcommand::AddRisk {
            id,
            risk,
            severity,
            mitigation,
        } => {
            let severity: Severity = severity.parse()?;
            let phase = ws.store.update_phase_data(id, |data| {
                data.add_risk(Risk {
                    risk,
                    severity,
                    mitigation,
                })
            })?;
            (phase, format!("Added {severity} risk to phase {id}"))
        }
        PhaseSubcommand::AddStakeholder {
            id,
            name,
            role,
            status,
        } => {
            let message = format!("Added stakeholder {name} ({role}) to phase {id}");
            let phase = ws.store.update_phase_data(id, |data| {
                data.add_stakeholder(Stakeholder { name, role, status })
            })?;
            (phase, message)
        }
        PhaseSubcommand::AddRequirement {
            id,
            feature,
            as_a,
            i_want,
            so_that,
            priority,
        } => {
            let message = format!("Added requirement '{feature}' to phase {id}");
            let phase = ws.store.update_phase_data(id, |data| {
                data.add_requirement(Requirement {
                    feature,
                    as_a,
                    i_want,
                    so_that,
                    priority,
                    scenarios: Vec::new(),
                })
            })?;
            (phase, message)
        }
    };
    report(&phase, &message, json)
}

fn report(phase: &Phase, message: &str, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(phase);
    }
    println!("{message}");
    Ok(())
}
