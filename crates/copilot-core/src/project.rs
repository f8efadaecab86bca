use crate::phase::PhaseData;
use crate::types::{PhaseId, PhaseStatus, ProjectId, ProjectStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    /// Number of the phase the project is working in.
    #[serde(default = "default_current_phase")]
    pub current_phase: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_current_phase() -> u8 {
    1
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// One of the six SDLC phases of a project.
///
/// Serialized with `data` as plain JSON; decoding picks the typed
/// [`PhaseData`] shape from `phase_number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PhaseRecord", into = "PhaseRecord")]
pub struct Phase {
    pub id: PhaseId,
    pub project_id: ProjectId,
    pub phase_number: u8,
    pub phase_name: String,
    pub status: PhaseStatus,
    pub data: PhaseData,
    pub ai_confidence_score: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Phase {
    pub fn is(&self, status: PhaseStatus) -> bool {
        self.status == status
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PhaseRecord {
    id: PhaseId,
    project_id: ProjectId,
    phase_number: u8,
    phase_name: String,
    #[serde(default)]
    status: PhaseStatus,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    ai_confidence_score: u8,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PhaseRecord> for Phase {
    fn from(r: PhaseRecord) -> Self {
        Phase {
            data: PhaseData::decode(r.phase_number, r.data),
            id: r.id,
            project_id: r.project_id,
            phase_number: r.phase_number,
            phase_name: r.phase_name,
            status: r.status,
            ai_confidence_score: r.ai_confidence_score,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl From<Phase> for PhaseRecord {
    fn from(p: Phase) -> Self {
        PhaseRecord {
            data: p.data.to_value(),
            id: p.id,
            project_id: p.project_id,
            phase_number: p.phase_number,
            phase_name: p.phase_name,
            status: p.status,
            ai_confidence_score: p.ai_confidence_score,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
