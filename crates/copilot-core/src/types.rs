use crate::error::CopilotError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ProjectId = u64;
pub type PhaseId = u64;
pub type MemoryId = uuid::Uuid;

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// The boundary a query is answered within. Derived from caller input,
/// never inferred from the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Scope {
    Dashboard,
    Project {
        project_id: ProjectId,
    },
    ProjectPhase {
        project_id: ProjectId,
        phase_id: PhaseId,
    },
}

impl Scope {
    /// Build a scope from the wire triple `(scope_type, project_id, phase_id)`.
    ///
    /// Dashboard scope ignores any ids. Project scope requires `project_id`.
    pub fn from_parts(
        scope_type: &str,
        project_id: Option<ProjectId>,
        phase_id: Option<PhaseId>,
    ) -> Result<Self, CopilotError> {
        match scope_type {
            "dashboard" => Ok(Scope::Dashboard),
            "project" => match (project_id, phase_id) {
                (Some(project_id), Some(phase_id)) => Ok(Scope::ProjectPhase {
                    project_id,
                    phase_id,
                }),
                (Some(project_id), None) => Ok(Scope::Project { project_id }),
                (None, _) => Err(CopilotError::InvalidScope(
                    "project scope requires project_id".to_string(),
                )),
            },
            other => Err(CopilotError::InvalidScope(format!(
                "unknown scope type '{other}': expected dashboard or project"
            ))),
        }
    }

    pub fn kind(&self) -> ScopeKind {
        match self {
            Scope::Dashboard => ScopeKind::Dashboard,
            Scope::Project { .. } | Scope::ProjectPhase { .. } => ScopeKind::Project,
        }
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        match self {
            Scope::Dashboard => None,
            Scope::Project { project_id } | Scope::ProjectPhase { project_id, .. } => {
                Some(*project_id)
            }
        }
    }

    pub fn phase_id(&self) -> Option<PhaseId> {
        match self {
            Scope::ProjectPhase { phase_id, .. } => Some(*phase_id),
            _ => None,
        }
    }

    /// Memory-index partition this scope reads from and records into.
    pub fn filter(&self) -> ScopeFilter {
        ScopeFilter {
            project_id: self.project_id(),
            phase_id: self.phase_id(),
        }
    }
}

/// Tag of a [`Scope`]; `ProjectPhase` has kind `Project`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Dashboard,
    Project,
}

impl ScopeKind {
    pub fn all() -> &'static [ScopeKind] {
        &[ScopeKind::Dashboard, ScopeKind::Project]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScopeKind::Dashboard => "dashboard",
            ScopeKind::Project => "project",
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partition of the memory index.
///
/// `project_id: None` means every memory. With a `phase_id`, search matches
/// memories of that phase plus project-wide memories (no phase).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_id: Option<PhaseId>,
}

impl ScopeFilter {
    pub fn global() -> Self {
        Self::default()
    }

    pub fn project(project_id: ProjectId) -> Self {
        Self {
            project_id: Some(project_id),
            phase_id: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    #[serde(alias = "text")]
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ApprovalQuery,
    ProjectList,
    ProjectStatus,
    ProjectCreationGuidance,
    FollowUp,
    DashboardGeneral,
    PhaseGuidance,
    RequirementInfo,
    RiskAnalysis,
    StakeholderInfo,
    ProjectGeneral,
}

impl Intent {
    /// The intents a classifier may assign in the given scope kind.
    pub fn for_scope(kind: ScopeKind) -> &'static [Intent] {
        match kind {
            ScopeKind::Dashboard => &[
                Intent::ApprovalQuery,
                Intent::ProjectList,
                Intent::ProjectStatus,
                Intent::ProjectCreationGuidance,
                Intent::FollowUp,
                Intent::DashboardGeneral,
            ],
            ScopeKind::Project => &[
                Intent::PhaseGuidance,
                Intent::RequirementInfo,
                Intent::RiskAnalysis,
                Intent::StakeholderInfo,
                Intent::ProjectStatus,
                Intent::ProjectGeneral,
                Intent::FollowUp,
            ],
        }
    }

    /// Catch-all intent for unmatched queries.
    pub fn general_for(kind: ScopeKind) -> Intent {
        match kind {
            ScopeKind::Dashboard => Intent::DashboardGeneral,
            ScopeKind::Project => Intent::ProjectGeneral,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::ApprovalQuery => "approval_query",
            Intent::ProjectList => "project_list",
            Intent::ProjectStatus => "project_status",
            Intent::ProjectCreationGuidance => "project_creation_guidance",
            Intent::FollowUp => "follow_up",
            Intent::DashboardGeneral => "dashboard_general",
            Intent::PhaseGuidance => "phase_guidance",
            Intent::RequirementInfo => "requirement_info",
            Intent::RiskAnalysis => "risk_analysis",
            Intent::StakeholderInfo => "stakeholder_info",
            Intent::ProjectGeneral => "project_general",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Provenance label attached to a reply. Display only; no logic reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "SQL Database")]
    SqlDatabase,
    #[serde(rename = "Vector Database")]
    VectorDatabase,
    #[serde(rename = "SDLC Knowledge Base")]
    KnowledgeBase,
    #[serde(rename = "Project Data")]
    ProjectData,
    #[serde(rename = "General AI")]
    GeneralAi,
    #[serde(rename = "Context")]
    Context,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::SqlDatabase => "SQL Database",
            Source::VectorDatabase => "Vector Database",
            Source::KnowledgeBase => "SDLC Knowledge Base",
            Source::ProjectData => "Project Data",
            Source::GeneralAi => "General AI",
            Source::Context => "Context",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ProjectStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    OnHold,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::OnHold => "on_hold",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = CopilotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProjectStatus::Active),
            "on_hold" => Ok(ProjectStatus::OnHold),
            "completed" => Ok(ProjectStatus::Completed),
            "cancelled" => Ok(ProjectStatus::Cancelled),
            other => Err(CopilotError::InvalidStatus(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// PhaseStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    #[default]
    NotStarted,
    Pending,
    InProgress,
    PendingApproval,
    Approved,
    Completed,
    Rejected,
    Blocked,
}

impl PhaseStatus {
    pub fn all() -> &'static [PhaseStatus] {
        &[
            PhaseStatus::NotStarted,
            PhaseStatus::Pending,
            PhaseStatus::InProgress,
            PhaseStatus::PendingApproval,
            PhaseStatus::Approved,
            PhaseStatus::Completed,
            PhaseStatus::Rejected,
            PhaseStatus::Blocked,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PhaseStatus::NotStarted => "not_started",
            PhaseStatus::Pending => "pending",
            PhaseStatus::InProgress => "in_progress",
            PhaseStatus::PendingApproval => "pending_approval",
            PhaseStatus::Approved => "approved",
            PhaseStatus::Completed => "completed",
            PhaseStatus::Rejected => "rejected",
            PhaseStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PhaseStatus {
    type Err = CopilotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PhaseStatus::all()
            .iter()
            .copied()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| CopilotError::InvalidStatus(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// MemoryKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    Requirement,
    Document,
    Chat,
    Note,
    ProjectSummary,
}

impl MemoryKind {
    pub fn all() -> &'static [MemoryKind] {
        &[
            MemoryKind::Requirement,
            MemoryKind::Document,
            MemoryKind::Chat,
            MemoryKind::Note,
            MemoryKind::ProjectSummary,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MemoryKind::Requirement => "requirement",
            MemoryKind::Document => "document",
            MemoryKind::Chat => "chat",
            MemoryKind::Note => "note",
            MemoryKind::ProjectSummary => "project_summary",
        }
    }
}

impl fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryKind {
    type Err = CopilotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MemoryKind::all()
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CopilotError::InvalidMemoryKind(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
