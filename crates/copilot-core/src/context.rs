//! Context assembly: structured facts from the artifact store plus
//! relevance-ranked snippets from the memory index, fetched concurrently
//! and merged into one [`ContextPayload`].
//!
//! Neither source can fail the query. A store failure (or an unknown id)
//! becomes [`StructuredFacts::Unavailable`]; an index failure becomes an
//! empty snippet list.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::config::RetrievalConfig;
use crate::error::{CopilotError, Result};
use crate::index::EmbeddingIndex;
use crate::project::{Phase, Project};
use crate::store::ArtifactStore;
use crate::types::{Intent, PhaseId, PhaseStatus, ProjectId, ProjectStatus, Scope, Source};

// ---------------------------------------------------------------------------
// Facts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub total_phases: usize,
    pub completed_phases: usize,
    pub pending_approval_phases: usize,
    /// Name of the first `in_progress` phase.
    pub current_phase: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStatistics {
    pub active_projects: usize,
    pub completed_projects: usize,
    /// Phase records in `pending_approval`, across all projects.
    pub pending_approvals: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardFacts {
    pub total_projects: usize,
    pub projects: Vec<ProjectSummary>,
    pub statistics: DashboardStatistics,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub total_phases: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
}

impl Progress {
    pub fn of(phases: &[Phase]) -> Self {
        let count = |s: PhaseStatus| phases.iter().filter(|p| p.is(s)).count();
        Self {
            total_phases: phases.len(),
            completed: count(PhaseStatus::Completed),
            in_progress: count(PhaseStatus::InProgress),
            pending: count(PhaseStatus::Pending),
        }
    }

    /// Whole-number completion percentage.
    pub fn percent(&self) -> usize {
        if self.total_phases == 0 {
            0
        } else {
            self.completed * 100 / self.total_phases
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectFacts {
    pub project: Project,
    /// Ordered by phase number.
    pub phases: Vec<Phase>,
    /// Present only when the scope selected a phase.
    pub current_phase: Option<Phase>,
    pub progress: Progress,
}

impl ProjectFacts {
    /// The selected phase, else the first phase in progress.
    pub fn focus_phase(&self) -> Option<&Phase> {
        self.current_phase
            .as_ref()
            .or_else(|| self.phases.iter().find(|p| p.is(PhaseStatus::InProgress)))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuredFacts {
    Dashboard(DashboardFacts),
    Project(ProjectFacts),
    Unavailable { error: String },
}

impl StructuredFacts {
    pub fn is_available(&self) -> bool {
        !matches!(self, StructuredFacts::Unavailable { .. })
    }

    pub fn dashboard(&self) -> Option<&DashboardFacts> {
        match self {
            StructuredFacts::Dashboard(f) => Some(f),
            _ => None,
        }
    }

    pub fn project(&self) -> Option<&ProjectFacts> {
        match self {
            StructuredFacts::Project(f) => Some(f),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ContextPayload
// ---------------------------------------------------------------------------

/// Everything a reply strategy may draw on. Built per query.
#[derive(Debug, Clone, Serialize)]
pub struct ContextPayload {
    pub facts: StructuredFacts,
    /// Most similar first; at most [`crate::config::MAX_SNIPPETS`].
    pub snippets: Vec<String>,
    pub source_labels: BTreeSet<Source>,
}

impl ContextPayload {
    pub fn new(facts: StructuredFacts, snippets: Vec<String>) -> Self {
        let mut source_labels = BTreeSet::new();
        if facts.is_available() {
            source_labels.insert(Source::SqlDatabase);
        }
        if !snippets.is_empty() {
            source_labels.insert(Source::VectorDatabase);
        }
        Self {
            facts,
            snippets,
            source_labels,
        }
    }
}

/// Keep snippets in order while their cumulative character count fits in
/// `budget`; the first one that overflows and everything after it go.
pub fn within_budget(snippets: Vec<String>, budget: usize) -> Vec<String> {
    let mut used = 0usize;
    snippets
        .into_iter()
        .take_while(|s| {
            used += s.chars().count();
            used <= budget
        })
        .collect()
}

// ---------------------------------------------------------------------------
// ContextAssembler
// ---------------------------------------------------------------------------

pub struct ContextAssembler {
    store: Arc<dyn ArtifactStore>,
    index: Arc<dyn EmbeddingIndex>,
    retrieval: RetrievalConfig,
}

impl ContextAssembler {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        index: Arc<dyn EmbeddingIndex>,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            index,
            retrieval,
        }
    }

    /// Gather facts and snippets for one query. Never fails.
    pub async fn assemble(&self, intent: Intent, scope: &Scope, query: &str) -> ContextPayload {
        let (facts, snippets) = tokio::join!(self.facts(scope), self.snippets(scope, query));
        let snippets = within_budget(snippets, self.retrieval.snippet_char_budget);
        tracing::debug!(
            %intent,
            scope = %scope.kind(),
            facts = facts.is_available(),
            snippets = snippets.len(),
            "context assembled"
        );
        ContextPayload::new(facts, snippets)
    }

    async fn facts(&self, scope: &Scope) -> StructuredFacts {
        let result = match *scope {
            Scope::Dashboard => self.dashboard_facts().await.map(StructuredFacts::Dashboard),
            Scope::Project { project_id } => self
                .project_facts(project_id, None)
                .await
                .map(StructuredFacts::Project),
            Scope::ProjectPhase {
                project_id,
                phase_id,
            } => self
                .project_facts(project_id, Some(phase_id))
                .await
                .map(StructuredFacts::Project),
        };
        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "structured facts unavailable");
            StructuredFacts::Unavailable {
                error: e.to_string(),
            }
        })
    }

    async fn dashboard_facts(&self) -> Result<DashboardFacts> {
        let projects = self.store.list_projects().await?;
        let grouped = self.store.phases_by_project().await?;
        let mut summaries = Vec::with_capacity(projects.len());
        for project in &projects {
            let phases = grouped.get(&project.id).map(Vec::as_slice).unwrap_or(&[]);
            summaries.push(ProjectSummary {
                id: project.id,
                name: project.name.clone(),
                description: project.description.clone(),
                status: project.status,
                total_phases: phases.len(),
                completed_phases: phases.iter().filter(|p| p.is(PhaseStatus::Completed)).count(),
                pending_approval_phases: phases
                    .iter()
                    .filter(|p| p.is(PhaseStatus::PendingApproval))
                    .count(),
                current_phase: phases
                    .iter()
                    .find(|p| p.is(PhaseStatus::InProgress))
                    .map(|p| p.phase_name.clone()),
            });
        }
        let pending_approvals = grouped
            .values()
            .flatten()
            .filter(|p| p.is(PhaseStatus::PendingApproval))
            .count();
        let with_status = |s: ProjectStatus| projects.iter().filter(|p| p.status == s).count();

        Ok(DashboardFacts {
            total_projects: projects.len(),
            statistics: DashboardStatistics {
                active_projects: with_status(ProjectStatus::Active),
                completed_projects: with_status(ProjectStatus::Completed),
                pending_approvals,
            },
            projects: summaries,
        })
    }

    async fn project_facts(
        &self,
        project_id: ProjectId,
        phase_id: Option<PhaseId>,
    ) -> Result<ProjectFacts> {
        let project = self
            .store
            .get_project(project_id)
            .await?
            .ok_or(CopilotError::ProjectNotFound(project_id))?;
        let phases = self.store.list_phases(project_id).await?;

        let current_phase = match phase_id {
            Some(id) => {
                let phase = self
                    .store
                    .get_phase(id)
                    .await?
                    .ok_or(CopilotError::PhaseNotFound(id))?;
                if phase.project_id != project_id {
                    return Err(CopilotError::PhaseOutsideProject {
                        phase_id: id,
                        project_id,
                    });
                }
                Some(phase)
            }
            None => None,
        };

        Ok(ProjectFacts {
            progress: Progress::of(&phases),
            project,
            phases,
            current_phase,
        })
    }

    async fn snippets(&self, scope: &Scope, query: &str) -> Vec<String> {
        let limit = self.retrieval.effective_limit();
        match self.index.search(scope.filter(), query, limit).await {
            Ok(hits) => hits.into_iter().take(limit).map(|h| h.content).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "semantic retrieval failed");
                Vec::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
