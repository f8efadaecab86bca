//! A copilot root directory: its config plus the opened record store and
//! memory index.
//!
//! ```text
//! <root>/.copilot/config.yaml
//! <root>/.copilot/artifacts.redb
//! <root>/.copilot/memories.redb
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::analysis::{self, Analysis};
use crate::config::{Config, WarnLevel};
use crate::documents::{self, DocumentKind, GeneratedDocument};
use crate::error::{CopilotError, Result};
use crate::index::{Memory, MemoryIndex};
use crate::llm::{self, Completer};
use crate::paths;
use crate::phase::{Requirement, Risk};
use crate::project::{Phase, Project};
use crate::service::ChatService;
use crate::store::RedbArtifactStore;
use crate::types::{MemoryKind, PhaseId, PhaseStatus, ProjectId, ScopeFilter};

pub struct Workspace {
    pub root: PathBuf,
    pub config: Config,
    pub store: RedbArtifactStore,
    pub index: MemoryIndex,
}

/// What `init` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitOutcome {
    pub created_config: bool,
}

impl Workspace {
    /// Create the `.copilot` directory, a default config (left alone if one
    /// exists) and both databases.
    pub fn init(root: &Path) -> Result<InitOutcome> {
        std::fs::create_dir_all(paths::copilot_dir(root))?;
        let yaml = serde_yaml::to_string(&Config::default())?;
        let created_config = crate::io::write_if_missing(&paths::config_path(root), yaml.as_bytes())?;
        RedbArtifactStore::open(&paths::artifacts_db_path(root))?;
        MemoryIndex::open(&paths::memories_db_path(root))?;
        tracing::info!(root = %root.display(), created_config, "workspace initialized");
        Ok(InitOutcome { created_config })
    }

    pub fn open(root: &Path) -> Result<Self> {
        let config = Config::load(root)?;
        for w in config.validate() {
            match w.level {
                WarnLevel::Warning => tracing::warn!("config: {}", w.message),
                WarnLevel::Error => tracing::error!("config: {}", w.message),
            }
        }
        let store = RedbArtifactStore::open(&paths::artifacts_db_path(root))?;
        let index = MemoryIndex::open(&paths::memories_db_path(root))?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
            store,
            index,
        })
    }

    pub fn completer(&self) -> Option<Arc<dyn Completer>> {
        llm::build_completer(&self.config)
    }

    pub fn chat_service(&self) -> ChatService {
        ChatService::new(
            Arc::new(self.store.clone()),
            Arc::new(self.index.clone()),
            &self.config,
            self.completer(),
        )
    }

    /// Store a memory against a project (and optionally one of its phases).
    pub fn add_memory(
        &self,
        project_id: ProjectId,
        phase_id: Option<PhaseId>,
        kind: MemoryKind,
        content: &str,
    ) -> Result<Memory> {
        self.store
            .project(project_id)?
            .ok_or(CopilotError::ProjectNotFound(project_id))?;
        if let Some(id) = phase_id {
            let phase = self.store.phase(id)?.ok_or(CopilotError::PhaseNotFound(id))?;
            if phase.project_id != project_id {
                return Err(CopilotError::PhaseOutsideProject {
                    phase_id: id,
                    project_id,
                });
            }
        }
        let filter = ScopeFilter {
            project_id: Some(project_id),
            phase_id,
        };
        self.index
            .insert(filter, kind, content, json!({ "source": "manual" }))
    }

    /// Run store and index work on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&RedbArtifactStore, &MemoryIndex) -> Result<T> + Send + 'static,
    {
        let store = self.store.clone();
        let index = self.index.clone();
        tokio::task::spawn_blocking(move || f(&store, &index))
            .await
            .map_err(|e| CopilotError::Join(e.to_string()))?
    }

    /// Draft a PRD or BRD from phase-1 requirements, save it into phase-1
    /// data and index it as a document memory.
    pub async fn generate_document(
        &self,
        project_id: ProjectId,
        kind: DocumentKind,
    ) -> Result<GeneratedDocument> {
        let (project, phase) = self
            .blocking(move |store, _| requirements_phase(store, project_id))
            .await?;
        let requirements = phase.data.requirements();

        let completer = self.completer();
        let doc = documents::generate(kind, &project, &requirements, completer.as_deref()).await;

        let content = doc.content.clone();
        let fallback = doc.fallback;
        self.blocking(move |store, index| {
            let saved = content.clone();
            store.update_phase_data(phase.id, |data| data.set_document(kind.key(), saved))?;
            index.insert(
                ScopeFilter {
                    project_id: Some(project_id),
                    phase_id: Some(phase.id),
                },
                MemoryKind::Document,
                &content,
                json!({ "document_type": kind.key(), "fallback": fallback }),
            )?;
            Ok(())
        })
        .await?;
        Ok(doc)
    }

    /// Extract requirements from `text`, append them to phase-1 data and
    /// index each as a requirement memory.
    pub async fn extract_requirements(
        &self,
        project_id: ProjectId,
        text: &str,
    ) -> Result<Analysis<Requirement>> {
        let (_, phase) = self
            .blocking(move |store, _| requirements_phase(store, project_id))
            .await?;

        let completer = self.completer();
        let extracted = analysis::extract_requirements(text, completer.as_deref()).await;

        let requirements = extracted.items.clone();
        let fallback = extracted.fallback;
        self.blocking(move |store, index| {
            let stored = requirements.clone();
            store.update_phase_data(phase.id, |data| {
                stored.into_iter().try_for_each(|r| data.add_requirement(r))
            })?;
            let filter = ScopeFilter {
                project_id: Some(project_id),
                phase_id: Some(phase.id),
            };
            for r in &requirements {
                index.insert(
                    filter,
                    MemoryKind::Requirement,
                    &format!("{}: {}", r.feature, r.user_story()),
                    json!({ "source": "extraction", "priority": r.priority, "fallback": fallback }),
                )?;
            }
            Ok(())
        })
        .await?;
        tracing::info!(project_id, requirements = extracted.items.len(), fallback, "requirements stored");
        Ok(extracted)
    }

    /// Analyze the owning project's phase-1 requirements and append the
    /// risks not already recorded on phase `phase_id`. Returns the added
    /// risks.
    pub async fn analyze_risks(&self, phase_id: PhaseId) -> Result<Analysis<Risk>> {
        let (project, requirements) = self
            .blocking(move |store, _| {
                let phase = store.phase(phase_id)?.ok_or(CopilotError::PhaseNotFound(phase_id))?;
                let (project, first) = requirements_phase(store, phase.project_id)?;
                Ok((project, first.data.requirements()))
            })
            .await?;

        let completer = self.completer();
        let mut analyzed =
            analysis::analyze_risks(&project, &requirements, completer.as_deref()).await;

        let candidates = std::mem::take(&mut analyzed.items);
        analyzed.items = self
            .blocking(move |store, _| {
                let mut added = Vec::new();
                store.update_phase_data(phase_id, |data| {
                    let mut known: HashSet<String> =
                        data.risks().into_iter().map(|r| r.risk.to_lowercase()).collect();
                    for risk in candidates {
                        if known.insert(risk.risk.to_lowercase()) {
                            data.add_risk(risk.clone())?;
                            added.push(risk);
                        }
                    }
                    Ok(())
                })?;
                Ok(added)
            })
            .await?;
        tracing::info!(phase_id, risks = analyzed.items.len(), "risks stored");
        Ok(analyzed)
    }

    /// Phases awaiting sign-off, in project then phase order.
    pub async fn pending_approvals(&self) -> Result<Vec<PendingApproval>> {
        self.blocking(|store, _| {
            let names: HashMap<ProjectId, String> = store
                .projects()?
                .into_iter()
                .map(|p| (p.id, p.name))
                .collect();
            Ok(store
                .phases_grouped()?
                .into_values()
                .flatten()
                .filter(|p| p.is(PhaseStatus::PendingApproval))
                .map(|p| PendingApproval {
                    project_id: p.project_id,
                    project_name: names.get(&p.project_id).cloned().unwrap_or_default(),
                    phase_id: p.id,
                    phase_number: p.phase_number,
                    phase_name: p.phase_name,
                    submitted_at: p.updated_at,
                })
                .collect())
        })
        .await
    }
}

/// A phase in `pending_approval`, with its project's name.
#[derive(Debug, Clone, Serialize)]
pub struct PendingApproval {
    pub project_id: ProjectId,
    pub project_name: String,
    pub phase_id: PhaseId,
    pub phase_number: u8,
    pub phase_name: String,
    pub submitted_at: DateTime<Utc>,
}

/// A project and its requirements phase.
fn requirements_phase(store: &RedbArtifactStore, project_id: ProjectId) -> Result<(Project, Phase)> {
    let project = store
        .project(project_id)?
        .ok_or(CopilotError::ProjectNotFound(project_id))?;
    let phase = store
        .phase_by_number(project_id, 1)?
        .ok_or(CopilotError::InvalidPhaseNumber(1))?;
    Ok((project, phase))
}
