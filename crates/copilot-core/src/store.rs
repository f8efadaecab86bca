//! Structured project and phase records.
//!
//! The chat pipeline reads through the [`ArtifactStore`] trait. The embedded
//! implementation, [`RedbArtifactStore`], keeps JSON-encoded records in a
//! redb file:
//!
//! ```text
//! projects : u64 id -> Project JSON
//! phases   : u64 id -> Phase JSON
//! counters : "project" | "phase" -> last issued id
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use redb::{Database, ReadableTable, Table, TableDefinition, WriteTransaction};
use serde::de::DeserializeOwned;

use crate::catalog::{self, PHASE_COUNT};
use crate::error::{CopilotError, Result};
use crate::phase::PhaseData;
use crate::project::{Phase, Project};
use crate::types::{PhaseId, PhaseStatus, ProjectId, ProjectStatus};

// ---------------------------------------------------------------------------
// ArtifactStore
// ---------------------------------------------------------------------------

/// Read side of the structured record store.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>>;

    async fn list_projects(&self) -> Result<Vec<Project>>;

    /// Phases of `project_id`, ordered by phase number.
    async fn list_phases(&self, project_id: ProjectId) -> Result<Vec<Phase>>;

    async fn get_phase(&self, id: PhaseId) -> Result<Option<Phase>>;

    /// Every phase, grouped by project and ordered by phase number.
    async fn phases_by_project(&self) -> Result<BTreeMap<ProjectId, Vec<Phase>>>;

    /// Number of phase records, across all projects, with `status`.
    async fn count_phases_by_status(&self, status: PhaseStatus) -> Result<usize>;
}

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

const PROJECTS: TableDefinition<u64, &[u8]> = TableDefinition::new("projects");
const PHASES: TableDefinition<u64, &[u8]> = TableDefinition::new("phases");
const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

fn store_err(e: impl std::fmt::Display) -> CopilotError {
    CopilotError::Store(e.to_string())
}

// ---------------------------------------------------------------------------
// RedbArtifactStore
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct RedbArtifactStore {
    db: Arc<Database>,
}

impl RedbArtifactStore {
    /// Open or create the store at `path`, creating its tables.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(store_err)?;
        let wt = db.begin_write().map_err(store_err)?;
        wt.open_table(PROJECTS).map_err(store_err)?;
        wt.open_table(PHASES).map_err(store_err)?;
        wt.open_table(COUNTERS).map_err(store_err)?;
        wt.commit().map_err(store_err)?;
        Ok(Self { db: Arc::new(db) })
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn project(&self, id: ProjectId) -> Result<Option<Project>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(PROJECTS).map_err(store_err)?;
        match table.get(id).map_err(store_err)? {
            Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
            None => Ok(None),
        }
    }

    /// All projects in id (creation) order.
    pub fn projects(&self) -> Result<Vec<Project>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(PROJECTS).map_err(store_err)?;
        let mut result = Vec::new();
        for entry in table.iter().map_err(store_err)? {
            let (_, v) = entry.map_err(store_err)?;
            result.push(serde_json::from_slice(v.value())?);
        }
        Ok(result)
    }

    pub fn phase(&self, id: PhaseId) -> Result<Option<Phase>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(PHASES).map_err(store_err)?;
        match table.get(id).map_err(store_err)? {
            Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
            None => Ok(None),
        }
    }

    fn all_phases(&self) -> Result<Vec<Phase>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(PHASES).map_err(store_err)?;
        let mut result = Vec::new();
        for entry in table.iter().map_err(store_err)? {
            let (_, v) = entry.map_err(store_err)?;
            result.push(serde_json::from_slice::<Phase>(v.value())?);
        }
        Ok(result)
    }

    /// Phases of one project, ordered by phase number.
    pub fn phases_for(&self, project_id: ProjectId) -> Result<Vec<Phase>> {
        Ok(self
            .phases_grouped()?
            .remove(&project_id)
            .unwrap_or_default())
    }

    /// One scan of the phases table, grouped by project.
    pub fn phases_grouped(&self) -> Result<BTreeMap<ProjectId, Vec<Phase>>> {
        let mut grouped: BTreeMap<ProjectId, Vec<Phase>> = BTreeMap::new();
        for phase in self.all_phases()? {
            grouped.entry(phase.project_id).or_default().push(phase);
        }
        for phases in grouped.values_mut() {
            phases.sort_by_key(|p| p.phase_number);
        }
        Ok(grouped)
    }

    pub fn phase_by_number(&self, project_id: ProjectId, number: u8) -> Result<Option<Phase>> {
        Ok(self
            .phases_for(project_id)?
            .into_iter()
            .find(|p| p.phase_number == number))
    }

    pub fn count_by_status(&self, status: PhaseStatus) -> Result<usize> {
        Ok(self.all_phases()?.iter().filter(|p| p.is(status)).count())
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Create a project together with its six catalog phases.
    ///
    /// Phase 1 starts `in_progress`; the rest start `not_started`.
    pub fn create_project(&self, name: &str, description: &str) -> Result<(Project, Vec<Phase>)> {
        let now = Utc::now();
        let wt = self.db.begin_write().map_err(store_err)?;
        let project_id = next_id(&wt, "project")?;
        let project = Project {
            id: project_id,
            name: name.to_string(),
            description: description.to_string(),
            status: ProjectStatus::Active,
            current_phase: 1,
            created_at: now,
            updated_at: now,
        };

        let mut phases = Vec::with_capacity(PHASE_COUNT as usize);
        for def in &catalog::PHASES {
            phases.push(Phase {
                id: next_id(&wt, "phase")?,
                project_id,
                phase_number: def.number,
                phase_name: def.name.to_string(),
                status: if def.number == 1 {
                    PhaseStatus::InProgress
                } else {
                    PhaseStatus::NotStarted
                },
                data: PhaseData::seeded(def.number),
                ai_confidence_score: 0,
                created_at: now,
                updated_at: now,
            });
        }

        {
            let mut table = wt.open_table(PROJECTS).map_err(store_err)?;
            save(&mut table, project.id, &project)?;
        }
        {
            let mut table = wt.open_table(PHASES).map_err(store_err)?;
            for phase in &phases {
                save(&mut table, phase.id, phase)?;
            }
        }
        wt.commit().map_err(store_err)?;
        tracing::info!(project_id, name, "project created");
        Ok((project, phases))
    }

    pub fn set_project_status(&self, id: ProjectId, status: ProjectStatus) -> Result<Project> {
        let wt = self.db.begin_write().map_err(store_err)?;
        let project = {
            let mut table = wt.open_table(PROJECTS).map_err(store_err)?;
            let mut project: Project =
                load(&table, id)?.ok_or(CopilotError::ProjectNotFound(id))?;
            project.status = status;
            project.updated_at = Utc::now();
            save(&mut table, id, &project)?;
            project
        };
        wt.commit().map_err(store_err)?;
        Ok(project)
    }

    /// Set a phase's status. A phase moving to `in_progress` becomes the
    /// project's current phase in the same transaction.
    pub fn set_phase_status(&self, id: PhaseId, status: PhaseStatus) -> Result<Phase> {
        let wt = self.db.begin_write().map_err(store_err)?;
        let phase = {
            let mut phases = wt.open_table(PHASES).map_err(store_err)?;
            let mut phase: Phase = load(&phases, id)?.ok_or(CopilotError::PhaseNotFound(id))?;
            phase.status = status;
            phase.updated_at = Utc::now();
            save(&mut phases, id, &phase)?;
            phase
        };
        if status == PhaseStatus::InProgress {
            let mut projects = wt.open_table(PROJECTS).map_err(store_err)?;
            if let Some(mut project) = load::<Project>(&projects, phase.project_id)? {
                project.current_phase = phase.phase_number;
                project.updated_at = phase.updated_at;
                save(&mut projects, project.id, &project)?;
            }
        }
        wt.commit().map_err(store_err)?;
        tracing::debug!(phase_id = id, status = %status, "phase status updated");
        Ok(phase)
    }

    /// Apply `edit` to a phase's data. The read, the edit and the write share
    /// one write transaction, so concurrent edits serialize.
    pub fn update_phase_data<F>(&self, id: PhaseId, edit: F) -> Result<Phase>
    where
        F: FnOnce(&mut PhaseData) -> Result<()>,
    {
        let wt = self.db.begin_write().map_err(store_err)?;
        let phase = {
            let mut table = wt.open_table(PHASES).map_err(store_err)?;
            let mut phase: Phase = load(&table, id)?.ok_or(CopilotError::PhaseNotFound(id))?;
            edit(&mut phase.data)?;
            phase.updated_at = Utc::now();
            save(&mut table, id, &phase)?;
            phase
        };
        wt.commit().map_err(store_err)?;
        Ok(phase)
    }

    /// Run a read on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&RedbArtifactStore) -> Result<T> + Send + 'static,
    {
        let this = self.clone();
        tokio::task::spawn_blocking(move || f(&this))
            .await
            .map_err(|e| CopilotError::Join(e.to_string()))?
    }
}

fn load<T: DeserializeOwned>(table: &Table<'_, u64, &'static [u8]>, id: u64) -> Result<Option<T>> {
    match table.get(id).map_err(store_err)? {
        Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
        None => Ok(None),
    }
}

fn save<T: serde::Serialize>(
    table: &mut Table<'_, u64, &'static [u8]>,
    id: u64,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    table.insert(id, bytes.as_slice()).map_err(store_err)?;
    Ok(())
}

fn next_id(wt: &WriteTransaction, counter: &str) -> Result<u64> {
    let mut table = wt.open_table(COUNTERS).map_err(store_err)?;
    let current = table
        .get(counter)
        .map_err(store_err)?
        .map(|v| v.value())
        .unwrap_or(0);
    let next = current + 1;
    table.insert(counter, next).map_err(store_err)?;
    Ok(next)
}

#[async_trait]
impl ArtifactStore for RedbArtifactStore {
    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>> {
        self.blocking(move |s| s.project(id)).await
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.blocking(|s| s.projects()).await
    }

    async fn list_phases(&self, project_id: ProjectId) -> Result<Vec<Phase>> {
        self.blocking(move |s| s.phases_for(project_id)).await
    }

    async fn get_phase(&self, id: PhaseId) -> Result<Option<Phase>> {
        self.blocking(move |s| s.phase(id)).await
    }

    async fn count_phases_by_status(&self, status: PhaseStatus) -> Result<usize> {
        self.blocking(move |s| s.count_by_status(status)).await
    }

    async fn phases_by_project(&self) -> Result<BTreeMap<ProjectId, Vec<Phase>>> {
        self.blocking(|s| s.phases_grouped()).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::{Risk, Severity};
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, RedbArtifactStore) {
        let dir = TempDir::new().unwrap();
        let store = RedbArtifactStore::open(&dir.path().join("artifacts.redb")).unwrap();
        (dir, store)
    }

    #[test]
    fn create_project_seeds_six_phases() {
        let (_dir, store) = open_tmp();
        let (project, phases) = store.create_project("Atlas", "Billing revamp").unwrap();
        assert_eq!(project.id, 1);
        assert_eq!(phases.len(), 6);
        assert!(phases[0].is(PhaseStatus::InProgress));
        assert!(phases[1..].iter().all(|p| p.is(PhaseStatus::NotStarted)));
        assert_eq!(phases[2].phase_name, "Architecture & High-Level Design");
    }

    #[test]
    fn ids_are_unique_across_projects() {
        let (_dir, store) = open_tmp();
        let (a, a_phases) = store.create_project("A", "").unwrap();
        let (b, b_phases) = store.create_project("B", "").unwrap();
        assert_ne!(a.id, b.id);
        assert!(a_phases.iter().all(|p| b_phases.iter().all(|q| q.id != p.id)));
    }

    #[test]
    fn phases_for_returns_only_that_project_in_order() {
        let (_dir, store) = open_tmp();
        store.create_project("A", "").unwrap();
        let (b, _) = store.create_project("B", "").unwrap();
        let phases = store.phases_for(b.id).unwrap();
        assert_eq!(phases.len(), 6);
        assert!(phases.iter().all(|p| p.project_id == b.id));
        let numbers: Vec<u8> = phases.iter().map(|p| p.phase_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn count_by_status_counts_phase_records() {
        let (_dir, store) = open_tmp();
        let (_, a) = store.create_project("A", "").unwrap();
        let (_, b) = store.create_project("B", "").unwrap();
        store
            .set_phase_status(a[0].id, PhaseStatus::PendingApproval)
            .unwrap();
        store
            .set_phase_status(b[0].id, PhaseStatus::PendingApproval)
            .unwrap();
        assert_eq!(store.count_by_status(PhaseStatus::PendingApproval).unwrap(), 2);
        assert_eq!(store.count_by_status(PhaseStatus::NotStarted).unwrap(), 10);
    }

    #[test]
    fn in_progress_phase_becomes_current() {
        let (_dir, store) = open_tmp();
        let (project, phases) = store.create_project("A", "").unwrap();
        store
            .set_phase_status(phases[2].id, PhaseStatus::InProgress)
            .unwrap();
        assert_eq!(store.project(project.id).unwrap().unwrap().current_phase, 3);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let (_dir, store) = open_tmp();
        assert!(store.project(99).unwrap().is_none());
        assert!(matches!(
            store.set_phase_status(99, PhaseStatus::Approved),
            Err(CopilotError::PhaseNotFound(99))
        ));
        assert!(matches!(
            store.set_project_status(5, ProjectStatus::Completed),
            Err(CopilotError::ProjectNotFound(5))
        ));
    }

    #[test]
    fn update_phase_data_persists_edits() {
        let (_dir, store) = open_tmp();
        let (_, phases) = store.create_project("A", "").unwrap();
        store
            .update_phase_data(phases[0].id, |data| {
                data.add_risk(Risk {
                    risk: "Unclear scope".into(),
                    severity: Severity::High,
                    mitigation: Some("Workshop".into()),
                })
            })
            .unwrap();
        let reloaded = store.phase(phases[0].id).unwrap().unwrap();
        assert_eq!(reloaded.data.risks().len(), 1);
    }

    fn risk(name: &str) -> Risk {
        Risk {
            risk: name.into(),
            severity: Severity::Medium,
            mitigation: None,
        }
    }

    #[test]
    fn concurrent_edits_of_one_phase_are_both_kept() {
        let (_dir, store) = open_tmp();
        let (_, phases) = store.create_project("A", "").unwrap();
        let id = phases[0].id;

        let (started_tx, started_rx) = std::sync::mpsc::channel();
        let slow = {
            let store = store.clone();
            std::thread::spawn(move || {
                store
                    .update_phase_data(id, |data| {
                        started_tx.send(()).unwrap();
                        std::thread::sleep(std::time::Duration::from_millis(150));
                        data.add_risk(risk("A"))
                    })
                    .unwrap();
            })
        };
        started_rx.recv().unwrap();
        store.update_phase_data(id, |data| data.add_risk(risk("B"))).unwrap();
        slow.join().unwrap();

        let names: Vec<String> = store
            .phase(id)
            .unwrap()
            .unwrap()
            .data
            .risks()
            .into_iter()
            .map(|r| r.risk)
            .collect();
        assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn failed_edit_writes_nothing() {
        let (_dir, store) = open_tmp();
        let (_, phases) = store.create_project("A", "").unwrap();
        let result = store.update_phase_data(phases[0].id, |data| {
            data.add_risk(risk("half-done"))?;
            Err(CopilotError::InvalidPhaseNumber(9))
        });
        assert!(result.is_err());
        assert!(store.phase(phases[0].id).unwrap().unwrap().data.risks().is_empty());
    }

    #[test]
    fn phases_grouped_in_one_pass() {
        let (_dir, store) = open_tmp();
        let (a, _) = store.create_project("A", "").unwrap();
        let (b, _) = store.create_project("B", "").unwrap();
        let grouped = store.phases_grouped().unwrap();
        assert_eq!(grouped.len(), 2);
        for pid in [a.id, b.id] {
            let numbers: Vec<u8> = grouped[&pid].iter().map(|p| p.phase_number).collect();
            assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
            assert!(grouped[&pid].iter().all(|p| p.project_id == pid));
        }
    }

    #[test]
    fn reopen_preserves_records_and_counters() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artifacts.redb");
        {
            let store = RedbArtifactStore::open(&path).unwrap();
            store.create_project("A", "").unwrap();
        }
        let store = RedbArtifactStore::open(&path).unwrap();
        let (b, _) = store.create_project("B", "").unwrap();
        assert_eq!(b.id, 2);
        assert_eq!(store.projects().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn trait_reads_run_on_blocking_pool() {
        let (_dir, store) = open_tmp();
        let (project, _) = store.create_project("A", "desc").unwrap();
        let found = store.get_project(project.id).await.unwrap().unwrap();
        assert_eq!(found.name, "A");
        assert_eq!(store.list_phases(project.id).await.unwrap().len(), 6);
        assert_eq!(
            store
                .count_phases_by_status(PhaseStatus::InProgress)
                .await
                .unwrap(),
            1
        );
    }
}
