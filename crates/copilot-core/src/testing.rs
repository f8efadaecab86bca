//! Shared fixtures and doubles for unit tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tempfile::TempDir;

use crate::config::RetrievalConfig;
use crate::context::ContextAssembler;
use crate::error::{CopilotError, Result};
use crate::index::{EmbeddingIndex, MemoryIndex, ScoredMemory};
use crate::llm::Completer;
use crate::project::{Phase, Project};
use crate::store::{ArtifactStore, RedbArtifactStore};
use crate::types::{MemoryId, MemoryKind, PhaseId, PhaseStatus, ProjectId, ScopeFilter};

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// A store and an index in a temporary directory.
pub struct Fixture {
    _dir: TempDir,
    pub store: RedbArtifactStore,
    pub index: MemoryIndex,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = RedbArtifactStore::open(&dir.path().join("artifacts.redb")).unwrap();
        let index = MemoryIndex::open(&dir.path().join("memories.redb")).unwrap();
        Self {
            _dir: dir,
            store,
            index,
        }
    }

    pub fn assembler(&self) -> ContextAssembler {
        self.assembler_with(RetrievalConfig::default())
    }

    pub fn assembler_with(&self, retrieval: RetrievalConfig) -> ContextAssembler {
        ContextAssembler::new(
            Arc::new(self.store.clone()),
            Arc::new(self.index.clone()),
            retrieval,
        )
    }
}

fn down() -> CopilotError {
    CopilotError::Store("connection refused".to_string())
}

/// Artifact store whose every read fails.
pub struct FailingStore;

#[async_trait]
impl ArtifactStore for FailingStore {
    async fn get_project(&self, _id: ProjectId) -> Result<Option<Project>> {
        Err(down())
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        Err(down())
    }

    async fn list_phases(&self, _project_id: ProjectId) -> Result<Vec<Phase>> {
        Err(down())
    }

    async fn get_phase(&self, _id: PhaseId) -> Result<Option<Phase>> {
        Err(down())
    }

    async fn phases_by_project(&self) -> Result<BTreeMap<ProjectId, Vec<Phase>>> {
        Err(down())
    }

    async fn count_phases_by_status(&self, _status: PhaseStatus) -> Result<usize> {
        Err(down())
    }
}

/// Memory index whose every call fails.
pub struct FailingIndex;

#[async_trait]
impl EmbeddingIndex for FailingIndex {
    async fn search(
        &self,
        _filter: ScopeFilter,
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<ScoredMemory>> {
        Err(CopilotError::Index("index offline".to_string()))
    }

    async fn store(
        &self,
        _filter: ScopeFilter,
        _kind: MemoryKind,
        _text: &str,
        _metadata: Value,
    ) -> Result<MemoryId> {
        Err(CopilotError::Index("index offline".to_string()))
    }
}

/// Completer returning a canned reply (or failing) and remembering prompts.
pub struct StubCompleter {
    reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl StubCompleter {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Completer for StubCompleter {
    async fn complete(&self, _system: Option<&str>, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .ok_or(CopilotError::Llm(llm_client::LlmError::EmptyResponse))
    }
}
