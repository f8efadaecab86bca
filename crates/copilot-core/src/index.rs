//! Memory index: stored project history retrievable by relevance.
//!
//! # Storage
//!
//! Memories are appended to a single redb table keyed by a 24-byte
//! composite key:
//! ```text
//! [ created_at_ms: u64 big-endian (8 bytes) | uuid: 16 bytes ]
//! ```
//! so a table scan yields memories in creation order.
//!
//! # Retrieval
//!
//! On open every stored memory is loaded into an in-RAM tantivy index; each
//! new memory is written to redb first and then added to the live index.
//! Similarity is the BM25 score of the memory text against the query
//! (higher is more similar). Scope filtering is applied as zero-score
//! clauses so it never changes the ranking.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tantivy::{
    collector::TopDocs,
    query::{BooleanQuery, ConstScoreQuery, Occur, Query, QueryParser, TermQuery},
    schema::{Field, IndexRecordOption, Schema, Value as _, STORED, STRING, TEXT},
    Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term,
};
use uuid::Uuid;

use crate::error::{CopilotError, Result};
use crate::types::{MemoryId, MemoryKind, PhaseId, ProjectId, ScopeFilter};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One stored text entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: MemoryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_id: Option<PhaseId>,
    pub kind: MemoryKind,
    pub content: String,
    #[serde(default)]
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredMemory {
    pub id: MemoryId,
    pub kind: MemoryKind,
    pub content: String,
    pub similarity: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoryStats {
    pub total_memories: usize,
    pub by_kind: BTreeMap<String, usize>,
    /// Only reported for global stats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_project: Option<BTreeMap<ProjectId, usize>>,
}

// ---------------------------------------------------------------------------
// EmbeddingIndex
// ---------------------------------------------------------------------------

/// Relevance-ranked retrieval over stored memories, partitioned by scope.
#[async_trait]
pub trait EmbeddingIndex: Send + Sync {
    /// Up to `limit` memories inside `filter`, most similar first.
    async fn search(
        &self,
        filter: ScopeFilter,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredMemory>>;

    /// Append a memory tagged with `filter`'s project and phase.
    async fn store(
        &self,
        filter: ScopeFilter,
        kind: MemoryKind,
        text: &str,
        metadata: Value,
    ) -> Result<MemoryId>;
}

// ---------------------------------------------------------------------------
// Table definition and keys
// ---------------------------------------------------------------------------

const MEMORIES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("memories");

/// Tag used in the tantivy `project`/`phase` fields when the id is absent.
const UNSCOPED: &str = "none";

fn memory_key(ts: DateTime<Utc>, id: Uuid) -> [u8; 24] {
    let mut key = [0u8; 24];
    let ms = ts.timestamp_millis().max(0) as u64;
    key[..8].copy_from_slice(&ms.to_be_bytes());
    key[8..].copy_from_slice(id.as_bytes());
    key
}

fn index_err(e: impl std::fmt::Display) -> CopilotError {
    CopilotError::Index(e.to_string())
}

fn tag(id: Option<u64>) -> String {
    id.map(|v| v.to_string())
        .unwrap_or_else(|| UNSCOPED.to_string())
}

// ---------------------------------------------------------------------------
// MemoryIndex
// ---------------------------------------------------------------------------

struct Fields {
    id: Field,
    kind: Field,
    content: Field,
    project: Field,
    phase: Field,
}

struct Inner {
    db: Database,
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    fields: Fields,
}

/// redb-backed memory store with an in-RAM tantivy mirror.
#[derive(Clone)]
pub struct MemoryIndex {
    inner: Arc<Inner>,
}

fn build_schema() -> (Schema, Fields) {
    let mut builder = Schema::builder();
    let id = builder.add_text_field("id", STRING | STORED);
    let kind = builder.add_text_field("kind", STRING | STORED);
    let content = builder.add_text_field("content", TEXT | STORED);
    let project = builder.add_text_field("project", STRING);
    let phase = builder.add_text_field("phase", STRING);
    (
        builder.build(),
        Fields {
            id,
            kind,
            content,
            project,
            phase,
        },
    )
}

fn to_doc(fields: &Fields, memory: &Memory) -> TantivyDocument {
    let mut doc = TantivyDocument::default();
    doc.add_text(fields.id, memory.id.to_string());
    doc.add_text(fields.kind, memory.kind.as_str());
    doc.add_text(fields.content, &memory.content);
    doc.add_text(fields.project, tag(memory.project_id));
    doc.add_text(fields.phase, tag(memory.phase_id));
    doc
}

impl MemoryIndex {
    /// Open or create the memory store at `path` and rebuild the search
    /// index from every stored memory.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(index_err)?;
        let wt = db.begin_write().map_err(index_err)?;
        wt.open_table(MEMORIES).map_err(index_err)?;
        wt.commit().map_err(index_err)?;

        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        let mut writer: IndexWriter = index.writer(15_000_000).map_err(index_err)?;

        let existing = read_all(&db)?;
        for memory in &existing {
            writer
                .add_document(to_doc(&fields, memory))
                .map_err(index_err)?;
        }
        writer.commit().map_err(index_err)?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e: tantivy::TantivyError| index_err(e))?;

        tracing::debug!(count = existing.len(), "memory index loaded");
        Ok(Self {
            inner: Arc::new(Inner {
                db,
                index,
                reader,
                writer: Mutex::new(writer),
                fields,
            }),
        })
    }

    /// Append a memory. The redb write commits before the search index is
    /// updated.
    pub fn insert(
        &self,
        filter: ScopeFilter,
        kind: MemoryKind,
        text: &str,
        metadata: Value,
    ) -> Result<Memory> {
        let memory = Memory {
            id: Uuid::new_v4(),
            project_id: filter.project_id,
            phase_id: filter.phase_id,
            kind,
            content: text.to_string(),
            metadata,
            created_at: Utc::now(),
        };
        let inner = &self.inner;

        let key = memory_key(memory.created_at, memory.id);
        let value = serde_json::to_vec(&memory)?;
        let wt = inner.db.begin_write().map_err(index_err)?;
        {
            let mut table = wt.open_table(MEMORIES).map_err(index_err)?;
            table
                .insert(key.as_slice(), value.as_slice())
                .map_err(index_err)?;
        }
        wt.commit().map_err(index_err)?;

        {
            let mut writer = inner
                .writer
                .lock()
                .map_err(|_| index_err("index writer lock poisoned"))?;
            writer
                .add_document(to_doc(&inner.fields, &memory))
                .map_err(index_err)?;
            writer.commit().map_err(index_err)?;
        }
        inner.reader.reload().map_err(index_err)?;

        tracing::debug!(id = %memory.id, kind = %kind, project_id = ?filter.project_id, "memory stored");
        Ok(memory)
    }

    /// BM25 search restricted to `filter`. Malformed query syntax is parsed
    /// leniently; a query with no searchable terms matches nothing.
    pub fn query(&self, filter: ScopeFilter, text: &str, limit: usize) -> Result<Vec<ScoredMemory>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let inner = &self.inner;
        let f = &inner.fields;

        let parser = QueryParser::for_index(&inner.index, vec![f.content]);
        let (text_query, _errors) = parser.parse_query_lenient(text);

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = vec![(Occur::Must, text_query)];
        if let Some(project_id) = filter.project_id {
            clauses.push((Occur::Must, zero_score(term(f.project, &project_id.to_string()))));
            if let Some(phase_id) = filter.phase_id {
                let either: Box<dyn Query> = Box::new(BooleanQuery::new(vec![
                    (Occur::Should, term(f.phase, &phase_id.to_string())),
                    (Occur::Should, term(f.phase, UNSCOPED)),
                ]));
                clauses.push((Occur::Must, zero_score(either)));
            }
        }
        let query = BooleanQuery::new(clauses);

        let searcher = inner.reader.searcher();
        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .map_err(index_err)?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (score, addr) in top_docs {
            let doc: TantivyDocument = searcher.doc(addr).map_err(index_err)?;
            let text_of = |field: Field| {
                doc.get_first(field)
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string()
            };
            let id = Uuid::parse_str(&text_of(f.id)).map_err(index_err)?;
            let kind = text_of(f.kind).parse()?;
            results.push(ScoredMemory {
                id,
                kind,
                content: text_of(f.content),
                similarity: score,
            });
        }
        Ok(results)
    }

    /// Memories for one project (or all), newest first.
    pub fn memories(&self, project_id: Option<ProjectId>) -> Result<Vec<Memory>> {
        let mut all = read_all(&self.inner.db)?;
        if let Some(pid) = project_id {
            all.retain(|m| m.project_id == Some(pid));
        }
        all.reverse();
        Ok(all)
    }

    /// Counts by kind for one project, or by kind and project globally.
    pub fn stats(&self, project_id: Option<ProjectId>) -> Result<MemoryStats> {
        let memories = self.memories(project_id)?;
        let mut stats = MemoryStats {
            total_memories: memories.len(),
            ..Default::default()
        };
        for m in &memories {
            *stats.by_kind.entry(m.kind.as_str().to_string()).or_default() += 1;
        }
        if project_id.is_none() {
            let mut by_project = BTreeMap::new();
            for pid in memories.iter().filter_map(|m| m.project_id) {
                *by_project.entry(pid).or_default() += 1;
            }
            stats.by_project = Some(by_project);
        }
        Ok(stats)
    }
}

fn term(field: Field, value: &str) -> Box<dyn Query> {
    Box::new(TermQuery::new(
        Term::from_field_text(field, value),
        IndexRecordOption::Basic,
    ))
}

fn zero_score(query: Box<dyn Query>) -> Box<dyn Query> {
    Box::new(ConstScoreQuery::new(query, 0.0))
}

fn read_all(db: &Database) -> Result<Vec<Memory>> {
    let rt = db.begin_read().map_err(index_err)?;
    let table = rt.open_table(MEMORIES).map_err(index_err)?;
    let mut result = Vec::new();
    for entry in table.iter().map_err(index_err)? {
        let (_, v) = entry.map_err(index_err)?;
        result.push(serde_json::from_slice(v.value())?);
    }
    Ok(result)
}

#[async_trait]
impl EmbeddingIndex for MemoryIndex {
    async fn search(
        &self,
        filter: ScopeFilter,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredMemory>> {
        let this = self.clone();
        let query = query.to_string();
        tokio::task::spawn_blocking(move || this.query(filter, &query, limit))
            .await
            .map_err(|e| CopilotError::Join(e.to_string()))?
    }

    async fn store(
        &self,
        filter: ScopeFilter,
        kind: MemoryKind,
        text: &str,
        metadata: Value,
    ) -> Result<MemoryId> {
        let this = self.clone();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || this.insert(filter, kind, &text, metadata))
            .await
            .map_err(|e| CopilotError::Join(e.to_string()))?
            .map(|m| m.id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
