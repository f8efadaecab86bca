use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::index::EmbeddingIndex;
use crate::types::{Intent, MemoryId, MemoryKind, Scope, Source};

/// One answered query, as written to the memory index.
#[derive(Debug, Clone, Serialize)]
pub struct StoredInteraction {
    pub scope: Scope,
    pub query: String,
    pub response: String,
    pub intent: Intent,
    pub sources: Vec<Source>,
}

impl StoredInteraction {
    /// Searchable text of the interaction.
    pub fn content(&self) -> String {
        format!("Q: {}\nA: {}", self.query, self.response)
    }
}

/// Appends answered queries to the memory index so later searches can
/// surface them. Never fails the caller.
#[derive(Clone)]
pub struct InteractionRecorder {
    index: Arc<dyn EmbeddingIndex>,
    enabled: bool,
}

impl InteractionRecorder {
    pub fn new(index: Arc<dyn EmbeddingIndex>, enabled: bool) -> Self {
        Self { index, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn record(&self, interaction: StoredInteraction) -> Option<MemoryId> {
        if !self.enabled {
            return None;
        }
        let metadata = json!({
            "query": interaction.query,
            "response": interaction.response,
            "intent": interaction.intent,
            "sources": interaction.sources,
        });
        let result = self
            .index
            .store(
                interaction.scope.filter(),
                MemoryKind::Chat,
                &interaction.content(),
                metadata,
            )
            .await;
        match result {
            Ok(id) => {
                tracing::debug!(%id, intent = %interaction.intent, "interaction recorded");
                Some(id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to record interaction");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingIndex, Fixture};

    fn interaction(scope: Scope) -> StoredInteraction {
        StoredInteraction {
            scope,
            query: "what are the risks?".into(),
            response: "No risks have been identified yet.".into(),
            intent: Intent::RiskAnalysis,
            sources: vec![Source::ProjectData],
        }
    }

    #[tokio::test]
    async fn recording_twice_stores_two_entries() {
        let fx = Fixture::new();
        let recorder = InteractionRecorder::new(Arc::new(fx.index.clone()), true);
        let scope = Scope::Project { project_id: 3 };
        let a = recorder.record(interaction(scope)).await.unwrap();
        let b = recorder.record(interaction(scope)).await.unwrap();
        assert_ne!(a, b);

        let memories = fx.index.memories(Some(3)).unwrap();
        assert_eq!(memories.len(), 2);
        assert!(memories.iter().all(|m| m.kind == MemoryKind::Chat));
        assert_eq!(
            memories[0].content,
            "Q: what are the risks?\nA: No risks have been identified yet."
        );
        assert_eq!(memories[0].metadata["intent"], "risk_analysis");
        assert_eq!(memories[0].metadata["sources"][0], "Project Data");
    }

    #[tokio::test]
    async fn dashboard_interactions_are_unscoped() {
        let fx = Fixture::new();
        let recorder = InteractionRecorder::new(Arc::new(fx.index.clone()), true);
        recorder.record(interaction(Scope::Dashboard)).await.unwrap();
        let all = fx.index.memories(None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].project_id, None);
    }

    #[tokio::test]
    async fn phase_scope_tags_phase() {
        let fx = Fixture::new();
        let recorder = InteractionRecorder::new(Arc::new(fx.index.clone()), true);
        let scope = Scope::ProjectPhase {
            project_id: 2,
            phase_id: 9,
        };
        recorder.record(interaction(scope)).await.unwrap();
        assert_eq!(fx.index.memories(Some(2)).unwrap()[0].phase_id, Some(9));
    }

    #[tokio::test]
    async fn disabled_recorder_writes_nothing() {
        let fx = Fixture::new();
        let recorder = InteractionRecorder::new(Arc::new(fx.index.clone()), false);
        assert!(recorder.record(interaction(Scope::Dashboard)).await.is_none());
        assert!(fx.index.memories(None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn index_failure_is_swallowed() {
        let recorder = InteractionRecorder::new(Arc::new(FailingIndex), true);
        assert!(recorder.record(interaction(Scope::Dashboard)).await.is_none());
    }
}
