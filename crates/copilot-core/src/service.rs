//! The chat pipeline entry point.
//!
//! ```text
//! ChatRequest ─▶ Scope::from_parts ─▶ classify ─▶ assemble ─▶ route ─▶ ChatResponse
//!                                                                 └──▶ record (after reply)
//! ```
//!
//! A [`ChatService`] is built once from its parts and shared behind an
//! `Arc`; it holds no mutable state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::classifier::{IntentClassifier, KeywordClassifier};
use crate::config::Config;
use crate::context::ContextAssembler;
use crate::error::Result;
use crate::index::EmbeddingIndex;
use crate::llm::Completer;
use crate::recorder::{InteractionRecorder, StoredInteraction};
use crate::router::ResponseRouter;
use crate::store::ArtifactStore;
use crate::types::{ConversationTurn, Intent, PhaseId, ProjectId, Scope, ScopeKind, Source};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    /// `dashboard` or `project`.
    #[serde(alias = "context_type")]
    pub scope_type: String,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub phase_id: Option<PhaseId>,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
}

impl ChatRequest {
    pub fn dashboard(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            scope_type: ScopeKind::Dashboard.as_str().to_string(),
            project_id: None,
            phase_id: None,
            conversation_history: Vec::new(),
        }
    }

    pub fn project(query: impl Into<String>, project_id: ProjectId, phase_id: Option<PhaseId>) -> Self {
        Self {
            query: query.into(),
            scope_type: ScopeKind::Project.as_str().to_string(),
            project_id: Some(project_id),
            phase_id,
            conversation_history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.conversation_history = history;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub confidence_score: u8,
    pub sources: Vec<Source>,
    pub context_type: ScopeKind,
    pub intent: Intent,
}

pub struct ChatService {
    classifier: Box<dyn IntentClassifier>,
    assembler: ContextAssembler,
    router: ResponseRouter,
    recorder: InteractionRecorder,
    llm_enabled: bool,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        index: Arc<dyn EmbeddingIndex>,
        config: &Config,
        completer: Option<Arc<dyn Completer>>,
    ) -> Self {
        Self {
            classifier: Box::new(KeywordClassifier::default()),
            assembler: ContextAssembler::new(store, index.clone(), config.retrieval.clone()),
            llm_enabled: completer.is_some(),
            router: ResponseRouter::new(completer),
            recorder: InteractionRecorder::new(index, config.recording.enabled),
        }
    }

    /// Replace the keyword classifier.
    pub fn with_classifier(mut self, classifier: Box<dyn IntentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn llm_enabled(&self) -> bool {
        self.llm_enabled
    }

    pub fn recording_enabled(&self) -> bool {
        self.recorder.is_enabled()
    }

    /// Answer a query; the interaction is recorded in the background.
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResponse> {
        let (response, interaction) = self.answer(request).await?;
        let recorder = self.recorder.clone();
        tokio::spawn(async move {
            recorder.record(interaction).await;
        });
        Ok(response)
    }

    /// Answer a query and wait for the recording to finish.
    pub async fn handle_inline(&self, request: ChatRequest) -> Result<ChatResponse> {
        let (response, interaction) = self.answer(request).await?;
        self.recorder.record(interaction).await;
        Ok(response)
    }

    async fn answer(&self, request: ChatRequest) -> Result<(ChatResponse, StoredInteraction)> {
        let scope = Scope::from_parts(&request.scope_type, request.project_id, request.phase_id)?;
        let history = request.conversation_history.as_slice();

        let intent = self.classifier.classify(&request.query, &scope, history);
        let context = self.assembler.assemble(intent, &scope, &request.query).await;
        let reply = self
            .router
            .route(intent, &scope, &context, &request.query, history)
            .await;
        tracing::info!(
            scope = %scope.kind(),
            %intent,
            confidence = reply.confidence_score,
            "query answered"
        );

        let interaction = StoredInteraction {
            scope,
            query: request.query,
            response: reply.response.clone(),
            intent,
            sources: reply.sources.clone(),
        };
        let response = ChatResponse {
            response: reply.response,
            confidence_score: reply.confidence_score,
            sources: reply.sources,
            context_type: scope.kind(),
            intent,
        };
        Ok((response, interaction))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CopilotError;
    use crate::testing::Fixture;
    use std::time::Duration;

    fn service(fx: &Fixture, config: &Config) -> ChatService {
        ChatService::new(
            Arc::new(fx.store.clone()),
            Arc::new(fx.index.clone()),
            config,
            None,
        )
    }

    #[test]
    fn request_accepts_context_type_and_text_alias() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"query":"yes","context_type":"dashboard",
                "conversation_history":[{"role":"user","text":"hi"}]}"#,
        )
        .unwrap();
        assert_eq!(req.scope_type, "dashboard");
        assert_eq!(req.conversation_history[0].content, "hi");
    }

    #[tokio::test]
    async fn inline_handling_records_before_returning() {
        let fx = Fixture::new();
        let (p, _) = fx.store.create_project("Atlas", "").unwrap();
        let svc = service(&fx, &Config::default());

        let resp = svc
            .handle_inline(ChatRequest::project("what should I do next?", p.id, None))
            .await
            .unwrap();
        assert_eq!(resp.intent, Intent::PhaseGuidance);
        assert_eq!(resp.context_type, ScopeKind::Project);
        assert!(resp.response.contains("Phase 1: Requirements & Business Analysis"));

        let memories = fx.index.memories(Some(p.id)).unwrap();
        assert_eq!(memories.len(), 1);
        assert!(memories[0].content.starts_with("Q: what should I do next?\nA: "));
    }

    #[tokio::test]
    async fn background_recording_lands_eventually() {
        let fx = Fixture::new();
        let svc = service(&fx, &Config::default());
        svc.handle(ChatRequest::dashboard("hello")).await.unwrap();

        let mut stored = 0;
        for _ in 0..50 {
            stored = fx.index.memories(None).unwrap().len();
            if stored > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(stored, 1);
    }

    #[tokio::test]
    async fn recorded_answers_become_snippets() {
        let fx = Fixture::new();
        let (p, _) = fx.store.create_project("Atlas", "").unwrap();
        let svc = service(&fx, &Config::default());
        svc.handle_inline(ChatRequest::project("tell me about invoicing", p.id, None))
            .await
            .unwrap();
        let resp = svc
            .handle_inline(ChatRequest::project("invoicing", p.id, None))
            .await
            .unwrap();
        assert!(resp.response.contains("**Related notes**"));
    }

    #[tokio::test]
    async fn recording_can_be_disabled() {
        let fx = Fixture::new();
        let mut config = Config::default();
        config.recording.enabled = false;
        let svc = service(&fx, &config);
        assert!(!svc.recording_enabled());
        svc.handle_inline(ChatRequest::dashboard("hello")).await.unwrap();
        assert!(fx.index.memories(None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_scope_is_rejected() {
        let fx = Fixture::new();
        let svc = service(&fx, &Config::default());
        let mut req = ChatRequest::dashboard("hi");
        req.scope_type = "project".into();
        assert!(matches!(
            svc.handle(req).await,
            Err(CopilotError::InvalidScope(_))
        ));
        let mut req = ChatRequest::dashboard("hi");
        req.scope_type = "galaxy".into();
        assert!(matches!(
            svc.handle_inline(req).await,
            Err(CopilotError::InvalidScope(_))
        ));
        assert!(fx.index.memories(None).unwrap().is_empty());
    }

    struct AlwaysRisks;

    impl IntentClassifier for AlwaysRisks {
        fn classify(&self, _query: &str, _scope: &Scope, _history: &[ConversationTurn]) -> Intent {
            Intent::RiskAnalysis
        }
    }

    #[tokio::test]
    async fn classifier_can_be_substituted() {
        let fx = Fixture::new();
        let svc = service(&fx, &Config::default()).with_classifier(Box::new(AlwaysRisks));
        let resp = svc
            .handle_inline(ChatRequest::project("hello", 1, None))
            .await
            .unwrap();
        assert_eq!(resp.intent, Intent::RiskAnalysis);
        assert!(resp.response.contains("No risks have been identified yet"));
    }

    #[tokio::test]
    async fn dashboard_ignores_ids() {
        let fx = Fixture::new();
        let svc = service(&fx, &Config::default());
        let mut req = ChatRequest::dashboard("how many projects?");
        req.project_id = Some(99);
        let resp = svc.handle_inline(req).await.unwrap();
        assert_eq!(resp.context_type, ScopeKind::Dashboard);
        assert!(resp.response.contains("0 total projects"));
    }
}
