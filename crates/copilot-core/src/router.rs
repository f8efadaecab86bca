use std::collections::HashMap;
use std::sync::Arc;

use crate::context::ContextPayload;
use crate::llm::Completer;
use crate::strategies::{self, Reply, Strategy, StrategyInput, StrategyKind};
use crate::types::{ConversationTurn, Intent, Scope, ScopeKind, Source};

const GENERAL_SYSTEM_PROMPT: &str = "You are an SDLC copilot helping a team move projects \
through six phases: Requirements & Business Analysis, Planning & Product Backlog, \
Architecture & High-Level Design, Detailed Design & Specifications, Development, Testing & \
Code Review, and Deployment, Release & Operations. Answer briefly and only from the context \
you are given. Say so when the context does not contain the answer.";

/// Dispatches `(scope kind, intent)` to a reply strategy.
///
/// The table is built once. A pair that is not in it is answered by the
/// scope's general strategy. When a completer is present, general
/// strategies with retrieved snippets are answered by the model instead,
/// falling back to the templated menu on any failure.
pub struct ResponseRouter {
    table: HashMap<(ScopeKind, Intent), Strategy>,
    completer: Option<Arc<dyn Completer>>,
}

impl ResponseRouter {
    pub fn new(completer: Option<Arc<dyn Completer>>) -> Self {
        Self {
            table: strategies::table().into_iter().collect(),
            completer,
        }
    }

    pub fn templated() -> Self {
        Self::new(None)
    }

    pub fn strategy_for(&self, kind: ScopeKind, intent: Intent) -> Strategy {
        self.table
            .get(&(kind, intent))
            .copied()
            .unwrap_or_else(|| strategies::general(kind))
    }

    pub async fn route(
        &self,
        intent: Intent,
        scope: &Scope,
        context: &ContextPayload,
        query: &str,
        history: &[ConversationTurn],
    ) -> Reply {
        let strategy = self.strategy_for(scope.kind(), intent);
        tracing::debug!(strategy = strategy.id, %intent, "routing");

        if strategy.kind == StrategyKind::General && !context.snippets.is_empty() {
            if let Some(completer) = &self.completer {
                if let Some(reply) = model_reply(completer.as_ref(), query, context).await {
                    return reply;
                }
            }
        }

        let mut reply = (strategy.generate)(&StrategyInput {
            scope,
            query,
            history,
            context,
        });
        reply.confidence_score = reply.confidence_score.min(100);
        reply
    }
}

fn general_prompt(query: &str, context: &ContextPayload) -> String {
    let mut prompt = String::new();
    if let Some(project) = context.facts.project() {
        prompt.push_str(&format!(
            "Project: {} ({})\nPhases completed: {}/{}\n\n",
            project.project.name,
            project.project.status,
            project.progress.completed,
            project.progress.total_phases
        ));
    } else if let Some(dashboard) = context.facts.dashboard() {
        prompt.push_str(&format!("Projects on the platform: {}\n\n", dashboard.total_projects));
    }
    prompt.push_str("Relevant project notes:\n");
    for (i, snippet) in context.snippets.iter().enumerate() {
        prompt.push_str(&format!("[{}] {snippet}\n", i + 1));
    }
    prompt.push_str(&format!("\nQuestion: {query}"));
    prompt
}

async fn model_reply(completer: &dyn Completer, query: &str, context: &ContextPayload) -> Option<Reply> {
    let prompt = general_prompt(query, context);
    match completer.complete(Some(GENERAL_SYSTEM_PROMPT), &prompt).await {
        Ok(text) if !text.trim().is_empty() => Some(Reply {
            response: text,
            confidence_score: 80,
            sources: vec![Source::GeneralAi, Source::VectorDatabase],
        }),
        Ok(_) => {
            tracing::warn!("language model returned no text; using templated reply");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "language model failed; using templated reply");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
