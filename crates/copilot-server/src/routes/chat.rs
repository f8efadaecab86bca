use axum::extract::State;
use axum::Json;
use copilot_core::{ChatRequest, ChatResponse};

use crate::error::AppError;
use crate::state::AppState;

/// POST /api/chat/query: classify, assemble context and answer.
pub async fn query(
    State(app): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let response = app.chat.handle(request).await?;
    tracing::info!(
        intent = %response.intent,
        confidence = response.confidence_score,
        "chat query answered"
    );
    Ok(Json(response))
}

/// GET /api/chat/health: report which backends are reachable.
pub async fn health(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let workspace = app.workspace.clone();
    let (index_ok, memory_index, artifact_store) = tokio::task::spawn_blocking(move || {
        let index_stats = workspace.index.stats(None);
        let index_ok = index_stats.is_ok();
        let memory_index = match index_stats {
            Ok(stats) => serde_json::json!({
                "status": "connected",
                "total_memories": stats.total_memories,
            }),
            Err(e) => serde_json::json!({ "status": "error", "error": e.to_string() }),
        };
        let artifact_store = match workspace.store.projects() {
            Ok(projects) => serde_json::json!({
                "status": "connected",
                "total_projects": projects.len(),
            }),
            Err(e) => serde_json::json!({ "status": "error", "error": e.to_string() }),
        };
        (index_ok, memory_index, artifact_store)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?;

    // Retrieval needs a reachable index and a non-zero snippet limit.
    let rag_enabled = index_ok && app.workspace.config.retrieval.effective_limit() > 0;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": "sdlc-copilot",
        "rag_enabled": rag_enabled,
        "llm_enabled": app.chat.llm_enabled(),
        "recording_enabled": app.chat.recording_enabled(),
        "memory_index": memory_index,
        "artifact_store": artifact_store,
    })))
}
