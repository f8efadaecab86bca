use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use copilot_core::index::{Memory, MemoryStats};
use copilot_core::types::{MemoryKind, PhaseId, ProjectId};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddMemoryBody {
    pub kind: String,
    pub content: String,
    #[serde(default)]
    pub phase_id: Option<PhaseId>,
}

/// POST /api/projects/{id}/memories: store a memory for a project.
pub async fn add_memory(
    State(app): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Json(body): Json<AddMemoryBody>,
) -> Result<(StatusCode, Json<Memory>), AppError> {
    let kind: MemoryKind = body.kind.parse()?;
    if body.content.trim().is_empty() {
        return Err(AppError::bad_request("memory content must not be empty"));
    }
    let workspace = app.workspace.clone();
    let memory = tokio::task::spawn_blocking(move || {
        workspace.add_memory(project_id, body.phase_id, kind, &body.content)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok((StatusCode::CREATED, Json(memory)))
}

#[derive(Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub project_id: Option<ProjectId>,
}

/// GET /api/memories/stats: counts by kind, optionally for one project.
pub async fn stats(
    State(app): State<AppState>,
    Query(q): Query<StatsQuery>,
) -> Result<Json<MemoryStats>, AppError> {
    let workspace = app.workspace.clone();
    let stats = tokio::task::spawn_blocking(move || workspace.index.stats(q.project_id))
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(stats))
}
