use axum::extract::{Path, State};
use axum::Json;
use copilot_core::analysis::Analysis;
use copilot_core::phase::Risk;
use copilot_core::project::Phase;
use copilot_core::types::{PhaseId, PhaseStatus};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StatusBody {
    pub status: String,
}

/// PUT /api/phases/{id}/status: move a phase to a new status.
pub async fn set_status(
    State(app): State<AppState>,
    Path(id): Path<PhaseId>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Phase>, AppError> {
    let status: PhaseStatus = body.status.parse()?;
    let workspace = app.workspace.clone();
    let phase = tokio::task::spawn_blocking(move || workspace.store.set_phase_status(id, status))
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(phase))
}

/// POST /api/phases/{id}/risks/analyze: derive risks from the project's
/// requirements and record the new ones on this phase.
pub async fn analyze_risks(
    State(app): State<AppState>,
    Path(id): Path<PhaseId>,
) -> Result<Json<Analysis<Risk>>, AppError> {
    Ok(Json(app.workspace.analyze_risks(id).await?))
}
