use axum::extract::State;
use axum::Json;
use copilot_core::workspace::PendingApproval;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/approvals: phases waiting for sign-off. Approve or reject one
/// through `PUT /api/phases/{id}/status`.
pub async fn list(State(app): State<AppState>) -> Result<Json<Vec<PendingApproval>>, AppError> {
    Ok(Json(app.workspace.pending_approvals().await?))
}
