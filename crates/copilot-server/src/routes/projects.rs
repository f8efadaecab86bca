use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use copilot_core::analysis::Analysis;
use copilot_core::documents::{DocumentKind, GeneratedDocument};
use copilot_core::phase::Requirement;
use copilot_core::types::ProjectId;
use copilot_core::CopilotError;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/projects: all projects, oldest first.
pub async fn list_projects(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let workspace = app.workspace.clone();
    let result = tokio::task::spawn_blocking(move || {
        let projects = workspace.store.projects()?;
        Ok::<_, CopilotError>(serde_json::json!(projects))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(Deserialize)]
pub struct CreateProjectBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// POST /api/projects: create a project with its six phases.
pub async fn create_project(
    State(app): State<AppState>,
    Json(body): Json<CreateProjectBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("project name must not be empty"));
    }
    let workspace = app.workspace.clone();
    let result = tokio::task::spawn_blocking(move || {
        let (project, phases) = workspace.store.create_project(&name, &body.description)?;
        Ok::<_, CopilotError>(serde_json::json!({ "project": project, "phases": phases }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok((StatusCode::CREATED, Json(result)))
}

/// GET /api/projects/{id}: project detail with its phases.
pub async fn get_project(
    State(app): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Json<serde_json::Value>, AppError> {
    let workspace = app.workspace.clone();
    let result = tokio::task::spawn_blocking(move || {
        let project = workspace
            .store
            .project(id)?
            .ok_or(CopilotError::ProjectNotFound(id))?;
        let phases = workspace.store.phases_for(id)?;
        Ok::<_, CopilotError>(serde_json::json!({ "project": project, "phases": phases }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// POST /api/projects/{id}/documents/{kind}: draft a PRD or BRD.
pub async fn generate_document(
    State(app): State<AppState>,
    Path((id, kind)): Path<(ProjectId, String)>,
) -> Result<Json<GeneratedDocument>, AppError> {
    let kind: DocumentKind = kind.parse()?;
    let doc = app.workspace.generate_document(id, kind).await?;
    Ok(Json(doc))
}

#[derive(Deserialize)]
pub struct ExtractBody {
    pub text: String,
}

/// POST /api/projects/{id}/requirements/extract: turn free text into
/// phase-1 requirements.
pub async fn extract_requirements(
    State(app): State<AppState>,
    Path(id): Path<ProjectId>,
    Json(body): Json<ExtractBody>,
) -> Result<Json<Analysis<Requirement>>, AppError> {
    if body.text.trim().is_empty() {
        return Err(AppError::bad_request("text must not be empty"));
    }
    let extracted = app.workspace.extract_requirements(id, &body.text).await?;
    Ok(Json(extracted))
}
