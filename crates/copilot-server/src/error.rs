use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use copilot_core::CopilotError;

// ---------------------------------------------------------------------------
// Internal sentinel for explicit 400 Bad Request errors
// ---------------------------------------------------------------------------

/// Carries an explicit HTTP 400 through the `anyhow::Error` chain for
/// request problems that have no `CopilotError` variant.
#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses. The body is always `{"error": ..}`.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }

    fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<BadRequestError>().is_some() {
            return StatusCode::BAD_REQUEST;
        }
        let Some(e) = self.0.downcast_ref::<CopilotError>() else {
            return StatusCode::INTERNAL_SERVER_ERROR;
        };
        match e {
            CopilotError::ProjectNotFound(_) | CopilotError::PhaseNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            CopilotError::NotInitialized
            | CopilotError::PhaseOutsideProject { .. }
            | CopilotError::InvalidScope(_)
            | CopilotError::InvalidStatus(_)
            | CopilotError::InvalidPhaseNumber(_)
            | CopilotError::InvalidMemoryKind(_)
            | CopilotError::InvalidDocumentKind(_)
            | CopilotError::InvalidSeverity(_) => StatusCode::BAD_REQUEST,
            CopilotError::Llm(_) => StatusCode::BAD_GATEWAY,
            CopilotError::Store(_)
            | CopilotError::Index(_)
            | CopilotError::Join(_)
            | CopilotError::Io(_)
            | CopilotError::Yaml(_)
            | CopilotError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
