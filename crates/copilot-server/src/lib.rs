//! HTTP API for the SDLC copilot.
//!
//! Every handler works against one [`state::AppState`], opened once from a
//! copilot root. Blocking store and index calls run on the blocking pool.

pub mod error;
pub mod routes;
pub mod state;

use std::path::Path;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: state::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Chat
        .route("/api/chat/query", post(routes::chat::query))
        .route("/api/chat/health", get(routes::chat::health))
        // Projects
        .route("/api/projects", get(routes::projects::list_projects))
        .route("/api/projects", post(routes::projects::create_project))
        .route("/api/projects/{id}", get(routes::projects::get_project))
        .route(
            "/api/projects/{id}/documents/{kind}",
            post(routes::projects::generate_document),
        )
        .route(
            "/api/projects/{id}/requirements/extract",
            post(routes::projects::extract_requirements),
        )
        // Phases
        .route("/api/phases/{id}/status", put(routes::phases::set_status))
        .route(
            "/api/phases/{id}/risks/analyze",
            post(routes::phases::analyze_risks),
        )
        // Approvals
        .route("/api/approvals", get(routes::approvals::list))
        // Memories
        .route(
            "/api/projects/{id}/memories",
            post(routes::memories::add_memory),
        )
        .route("/api/memories/stats", get(routes::memories::stats))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Open the copilot root and serve the API until the process is stopped.
pub async fn serve(root: &Path, port: u16) -> anyhow::Result<()> {
    let app_state = state::AppState::open(root)?;
    let app = build_router(app_state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(root = %root.display(), "copilot API listening on http://localhost:{port}");

    axum::serve(listener, app).await?;
    Ok(())
}
