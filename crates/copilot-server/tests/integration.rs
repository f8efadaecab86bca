use axum::http::StatusCode;
use copilot_core::config::Config;
use copilot_core::types::{PhaseStatus, ProjectStatus};
use copilot_core::Workspace;
use copilot_server::state::AppState;
use http_body_util::BodyExt;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Initialize a copilot root inside the temp directory and open its state.
fn open_state(dir: &TempDir) -> AppState {
    Workspace::init(dir.path()).unwrap();
    AppState::open(dir.path()).unwrap()
}

/// Send a request via `oneshot` and return (status, parsed JSON body).
async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, None).await
}

async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(body)).await
}

async fn put_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "PUT", uri, Some(body)).await
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dashboard_count_query_lists_projects() {
    let dir = TempDir::new().unwrap();
    let state = open_state(&dir);
    for name in ["Atlas", "Borealis", "Comet"] {
        state.workspace.store.create_project(name, "").unwrap();
    }
    state
        .workspace
        .store
        .set_project_status(3, ProjectStatus::Completed)
        .unwrap();
    let app = copilot_server::build_router(state);

    let (status, body) = post_json(
        app,
        "/api/chat/query",
        json!({ "query": "how many projects are there?", "scope_type": "dashboard" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["context_type"], "dashboard");
    assert_eq!(body["intent"], "project_list");
    assert_eq!(body["confidence_score"], 95);
    assert_eq!(body["sources"], json!(["SQL Database"]));
    assert!(body["response"].as_str().unwrap().contains("3 total projects"));
}

#[tokio::test]
async fn legacy_context_type_field_is_accepted() {
    let dir = TempDir::new().unwrap();
    let state = open_state(&dir);
    let (project, _) = state.workspace.store.create_project("Atlas", "").unwrap();
    let app = copilot_server::build_router(state);

    let (status, body) = post_json(
        app,
        "/api/chat/query",
        json!({
            "query": "what is the progress?",
            "context_type": "project",
            "project_id": project.id,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["context_type"], "project");
    assert_eq!(body["intent"], "project_status");
    assert!(body["response"].as_str().unwrap().contains("Atlas"));
}

#[tokio::test]
async fn invalid_scope_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let app = copilot_server::build_router(open_state(&dir));

    let (status, body) = post_json(
        app,
        "/api/chat/query",
        json!({ "query": "hello", "scope_type": "galaxy" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn health_reports_backends() {
    let dir = TempDir::new().unwrap();
    let app = copilot_server::build_router(open_state(&dir));

    let (status, body) = get(app, "/api/chat/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["llm_enabled"], false);
    assert_eq!(body["rag_enabled"], true);
    assert_eq!(body["memory_index"]["status"], "connected");
    assert_eq!(body["artifact_store"]["total_projects"], 0);
}

#[tokio::test]
async fn health_reports_rag_off_when_retrieval_is_disabled() {
    let dir = TempDir::new().unwrap();
    Workspace::init(dir.path()).unwrap();
    let mut config = Config::load(dir.path()).unwrap();
    config.retrieval.snippet_limit = 0;
    config.save(dir.path()).unwrap();
    let app = copilot_server::build_router(AppState::open(dir.path()).unwrap());

    let (status, body) = get(app, "/api/chat/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rag_enabled"], false);
    assert_eq!(body["memory_index"]["status"], "connected");
}

// ---------------------------------------------------------------------------
// Projects and phases
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_then_fetch_project() {
    let dir = TempDir::new().unwrap();
    let app = copilot_server::build_router(open_state(&dir));

    let (status, created) = post_json(
        app.clone(),
        "/api/projects",
        json!({ "name": "Atlas", "description": "Billing revamp" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["phases"].as_array().unwrap().len(), 6);
    let id = created["project"]["id"].as_u64().unwrap();

    let (status, detail) = get(app.clone(), &format!("/api/projects/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["project"]["name"], "Atlas");
    assert_eq!(detail["phases"][0]["status"], "in_progress");

    let (status, list) = get(app, "/api/projects").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_project_name_is_rejected() {
    let dir = TempDir::new().unwrap();
    let app = copilot_server::build_router(open_state(&dir));

    let (status, _) = post_json(app, "/api/projects", json!({ "name": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_project_is_not_found() {
    let dir = TempDir::new().unwrap();
    let app = copilot_server::build_router(open_state(&dir));

    let (status, body) = get(app, "/api/projects/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("99"));
}

#[tokio::test]
async fn phase_status_update() {
    let dir = TempDir::new().unwrap();
    let state = open_state(&dir);
    let (_, phases) = state.workspace.store.create_project("Atlas", "").unwrap();
    let phase_id = phases[0].id;
    let app = copilot_server::build_router(state);

    let uri = format!("/api/phases/{phase_id}/status");
    let (status, body) = put_json(app.clone(), &uri, json!({ "status": "pending_approval" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending_approval");

    let (status, _) = put_json(app.clone(), &uri, json!({ "status": "finished" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = put_json(app, "/api/phases/999/status", json!({ "status": "approved" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn template_document_is_generated_without_model() {
    let dir = TempDir::new().unwrap();
    let state = open_state(&dir);
    let (project, _) = state.workspace.store.create_project("Atlas", "").unwrap();
    let app = copilot_server::build_router(state);

    let uri = format!("/api/projects/{}/documents/prd", project.id);
    let (status, body) = post_json(app.clone(), &uri, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fallback"], true);
    assert_eq!(body["confidence_score"], 60);

    let uri = format!("/api/projects/{}/documents/srs", project.id);
    let (status, _) = post_json(app, &uri, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn extracted_requirements_feed_risk_analysis() {
    let dir = TempDir::new().unwrap();
    let state = open_state(&dir);
    let (project, phases) = state.workspace.store.create_project("Atlas", "").unwrap();
    let app = copilot_server::build_router(state);

    let uri = format!("/api/projects/{}/requirements/extract", project.id);
    let (status, extracted) = post_json(
        app.clone(),
        &uri,
        json!({ "text": "Shoppers must pay by card through the payment gateway API." }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(extracted["fallback"], true);
    assert_eq!(extracted["items"].as_array().unwrap().len(), 1);
    assert_eq!(extracted["items"][0]["priority"], "High");

    let (status, _) = post_json(app.clone(), &uri, json!({ "text": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/phases/{}/risks/analyze", phases[0].id);
    let (status, analyzed) = post_json(app.clone(), &uri, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = analyzed["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["risk"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Third-party integration failures or API changes"));
    assert!(names.contains(&"Security and data protection gaps"));

    let (_, detail) = get(app.clone(), &format!("/api/projects/{}", project.id)).await;
    assert_eq!(
        detail["phases"][0]["data"]["risks"].as_array().unwrap().len(),
        names.len()
    );

    let (status, _) = post_json(app, "/api/phases/999/risks/analyze", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn approvals_list_pending_phases() {
    let dir = TempDir::new().unwrap();
    let state = open_state(&dir);
    let (_, phases) = state.workspace.store.create_project("Atlas", "").unwrap();
    state
        .workspace
        .store
        .set_phase_status(phases[0].id, PhaseStatus::PendingApproval)
        .unwrap();
    let app = copilot_server::build_router(state);

    let (status, body) = get(app.clone(), "/api/approvals").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["project_name"], "Atlas");
    assert_eq!(body[0]["phase_id"], phases[0].id);

    let uri = format!("/api/phases/{}/status", phases[0].id);
    let (status, _) = put_json(app.clone(), &uri, json!({ "status": "approved" })).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = get(app, "/api/approvals").await;
    assert!(body.as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Memories
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_memory_and_read_stats() {
    let dir = TempDir::new().unwrap();
    let state = open_state(&dir);
    let (project, phases) = state.workspace.store.create_project("Atlas", "").unwrap();
    let app = copilot_server::build_router(state);

    let uri = format!("/api/projects/{}/memories", project.id);
    let (status, memory) = post_json(
        app.clone(),
        &uri,
        json!({ "kind": "note", "content": "Invoices must export to CSV", "phase_id": phases[0].id }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(memory["kind"], "note");
    assert_eq!(memory["phase_id"], phases[0].id);

    let (status, _) = post_json(app.clone(), &uri, json!({ "kind": "gossip", "content": "x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, stats) = get(
        app.clone(),
        &format!("/api/memories/stats?project_id={}", project.id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_memories"], 1);
    assert_eq!(stats["by_kind"]["note"], 1);

    let (status, global) = get(app, "/api/memories/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert!(global["by_project"].is_object());
}

#[tokio::test]
async fn memory_for_foreign_phase_is_rejected() {
    let dir = TempDir::new().unwrap();
    let state = open_state(&dir);
    let (_, a_phases) = state.workspace.store.create_project("A", "").unwrap();
    let (b, _) = state.workspace.store.create_project("B", "").unwrap();
    let app = copilot_server::build_router(state);

    let (status, _) = post_json(
        app,
        &format!("/api/projects/{}/memories", b.id),
        json!({ "kind": "note", "content": "x", "phase_id": a_phases[0].id }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
