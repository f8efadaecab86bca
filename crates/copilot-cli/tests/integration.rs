#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn copilot(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("copilot").unwrap();
    cmd.current_dir(dir.path())
        .env("COPILOT_ROOT", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn init(dir: &TempDir) {
    copilot(dir).arg("init").assert().success();
}

fn json_of(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.arg("--json").assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

/// Create a project and return (project id, phase ids in phase order).
fn create_project(dir: &TempDir, name: &str) -> (u64, Vec<u64>) {
    let v = json_of(copilot(dir).args(["project", "create", name]));
    let id = v["project"]["id"].as_u64().unwrap();
    let phases = v["phases"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_u64().unwrap())
        .collect();
    (id, phases)
}

// ---------------------------------------------------------------------------
// copilot init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_copilot_dir() {
    let dir = TempDir::new().unwrap();
    copilot(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .copilot/config.yaml"));

    assert!(dir.path().join(".copilot/config.yaml").exists());
    assert!(dir.path().join(".copilot/artifacts.redb").exists());
    assert!(dir.path().join(".copilot/memories.redb").exists());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    copilot(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:"));
}

#[test]
fn commands_before_init_fail() {
    let dir = TempDir::new().unwrap();
    copilot(&dir)
        .args(["project", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("copilot init"));
}

// ---------------------------------------------------------------------------
// copilot project / phase
// ---------------------------------------------------------------------------

#[test]
fn project_create_list_show() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    let (id, phases) = create_project(&dir, "Atlas");
    assert_eq!(phases.len(), 6);

    copilot(&dir)
        .args(["project", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Atlas"));

    let detail = json_of(copilot(&dir).args(["project", "show", &id.to_string()]));
    assert_eq!(detail["project"]["name"], "Atlas");
    assert_eq!(detail["phases"][0]["status"], "in_progress");
}

#[test]
fn show_unknown_project_fails() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    copilot(&dir)
        .args(["project", "show", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("project not found: 42"));
}

#[test]
fn project_set_status() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    let (id, _) = create_project(&dir, "Atlas");

    let v = json_of(copilot(&dir).args(["project", "set-status", &id.to_string(), "on_hold"]));
    assert_eq!(v["status"], "on_hold");

    copilot(&dir)
        .args(["project", "set-status", &id.to_string(), "paused"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid status 'paused'"));
}

#[test]
fn phase_set_status_rejects_unknown_status() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    let (_, phases) = create_project(&dir, "Atlas");

    copilot(&dir)
        .args(["phase", "set-status", &phases[1].to_string(), "finished"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid status"));

    let v = json_of(copilot(&dir).args([
        "phase",
        "set-status",
        &phases[1].to_string(),
        "pending_approval",
    ]));
    assert_eq!(v["status"], "pending_approval");
}

#[test]
fn requirement_only_fits_phase_one() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    let (_, phases) = create_project(&dir, "Atlas");

    copilot(&dir)
        .args([
            "phase",
            "add-requirement",
            &phases[0].to_string(),
            "--feature",
            "Invoice export",
            "--as-a",
            "accountant",
        ])
        .assert()
        .success();

    copilot(&dir)
        .args([
            "phase",
            "add-requirement",
            &phases[2].to_string(),
            "--feature",
            "Invoice export",
        ])
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// copilot ask
// ---------------------------------------------------------------------------

#[test]
fn ask_dashboard_counts_projects() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    create_project(&dir, "Atlas");
    create_project(&dir, "Borealis");

    let v = json_of(copilot(&dir).args(["ask", "how many projects are there?"]));
    assert_eq!(v["intent"], "project_list");
    assert_eq!(v["confidence_score"], 95);
    assert!(v["response"].as_str().unwrap().contains("2 total projects"));
}

#[test]
fn ask_records_the_interaction() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    copilot(&dir)
        .args(["ask", "how do I create a new project?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("confidence 100"));

    let stats = json_of(copilot(&dir).args(["memory", "stats"]));
    assert_eq!(stats["total_memories"], 1);
    assert_eq!(stats["by_kind"]["chat"], 1);
}

#[test]
fn ask_project_risks_lists_recorded_risk() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    let (id, phases) = create_project(&dir, "Atlas");

    copilot(&dir)
        .args([
            "phase",
            "add-risk",
            &phases[0].to_string(),
            "Vendor lock-in",
            "--severity",
            "high",
        ])
        .assert()
        .success();

    let v = json_of(copilot(&dir).args(["ask", "what are the risks?", "--project", &id.to_string()]));
    assert_eq!(v["intent"], "risk_analysis");
    assert_eq!(v["confidence_score"], 90);
    let text = v["response"].as_str().unwrap();
    assert!(text.contains("Vendor lock-in"));
    assert!(text.contains("Mitigation: TBD"));
}

#[test]
fn ask_unknown_project_still_answers() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    let v = json_of(copilot(&dir).args(["ask", "what are the risks?", "--project", "7"]));
    assert_eq!(v["confidence_score"], 75);
    assert!(v["response"]
        .as_str()
        .unwrap()
        .contains("No risks have been identified yet"));
}

// ---------------------------------------------------------------------------
// copilot memory / doc
// ---------------------------------------------------------------------------

#[test]
fn memory_add_and_stats() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    let (id, _) = create_project(&dir, "Atlas");

    copilot(&dir)
        .args(["memory", "add", "--project", &id.to_string(), "Exports must be CSV"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored note memory"));

    copilot(&dir)
        .args([
            "memory",
            "add",
            "--project",
            &id.to_string(),
            "--kind",
            "gossip",
            "x",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid memory kind"));

    let stats = json_of(copilot(&dir).args(["memory", "stats", "--project", &id.to_string()]));
    assert_eq!(stats["total_memories"], 1);
    assert_eq!(stats["by_kind"]["note"], 1);
}

#[test]
fn doc_prd_writes_template_without_model() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    let (id, _) = create_project(&dir, "Atlas");

    copilot(&dir)
        .args(["doc", "prd", "--project", &id.to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Product Requirements Document (PRD)"))
        .stderr(predicate::str::contains("no language model configured"));

    let detail = json_of(copilot(&dir).args(["project", "show", &id.to_string()]));
    assert!(detail["phases"][0]["data"]["prd"].is_string());
}

// ---------------------------------------------------------------------------
// copilot analyze / approvals
// ---------------------------------------------------------------------------

#[test]
fn analyze_requirements_from_file_then_risks() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    let (id, phases) = create_project(&dir, "Atlas");
    let brief = dir.path().join("brief.md");
    std::fs::write(
        &brief,
        "- Customers must log in with a password.\n- Reports should export to CSV.\n",
    )
    .unwrap();

    let v = json_of(copilot(&dir).args([
        "analyze",
        "requirements",
        "--project",
        &id.to_string(),
        "--file",
        brief.to_str().unwrap(),
    ]));
    assert_eq!(v["items"].as_array().unwrap().len(), 2);
    assert_eq!(v["fallback"], true);

    copilot(&dir)
        .args(["analyze", "risks", &phases[0].to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Security and data protection gaps"))
        .stderr(predicate::str::contains("keyword heuristics"));

    copilot(&dir)
        .args(["analyze", "risks", &phases[0].to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("No new risks"));

    let detail = json_of(copilot(&dir).args(["project", "show", &id.to_string()]));
    assert_eq!(detail["phases"][0]["data"]["requirements"].as_array().unwrap().len(), 2);
}

#[test]
fn analyze_requirements_needs_input() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    let (id, _) = create_project(&dir, "Atlas");
    copilot(&dir)
        .args(["analyze", "requirements", "--project", &id.to_string()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--text or --file"));
}

#[test]
fn approvals_lists_submitted_phases() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    let (_, phases) = create_project(&dir, "Atlas");

    copilot(&dir)
        .arg("approvals")
        .assert()
        .success()
        .stdout(predicate::str::contains("No phases are waiting"));

    copilot(&dir)
        .args(["phase", "set-status", &phases[1].to_string(), "pending_approval"])
        .assert()
        .success();

    let v = json_of(copilot(&dir).arg("approvals"));
    assert_eq!(v.as_array().unwrap().len(), 1);
    assert_eq!(v[0]["phase_id"], phases[1]);
    assert_eq!(v[0]["project_name"], "Atlas");
}
