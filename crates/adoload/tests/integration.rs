//! End-to-end CLI integration tests for the `adoload` binary.
//!
//! Each test writes its input documents into its own temporary directory
//! and exercises the binary as a subprocess via `assert_cmd`. Only the
//! offline commands (`check`, `templates`) are driven end to end.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a `Command` targeting the cargo-built `adoload` binary.
fn adoload() -> Command {
    Command::cargo_bin("adoload").unwrap()
}

const VALID_PLAN: &str = r#"
features:
  - Title: Checkout revamp
    Description: Replace the legacy checkout flow
    user_stories:
      - Title: Guest checkout
        Story_Points: 5
        tasks:
          - Title: Add guest session endpoint
            Remaining_Work: 4
          - Title: Wire up payment form
  - Title: Search improvements
"#;

/// Write a plan file into `tmp` and return its path as a string.
fn write_plan(tmp: &TempDir, content: &str) -> String {
    let path = tmp.path().join("backlog.yaml");
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_valid_plan_succeeds() {
    let tmp = TempDir::new().unwrap();
    let plan = write_plan(&tmp, VALID_PLAN);

    adoload()
        .args(["check", "--plan", &plan])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("5 checked, 0 failed"))
        .stdout(predicate::str::contains("Guest checkout"));
}

#[test]
fn check_reports_missing_title() {
    let tmp = TempDir::new().unwrap();
    let plan = write_plan(
        &tmp,
        "features:\n  - Description: no title on this one\n",
    );

    adoload()
        .args(["check", "--plan", &plan])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAILED"))
        .stderr(predicate::str::contains("payload build failed for 1 of 1"));
}

#[test]
fn check_visits_children_of_failed_parent() {
    let tmp = TempDir::new().unwrap();
    // The feature has no title, but its story is fine; check still
    // reports on both nodes.
    let plan = write_plan(
        &tmp,
        "features:\n  - Description: broken\n    user_stories:\n      - Title: Fine story\n",
    );

    adoload()
        .args(["check", "--plan", &plan])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Fine story"))
        .stdout(predicate::str::contains("2 checked, 1 failed"));
}

#[test]
fn check_json_output_parses() {
    let tmp = TempDir::new().unwrap();
    let plan = write_plan(&tmp, VALID_PLAN);

    let output = adoload()
        .args(["check", "--plan", &plan, "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0]["type"], "Feature");
    assert_eq!(entries[0]["title"], "Checkout revamp");
    assert_eq!(entries[0]["ok"], true);
    assert_eq!(entries[0]["payload"]["System.Title"], "Checkout revamp");
    assert_eq!(entries[1]["type"], "User Story");
    assert_eq!(entries[2]["type"], "Task");
}

#[test]
fn check_without_plan_or_config_fails() {
    let tmp = TempDir::new().unwrap();

    adoload()
        .arg("check")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no plan file"));
}

#[test]
fn check_respects_template_override() {
    let tmp = TempDir::new().unwrap();
    let plan = write_plan(&tmp, "features:\n  - Name: Renamed key\n");
    let template = tmp.path().join("templates.yaml");
    std::fs::write(
        &template,
        r#"
work_item_types:
  Feature:
    fields:
      - name: Title
        yaml_key: Name
        azure_field_path: System.Title
        required: true
"#,
    )
    .unwrap();

    adoload()
        .args(["check", "--plan", &plan, "--template"])
        .arg(&template)
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 checked, 0 failed"));
}

#[test]
fn check_rejects_plan_without_features() {
    let tmp = TempDir::new().unwrap();
    let plan = write_plan(&tmp, "features: []\n");

    adoload()
        .args(["check", "--plan", &plan])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load plan file"));
}

#[test]
fn check_reads_plan_path_from_config() {
    let tmp = TempDir::new().unwrap();
    write_plan(&tmp, VALID_PLAN);
    let config = tmp.path().join("parameters.yaml");
    std::fs::write(&config, "file_paths:\n  plan_file: backlog.yaml\n").unwrap();

    adoload()
        .arg("check")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("5 checked, 0 failed"));
}

// ---------------------------------------------------------------------------
// templates
// ---------------------------------------------------------------------------

#[test]
fn templates_shows_builtin_mappings() {
    let tmp = TempDir::new().unwrap();

    adoload()
        .arg("templates")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Feature (built-in)"))
        .stdout(predicate::str::contains("System.Title"))
        .stdout(predicate::str::contains("Microsoft.VSTS.Common.AcceptanceCriteria"));
}

#[test]
fn templates_json_lists_all_three_types() {
    let tmp = TempDir::new().unwrap();

    let output = adoload()
        .args(["templates", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let types: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let types = types.as_array().unwrap();
    assert_eq!(types.len(), 3);
    assert_eq!(types[0]["type"], "Feature");
    assert_eq!(types[1]["type"], "User Story");
    assert_eq!(types[2]["type"], "Task");
    assert_eq!(types[0]["source"], "built-in");
}

#[test]
fn templates_marks_overridden_type() {
    let tmp = TempDir::new().unwrap();
    let template = tmp.path().join("templates.yaml");
    std::fs::write(
        &template,
        r#"
work_item_types:
  Task:
    fields:
      - name: Title
        azure_field_path: System.Title
        required: true
"#,
    )
    .unwrap();

    adoload()
        .args(["templates", "--template"])
        .arg(&template)
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Task (template file)"))
        .stdout(predicate::str::contains("Feature (built-in)"));
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_without_config_file_fails() {
    let tmp = TempDir::new().unwrap();

    adoload()
        .arg("run")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("parameters file not found"));
}

#[test]
fn run_reports_missing_required_parameters() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("parameters.yaml");
    std::fs::write(&config, "azure_devops:\n  project: Platform\n").unwrap();

    adoload()
        .arg("run")
        .current_dir(tmp.path())
        .env_remove("AZURE_DEVOPS_PAT")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required parameters"))
        .stderr(predicate::str::contains("azure_devops.organization_url"));
}

#[test]
fn run_json_error_output() {
    let tmp = TempDir::new().unwrap();

    let output = adoload()
        .args(["run", "--json"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(!output.status.success());

    let err: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert!(err["error"].as_str().unwrap().contains("parameters file not found"));
}
