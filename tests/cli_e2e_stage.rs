//! End-to-end tests for the `stage` command.
//!
//! These tests invoke the actual CLI binary and validate staging behavior
//! from a user's perspective.

mod common;
use common::prelude::*;

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_stage_help() {
    let mut cmd = cargo_bin_cmd!("stagehand");

    cmd.arg("stage")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Stage the files listed in a manifest",
        ));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_stage_writes_files() {
    let fixture = TestFixture::new().with_manifest(manifests::TWO_FILES);

    let mut cmd = cargo_bin_cmd!("stagehand");
    cmd.arg("stage")
        .arg("--manifest")
        .arg(fixture.manifest_path())
        .arg("--root")
        .arg(fixture.scratch_root())
        .assert()
        .success()
        .stdout(predicate::str::contains("Stage pass 1: 2 written, 0 unchanged"));

    fixture
        .child("scratch/app.js")
        .assert(predicate::str::diff("console.log('app')"));
    fixture
        .child("scratch/nested/routes.js")
        .assert(predicate::str::diff("export default []"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_stage_clears_directory_of_previous_process() {
    let fixture = TestFixture::new()
        .with_manifest(manifests::TWO_FILES)
        .with_file("scratch/stale.js", "old")
        .with_file("scratch/.stagehand-0000000000000000", "");

    let mut cmd = cargo_bin_cmd!("stagehand");
    cmd.arg("stage")
        .arg("--manifest")
        .arg(fixture.manifest_path())
        .arg("--root")
        .arg(fixture.scratch_root())
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let entries = fixture.scratch_entries();
    assert!(!entries.contains(&"stale.js".to_string()));
    assert!(!entries.contains(&".stagehand-0000000000000000".to_string()));
    assert_eq!(entries.len(), 3, "marker, app.js, nested: {:?}", entries);
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_stage_root_from_env() {
    let fixture = TestFixture::new().with_manifest(manifests::TWO_FILES);

    let mut cmd = cargo_bin_cmd!("stagehand");
    cmd.env("STAGEHAND_ROOT", fixture.scratch_root())
        .current_dir(fixture.path())
        .arg("stage")
        .assert()
        .success();

    fixture
        .child("scratch/app.js")
        .assert(predicate::path::exists());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_stage_json_report() {
    let fixture = TestFixture::new()
        .with_manifest(manifests::FROM_SOURCE)
        .with_file("source.txt", "from source");

    let mut cmd = cargo_bin_cmd!("stagehand");
    let output = cmd
        .arg("stage")
        .arg("--manifest")
        .arg(fixture.manifest_path())
        .arg("--root")
        .arg(fixture.scratch_root())
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["pass"], 1);
    assert_eq!(report["written"], 1);
    assert_eq!(report["unchanged"], 0);
    assert!(report["files"][0]
        .as_str()
        .unwrap()
        .ends_with("scratch/out.txt"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_stage_follow_restages_on_stdin() {
    let fixture = TestFixture::new().with_manifest(manifests::TWO_FILES);

    let mut cmd = cargo_bin_cmd!("stagehand");
    cmd.arg("stage")
        .arg("--manifest")
        .arg(fixture.manifest_path())
        .arg("--root")
        .arg(fixture.scratch_root())
        .arg("--follow")
        .write_stdin("changed\nchanged\nchanged\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stage pass 1: 2 written"))
        .stdout(predicate::str::contains("Stage pass 2: 0 written, 2 unchanged"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_stage_dry_run_writes_nothing() {
    let fixture = TestFixture::new().with_manifest(manifests::TWO_FILES);

    let mut cmd = cargo_bin_cmd!("stagehand");
    cmd.arg("stage")
        .arg("--manifest")
        .arg(fixture.manifest_path())
        .arg("--root")
        .arg(fixture.scratch_root())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("DRY RUN"));

    fixture.child("scratch").assert(predicate::path::missing());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_stage_missing_manifest_fails() {
    let fixture = TestFixture::new();

    let mut cmd = cargo_bin_cmd!("stagehand");
    cmd.arg("stage")
        .arg("--manifest")
        .arg(fixture.path().join("missing.yaml"))
        .arg("--root")
        .arg(fixture.scratch_root())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Manifest file not found"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_stage_invalid_manifest_fails() {
    let fixture = TestFixture::new().with_manifest(manifests::INVALID_ENTRY);

    let mut cmd = cargo_bin_cmd!("stagehand");
    cmd.arg("stage")
        .arg("--manifest")
        .arg(fixture.manifest_path())
        .arg("--root")
        .arg(fixture.scratch_root())
        .assert()
        .failure()
        .stderr(predicate::str::contains("neither content nor from"));
}
