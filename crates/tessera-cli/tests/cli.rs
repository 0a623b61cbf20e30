//! End-to-end tests for the `tessera` binary.
//!
//! Each test runs in its own temporary directory so `tessera.toml` and the
//! written manifests never leak between tests.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A `tessera` command running in `dir` with no inherited output directory.
fn tessera(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tessera").unwrap();
    cmd.current_dir(dir.path()).env_remove("TESSERA_OUTPUT_DIR");
    cmd
}

fn synth_into(dir: &TempDir, out: &str) {
    tessera(dir)
        .args(["synth", "--output-dir", out])
        .assert()
        .success();
}

fn read_json(path: std::path::PathBuf) -> serde_json::Value {
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    serde_json::from_str(&text).unwrap()
}

// ---------------------------------------------------------------------------
// synth
// ---------------------------------------------------------------------------

#[test]
fn synth_without_output_dir_is_a_dry_run() {
    let tmp = TempDir::new().unwrap();
    tessera(&tmp)
        .arg("synth")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "dry run: converted 2 workflow(s) and 1 agent(s)",
        ));
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn synth_writes_both_manifests() {
    let tmp = TempDir::new().unwrap();
    tessera(&tmp)
        .args(["synth", "-o", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote"));

    let workflows = read_json(tmp.path().join("out/workflow-manifest.json"));
    assert_eq!(workflows["sdk"]["language"], "rust");
    let names: Vec<&str> = workflows["workflows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["order-digest", "reminder"]);

    let digest = &workflows["workflows"][0];
    assert_eq!(digest["tasks"][0]["name"], "_init_context");
    assert_eq!(
        digest["tasks"][0]["config"]["variables"]["token"],
        "${ $secrets.API_TOKEN }"
    );
    assert_eq!(digest["tasks"][1]["export"], "${.}");

    let agents = read_json(tmp.path().join("out/agent-manifest.json"));
    assert_eq!(agents["agents"][0]["name"], "support");
}

#[test]
fn synth_reads_output_dir_from_environment() {
    let tmp = TempDir::new().unwrap();
    tessera(&tmp)
        .arg("synth")
        .env("TESSERA_OUTPUT_DIR", tmp.path().join("env-out"))
        .assert()
        .success();
    assert!(tmp.path().join("env-out/workflow-manifest.json").is_file());
}

#[test]
fn synth_honors_tessera_toml() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("tessera.toml"),
        "output_dir = \"toml-out\"\npretty = false\nworkflow_file = \"flows.json\"\n",
    )
    .unwrap();
    tessera(&tmp).arg("synth").assert().success();

    let text = std::fs::read_to_string(tmp.path().join("toml-out/flows.json")).unwrap();
    assert_eq!(text.lines().count(), 1, "compact output is a single line");
}

#[test]
fn synth_json_reports_written_files() {
    let tmp = TempDir::new().unwrap();
    let output = tessera(&tmp)
        .args(["synth", "-o", "out", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "written");
    assert_eq!(json["files"].as_array().unwrap().len(), 2);
}

#[test]
fn invalid_config_fails_with_error() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("tessera.toml"), "agent_file = \"a/b.json\"\n").unwrap();
    tessera(&tmp)
        .arg("synth")
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

#[test]
fn inspect_summarizes_workflow_manifest() {
    let tmp = TempDir::new().unwrap();
    synth_into(&tmp, "out");
    tessera(&tmp)
        .args(["inspect", "out/workflow-manifest.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("workflow manifest (rust"))
        .stdout(predicate::str::contains("samples/order-digest"))
        .stdout(predicate::str::contains("MISMATCH").not());
}

#[test]
fn inspect_json_lists_agents() {
    let tmp = TempDir::new().unwrap();
    synth_into(&tmp, "out");
    let output = tessera(&tmp)
        .args(["inspect", "out/agent-manifest.json", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["kind"], "agent");
    assert_eq!(json["entries"][0]["name"], "support");
    assert_eq!(json["entries"][0]["skills"], "1");
}

#[test]
fn inspect_missing_file_fails() {
    let tmp = TempDir::new().unwrap();
    tessera(&tmp)
        .args(["inspect", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read nope.json"));
}

#[test]
fn inspect_rejects_unrelated_json() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("other.json"), "{\"hello\": 1}").unwrap();
    tessera(&tmp)
        .args(["inspect", "other.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("neither a workflow nor an agent manifest"));
}

// ---------------------------------------------------------------------------
// config / misc
// ---------------------------------------------------------------------------

#[test]
fn config_shows_layered_values() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("tessera.toml"), "pretty = false\n").unwrap();
    let output = tessera(&tmp)
        .args(["config", "--json"])
        .env("TESSERA_OUTPUT_DIR", "from-env")
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["output_dir"], "from-env");
    assert_eq!(json["pretty"], false);
    assert_eq!(json["workflow_file"], "workflow-manifest.json");
}

#[test]
fn no_subcommand_prints_help() {
    let tmp = TempDir::new().unwrap();
    tessera(&tmp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}
