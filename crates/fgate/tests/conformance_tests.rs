//! Conformance tests: the hook contract via the real binary, one JSON
//! payload on stdin per invocation, exit 0 allows and exit 2 denies.

use test_helpers::{command_payload, edit_payload, fgate_expect, stderr_of};

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

const CHECK_CONFIG: &str =
    "docker exec homeassistant python -m homeassistant --script check_config --config /config";
const RESTART: &str = "docker restart homeassistant";
const DASHBOARD_FILE: &str = "config/lovelace/kitchen_tabs/view.yaml";

fn write_config(root: &Path, config: &serde_json::Value) {
    let dir = root.join(".freshgate");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("config.json"),
        serde_json::to_string_pretty(config).unwrap(),
    )
    .unwrap();
}

fn epoch_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs_f64()
}

// ── Restart gate ────────────────────────────────────────────────

#[test]
fn restart_denied_without_validation() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();

    let out = fgate_expect(
        &["command", "--root", root],
        &command_payload(RESTART),
        2,
    );
    let stderr = stderr_of(&out);
    assert!(stderr.contains("No config validation found!"), "{stderr}");
    assert!(stderr.contains("RESTART BLOCKED"), "{stderr}");
    assert!(
        stderr.contains("docker exec homeassistant python -m homeassistant"),
        "{stderr}"
    );
}

#[test]
fn restart_allowed_after_validation() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();

    fgate_expect(&["command", "--root", root], &command_payload(CHECK_CONFIG), 0);
    let out = fgate_expect(&["command", "--root", root], &command_payload(RESTART), 0);
    assert!(stderr_of(&out).is_empty());
}

#[test]
fn restart_denied_with_stale_stamp() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    // A stamp far in the past: any real clock puts it well beyond 600s.
    std::fs::write(dir.path().join(".config_validated"), "100.0").unwrap();

    let out = fgate_expect(&["command", "--root", root], &command_payload(RESTART), 2);
    let stderr = stderr_of(&out);
    assert!(stderr.contains("minutes old (max: 10 min)!"), "{stderr}");
}

#[test]
fn check_config_writes_stamp() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();

    let before = epoch_now();
    let out = fgate_expect(&["command", "--root", root], &command_payload(CHECK_CONFIG), 0);
    let after = epoch_now();

    assert!(stderr_of(&out).is_empty());
    assert!(out.stdout.is_empty());

    let stamp: f64 = std::fs::read_to_string(dir.path().join(".config_validated"))
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert!(
        stamp >= before - 1.0 && stamp <= after + 1.0,
        "stamp {stamp} outside [{before}, {after}]"
    );
}

#[test]
fn unrelated_command_allowed_regardless_of_lock() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    std::fs::write(dir.path().join(".config_validated"), "100.0").unwrap();

    fgate_expect(&["command", "--root", root], &command_payload("ls -la"), 0);
    fgate_expect(
        &["command", "--root", root],
        &command_payload("docker restart postgres"),
        0,
    );
}

#[test]
fn custom_container_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    write_config(dir.path(), &serde_json::json!({"container_name": "hass-dev"}));

    // The configured name is gated, the default name is not.
    fgate_expect(
        &["command", "--root", root],
        &command_payload("docker restart hass-dev"),
        2,
    );
    fgate_expect(&["command", "--root", root], &command_payload(RESTART), 0);
}

#[test]
fn config_overlay_in_payload() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();

    let payload = serde_json::json!({
        "tool_input": {"command": "docker restart ha2"},
        "config": {"container_name": "ha2"}
    })
    .to_string();
    fgate_expect(&["command", "--root", root], &payload, 2);

    // Without the overlay the same command passes through.
    fgate_expect(
        &["command", "--root", root],
        &command_payload("docker restart ha2"),
        0,
    );
}

// ── Input contract ──────────────────────────────────────────────

#[test]
fn malformed_json_allows() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();

    let out = fgate_expect(&["command", "--root", root], "this is not json", 0);
    assert!(stderr_of(&out).is_empty());
}

#[test]
fn missing_fields_allow() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();

    fgate_expect(&["command", "--root", root], "{}", 0);
    fgate_expect(&["command", "--root", root], r#"{"tool_input": {}}"#, 0);
    fgate_expect(
        &["command", "--root", root],
        r#"{"tool_input": {"command": ""}}"#,
        0,
    );
    fgate_expect(&["edit", "--root", root], "{}", 0);
}

// ── Evidence gate ───────────────────────────────────────────────

#[test]
fn edit_denied_without_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    let artifacts = dir.path().join("shots");
    std::fs::create_dir_all(&artifacts).unwrap();
    write_config(
        dir.path(),
        &serde_json::json!({"evidence": {"artifact_dir": artifacts.to_str().unwrap()}}),
    );

    let out = fgate_expect(&["edit", "--root", root], &edit_payload(DASHBOARD_FILE), 2);
    let stderr = stderr_of(&out);
    assert!(stderr.contains("BEFORE SCREENSHOT REQUIRED!"), "{stderr}");
    assert!(stderr.contains("/lovelace/kitchen "), "{stderr}");
}

#[test]
fn edit_allowed_with_fresh_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    let artifacts = dir.path().join("shots");
    std::fs::create_dir_all(&artifacts).unwrap();
    let artifact = artifacts.join("lovelace_before_1432.png");
    std::fs::write(&artifact, b"png").unwrap();
    write_config(
        dir.path(),
        &serde_json::json!({"evidence": {"artifact_dir": artifacts.to_str().unwrap()}}),
    );

    let out = fgate_expect(&["edit", "--root", root], &edit_payload(DASHBOARD_FILE), 0);
    assert!(stderr_of(&out).is_empty());

    let record: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join(".freshgate/dashboard_evidence.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(record["artifact"], artifact.to_str().unwrap());
    assert_eq!(record["target"], DASHBOARD_FILE);
    assert_eq!(record["comparison_done"], false);
}

#[test]
fn edit_outside_dashboards_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();

    fgate_expect(&["edit", "--root", root], &edit_payload("src/main.rs"), 0);
    fgate_expect(
        &["edit", "--root", root],
        &edit_payload("config/automations.yaml"),
        0,
    );
}

// ── Auxiliary commands ──────────────────────────────────────────

#[test]
fn init_writes_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();

    fgate_expect(&["init", "--root", root], "", 0);

    let cfg: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join(".freshgate/config.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(cfg["container_name"], "homeassistant");
    assert_eq!(cfg["restart"]["lock_timeout_secs"], 600);
    assert_eq!(cfg["write_failure_policy"], "open");
}

#[test]
fn decisions_are_logged_and_verifiable() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();

    fgate_expect(&["command", "--root", root], &command_payload(RESTART), 2);
    fgate_expect(&["command", "--root", root], &command_payload(CHECK_CONFIG), 0);

    let out = fgate_expect(&["log", "--root", root, "--verify"], "", 0);
    assert!(stderr_of(&out).contains("2 entries"), "{}", stderr_of(&out));
}

#[test]
fn status_reports_stamp_age() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();

    fgate_expect(&["command", "--root", root], &command_payload(CHECK_CONFIG), 0);

    let out = fgate_expect(&["status", "--root", root, "--json"], "", 0);
    let status: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("status --json must print JSON");
    assert_eq!(status["validation_window_secs"], 600);
    let age = status["validation_stamp_age_secs"].as_f64().unwrap();
    assert!((0.0..60.0).contains(&age), "unexpected age {age}");
}
