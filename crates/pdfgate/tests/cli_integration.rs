//! Integration tests for the `pdfgate` CLI binary.
//!
//! Run with: `cargo test -p pdfgate --test cli_integration`

mod common;

use std::io::Write;
use std::process::{Command, Output};

fn pdfgate_bin() -> &'static str {
    env!("CARGO_BIN_EXE_pdfgate")
}

fn fixture(name: &str) -> String {
    common::fixture(name).display().to_string()
}

fn run(args: &[&str]) -> Output {
    Command::new(pdfgate_bin())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run pdfgate")
}

#[test]
fn clean_file_exits_zero() {
    let out = run(&["scan", &fixture("plain.pdf")]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("clean"));
}

#[test]
fn disallowed_action_exits_one() {
    let out = run(&["scan", &fixture("simple_action.pdf")]);
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("disallowed: JavaScript at document-open"), "stdout: {stdout}");
}

#[test]
fn encrypted_file_exits_zero() {
    let out = run(&["scan", &fixture("encrypted.pdf")]);
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("encrypted"));
}

#[test]
fn missing_file_exits_two() {
    let out = run(&["scan", "non_existent_file.pdf"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn non_pdf_exits_two() {
    let out = run(&["scan", &fixture("not_a_pdf.pdf")]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("unsupported format"));
}

#[test]
fn scan_without_files_is_usage_error() {
    let out = run(&["scan"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn json_output_is_one_object_per_file() {
    let out = run(&["scan", "--json", &fixture("plain.pdf"), &fixture("multiple_actions.pdf")]);
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("line is not valid JSON"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["disallowed"], false);
    assert_eq!(lines[1]["disallowed"], true);
    assert_eq!(lines[1]["first_match"]["kind"], "Launch");
    assert_eq!(lines[1]["first_match"]["trigger"], "O");
}

#[test]
fn disallow_flag_replaces_policy() {
    let out = run(&["scan", "--disallow", "Launch,GoToR", &fixture("simple_action.pdf")]);
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn unknown_disallow_kind_exits_two() {
    let out = run(&["scan", "--disallow", "Teleport", &fixture("plain.pdf")]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Teleport"));
}

#[test]
fn config_profile_is_applied() {
    let mut config = tempfile::Builder::new().suffix(".toml").tempfile().expect("tempfile");
    config
        .write_all(
            b"[scan]\ndisallow = [\"Launch\"]\n\n[profiles.scripts.scan]\ndisallow = [\"JavaScript\"]\n",
        )
        .expect("write config");
    let path = config.path().to_str().expect("utf-8 path").to_string();
    let base = run(&["scan", "--config", &path, &fixture("simple_action.pdf")]);
    assert_eq!(base.status.code(), Some(0));
    let profiled =
        run(&["scan", "--config", &path, "--profile", "scripts", &fixture("simple_action.pdf")]);
    assert_eq!(profiled.status.code(), Some(1));
}

#[test]
fn actions_lists_every_location() {
    let out = run(&["actions", "--json", &fixture("next_chain.pdf")]);
    assert_eq!(out.status.code(), Some(0));
    let json: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("stdout is not valid JSON");
    let kinds: Vec<&str> = json["actions"]
        .as_array()
        .expect("actions array")
        .iter()
        .filter_map(|a| a["raw_type"].as_str())
        .collect();
    assert_eq!(kinds, vec!["GoTo", "URI", "ImportData"]);
    assert_eq!(json["truncated"], false);
}

#[test]
fn actions_text_marks_policy_verdict() {
    let out = run(&["actions", &fixture("outline_cycle_clean.pdf")]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(stdout.lines().count(), 2, "stdout: {stdout}");
    assert!(stdout.lines().all(|l| l.ends_with("allowed") && !l.ends_with("disallowed")));
}

#[test]
fn exhausted_visit_budget_exits_two() {
    let out = run(&["scan", "--max-visits", "2", &fixture("multiple_actions.pdf")]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("truncated"));
    assert!(!String::from_utf8_lossy(&out.stdout).contains("clean"));
}

#[test]
fn budget_large_enough_still_flags() {
    let out = run(&["scan", "--max-visits", "50", &fixture("multiple_actions.pdf")]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn encrypt_text_in_strings_does_not_hide_actions() {
    let out = run(&["scan", &fixture("encrypt_decoy.pdf")]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!String::from_utf8_lossy(&out.stdout).contains("encrypted"));
}
