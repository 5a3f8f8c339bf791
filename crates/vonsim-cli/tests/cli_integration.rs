//! Integration tests for the vonsim8 CLI.

use devs_kernel as _;
use env_logger as _;
use log as _;
use std::path::PathBuf;
use std::process::{Command, Output};
use vonsim_core as _;

fn binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.join("vonsim8")
}

fn vonsim8(args: &[&str]) -> Output {
    Command::new(binary_path())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run vonsim8")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn canonical_run_reports_the_register_move() {
    let output = vonsim8(&["run"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("Instruction: MOV AL, BL"), "{text}");
    assert!(text.contains("AL  01 -> 0A"), "{text}");
    assert!(text.contains("BL  0A"), "{text}");
    assert!(text.contains("IP  00 -> 01"), "{text}");
    assert!(text.contains("Phase: DONE at t=14"), "{text}");
    assert!(text.contains("Cycles: 14 (fetch 8, execute 6), CPI 14.00"), "{text}");
    assert!(text.contains("Wall time:"), "{text}");
}

#[test]
fn json_report_carries_snapshot_and_counts() {
    let output = vonsim8(&["run", "--reg", "BL=0x7F", "--json"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["snapshot"]["registers"], serde_json::json!([127, 127, 0, 0]));
    assert_eq!(report["snapshot"]["clock"], 14);
    assert_eq!(report["snapshot"]["cycles"]["total"], 14);
    assert_eq!(report["summary"]["clock"], 14);
    assert_eq!(report["summary"]["confluent"], 1);
    assert_eq!(report["summary"]["steps"], 19);
}

#[test]
fn unknown_opcode_runs_as_nop() {
    let output = vonsim8(&["run", "--poke", "0=0x02"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("NOP"), "{text}");
    assert!(text.contains("AL  01\n"), "{text}");
}

#[test]
fn trace_lists_each_transition() {
    let output = vonsim8(&["run", "--trace"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("t=   1  IP   external"), "{text}");
    assert!(text.contains("t=   1  MAR  internal"), "{text}");
    assert!(text.contains("t=  14  CU   internal"), "{text}");
}

#[test]
fn exhausted_budget_exits_with_error() {
    let output = vonsim8(&["run", "--max-steps", "3"]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("step budget of 3 exhausted"), "{stderr}");
}

#[test]
fn bad_option_prints_usage() {
    let output = vonsim8(&["run", "--frobnicate"]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("unknown option: --frobnicate"));
    assert!(stderr.contains("Usage: vonsim8"));
}

#[test]
fn help_succeeds() {
    let output = vonsim8(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage: vonsim8"));
}
