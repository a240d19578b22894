use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

use serde_json::Value;

const MEMO: &str = "Terdakwa dijerat Pasal 340 KUHP jo. Pasal 55, alat bukti menurut Pasal 184 ayat (1) KUHAP.";

fn pasalcheck() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pasalcheck"));
    for var in ["PROVIDER_TIMEOUT_MS", "ENABLE_FALLBACK_SEARCH", "MAX_INPUT_CHARS", "RUST_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}

fn run_with_stdin(mut cmd: Command, input: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn pasalcheck");
    child.stdin.take().unwrap().write_all(input.as_bytes()).unwrap();
    child.wait_with_output().unwrap()
}

fn run_without_stdin(mut cmd: Command) -> Output {
    cmd.stdin(Stdio::null()).output().expect("run pasalcheck")
}

#[test]
fn extract_only_on_stdin_prints_a_key_array() {
    let mut cmd = pasalcheck();
    cmd.arg("--extract-only");
    let out = run_with_stdin(cmd, MEMO);

    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let json: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json, serde_json::json!(["Pasal 340 KUHP", "Pasal 55 KUHP", "Pasal 184 KUHAP"]));
}

#[test]
fn extract_only_on_files_prints_one_report_per_file() {
    let td = tempfile::tempdir().unwrap();
    fs::write(td.path().join("a.txt"), MEMO).unwrap();
    fs::write(td.path().join("b.txt"), "tidak ada rujukan").unwrap();

    let mut cmd = pasalcheck();
    cmd.arg("--extract-only").arg(format!("{}/*.txt", td.path().display()));
    let out = run_without_stdin(cmd);

    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let json: Value = serde_json::from_slice(&out.stdout).unwrap();
    let reports = json.as_array().expect("array of reports");
    assert_eq!(reports.len(), 2);

    assert!(reports[0]["file"].as_str().unwrap().ends_with("a.txt"));
    assert_eq!(reports[0]["citations"], serde_json::json!(["Pasal 340 KUHP", "Pasal 55 KUHP", "Pasal 184 KUHAP"]));
    assert!(reports[0].get("results").is_none());

    assert!(reports[1]["file"].as_str().unwrap().ends_with("b.txt"));
    assert_eq!(reports[1]["citations"], serde_json::json!([]));
}

#[test]
fn memo_without_citations_verifies_to_an_empty_array() {
    // nothing extracted, so no site is contacted
    let out = run_with_stdin(pasalcheck(), "Memo ini tidak menyebut satu pun ketentuan.");

    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let json: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json, serde_json::json!([]));
}

#[test]
fn glob_without_matches_exits_1() {
    let td = tempfile::tempdir().unwrap();
    let mut cmd = pasalcheck();
    cmd.arg("--extract-only").arg(format!("{}/*.txt", td.path().display()));
    let out = run_without_stdin(cmd);

    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("NoFilesFound"));
}

#[test]
fn bad_timeout_env_exits_3() {
    let mut cmd = pasalcheck();
    cmd.arg("--extract-only").env("PROVIDER_TIMEOUT_MS", "fast");
    let out = run_with_stdin(cmd, MEMO);

    assert_eq!(out.status.code(), Some(3));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("PROVIDER_TIMEOUT_MS=fast"));
}

#[test]
fn zero_timeout_flag_exits_3() {
    let mut cmd = pasalcheck();
    cmd.args(["--extract-only", "--timeout-ms", "0"]);
    let out = run_with_stdin(cmd, MEMO);

    assert_eq!(out.status.code(), Some(3));
    assert!(out.stdout.is_empty());
}

#[test]
fn unreadable_config_file_exits_3() {
    let td = tempfile::tempdir().unwrap();
    let mut cmd = pasalcheck();
    cmd.arg("--extract-only").arg("--config").arg(td.path().join("missing.yaml"));
    let out = run_with_stdin(cmd, MEMO);

    assert_eq!(out.status.code(), Some(3));
}
