//! Runs the built filter binary over piped stdin.

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn run_diag(input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_ledcast-diag"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn ledcast-diag");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn rewrites_stream_and_exits_cleanly() {
    let out = run_diag("5\ndeadbeef x\nb\n");
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "R2C\ndeadbeef x\nb\n");
}

#[test]
fn malformed_line_fails_with_one_report() {
    let out = run_diag("1\nzz\n");
    assert!(!out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "R1\n");

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert_eq!(stderr.matches("is not a hex state code").count(), 1, "{stderr}");
}
