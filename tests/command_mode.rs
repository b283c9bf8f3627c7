//! Integration tests for running command scripts (-c/--command, files, stdin)

use std::io::Write;
use std::process::{Command, Stdio};

fn cellgraph() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cellgraph"));
    // Tests must be deterministic and not depend on a user's ~/.config/cellgraph/config.toml.
    cmd.arg("--no-config");
    cmd
}

fn run_command(args: &[&str]) -> (String, String, i32) {
    let output = cellgraph().args(args).output().expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn run_stdin(args: &[&str], script: &str) -> (String, String, i32) {
    let mut child = cellgraph()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn command");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(script.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

#[test]
fn test_basic_arithmetic() {
    let (stdout, _, code) = run_command(&["-o", "none", "-c", "A1: =5+3", "-c", "value A1"]);
    assert_eq!(stdout.trim(), "8");
    assert_eq!(code, 0);
}

#[test]
fn test_values_follow_edits() {
    let (stdout, _, code) = run_command(&[
        "-o", "none", "-c", "A1: 5", "-c", "A2: =A1+3", "-c", "value A2", "-c", "A1: 2", "-c",
        "value A2",
    ]);
    assert_eq!(stdout, "8\n5\n");
    assert_eq!(code, 0);
}

#[test]
fn test_division_by_zero() {
    let (stdout, _, code) = run_command(&["-o", "none", "-c", "A1: =1/0", "-c", "value A1"]);
    assert_eq!(stdout.trim(), "#DIV/0!");
    // Value-level errors are data, not failures.
    assert_eq!(code, 0);
}

#[test]
fn test_prints_values_by_default() {
    let (stdout, _, code) = run_command(&["-c", "A1: 2", "-c", "B1: =A1*4", "-c", "A2: 'x"]);
    assert_eq!(stdout, "2\t8\nx\t\n");
    assert_eq!(code, 0);
}

#[test]
fn test_prints_texts() {
    let (stdout, _, code) =
        run_command(&["-o", "texts", "-c", "A1: 2", "-c", "B1: = A1 * 4", "-c", "A2: 'x"]);
    assert_eq!(stdout, "2\t=A1*4\n'x\t\n");
    assert_eq!(code, 0);
}

#[test]
fn test_circular_dependency_exit_code() {
    let (stdout, stderr, code) =
        run_command(&["-c", "A1: =B1", "-c", "B1: =A1", "-o", "texts"]);
    assert!(stderr.contains("line 2: Circular dependency detected"));
    assert_eq!(stdout, "=B1\n");
    assert_eq!(code, 1);
}

#[test]
fn test_syntax_error_reported() {
    let (_, stderr, code) = run_command(&["-c", "A1: =1+"]);
    assert!(stderr.contains("line 1: Invalid formula"));
    assert_eq!(code, 1);
}

#[test]
fn test_stop_on_error() {
    let (stdout, _, code) = run_command(&[
        "--stop-on-error",
        "-o",
        "none",
        "-c",
        "bogus",
        "-c",
        "A1: 1",
        "-c",
        "size",
    ]);
    assert_eq!(stdout, "");
    assert_eq!(code, 1);
}

#[test]
fn test_script_from_stdin() {
    let script = "# setup\nA1: 1\nB3: =A1+1\n\nsize\nclear B3\nsize\n";
    let (stdout, stderr, code) = run_stdin(&["-o", "none"], script);
    assert_eq!(stdout, "3x2\n1x1\n");
    assert_eq!(stderr, "");
    assert_eq!(code, 0);
}

#[test]
fn test_script_from_file() {
    use std::fs;

    let path = std::env::temp_dir().join(format!("cellgraph_test_{}.txt", std::process::id()));
    fs::write(&path, "A1: 10\nA2: =A1/4\n").unwrap();

    let (stdout, _, code) = run_command(&[path.to_str().unwrap()]);
    assert_eq!(stdout, "10\n2.5\n");
    assert_eq!(code, 0);

    fs::remove_file(&path).ok();
}

#[test]
fn test_missing_script_file() {
    let (_, stderr, code) = run_command(&["/nonexistent/cellgraph/script.txt"]);
    assert!(stderr.contains("Failed to read script"));
    assert_eq!(code, 1);
}

#[test]
fn test_config_file_sets_output_mode() {
    use std::fs;

    let path = std::env::temp_dir().join(format!("cellgraph_config_{}.toml", std::process::id()));
    fs::write(&path, "output = \"texts\"\n").unwrap();

    let (stdout, _, code) =
        run_command(&["--config", path.to_str().unwrap(), "-c", "A1: =2*3"]);
    assert_eq!(stdout, "=2*3\n");
    assert_eq!(code, 0);

    fs::remove_file(&path).ok();
}

#[test]
fn test_unknown_option() {
    let (_, stderr, code) = run_command(&["--frobnicate"]);
    assert!(stderr.contains("Unknown option"));
    assert_eq!(code, 2);
}
