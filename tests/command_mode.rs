//! Integration tests for the command-line front end

use std::fs;
use std::path::Path;
use std::process::Command;

fn run_in(dir: &Path, args: &[&str]) -> (String, String, i32) {
    // Tests must not depend on a user's ~/.config/cubecell/config.toml.
    let config = dir.join("config.toml");
    if !config.exists() {
        fs::write(&config, "").expect("Failed to write config");
    }

    let output = Command::new(env!("CARGO_BIN_EXE_cubecell"))
        .arg("--config")
        .arg(&config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn run_command(args: &[&str]) -> (String, String, i32) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    run_in(dir.path(), args)
}

#[test]
fn test_basic_arithmetic() {
    let (stdout, _, code) = run_command(&["-c", "5 + 3"]);
    assert_eq!(stdout.trim(), "8");
    assert_eq!(code, 0);
}

#[test]
fn test_leading_equals_and_precedence() {
    let (stdout, _, code) = run_command(&["-c", "=2 + 3 * 4"]);
    assert_eq!(stdout.trim(), "14");
    assert_eq!(code, 0);
}

#[test]
fn test_big_integers() {
    let (stdout, _, code) = run_command(&["-c", "2^100"]);
    assert_eq!(stdout.trim(), "1267650600228229401496703205376");
    assert_eq!(code, 0);
}

#[test]
fn test_boolean_output() {
    let (stdout, _, code) = run_command(&["-c", "not (1 = 2)"]);
    assert_eq!(stdout.trim(), "TRUE");
    assert_eq!(code, 0);
}

#[test]
fn test_division_by_zero_fails() {
    let (stdout, stderr, code) = run_command(&["-c", "1 / 0"]);
    assert_eq!(stdout.trim(), "#ERROR");
    assert!(stderr.contains("Error"));
    assert_eq!(code, 1);
}

#[test]
fn test_syntax_error_fails() {
    let (stdout, _, code) = run_command(&["-c", "(1 + 2"]);
    assert_eq!(stdout.trim(), "#ERROR");
    assert_eq!(code, 1);
}

#[test]
fn test_deeply_nested_formula_fails_cleanly() {
    let deep = format!("{}1{}", "(".repeat(5_000), ")".repeat(5_000));
    let (stdout, stderr, code) = run_command(&["-c", &deep]);
    assert_eq!(stdout.trim(), "#ERROR");
    assert!(stderr.contains("nested too deeply"));
    assert_eq!(code, 1);
}

#[test]
fn test_configured_exponent_bound() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "max_exponent = 8\n").unwrap();

    let (stdout, _, code) = run_in(dir.path(), &["-c", "2^8"]);
    assert_eq!(stdout.trim(), "256");
    assert_eq!(code, 0);

    let (stdout, _, code) = run_in(dir.path(), &["-c", "2^9"]);
    assert_eq!(stdout.trim(), "#ERROR");
    assert_eq!(code, 1);
}

#[test]
fn test_sheet_values_report() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("sheet.grd");
    fs::write(
        &sheet,
        "# totals\nA1: 10\nA2: 32\nA3: =A1 + A2\nB1: =mmax(A1, A2, 5)\nC1: =C1\n",
    )
    .unwrap();

    let (stdout, _, code) = run_in(dir.path(), &[sheet.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert_eq!(
        stdout,
        "# Cubecell values\nA1: 10\nB1: 32\nC1: #ERROR\nA2: 32\nA3: 42\n"
    );
}

#[test]
fn test_set_cascades_before_command() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("sheet.grd");
    fs::write(&sheet, "A1: 1\nA2: =A1 * 100\n").unwrap();

    let (stdout, _, code) = run_in(
        dir.path(),
        &[sheet.to_str().unwrap(), "-s", "A1=7", "-c", "A2 + 1"],
    );
    assert_eq!(stdout.trim(), "701");
    assert_eq!(code, 0);
}

#[test]
fn test_set_cycle_warns() {
    let (stdout, stderr, code) = run_command(&["-s", "A1==B1", "-s", "B1==A1"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("Warning: B1"));
    assert!(stdout.contains("B1: #ERROR"));
}

#[test]
fn test_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("values.txt");

    let (stdout, _, code) = run_in(
        dir.path(),
        &["-s", "B2=7", "-s", "C3==B2*6", "-o", out.to_str().unwrap()],
    );
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "# Cubecell values\nB2: 7\nC3: 42\n"
    );
}

#[test]
fn test_missing_sheet_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.grd");
    let (_, stderr, code) = run_in(dir.path(), &[missing.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Failed to load"));
}

#[test]
fn test_bad_sheet_line_reported() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("bad.grd");
    fs::write(&sheet, "A1: 1\n9Z: 2\n").unwrap();
    let (_, stderr, code) = run_in(dir.path(), &[sheet.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert!(stderr.contains("line 2"));
}

#[test]
fn test_unknown_option() {
    let (_, stderr, code) = run_command(&["--bogus"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown option"));
}
