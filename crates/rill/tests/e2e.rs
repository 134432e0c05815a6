//! End-to-end tests for the `rill` CLI.
//!
//! Each test writes a `.rill` script into a temp directory, invokes the
//! built binary, and asserts stdout/stderr and the exit status.

use std::path::PathBuf;
use std::process::Command;

/// Find the `rill` binary next to the test executable.
fn find_rill() -> PathBuf {
    let mut path = std::env::current_exe()
        .expect("cannot find current exe")
        .parent()
        .expect("cannot find parent dir")
        .to_path_buf();

    if path.file_name().map_or(false, |n| n == "deps") {
        path = path.parent().unwrap().to_path_buf();
    }

    let rill = path.join("rill");
    assert!(
        rill.exists(),
        "rill binary not found at {}. Run `cargo build -p rill` first.",
        rill.display()
    );
    rill
}

/// Write a script, run it, and return (stdout, stderr, exit code).
fn run_script(source: &str) -> (String, String, i32) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let script = dir.path().join("main.rill");
    std::fs::write(&script, source).expect("failed to write script");

    let output = Command::new(find_rill())
        .args(["run", script.to_str().unwrap()])
        .output()
        .expect("failed to invoke rill");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

fn run_expect_stdout(source: &str, expected: &str) {
    let (stdout, stderr, code) = run_script(source);
    assert_eq!(code, 0, "script failed:\nstderr: {stderr}");
    assert_eq!(stdout, expected);
}

#[test]
fn arithmetic_precedence() {
    run_expect_stdout("print(2 + 3 * 4)\n", "14\n");
}

#[test]
fn closure_capture() {
    let source = "\
conduit make() @
    let x = 10
    give () => x + 1
#
let f = make()
print(f())
";
    run_expect_stdout(source, "11\n");
}

#[test]
fn pipeline_with_method_and_function() {
    let source = "\
conduit double(x) @ give x * 2 #
print(~ 1, 2, 3 ! -> map(double) -> sum)
";
    run_expect_stdout(source, "12\n");
}

#[test]
fn pattern_matching_with_guard() {
    let source = "\
let n = 7
print(check n @ x when x < 5 => \"small\" ; x when x < 10 => \"mid\" ; _ => \"big\" #)
";
    run_expect_stdout(source, "mid\n");
}

#[test]
fn class_with_inheritance() {
    let source = "\
make A @ conduit name() @ give \"A\" # #
make B extend A @ conduit greet() @ give me.name() + \"!\" # #
print(B().greet())
";
    run_expect_stdout(source, "A!\n");
}

#[test]
fn template_strings_and_loops() {
    let source = "\
mut total = 0
repeat i in 1..3 @ total += i #
print(`total: $@total#`)
";
    run_expect_stdout(source, "total: 6\n");
}

#[test]
fn immutable_reassignment_reports_position_and_fails() {
    let (stdout, stderr, code) = run_script("let x = 1\nx = 2\n");
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(
        stderr.contains("line 2"),
        "stderr should name line 2: {stderr}"
    );
    assert!(
        stderr.contains("Cannot reassign immutable variable 'x'"),
        "stderr: {stderr}"
    );
    assert!(stderr.starts_with("File '"), "stderr: {stderr}");
}

#[test]
fn lex_error_fails_with_location() {
    let (_, stderr, code) = run_script("let ^ = 1\n");
    assert_eq!(code, 1);
    assert!(stderr.contains("Unexpected character"), "stderr: {stderr}");
    assert!(stderr.contains("line 1"), "stderr: {stderr}");
}

#[test]
fn debug_flag_dumps_tokens_and_tree() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("main.rill");
    std::fs::write(&script, "print(1 + 1)\n").unwrap();

    let output = Command::new(find_rill())
        .args(["run", "--debug", script.to_str().unwrap()])
        .output()
        .expect("failed to invoke rill");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== Tokens ==="), "stdout: {stdout}");
    assert!(stdout.contains("=== Syntax tree ==="), "stdout: {stdout}");
    assert!(stdout.contains("=== Output ==="), "stdout: {stdout}");
    assert!(stdout.ends_with("2\n"), "stdout: {stdout}");
}

#[test]
fn user_module_import_via_script_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("helpers.rill"),
        "share conduit triple(x) @ give x * 3 #\n",
    )
    .unwrap();
    let script = dir.path().join("main.rill");
    std::fs::write(&script, "grab helpers\nprint(helpers.triple(14))\n").unwrap();

    let output = Command::new(find_rill())
        .args(["run", script.to_str().unwrap()])
        .output()
        .expect("failed to invoke rill");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr: {stderr}");
    assert_eq!(String::from_utf8_lossy(&output.stdout), "42\n");
}

#[test]
fn stdlib_module_import() {
    run_expect_stdout("grab math\nprint(int(math.clamp(99, 0, 10)))\n", "10\n");
}

#[test]
fn exit_code_zero_on_success() {
    let (_, _, code) = run_script("let quiet = 1\n");
    assert_eq!(code, 0);
}
