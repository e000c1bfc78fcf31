/// Command-line tests: pipe scripts into the `exan` binary and check what it
/// prints.
///
/// Each case runs the binary with a fixed argument list.  stdout and stderr
/// are kept apart so value output can be checked exactly.

use std::io::Write;
use std::process::{Command, Output, Stdio};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn binary() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_exan"))
}

/// Run the binary with `args`, feeding `stdin` to it.  The config search is
/// pointed at a path that never exists so a user `exanrc` cannot leak in.
fn run(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(binary())
        .args(["-c", "/nonexistent/exanrc"])
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn exan binary");
    child
        .stdin
        .as_mut()
        .expect("stdin not open")
        .write_all(stdin.as_bytes())
        .expect("write to stdin");
    child.wait_with_output().expect("wait failed")
}

fn stdout_lines(out: &Output) -> Vec<String> {
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .map(str::to_owned)
        .collect()
}

/// Run and assert success with exactly `expected` on stdout.
fn check(args: &[&str], stdin: &str, expected: &[&str]) {
    let out = run(args, stdin);
    assert!(
        out.status.success(),
        "exan failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert_eq!(stdout_lines(&out), expected, "args: {args:?}, stdin: {stdin:?}");
}

// ── Script sources ────────────────────────────────────────────────────────────

#[test]
fn script_from_stdin() {
    check(&[], "a = 2;\nb = a * 21 ## answer\n", &["42"]);
}

#[test]
fn inline_script() {
    check(&["-e", "max(3, 8) - 1"], "", &["7"]);
}

#[test]
fn script_file() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "if (n > 10) {{ size = \"big\" }} else {{ size = \"small\" }}").unwrap();
    let path = f.path().to_string_lossy().into_owned();
    check(&["-f", &path, "-Dn=3"], "", &["small"]);
}

// ── Variables and settings ────────────────────────────────────────────────────

#[test]
fn defines_and_table() {
    check(
        &["-t", "-Dprice=2.5", "-Dname=\"widget\""],
        "total = price * 4",
        &["10.0", "name = widget", "price = 2.5", "total = 10.0"],
    );
}

#[test]
fn scale_and_rounding_flags() {
    check(&["-s2", "-r", "down"], "2 / 3", &["0.66"]);
    check(&["-s2"], "2 / 3", &["0.67"]);
}

#[test]
fn config_file_settings() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "## settings").unwrap();
    writeln!(f, "division_scale = 3").unwrap();
    let path = f.path().to_string_lossy().into_owned();
    let out = Command::new(binary())
        .args(["-c", &path, "-e", "1 / 8"])
        .output()
        .expect("failed to run exan");
    assert!(out.status.success());
    assert_eq!(stdout_lines(&out), ["0.125"]);
}

#[test]
fn statement_without_value_prints_nothing() {
    check(&[], "if (false) { x = 1 }", &[]);
}

// ── Failures ──────────────────────────────────────────────────────────────────

#[test]
fn evaluation_error_exits_nonzero() {
    let out = run(&[], "y = x + 1");
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("variable 'x' is not initialized"), "{err}");
}

#[test]
fn bad_option_prints_usage() {
    let out = run(&["-z"], "");
    assert_eq!(out.status.code(), Some(1));
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("unknown option: -z"));
    assert!(err.contains("Usage: exan"));
}
