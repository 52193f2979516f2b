use std::process::{Command, Output};

fn run_demo(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_optargs-demo"))
        .args(args)
        .output()
        .expect("failed to run optargs-demo")
}

#[test]
fn demo_reports_parsed_options_as_json() {
    let output = run_demo(&[
        "-vv",
        "--output=report.txt",
        "--include",
        "TODO",
        "-IFIXME",
        "notes.txt",
        "src.rs",
    ]);
    assert!(output.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(report["options"]["verbosity"], 2);
    assert_eq!(report["options"]["output"], "report.txt");
    assert_eq!(report["options"]["include"], serde_json::json!(["TODO", "FIXME"]));
    // defaults materialize even when the option never appears
    assert_eq!(report["options"]["format"], "json");
    assert_eq!(report["options"]["max_count"], 25);
    assert_eq!(report["files"], serde_json::json!(["notes.txt", "src.rs"]));
}

#[test]
fn demo_stops_option_processing_at_double_dash() {
    let output = run_demo(&["-v", "--", "--output=x", "-q"]);
    assert!(output.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(report["options"]["verbosity"], 1);
    assert_eq!(report["files"], serde_json::json!(["--output=x", "-q"]));
}

#[test]
fn demo_help_exits_zero_with_usage() {
    let output = run_demo(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Usage: optargs-demo [options] [file ...]"));
    assert!(stdout.contains("Matching Options:"));
    assert!(stdout.contains("-I PATTERN, --include=PATTERN"));
    // %default renders the declared default, before type conversion
    assert!(stdout.contains("stop after N matches per file (default: 0x19)"));
}

#[test]
fn demo_version_exits_zero() {
    let output = run_demo(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("optargs-demo "));
}

#[test]
fn demo_unknown_option_is_a_usage_error() {
    let output = run_demo(&["--bogus"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage: optargs-demo [options] [file ...]"));
    assert!(stderr.contains("optargs-demo: error: no such option: --bogus"));
}

#[test]
fn demo_bad_value_is_a_usage_error() {
    let output = run_demo(&["--max-count", "lots"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid integer value"));
}

#[test]
fn demo_abbreviated_long_option_resolves() {
    let output = run_demo(&["--inc", "X"]);
    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(report["options"]["include"], serde_json::json!(["X"]));
}
