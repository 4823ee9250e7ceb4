//! Black-box specs for the vigild binary's info flags.

use std::process::{Command, Output};

fn vigild(args: &[&str]) -> Output {
    Command::new(assert_cmd::cargo::cargo_bin("vigild"))
        .args(args)
        .output()
        .expect("vigild should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn help_describes_the_daemon() {
    let output = vigild(&["--help"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("vigild"));
    assert!(text.contains("USAGE"));
    assert!(text.contains("--version"));
}

#[test]
fn version_prints_the_crate_version() {
    let output = vigild(&["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("vigild "));
}

#[test]
fn unexpected_argument_fails() {
    let output = vigild(&["--bogus"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unexpected argument"));
}
