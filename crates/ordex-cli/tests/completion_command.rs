use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

#[allow(deprecated)]
fn get_ordex_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("ordex")
}

#[test]
fn test_completion_command_help() {
    let mut cmd = Command::new(get_ordex_bin());
    cmd.arg("completion").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Generate shell completion scripts"))
        .stdout(predicate::str::contains("SUPPORTED SHELLS"))
        .stdout(predicate::str::contains("INSTALLATION"))
        .stdout(predicate::str::contains("~/.zshrc"));
}

#[test]
fn test_completion_bash_generates_script() {
    let mut cmd = Command::new(get_ordex_bin());
    cmd.arg("completion").arg("--shell").arg("bash");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("_ordex()"))
        .stdout(predicate::str::contains("extract"));
}

#[test]
fn test_completion_fish_generates_script() {
    let mut cmd = Command::new(get_ordex_bin());
    cmd.arg("completion").arg("--shell").arg("fish");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("complete -c ordex"));
}

#[test]
fn test_completion_requires_shell() {
    let mut cmd = Command::new(get_ordex_bin());
    cmd.arg("completion");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--shell"));
}
