//! End-to-end tests for the `repo-meta completions` command.

#[allow(dead_code)]
mod common;
#[allow(unused_imports)]
use common::prelude::*;

#[test]
fn test_completions_help() {
    let mut cmd = cargo_bin_cmd!("repo-meta");
    cmd.arg("completions")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Generate shell completion scripts"))
        .stdout(predicate::str::contains("bash"))
        .stdout(predicate::str::contains("zsh"))
        .stdout(predicate::str::contains("fish"));
}

#[test]
fn test_completions_bash() {
    let mut cmd = cargo_bin_cmd!("repo-meta");
    cmd.arg("completions")
        .arg("bash")
        .assert()
        .success()
        .stdout(predicate::str::contains("_repo-meta()"))
        .stdout(predicate::str::contains("configure"))
        .stdout(predicate::str::contains("profiles"));
}

#[test]
fn test_completions_zsh() {
    let mut cmd = cargo_bin_cmd!("repo-meta");
    cmd.arg("completions")
        .arg("zsh")
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef repo-meta"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_completions_fish() {
    let mut cmd = cargo_bin_cmd!("repo-meta");
    cmd.arg("completions")
        .arg("fish")
        .assert()
        .success()
        .stdout(predicate::str::contains("complete -c repo-meta"));
}

#[test]
fn test_completions_invalid_shell() {
    let mut cmd = cargo_bin_cmd!("repo-meta");
    cmd.arg("completions")
        .arg("tcsh")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}
