//! CLI integration tests for the `gramdex` binary.
//!
//! Uses `assert_cmd` to spawn the binary as a subprocess, pipe stdin,
//! and assert on stdout/stderr/exit code.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

fn gramdex_cmd() -> Command {
    Command::from(cargo_bin_cmd!("gramdex"))
}

/// Write a corpus file into the temp directory and return its path.
fn corpus_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(name);
    fs::write(&path, content).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Basic CLI behavior
// ---------------------------------------------------------------------------

#[test]
fn help_flag() {
    gramdex_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("n-gram fuzzy matching"));
}

#[test]
fn version_flag() {
    gramdex_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gramdex"));
}

// ---------------------------------------------------------------------------
// Query loop
// ---------------------------------------------------------------------------

#[test]
fn fuzzy_query_finds_trained_entry() {
    let corpus = corpus_file(
        "gramdex_cli_test_fuzzy.txt",
        "# fruit lexicon\napple\napplet\nbanana\n",
    );
    gramdex_cmd()
        .args(["--n-min", "2", "--train"])
        .arg(&corpus)
        .write_stdin("appl\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("apple"));
    fs::remove_file(&corpus).ok();
}

#[test]
fn predict_query_emits_next_token() {
    let corpus = corpus_file(
        "gramdex_cli_test_predict.txt",
        "IF ID ASSIGN NUM SEMI\nIF ID ASSIGN NUM SEMI\n",
    );
    gramdex_cmd()
        .args(["--engine", "token-predict", "--n-min", "1", "--n-max", "4", "--train"])
        .arg(&corpus)
        .write_stdin("IF ID ASSIGN\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("NUM"));
    fs::remove_file(&corpus).ok();
}

#[test]
fn unknown_query_reports_no_results() {
    let corpus = corpus_file("gramdex_cli_test_unknown.txt", "apple\n");
    gramdex_cmd()
        .arg("--train")
        .arg(&corpus)
        .write_stdin("zzzzz\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("(no results)"));
    fs::remove_file(&corpus).ok();
}

#[test]
fn quit_exits_cleanly() {
    gramdex_cmd().write_stdin("quit\n").assert().success();
}

#[test]
fn exit_exits_cleanly() {
    gramdex_cmd().write_stdin("exit\n").assert().success();
}

#[test]
fn eof_exits_cleanly() {
    gramdex_cmd().write_stdin("").assert().success();
}

// ---------------------------------------------------------------------------
// Model save / load
// ---------------------------------------------------------------------------

#[test]
fn saved_model_reloads_and_answers() {
    let corpus = corpus_file("gramdex_cli_test_save.txt", "apple\napplet\nbanana\n");
    let model = std::env::temp_dir().join("gramdex_cli_test_model.json");

    gramdex_cmd()
        .args(["--n-min", "2", "--train"])
        .arg(&corpus)
        .arg("--save-model")
        .arg(&model)
        .write_stdin("quit\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved model"));

    gramdex_cmd()
        .arg("--load-model")
        .arg(&model)
        .write_stdin("appl\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("apple"));

    fs::remove_file(&corpus).ok();
    fs::remove_file(&model).ok();
}

#[test]
fn loading_foreign_model_kind_fails() {
    let corpus = corpus_file("gramdex_cli_test_foreign.txt", "apple\nbanana\n");
    let model = std::env::temp_dir().join("gramdex_cli_test_foreign_model.json");

    gramdex_cmd()
        .args(["--n-min", "2", "--train"])
        .arg(&corpus)
        .arg("--save-model")
        .arg(&model)
        .write_stdin("quit\n")
        .assert()
        .success();

    // A string-fuzzy model fed to the token-predict engine is rejected.
    gramdex_cmd()
        .args(["--engine", "token-predict", "--load-model"])
        .arg(&model)
        .write_stdin("quit\n")
        .assert()
        .failure();

    fs::remove_file(&corpus).ok();
    fs::remove_file(&model).ok();
}
