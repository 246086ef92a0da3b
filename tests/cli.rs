use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn cisl() -> Command {
    let mut cmd = Command::cargo_bin("cisl").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("CISL_MAX_DEPTH");
    cmd
}

#[test]
fn run_expression_prints_last_value() {
    cisl()
        .args(["run", "--expr", "(+ 1 2)"])
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn run_expression_renders_lists_as_cons_pairs() {
    cisl()
        .args(["run", "--expr", "(list 1 2)"])
        .assert()
        .success()
        .stdout("(1 . (2 . nil))\n");
}

#[test]
fn run_file_with_recursive_definition() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "; factorial\n(define fact (lambda (n) (if (= n 0) 1 (* n (fact (- n 1))))))\n(fact 10)"
    )
    .unwrap();

    cisl()
        .arg("run")
        .arg(file.path())
        .assert()
        .success()
        .stdout("3628800\n");
}

#[test]
fn print_writes_to_stdout() {
    cisl()
        .args(["run", "--expr", "(print \"hi\") 'done"])
        .assert()
        .success()
        .stdout("\"hi\"\ndone\n");
}

#[test]
fn unbound_symbol_fails() {
    cisl()
        .args(["run", "--expr", "undefined-thing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unbound symbol: undefined-thing"));
}

#[test]
fn parse_error_reports_offset() {
    cisl()
        .args(["run", "--expr", "(+ 1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parse error at byte 4"));
}

#[test]
fn missing_file_fails() {
    cisl()
        .args(["run", "/definitely/not/here.lisp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn max_depth_limits_recursion() {
    cisl()
        .args([
            "--max-depth",
            "50",
            "run",
            "--expr",
            "(define spin (lambda (n) (spin n))) (spin 1)",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("depth limit of 50 exceeded"));
}

#[test]
fn max_depth_from_environment() {
    cisl()
        .env("CISL_MAX_DEPTH", "50")
        .args(["run", "--expr", "(define spin (lambda (n) (spin n))) (spin 1)"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("depth limit of 50 exceeded"));
}

#[test]
fn help_lists_subcommands() {
    cisl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run").and(predicate::str::contains("repl")));
}
