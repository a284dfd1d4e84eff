// The CLI surface: every workflow operation is reachable from a subcommand.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_workflow_commands() {
    let mut cmd = Command::cargo_bin("receipt-ledger").unwrap();

    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("track"))
        .stdout(predicate::str::contains("update-status"))
        .stdout(predicate::str::contains("retry"))
        .stdout(predicate::str::contains("email"))
        .stdout(predicate::str::contains("submit"))
        .stdout(predicate::str::contains("payment-received"))
        .stdout(predicate::str::contains("logs"))
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("cleanup"));
}

#[test]
fn test_payment_received_help_shows_amount_flag() {
    let mut cmd = Command::cargo_bin("receipt-ledger").unwrap();

    cmd.args(["payment-received", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--amount"))
        .stdout(predicate::str::contains("--system"));
}

#[test]
fn test_unknown_status_is_rejected_with_reason() {
    let mut cmd = Command::cargo_bin("receipt-ledger").unwrap();

    cmd.args([
        "update-status",
        "00000000-0000-0000-0000-000000000000",
        "--to",
        "shipped",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("no status named 'shipped'"));
}
