//! Startup behaviour of the server binary.
//!
//! These cases all fail before the listener is bound, so the process exits
//! on its own.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn ledger() -> Command {
    let mut cmd = Command::cargo_bin("account-ledger").unwrap();
    cmd.env_remove("LEDGER_LISTEN_ADDR").env_remove("LEDGER_DATA_DIR");
    cmd
}

#[test]
fn test_invalid_listen_address_aborts() {
    let dir = TempDir::new().unwrap();
    ledger()
        .arg(dir.path())
        .env("LEDGER_LISTEN_ADDR", "not-an-address")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid listen address"));
}

#[test]
fn test_too_many_arguments_aborts() {
    ledger()
        .args(["one", "two"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_corrupt_counter_aborts_startup() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("last_id.txt"), "garbage").unwrap();

    ledger()
        .arg(dir.path())
        .env("LEDGER_LISTEN_ADDR", "127.0.0.1:0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("last_id.txt"));

    assert_eq!(fs::read_to_string(dir.path().join("last_id.txt")).unwrap(), "garbage");
}

#[test]
fn test_unusable_data_dir_aborts_startup() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("file");
    fs::write(&blocker, "").unwrap();

    ledger()
        .arg(blocker.join("db"))
        .env("LEDGER_LISTEN_ADDR", "127.0.0.1:0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}
