use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("oh")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("events"))
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("--conversation"));
}

#[test]
fn test_events_help_shows_options() {
    cargo_bin_cmd!("oh")
        .args(["events", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--conversation"))
        .stdout(predicate::str::contains("--send"))
        .stdout(predicate::str::contains("--pretty"));
}

#[test]
fn test_events_requires_conversation() {
    cargo_bin_cmd!("oh")
        .arg("events")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--conversation"));
}

#[test]
fn test_chat_without_conversation_fails() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("oh")
        .env("OH_HOME", dir.path())
        .env_remove("OH_CONVERSATION_ID")
        .env_remove("OH_BACKEND_BASE_URL")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No conversation selected"));
}

#[test]
fn test_invalid_backend_is_rejected() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("oh")
        .env("OH_HOME", dir.path())
        .args(["--backend", "ftp://example.com", "logout"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported backend scheme"));
}

#[test]
fn test_events_rejects_blank_send() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("oh")
        .env("OH_HOME", dir.path())
        .env_remove("OH_BACKEND_BASE_URL")
        .args(["events", "--conversation", "c1", "--send", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be empty"));
}
