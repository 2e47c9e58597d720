//! CLI smoke tests against the built binary

use assert_cmd::Command;
use predicates::prelude::*;

fn weft() -> Command {
    let mut cmd = Command::cargo_bin("weft").unwrap();
    cmd.env_remove("NODE_ENV");
    cmd
}

#[test]
fn init_then_build_production() {
    let dir = tempfile::tempdir().unwrap();

    weft().current_dir(dir.path()).arg("init").assert().success();

    weft()
        .current_dir(dir.path())
        .args(["build", "--mode", "production"])
        .assert()
        .success()
        .stderr(predicate::str::contains("production"));

    assert!(dir.path().join("public/bundle.js").is_file());
    assert!(dir.path().join("public/bundle.css").is_file());
    assert!(!dir.path().join("public/bundle.js.map").exists());
}

#[test]
fn build_defaults_to_development() {
    let dir = tempfile::tempdir().unwrap();

    weft().current_dir(dir.path()).arg("init").assert().success();

    weft()
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .success()
        .stderr(predicate::str::contains("development"));

    assert!(dir.path().join("public/bundle.js.map").is_file());
    assert!(!dir.path().join("public/bundle.css").exists());
}

#[test]
fn node_env_selects_production_when_flag_absent() {
    let dir = tempfile::tempdir().unwrap();

    weft().current_dir(dir.path()).arg("init").assert().success();

    weft()
        .current_dir(dir.path())
        .env("NODE_ENV", "production")
        .arg("build")
        .assert()
        .success()
        .stderr(predicate::str::contains("production"));

    assert!(dir.path().join("public/bundle.css").is_file());
}

#[test]
fn unrecognized_mode_falls_back_to_development() {
    let dir = tempfile::tempdir().unwrap();

    weft().current_dir(dir.path()).arg("init").assert().success();

    weft()
        .current_dir(dir.path())
        .args(["build", "--mode", "staging"])
        .assert()
        .success()
        .stderr(predicate::str::contains("development"));
}

#[test]
fn build_without_config_fails() {
    let dir = tempfile::tempdir().unwrap();

    weft()
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}
