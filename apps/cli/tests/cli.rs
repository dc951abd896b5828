use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn config(contents: &str) -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("factgate.toml");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

fn factgate() -> Command {
    let mut cmd = Command::cargo_bin("factgate").unwrap();
    cmd.env("RUST_LOG", "error");
    cmd
}

#[test]
fn plan_lists_every_module() {
    let (_dir, path) = config("[modules]\npreset = \"common\"\n");

    factgate()
        .arg("plan")
        .arg("-c")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("hardware.memory      enabled   preset"))
        .stdout(predicate::str::contains("os.processes         disabled  preset"));
}

#[test]
fn plan_repairs_conflicts_even_in_fail_mode() {
    let (_dir, path) = config("[modules]\npreset = \"common\"\ndisabled = [\"os\"]\n");

    factgate()
        .args(["plan", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("os.filesystem        disabled  repaired"))
        .stdout(predicate::str::contains("1 conflict(s) repaired"));
}

#[test]
fn check_fails_on_rejected_configuration() {
    let (_dir, path) = config("[modules]\npreset = \"common\"\ndisabled = [\"hardware\"]\n");

    factgate()
        .arg("check")
        .arg("-c")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("PARENT_DISABLED_CHILD_ENABLED"));
}

#[test]
fn check_accepts_a_consistent_configuration() {
    let (_dir, path) = config("[modules]\npreset = \"all\"\n[validation]\nmode = \"warn\"\n");

    factgate()
        .arg("check")
        .arg("-c")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("configuration ok (warn mode): 17 of 17 modules enabled"));
}

#[test]
fn missing_configuration_fails() {
    let dir = tempfile::tempdir().unwrap();

    factgate()
        .arg("check")
        .arg("-c")
        .arg(dir.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration could not be loaded"));
}

#[test]
fn check_logs_the_computed_plan_to_stderr() {
    let (_dir, path) = config("[modules]\npreset = \"common\"\n");

    factgate()
        .env("RUST_LOG", "info")
        .arg("check")
        .arg("-c")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Module plan computed"))
        .stdout(predicate::str::contains("Module plan computed").not());
}
