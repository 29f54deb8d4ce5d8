//! Behavioural smoke tests for the CLI entrypoint.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const PUBLIC_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIExample dev@laptop";

fn isolated_command(home: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("azdeploy");
    cmd.env_clear()
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .current_dir(home.path());
    cmd
}

#[test]
fn cli_without_arguments_prints_help() {
    let mut cmd = cargo_bin_cmd!("azdeploy");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("deploy"));
}

#[test]
fn cli_help_lists_deploy_command() {
    let mut cmd = cargo_bin_cmd!("azdeploy");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("--verbose"))
        .stdout(predicate::str::contains("AZDEPLOY_CONFIG_PATH"))
        .stdout(predicate::str::contains(".env files are not loaded"));
}

#[test]
fn deploy_without_credential_fails_before_contacting_azure() {
    let home = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
    let mut cmd = isolated_command(&home);
    cmd.arg("deploy")
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains(
            "no administrator credential configured",
        ));
}

#[test]
fn deploy_without_subscription_names_the_variable() {
    let home = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
    let mut cmd = isolated_command(&home);
    cmd.env("AZDEPLOY_ADMIN_SSH_PUBLIC_KEY", PUBLIC_KEY)
        .arg("deploy")
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("AZURE_SUBSCRIPTION_ID"));
}
