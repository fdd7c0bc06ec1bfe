use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn a2a(config_dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("kubectl-a2a");
    cmd.arg("--config").arg(config_dir.path());
    cmd.env_remove("KUBECTL_A2A_CONFIG");
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = cargo_bin_cmd!("kubectl-a2a");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("A2A task executor"))
        .stdout(predicate::str::contains("list-functions"))
        .stdout(predicate::str::contains("describe"))
        .stdout(predicate::str::contains("execute"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_cli_version() {
    let mut cmd = cargo_bin_cmd!("kubectl-a2a");
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kubectl-a2a"));
}

#[test]
fn test_cli_execute_help() {
    let mut cmd = cargo_bin_cmd!("kubectl-a2a");
    cmd.args(["execute", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--params"))
        .stdout(predicate::str::contains("--param"))
        .stdout(predicate::str::contains("--priority"));
}

#[test]
fn test_list_functions() {
    let dir = TempDir::new().unwrap();
    a2a(&dir)
        .arg("list-functions")
        .assert()
        .success()
        .stdout(predicate::str::contains("create_plan"))
        .stdout(predicate::str::contains("steps"));
}

#[test]
fn test_list_functions_json() {
    let dir = TempDir::new().unwrap();
    let output = a2a(&dir)
        .args(["--output", "json", "list-functions"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listing[0]["name"], "create_plan");
    assert_eq!(listing[0]["schema"]["required"][0], "steps");
}

#[test]
fn test_describe() {
    let dir = TempDir::new().unwrap();
    a2a(&dir)
        .args(["describe", "create_plan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Function: create_plan"))
        .stdout(predicate::str::contains("Schema:"))
        .stdout(predicate::str::contains("function_name"));
}

#[test]
fn test_describe_unknown_function_fails() {
    let dir = TempDir::new().unwrap();
    a2a(&dir)
        .args(["describe", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Function not found: missing"));
}

#[test]
fn test_execute_with_json_params() {
    let dir = TempDir::new().unwrap();
    a2a(&dir)
        .args([
            "execute",
            "create_plan",
            "--params",
            r#"{"steps": [{"function_name": "deploy_to", "arguments": {}}]}"#,
            "--priority",
            "high",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("plan created"))
        .stdout(predicate::str::contains("deploy_to"));
}

#[test]
fn test_execute_with_key_value_params() {
    let dir = TempDir::new().unwrap();
    a2a(&dir)
        .args(["--output", "json", "execute", "create_plan", "-P", "steps=[]"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""steps": []"#));
}

#[test]
fn test_execute_missing_required_param_fails() {
    let dir = TempDir::new().unwrap();
    a2a(&dir)
        .args(["execute", "create_plan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'steps' is required"));
}

#[test]
fn test_execute_rejects_malformed_param() {
    let dir = TempDir::new().unwrap();
    a2a(&dir)
        .args(["execute", "create_plan", "-P", "steps"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Use key=value"));
}

#[test]
fn test_execute_unknown_function_fails() {
    let dir = TempDir::new().unwrap();
    a2a(&dir)
        .args(["execute", "missing"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("list-functions"))
        .stderr(predicate::str::contains("Function not found"));
}

#[test]
fn test_config_path() {
    let dir = TempDir::new().unwrap();
    a2a(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_reset_then_show() {
    let dir = TempDir::new().unwrap();
    a2a(&dir)
        .args(["config", "reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reset to defaults"));
    assert!(dir.path().join("config.toml").exists());

    a2a(&dir)
        .args(["--output", "json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("topic_capacity"))
        .stdout(predicate::str::contains("1024"));
}

#[test]
fn test_config_show_redacts_secret() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[auth]\nsecret = \"super-secret-value\"\n",
    )
    .unwrap();

    a2a(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("super-secret-value").not());
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[broker]\ntopic_capacity = 0\n",
    )
    .unwrap();

    a2a(&dir)
        .arg("list-functions")
        .assert()
        .failure()
        .stderr(predicate::str::contains("broker.topic_capacity"));
}
