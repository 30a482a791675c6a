use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mcp_hand(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mcp-hand").unwrap();
    cmd.env("HOME", home.path())
        .env_remove("MCPHAND_STATE")
        .env_remove("MCPHAND_API_BASE")
        .env_remove("MCPHAND_HOST")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn version_prints_package_version() {
    let home = TempDir::new().unwrap();
    mcp_hand(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("mcp-hand v"));
}

#[test]
fn mcp_list_without_state_shows_samples() {
    let home = TempDir::new().unwrap();
    mcp_hand(&home)
        .args(["mcp", "list"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Linear MCP")
                .and(predicate::str::contains("Sentry MCP"))
                .and(predicate::str::contains("DeepWiki MCP"))
                .and(predicate::str::contains("Context7 MCP"))
                .and(predicate::str::contains("(sample)"))
                .and(predicate::str::contains("Connection failed")),
        );
}

#[test]
fn mcp_list_json_reads_state_snapshot() {
    let home = TempDir::new().unwrap();
    let state = home.path().join("state.json");
    std::fs::write(
        &state,
        r#"{
            "config": {
                "mcpServerStatuses": [
                    {"id": "gh", "name": "GitHub", "status": "authenticating", "isProtectedResource": true}
                ]
            }
        }"#,
    )
    .unwrap();

    let output = mcp_hand(&home)
        .args(["mcp", "list", "--json", "--state"])
        .arg(&state)
        .output()
        .unwrap();
    assert!(output.status.success());

    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["sample"], false);
    assert_eq!(v["servers"][0]["name"], "GitHub");
    assert_eq!(v["servers"][0]["status"], "authenticating");
    assert_eq!(v["servers"][0]["isProtectedResource"], true);
}

#[test]
fn mcp_list_honours_state_env() {
    let home = TempDir::new().unwrap();
    let state = home.path().join("elsewhere.json");
    std::fs::write(
        &state,
        r#"{"config":{"mcpServerStatuses":[{"id":"a","name":"Alpha","status":"connected"}]}}"#,
    )
    .unwrap();

    mcp_hand(&home)
        .env("MCPHAND_STATE", &state)
        .args(["mcp", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Alpha").and(predicate::str::contains("sample").not()));
}

#[test]
fn mcp_list_rejects_corrupt_state() {
    let home = TempDir::new().unwrap();
    let state = home.path().join("state.json");
    std::fs::write(&state, "{not json").unwrap();

    mcp_hand(&home)
        .args(["mcp", "list", "--state"])
        .arg(&state)
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));
}

#[test]
fn profile_show_signed_out() {
    let home = TempDir::new().unwrap();
    mcp_hand(&home)
        .args(["profile", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in"));
}

#[test]
fn profile_show_json_reads_auth_file() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join(".mcp-hand");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("auth.json"),
        r#"{"userEmail": "a@b.com", "accessToken": "tok", "organizationId": "org-1"}"#,
    )
    .unwrap();

    let output = mcp_hand(&home)
        .args(["profile", "show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["authenticated"], true);
    assert_eq!(v["userEmail"], "a@b.com");
    assert_eq!(v["organizationId"], "org-1");

    mcp_hand(&home)
        .args(["profile", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Signed in as a@b.com (organization: org-1)",
        ));
}
