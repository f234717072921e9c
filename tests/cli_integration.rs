//! CLI integration tests
//!
//! Runs the compiled binary and checks parsing, exit codes and the health probe.

use std::process::Command;

fn screencraft() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_screencraft"));
    cmd.env_remove("SCREENCRAFT_LOG_LEVEL")
        .env_remove("SCREENCRAFT_LOG_JSON")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    let output = screencraft()
        .arg("--help")
        .output()
        .expect("Failed to execute screencraft");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("serve"));
    assert!(stdout.contains("health"));
}

#[test]
fn test_cli_version() {
    let output = screencraft()
        .arg("--version")
        .output()
        .expect("Failed to execute screencraft");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_serve_rejects_unknown_provider() {
    let output = screencraft()
        .args(["serve", "--provider", "carrier-pigeon"])
        .output()
        .expect("Failed to execute screencraft");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("carrier-pigeon"));
}

#[test]
fn test_serve_rejects_invalid_config() {
    let output = screencraft()
        .args(["serve", "--port", "0"])
        .output()
        .expect("Failed to execute screencraft");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Port must be non-zero"));
}

#[test]
fn test_health_fails_without_server() {
    let output = screencraft()
        .args(["health", "--url", "http://127.0.0.1:1", "--timeout", "2"])
        .output()
        .expect("Failed to execute screencraft");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unreachable"));
}

#[test]
fn test_missing_subcommand_is_an_error() {
    let output = screencraft()
        .output()
        .expect("Failed to execute screencraft");

    assert!(!output.status.success());
}
