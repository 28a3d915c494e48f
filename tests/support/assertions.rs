//! Assertions over gpass command output.

use std::process::Output;

use super::Test;

/// Assert that gpass exited successfully.
pub fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "gpass exited with {}:\n{}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Assert that gpass failed and its error report mentions `expected`.
pub fn assert_fails_with(output: &Output, expected: &str) {
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(
        !output.status.success(),
        "gpass should have failed, stdout: {}",
        stdout(output)
    );
    assert!(err.contains(expected), "stderr missing '{}', got: {}", expected, err);
}

/// Stdout as a String.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Secret names reported by `gpass list --json`.
pub fn listed_secrets(t: &Test) -> Vec<String> {
    let output = t.list_json();
    assert_success(&output);
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("list output is not JSON");
    json["secrets"]
        .as_array()
        .expect("list output has no secrets array")
        .iter()
        .filter_map(|name| name.as_str().map(str::to_string))
        .collect()
}

/// Assert that `gpass show <name>` prints exactly `expected`.
pub fn assert_reveals(t: &Test, name: &str, expected: &str) {
    let output = t.show(name);
    assert_success(&output);
    assert_eq!(stdout(&output), expected, "unexpected value for secret '{}'", name);
}
