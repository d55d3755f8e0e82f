//! Integration tests for the agentkit binary
//!
//! Each test builds a throwaway workspace (settings/, personas/, prompts/)
//! and drives the CLI against it with `--root`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Helper to get the agentkit binary path
fn agentkit_binary() -> PathBuf {
    // When running tests, the binary is in target/debug/agentkit
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove deps
    path.push("agentkit");
    path
}

/// Run agentkit against a workspace root, keeping logs and config inside the temp dir
fn run_agentkit(temp: &TempDir, args: &[&str]) -> std::process::Output {
    let root = temp.path().join("workspace");
    Command::new(agentkit_binary())
        .env_remove("AGENTKIT_CONFIG")
        .env_remove("RUST_LOG")
        .env("AGENTKIT_DIR", temp.path())
        .env("XDG_DATA_HOME", temp.path().join("data"))
        .arg("--root")
        .arg(&root)
        .args(args)
        .output()
        .expect("Failed to execute agentkit")
}

fn run_json(temp: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = run_agentkit(temp, args);
    assert!(
        output.status.success(),
        "agentkit {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn create_workspace(debug: bool) -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("workspace");

    write(
        &root,
        "settings/system.yaml",
        &format!(
            r#"persona:
  enabled: true
  name: helper
debug:
  mode: {debug}
  simulated_response: |
    ```json
    {{"ok": true}}
    ```
misc:
  on_the_fly: false
"#
        ),
    );
    write(
        &root,
        "settings/models.yaml",
        r#"default_model:
  api: local
  model: small
  params:
    temperature: 0.7
library:
  local:
    params:
      host: localhost
    classes:
      tiny:
        models:
          small:
            identifier: small-v1
          large:
            identifier: large-v2
            params:
              temperature: 0.1
"#,
    );
    write(&root, "personas/helper.yaml", "name: Helper\ntone: calm\n");
    write(
        &root,
        "prompts/echo.yaml",
        r#"prompts:
  system: "You are {name}, speaking in a {tone} tone."
  user:
    request: "{text}"
    feedback: "Feedback: {feedback}"
    literal: "Reply as /{answer/}"
"#,
    );
    write(
        &root,
        "prompts/nested/structured.yaml",
        r#"prompts:
  system: "Return JSON."
  user: "Go."
model_overrides:
  model: large
parse_response_as: json
"#,
    );
    write(
        &root,
        "prompts/hollow.yaml",
        r#"prompts:
  system:
    only: "{absent}"
  user: "hi"
"#,
    );

    temp
}

#[test]
fn test_agent_list() {
    let temp = create_workspace(false);
    let names = run_json(&temp, &["agent", "list", "-o", "json"]);
    let mut names: Vec<String> = serde_json::from_value(names).unwrap();
    names.sort();
    assert_eq!(names, vec!["echo", "hollow", "structured"]);
}

#[test]
fn test_agent_render_with_vars() {
    let temp = create_workspace(false);
    let config = run_json(&temp, &["agent", "render", "echo", "--var", "text=Summarize this", "-o", "json"]);

    assert_eq!(config["agent"], "echo");
    assert_eq!(config["prompt"]["system"], "You are Helper, speaking in a calm tone.");
    assert_eq!(config["prompt"]["user"], "Summarize this\n\nReply as {answer}");
    assert_eq!(config["model"]["identifier"], "small-v1");
}

#[test]
fn test_agent_render_keeps_feedback_section_when_set() {
    let temp = create_workspace(false);
    let config = run_json(
        &temp,
        &["agent", "render", "echo", "--var", "text=x", "--var", "feedback=too long", "-o", "json"],
    );
    assert_eq!(config["prompt"]["user"], "x\n\nFeedback: too long\n\nReply as {answer}");
}

#[test]
fn test_agent_render_empty_role_fails() {
    let temp = create_workspace(false);
    let output = run_agentkit(&temp, &["agent", "render", "hollow", "-o", "json"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("system"), "stderr: {}", stderr);
}

#[test]
fn test_agent_render_unknown_agent_fails() {
    let temp = create_workspace(false);
    let output = run_agentkit(&temp, &["agent", "render", "ghost", "-o", "json"]);
    assert!(!output.status.success());
}

#[test]
fn test_agent_run_echoes_user_prompt() {
    let temp = create_workspace(false);
    let summary = run_json(&temp, &["agent", "run", "echo", "--var", "text=ping", "-o", "json"]);
    assert_eq!(summary["simulated"], false);
    assert_eq!(summary["response"], "ping\n\nReply as {answer}");
}

#[test]
fn test_agent_run_debug_parses_simulated_response() {
    let temp = create_workspace(true);
    let summary = run_json(&temp, &["agent", "run", "structured", "-o", "json"]);
    assert_eq!(summary["simulated"], true);
    assert_eq!(summary["model"], "large-v2");
    assert_eq!(summary["response"]["ok"], true);
}

#[test]
fn test_model_resolve_merges_params() {
    let temp = create_workspace(false);
    let model = run_json(&temp, &["model", "resolve", "structured", "-o", "json"]);
    assert_eq!(model["api"], "local");
    assert_eq!(model["model"], "large");
    assert_eq!(model["params"]["temperature"], 0.1);
    assert_eq!(model["params"]["host"], "localhost");
}

#[test]
fn test_config_get_dotted_key() {
    let temp = create_workspace(false);
    let output = run_agentkit(&temp, &["config", "get", "system.persona.name"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "helper");
}

#[test]
fn test_config_get_unknown_key_fails() {
    let temp = create_workspace(false);
    let output = run_agentkit(&temp, &["config", "get", "system.nope"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("system.nope"));
}

#[test]
fn test_persona_show() {
    let temp = create_workspace(false);
    let fields = run_json(&temp, &["persona", "show", "helper", "-o", "json"]);
    assert_eq!(fields["tone"], "calm");
}

#[test]
fn test_persona_show_missing_fails() {
    let temp = create_workspace(false);
    let output = run_agentkit(&temp, &["persona", "show", "ghost", "-o", "json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ghost"));
}
