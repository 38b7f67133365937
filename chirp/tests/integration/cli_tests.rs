use serde_json::{Value, json};
use std::path::Path;

use crate::common::{TestHome, assert_contains, assert_exit_code, init_test_logging};

const ENABLED_HOOKS: &[&str] = &[
    "PreToolUse",
    "PostToolUse",
    "Notification",
    "UserPromptSubmit",
    "Stop",
    "SubagentStop",
    "SessionStart",
];

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

fn command_of(entry: &Value) -> &str {
    entry[0]["hooks"][0]["command"]
        .as_str()
        .expect("hook entry has no command")
}

#[test]
fn test_install_registers_enabled_hooks() {
    init_test_logging();
    crate::test_log!("TEST START: test_install_registers_enabled_hooks");

    let env = TestHome::new();
    let output = env.run(&["install", "--scope", "user"]);
    assert_exit_code(&output, 0);
    assert_contains(
        &String::from_utf8_lossy(&output.stdout),
        "Installed 7 chirp hooks",
    );

    let settings = env.read_settings();
    let hooks = settings["hooks"].as_object().unwrap();
    let names: Vec<&str> = hooks.keys().map(String::as_str).collect();
    assert_eq!(names, ENABLED_HOOKS);

    let command = command_of(&hooks["PreToolUse"]);
    let basename = Path::new(command).file_name().unwrap().to_string_lossy();
    assert!(basename == "chirp" || basename == "chirp.exe", "got {command}");
    assert_eq!(hooks["Stop"][0]["matcher"], ".*");

    crate::test_log!("TEST PASS: test_install_registers_enabled_hooks");
}

#[test]
fn test_install_json_reports_outcome() {
    init_test_logging();
    let env = TestHome::new();

    let first = env.run(&["install", "--json"]);
    assert_exit_code(&first, 0);
    let report = stdout_json(&first);
    assert_eq!(report["action"], "install");
    assert_eq!(report["scope"], "user");
    assert_eq!(report["outcome"], "changed");
    assert_eq!(
        report["path"],
        json!(env.settings_path().to_string_lossy())
    );

    let before = std::fs::read(env.settings_path()).unwrap();
    let second = env.run(&["install", "--json"]);
    assert_exit_code(&second, 0);
    assert_eq!(stdout_json(&second)["outcome"], "unchanged");
    assert_eq!(std::fs::read(env.settings_path()).unwrap(), before);
}

#[test]
fn test_uninstall_restores_foreign_settings() {
    init_test_logging();
    let env = TestHome::new();
    let original = "{\n  \"version\": \"1.0\",\n  \"hooks\": {\n    \"PreCommit\": \"git diff\"\n  }\n}\n";
    env.write_settings(original);

    assert_exit_code(&env.run(&["install"]), 0);
    assert_eq!(env.read_settings()["hooks"]["PreCommit"], "git diff");

    let output = env.run(&["uninstall", "--scope", "user"]);
    assert_exit_code(&output, 0);
    assert_contains(&String::from_utf8_lossy(&output.stdout), "Removed 7 chirp hooks");
    assert_eq!(
        std::fs::read_to_string(env.settings_path()).unwrap(),
        original
    );

    let again = env.run(&["uninstall"]);
    assert_exit_code(&again, 0);
    assert_contains(&String::from_utf8_lossy(&again.stdout), "No chirp hooks found");
}

#[test]
fn test_uninstall_legacy_and_mixed_entries() {
    init_test_logging();
    let env = TestHome::new();
    env.write_settings(
        &json!({
            "hooks": {
                "PreToolUse": "/usr/local/bin/chirp",
                "Notification": [{
                    "matcher": ".*",
                    "hooks": [
                        {"type": "command", "command": "chirp"},
                        {"type": "command", "command": "notify-send done"}
                    ]
                }]
            },
            "v": 1
        })
        .to_string(),
    );

    let output = env.run(&["uninstall", "--json"]);
    assert_exit_code(&output, 0);
    assert_eq!(
        stdout_json(&output)["hooks"],
        json!(["PreToolUse", "Notification"])
    );
    assert_eq!(
        env.read_settings(),
        json!({
            "hooks": {
                "Notification": [{
                    "matcher": ".*",
                    "hooks": [{"type": "command", "command": "notify-send done"}]
                }]
            },
            "v": 1
        })
    );
}

#[test]
fn test_project_scope_uses_working_directory() {
    init_test_logging();
    let env = TestHome::new();

    let output = env.run(&["install", "--scope", "project", "--exec-path", "/opt/chirp"]);
    assert_exit_code(&output, 0);
    assert!(env.project_settings_path().exists());
    assert!(!env.settings_path().exists());

    let text = std::fs::read_to_string(env.project_settings_path()).unwrap();
    let settings: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(command_of(&settings["hooks"]["SessionStart"]), "/opt/chirp");
}

#[test]
fn test_exec_path_from_environment() {
    init_test_logging();
    let env = TestHome::new();

    let output = env
        .chirp()
        .args(["install"])
        .env("CHIRP_EXEC_PATH", "/env/bin/chirp")
        .output()
        .unwrap();
    assert_exit_code(&output, 0);
    assert_eq!(
        command_of(&env.read_settings()["hooks"]["PreToolUse"]),
        "/env/bin/chirp"
    );
}

#[test]
fn test_log_settings_from_environment() {
    init_test_logging();
    let env = TestHome::new();

    let output = env
        .chirp()
        .args(["install"])
        .env("CHIRP_LOG", "debug")
        .env("CHIRP_LOG_FORMAT", "json")
        .output()
        .unwrap();
    assert_exit_code(&output, 0);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    assert!(!lines.is_empty(), "expected log output on stderr");
    for line in lines {
        let _: Value = serde_json::from_str(line)
            .unwrap_or_else(|e| panic!("log line is not JSON ({e}): {line}"));
    }
}

#[test]
fn test_invalid_lock_timeout_in_environment_is_ignored() {
    init_test_logging();
    let env = TestHome::new();

    let output = env
        .chirp()
        .args(["install"])
        .env("CHIRP_LOCK_TIMEOUT", "forever")
        .output()
        .unwrap();
    assert_exit_code(&output, 0);
    assert_contains(
        &String::from_utf8_lossy(&output.stderr),
        "ignoring invalid environment value",
    );
    assert!(env.read_settings()["hooks"].is_object());
}

#[test]
fn test_dry_run_writes_nothing() {
    init_test_logging();
    let env = TestHome::new();

    let output = env.run(&["install", "--dry-run", "--json"]);
    assert_exit_code(&output, 0);
    assert_eq!(stdout_json(&output)["outcome"], "would-change");
    assert!(!env.settings_path().exists());
    assert!(!env.home.path().join(".claude").exists());

    env.write_settings(r#"{"hooks":{"Stop":"chirp"}}"#);
    let output = env.run(&["uninstall", "--dry-run"]);
    assert_exit_code(&output, 0);
    assert_contains(&String::from_utf8_lossy(&output.stdout), "Would remove 1 chirp hook");
    assert_eq!(
        std::fs::read_to_string(env.settings_path()).unwrap(),
        r#"{"hooks":{"Stop":"chirp"}}"#
    );
}

#[test]
fn test_status_transitions() {
    init_test_logging();
    let env = TestHome::new();

    let status = |env: &TestHome| {
        let output = env.run(&["status", "--json"]);
        assert_exit_code(&output, 0);
        stdout_json(&output)
    };

    assert_eq!(status(&env)["status"], "not-installed");

    env.write_settings(r#"{"hooks":{"PreToolUse":"chirp"}}"#);
    let report = status(&env);
    assert_eq!(report["status"], "needs-update");
    assert_eq!(report["detected"][0]["shape"], "legacy_scalar");

    assert_exit_code(&env.run(&["install"]), 0);
    let report = status(&env);
    assert_eq!(report["status"], "installed");
    assert_eq!(report["missing"], json!([]));

    let human = env.run(&["status"]);
    assert_contains(&String::from_utf8_lossy(&human.stdout), "installed");
}

#[test]
fn test_invalid_scope_fails() {
    init_test_logging();
    let env = TestHome::new();

    let output = env.run(&["install", "--scope", "global"]);
    assert_exit_code(&output, 1);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_contains(&stderr, "error[InvalidScope]");
    assert_contains(&stderr, "global");
    assert!(!env.settings_path().exists());
}

#[test]
fn test_malformed_settings_fail_without_writing() {
    init_test_logging();
    let env = TestHome::new();
    env.write_settings("{\"hooks\": ");

    let output = env.run(&["install"]);
    assert_exit_code(&output, 1);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_contains(&stderr, "error[MalformedJSON]");
    assert_contains(&stderr, &env.settings_path().display().to_string());
    assert_eq!(
        std::fs::read_to_string(env.settings_path()).unwrap(),
        "{\"hooks\": "
    );

    env.write_settings("[]");
    let output = env.run(&["install", "--json"]);
    assert_exit_code(&output, 1);
    let error = &stdout_json(&output)["error"];
    assert_eq!(error["kind"], "NotAnObject");
    assert_eq!(error["code"], "CHIRP-E011");
}

#[test]
fn test_existing_hooks_must_be_object() {
    init_test_logging();
    let env = TestHome::new();
    env.write_settings(r#"{"hooks": "chirp"}"#);

    let output = env.run(&["install"]);
    assert_exit_code(&output, 1);
    assert_contains(
        &String::from_utf8_lossy(&output.stderr),
        "error[ExistingHooksInvalid]",
    );

    // Uninstall treats the same file as having nothing to remove.
    let output = env.run(&["uninstall"]);
    assert_exit_code(&output, 0);
}

#[test]
fn test_held_lock_times_out() {
    init_test_logging();
    let env = TestHome::new();
    env.write_settings("{}");

    // A lock held by a live pid is never reclaimed.
    let lock = env.settings_path().with_extension("json.lock");
    std::fs::write(&lock, format!("{} 0\n", std::process::id())).unwrap();

    let output = env.run(&["install", "--lock-timeout", "150ms"]);
    assert_exit_code(&output, 1);
    assert_contains(&String::from_utf8_lossy(&output.stderr), "error[LockTimeout]");
    assert_eq!(std::fs::read_to_string(env.settings_path()).unwrap(), "{}");
    assert!(lock.exists());
}

#[test]
fn test_missing_subcommand_is_usage_error() {
    init_test_logging();
    let env = TestHome::new();
    assert_exit_code(&env.run(&[]), 2);
}
