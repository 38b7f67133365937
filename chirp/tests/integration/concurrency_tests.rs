use serde_json::Value;
use std::process::Child;

use crate::common::fixtures::{chirp_in, settings_in};
use crate::common::{TestHome, init_test_logging};

fn spawn_all(env: &TestHome, commands: &[&[&str]]) -> Vec<Child> {
    commands
        .iter()
        .map(|args| {
            chirp_in(env.home.path(), env.project.path())
                .args(*args)
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::piped())
                .spawn()
                .expect("Failed to spawn chirp")
        })
        .collect()
}

fn wait_all(children: Vec<Child>) {
    for child in children {
        let output = child.wait_with_output().expect("Failed to wait for chirp");
        assert!(
            output.status.success(),
            "chirp exited with {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

#[test]
fn test_concurrent_installs_converge() {
    init_test_logging();
    crate::test_log!("TEST START: test_concurrent_installs_converge");

    let env = TestHome::new();
    wait_all(spawn_all(&env, &[&["install"] as &[&str]; 5]));

    let reference = TestHome::new();
    assert!(reference.run(&["install"]).status.success());
    assert_eq!(
        std::fs::read(env.settings_path()).unwrap(),
        std::fs::read(settings_in(reference.home.path())).unwrap()
    );
    assert!(!env.settings_path().with_extension("json.lock").exists());

    crate::test_log!("TEST PASS: test_concurrent_installs_converge");
}

#[test]
fn test_interleaved_install_uninstall_leave_valid_document() {
    init_test_logging();
    let env = TestHome::new();
    let original = "{\n  \"theme\": \"dark\"\n}\n";
    env.write_settings(original);

    wait_all(spawn_all(
        &env,
        &[&["install"], &["uninstall"], &["install"], &["uninstall"]],
    ));

    let text = std::fs::read_to_string(env.settings_path()).unwrap();
    let settings: Value = serde_json::from_str(&text).expect("settings are not valid JSON");
    assert_eq!(settings["theme"], "dark");
    match settings.get("hooks") {
        None => assert_eq!(text, original),
        Some(hooks) => assert_eq!(hooks.as_object().map(|h| h.len()), Some(7)),
    }
    assert!(!env.settings_path().with_extension("json.lock").exists());
}
