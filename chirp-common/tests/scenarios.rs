//! End-to-end install/uninstall scenarios against in-memory and real filesystems.

use chirp_common::fs::{FaultOp, FileSystem, MemoryFs, OsFs};
use chirp_common::hooks::{HookDefinition, HookRegistry, hook_entry};
use chirp_common::paths::{HomeEnv, PathResolver, Platform, Scope, lock_path_for};
use chirp_common::{ErrorKind, Installer, Outcome};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

static ONLY_PRE_TOOL_USE: &[HookDefinition] =
    &[HookDefinition::new("PreToolUse", "tool", "Before a tool call", true)];

const HOME: &str = "/u";
const SETTINGS: &str = "/u/.claude/settings.json";

fn resolver_for(home: &Path) -> PathResolver {
    let home = home.to_string_lossy().into_owned();
    let env = HomeEnv {
        home: Some(home.clone()),
        userprofile: Some(home),
        ..HomeEnv::default()
    };
    PathResolver::new(env, Platform::current(), "/nonexistent-project")
}

fn installer<'a, F: FileSystem + ?Sized>(fs: &'a F, home: &Path) -> Installer<'a, F> {
    Installer::new(fs, resolver_for(home))
        .with_registry(HookRegistry::from_definitions(ONLY_PRE_TOOL_USE).unwrap())
        .with_exec_path(Some("/bin/chirp".to_string()))
        .with_lock_timeout(Duration::from_secs(10))
}

fn mem_installer(fs: &MemoryFs) -> Installer<'_, MemoryFs> {
    Installer::new(
        fs,
        PathResolver::new(
            HomeEnv {
                home: Some(HOME.to_string()),
                ..HomeEnv::default()
            },
            Platform::Unix,
            "/w",
        ),
    )
    .with_registry(HookRegistry::from_definitions(ONLY_PRE_TOOL_USE).unwrap())
    .with_exec_path(Some("/bin/chirp".to_string()))
}

fn parse(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

#[test]
fn fresh_install_into_missing_file() {
    let fs = MemoryFs::new();
    mem_installer(&fs).install(Scope::User).unwrap();

    let expected = json!({
        "hooks": {
            "PreToolUse": [
                {"matcher": ".*", "hooks": [{"type": "command", "command": "/bin/chirp"}]}
            ]
        }
    });
    let written = fs.contents_string(SETTINGS).unwrap();
    assert_eq!(
        written,
        format!("{}\n", serde_json::to_string_pretty(&expected).unwrap())
    );
    assert!(written.starts_with("{\n  \"hooks\": {\n    \"PreToolUse\""));
}

#[test]
fn install_preserves_foreign_keys_and_hooks() {
    let fs = MemoryFs::new().with_file(
        SETTINGS,
        r#"{"version":"1.0","hooks":{"PreCommit":"git diff"}}"#,
    );
    mem_installer(&fs).install(Scope::User).unwrap();

    let doc = parse(&fs.contents_string(SETTINGS).unwrap());
    assert_eq!(doc["version"], "1.0");
    assert_eq!(doc["hooks"]["PreCommit"], "git diff");
    assert_eq!(doc["hooks"]["PreToolUse"], hook_entry("/bin/chirp"));
}

#[test]
fn install_twice_serializes_identically() {
    let fs = MemoryFs::new().with_file(
        SETTINGS,
        r#"{"version":"1.0","hooks":{"PreCommit":"git diff"}}"#,
    );
    mem_installer(&fs).install(Scope::User).unwrap();
    let first = fs.contents_string(SETTINGS).unwrap();
    mem_installer(&fs).install(Scope::User).unwrap();
    assert_eq!(fs.contents_string(SETTINGS).unwrap(), first);
}

#[test]
fn uninstall_legacy_scalar() {
    let fs = MemoryFs::new().with_file(
        SETTINGS,
        r#"{"hooks":{"PreToolUse":"chirp","Other":"keep"}}"#,
    );
    mem_installer(&fs).uninstall(Scope::User).unwrap();
    assert_eq!(
        parse(&fs.contents_string(SETTINGS).unwrap()),
        json!({"hooks": {"Other": "keep"}})
    );
}

#[test]
fn uninstall_mixed_block() {
    let input = json!({
        "hooks": {
            "Notification": [{
                "matcher": ".*",
                "hooks": [
                    {"type": "command", "command": "chirp"},
                    {"type": "command", "command": "other"}
                ]
            }]
        }
    });
    let fs = MemoryFs::new().with_file(SETTINGS, input.to_string());
    let report = mem_installer(&fs).uninstall(Scope::User).unwrap();

    assert_eq!(report.hooks, vec!["Notification"]);
    assert_eq!(
        parse(&fs.contents_string(SETTINGS).unwrap()),
        json!({
            "hooks": {
                "Notification": [{
                    "matcher": ".*",
                    "hooks": [{"type": "command", "command": "other"}]
                }]
            }
        })
    );
}

#[test]
fn uninstall_removes_emptied_hooks_section() {
    let fs = MemoryFs::new().with_file(SETTINGS, r#"{"hooks":{"PreToolUse":"chirp"},"v":1}"#);
    mem_installer(&fs).uninstall(Scope::User).unwrap();
    assert_eq!(parse(&fs.contents_string(SETTINGS).unwrap()), json!({"v": 1}));
}

#[test]
fn failed_write_is_atomic() {
    let original = "{\n  \"keep\": [1, 2, 3]\n}\n";
    for fault in [FaultOp::WriteTemp, FaultOp::SetMode, FaultOp::Rename] {
        let fs = MemoryFs::new().with_file(SETTINGS, original);
        fs.inject_fault(fault);

        let err = mem_installer(&fs).install(Scope::User).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoError, "fault {fault:?}");
        assert_eq!(fs.contents_string(SETTINGS).unwrap(), original);
        assert_eq!(
            fs.list_dir("/u/.claude"),
            vec![PathBuf::from(SETTINGS)],
            "leftover files after {fault:?}"
        );
    }
}

#[test]
fn preserves_existing_file_mode() {
    let fs = MemoryFs::new();
    fs.insert_file(SETTINGS, "{}", 0o600);
    mem_installer(&fs).install(Scope::User).unwrap();
    assert_eq!(fs.mode(SETTINGS), Some(0o600));
}

#[test]
fn real_filesystem_round_trip() {
    let home = TempDir::new().unwrap();
    let settings = home.path().join(".claude").join("settings.json");
    std::fs::create_dir_all(settings.parent().unwrap()).unwrap();
    let original = "{\n  \"theme\": \"dark\"\n}\n";
    std::fs::write(&settings, original).unwrap();

    let fs = OsFs::new();
    let report = installer(&fs, home.path()).install(Scope::User).unwrap();
    assert_eq!(report.outcome, Outcome::Changed);
    assert_eq!(report.path, settings);
    assert!(!lock_path_for(&settings).exists());

    installer(&fs, home.path()).uninstall(Scope::User).unwrap();
    assert_eq!(std::fs::read_to_string(&settings).unwrap(), original);
}

#[test]
fn concurrent_installs_serialize() {
    let home = TempDir::new().unwrap();
    let fs = Arc::new(OsFs::new());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let fs = Arc::clone(&fs);
            let home = home.path().to_path_buf();
            std::thread::spawn(move || installer(fs.as_ref(), &home).install(Scope::User))
        })
        .collect();
    let outcomes: Vec<Outcome> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap().outcome)
        .collect();

    // Exactly one writer saw the empty file; the rest found it installed.
    assert_eq!(outcomes.iter().filter(|o| **o == Outcome::Changed).count(), 1);

    let settings = home.path().join(".claude").join("settings.json");
    let single = TempDir::new().unwrap();
    installer(&OsFs::new(), single.path()).install(Scope::User).unwrap();
    assert_eq!(
        std::fs::read(&settings).unwrap(),
        std::fs::read(single.path().join(".claude").join("settings.json")).unwrap()
    );
    assert!(!lock_path_for(&settings).exists());
}
