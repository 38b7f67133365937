//! Producing the hooks mapping to merge into a settings document.

use super::ownership::AGENT_NAME;
use super::registry::HookRegistry;
use crate::fs::FileSystem;
use serde_json::{Map, Value, json};
use tracing::debug;

/// Matcher that applies a hook to every tool.
pub const MATCH_ALL: &str = ".*";

/// The executable path to register when the caller doesn't supply one:
/// the running binary if it can be found on `fs`, else [`AGENT_NAME`].
pub fn default_exec_path<F: FileSystem + ?Sized>(fs: &F) -> String {
    match std::env::current_exe() {
        Ok(path) if path.is_absolute() && fs.exists(&path) => path.to_string_lossy().into_owned(),
        Ok(path) => {
            debug!(path = %path.display(), "current executable not usable, using bare name");
            AGENT_NAME.to_string()
        }
        Err(e) => {
            debug!(error = %e, "could not determine current executable");
            AGENT_NAME.to_string()
        }
    }
}

/// The structured value registered under one hook name.
pub fn hook_entry(exec_path: &str) -> Value {
    json!([
        {
            "matcher": MATCH_ALL,
            "hooks": [
                {
                    "type": "command",
                    "command": exec_path
                }
            ]
        }
    ])
}

/// Build the hooks mapping for every enabled entry in `registry`.
///
/// Output depends only on `registry` and the resolved exec path, and keys
/// follow registry order, so repeated calls serialize identically.
pub fn generate<F: FileSystem + ?Sized>(
    fs: &F,
    registry: &HookRegistry,
    exec_path: Option<&str>,
) -> Value {
    let exec_path = match exec_path {
        Some(path) => path.to_string(),
        None => default_exec_path(fs),
    };

    let mut hooks = Map::new();
    for def in registry.enabled() {
        hooks.insert(def.name.to_string(), hook_entry(&exec_path));
    }
    debug!(count = hooks.len(), exec_path = %exec_path, "generated hook entries");
    Value::Object(hooks)
}
