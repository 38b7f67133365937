//! Recognizing chirp's own command entries.
//!
//! A command is ours when its executable basename, after stripping one pair
//! of surrounding quotes, is exactly one of [`AGENT_BASENAMES`]. Absolute,
//! relative and quoted paths all qualify; nothing else does.

use serde_json::Value;

/// Canonical unqualified executable name.
pub const AGENT_NAME: &str = "chirp";

/// Closed set of basenames treated as agent-owned.
pub const AGENT_BASENAMES: &[&str] = &["chirp", "chirp.exe", "chirp-harness", "chirp-harness.exe"];

/// Whether `command` names the agent executable.
pub fn is_agent_command(command: &str) -> bool {
    let unquoted = strip_quotes(command.trim());
    let basename = unquoted
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(unquoted);
    AGENT_BASENAMES.contains(&basename)
}

/// Whether a hook value is a legacy scalar naming the agent.
pub fn is_agent_scalar(value: &Value) -> bool {
    value.as_str().is_some_and(is_agent_command)
}

/// Whether `entry` is a `{type, command}` mapping whose command is the agent.
///
/// Non-mappings and mappings without a string `command` are never ours.
pub fn is_agent_command_entry(entry: &Value) -> bool {
    entry
        .as_object()
        .and_then(|map| map.get("command"))
        .and_then(Value::as_str)
        .is_some_and(is_agent_command)
}

fn strip_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}
