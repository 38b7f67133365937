//! Finding and removing chirp's entries in a settings document.
//!
//! Detection recognizes both the legacy scalar shape (`"PreToolUse": "chirp"`)
//! and the structured matcher-block shape. Removal runs two passes over the
//! detected names: whole-entry removal for scalars and single-command values,
//! then a filter that strips agent commands out of mixed matcher blocks.
//! Anything not recognized as ours is left exactly as it was.

use super::merge::HOOKS_KEY;
use super::ownership::{is_agent_command_entry, is_agent_scalar};
use crate::document::Document;
use crate::errors::json_type_tag;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Shape in which an agent-owned hook value was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookShape {
    /// `"Name": "chirp"`
    LegacyScalar,
    /// `"Name": [{"matcher": .., "hooks": [{"command": "chirp"}]}]`
    Structured,
}

/// One agent-owned hook name found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedHook {
    pub name: String,
    pub shape: HookShape,
}

/// Names (in document order) whose hook value is agent-owned.
///
/// A `hooks` entry that is not a mapping is logged and treated as "nothing
/// of ours here".
pub fn detect(document: &Document) -> Vec<DetectedHook> {
    let Some(hooks) = document.get(HOOKS_KEY) else {
        return Vec::new();
    };
    let Some(hooks) = hooks.as_object() else {
        warn!(
            kind = json_type_tag(hooks),
            "settings \"hooks\" entry is not an object; treating as no agent hooks"
        );
        return Vec::new();
    };

    hooks
        .iter()
        .filter_map(|(name, value)| {
            hook_shape(value).map(|shape| DetectedHook {
                name: name.clone(),
                shape,
            })
        })
        .collect()
}

/// Just the names from [`detect`].
pub fn detect_names(document: &Document) -> Vec<String> {
    detect(document).into_iter().map(|d| d.name).collect()
}

fn hook_shape(value: &Value) -> Option<HookShape> {
    if is_agent_scalar(value) {
        return Some(HookShape::LegacyScalar);
    }
    let blocks = value.as_array()?;
    let owned = blocks.iter().any(|block| {
        block_commands(block).is_some_and(|cmds| cmds.iter().any(is_agent_command_entry))
    });
    owned.then_some(HookShape::Structured)
}

fn block_commands(block: &Value) -> Option<&Vec<Value>> {
    block.as_object()?.get(HOOKS_KEY)?.as_array()
}

/// Whether `value` is exactly one matcher block holding exactly one agent command.
fn is_single_agent_block(value: &Value) -> bool {
    match value.as_array().map(Vec::as_slice) {
        Some([block]) => block_commands(block)
            .is_some_and(|cmds| matches!(cmds.as_slice(), [only] if is_agent_command_entry(only))),
        _ => false,
    }
}

/// Pass 1: delete detected entries that are wholly the agent's.
///
/// Returns how many hook names were removed.
pub fn remove_scalar_hooks(hooks: &mut Map<String, Value>, names: &[String]) -> usize {
    let mut removed = 0;
    for name in names {
        let wholly_ours = hooks
            .get(name)
            .is_some_and(|v| is_agent_scalar(v) || is_single_agent_block(v));
        if wholly_ours {
            hooks.shift_remove(name);
            debug!(hook = %name, "removed agent hook entry");
            removed += 1;
        }
    }
    removed
}

/// Pass 2: strip agent commands out of the remaining structured values.
///
/// Blocks emptied by the filter are dropped, and a hook whose blocks were all
/// dropped is deleted. Blocks or values that were already empty are kept.
/// Returns how many command entries were removed.
pub fn filter_structured_hooks(hooks: &mut Map<String, Value>, names: &[String]) -> usize {
    let mut removed = 0;
    let mut emptied: Vec<&String> = Vec::new();

    for name in names {
        let Some(Value::Array(blocks)) = hooks.get_mut(name) else {
            continue;
        };

        let mut dropped_block = false;
        blocks.retain_mut(|block| {
            let Some(cmds) = block
                .as_object_mut()
                .and_then(|b| b.get_mut(HOOKS_KEY))
                .and_then(Value::as_array_mut)
            else {
                return true;
            };
            let before = cmds.len();
            cmds.retain(|entry| !is_agent_command_entry(entry));
            let stripped = before - cmds.len();
            removed += stripped;
            if stripped > 0 && cmds.is_empty() {
                dropped_block = true;
                return false;
            }
            true
        });

        if dropped_block && blocks.is_empty() {
            emptied.push(name);
        }
    }

    for name in emptied {
        hooks.shift_remove(name);
        debug!(hook = %name, "removed emptied agent hook entry");
    }
    removed
}

/// Remove every agent-owned entry from a copy of `document`.
///
/// If this leaves the `hooks` mapping empty, the key is deleted. A `hooks`
/// entry that is not a mapping is returned untouched.
pub fn remove_agent_hooks(document: &Document) -> Document {
    let names = detect_names(document);
    let mut cleaned = document.clone();
    if names.is_empty() {
        return cleaned;
    }

    let Some(Value::Object(hooks)) = cleaned.get_mut(HOOKS_KEY) else {
        return cleaned;
    };
    let entries = remove_scalar_hooks(hooks, &names);
    let commands = filter_structured_hooks(hooks, &names);
    let now_empty = hooks.is_empty();

    if now_empty && entries + commands > 0 {
        cleaned.shift_remove(HOOKS_KEY);
    }
    debug!(entries, commands, "removed agent hooks");
    cleaned
}
