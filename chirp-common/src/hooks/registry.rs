//! The hook entries chirp owns.

use serde::Serialize;
use std::collections::HashSet;

/// One hook the agent wants registered with the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HookDefinition {
    /// Hook event name as the editor spells it (e.g. `PreToolUse`).
    pub name: &'static str,
    /// Opaque tag forwarded to the agent.
    pub category: &'static str,
    pub description: &'static str,
    pub default_enabled: bool,
}

impl HookDefinition {
    pub const fn new(
        name: &'static str,
        category: &'static str,
        description: &'static str,
        default_enabled: bool,
    ) -> Self {
        Self {
            name,
            category,
            description,
            default_enabled,
        }
    }
}

/// Builtin registry, in emission order.
pub const BUILTIN_HOOKS: &[HookDefinition] = &[
    HookDefinition::new(
        "PreToolUse",
        "tool",
        "Before a tool call is executed",
        true,
    ),
    HookDefinition::new(
        "PostToolUse",
        "tool",
        "After a tool call completes",
        true,
    ),
    HookDefinition::new(
        "Notification",
        "notification",
        "When the editor needs the user's attention",
        true,
    ),
    HookDefinition::new(
        "UserPromptSubmit",
        "prompt",
        "When the user submits a prompt",
        true,
    ),
    HookDefinition::new("Stop", "completion", "When the main agent finishes", true),
    HookDefinition::new(
        "SubagentStop",
        "completion",
        "When a subagent finishes",
        true,
    ),
    HookDefinition::new(
        "PreCompact",
        "maintenance",
        "Before the conversation is compacted",
        false,
    ),
    HookDefinition::new("SessionStart", "session", "When a session starts", true),
    HookDefinition::new("SessionEnd", "session", "When a session ends", false),
];

/// Duplicate hook name in a registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("duplicate hook name in registry: {0}")]
pub struct DuplicateHook(pub &'static str);

/// An ordered set of uniquely named hook definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookRegistry {
    definitions: &'static [HookDefinition],
}

impl HookRegistry {
    /// The builtin registry.
    pub fn builtin() -> Self {
        Self {
            definitions: BUILTIN_HOOKS,
        }
    }

    /// Registry over an explicit list; rejects duplicate names.
    pub fn from_definitions(
        definitions: &'static [HookDefinition],
    ) -> Result<Self, DuplicateHook> {
        let mut seen = HashSet::new();
        for def in definitions {
            if !seen.insert(def.name) {
                return Err(DuplicateHook(def.name));
            }
        }
        Ok(Self { definitions })
    }

    pub fn all(&self) -> &'static [HookDefinition] {
        self.definitions
    }

    pub fn enabled(&self) -> impl Iterator<Item = &'static HookDefinition> {
        self.definitions.iter().filter(|d| d.default_enabled)
    }

    pub fn get(&self, name: &str) -> Option<&'static HookDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.definitions.iter().map(|d| d.name).collect()
    }

    pub fn enabled_names(&self) -> Vec<&'static str> {
        self.enabled().map(|d| d.name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
