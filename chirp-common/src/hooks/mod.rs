//! Hook entries: what chirp registers, how it recognizes its own, and how
//! they are merged into or removed from a settings document.

pub mod detect;
pub mod generate;
pub mod merge;
pub mod ownership;
pub mod registry;

pub use detect::{
    DetectedHook, HookShape, detect, detect_names, filter_structured_hooks, remove_agent_hooks,
    remove_scalar_hooks,
};
pub use generate::{MATCH_ALL, default_exec_path, generate, hook_entry};
pub use merge::{HOOKS_KEY, merge};
pub use ownership::{
    AGENT_BASENAMES, AGENT_NAME, is_agent_command, is_agent_command_entry, is_agent_scalar,
};
pub use registry::{BUILTIN_HOOKS, DuplicateHook, HookDefinition, HookRegistry};
