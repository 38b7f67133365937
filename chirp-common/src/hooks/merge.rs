//! Inserting generated hook entries into a settings document.

use crate::document::Document;
use crate::errors::{ChirpError, Result, json_type_tag};
use serde_json::{Map, Value};

/// Top-level key holding the hook registry in a settings document.
pub const HOOKS_KEY: &str = "hooks";

/// Merge `hooks_value` into a copy of `document`.
///
/// Every name in `hooks_value` replaces whatever the document had under that
/// name; all other hook names and top-level keys are carried over verbatim.
/// The input is never mutated.
pub fn merge(document: &Document, hooks_value: &Value) -> Result<Document> {
    let incoming = hooks_value
        .as_object()
        .ok_or_else(|| ChirpError::InvalidHooks {
            kind: json_type_tag(hooks_value),
        })?;

    let mut merged = document.clone();
    let hooks = merged
        .entry(HOOKS_KEY)
        .or_insert_with(|| Value::Object(Map::new()));
    let hooks = match hooks {
        Value::Object(map) => map,
        other => {
            return Err(ChirpError::ExistingHooksInvalid {
                kind: json_type_tag(other),
            });
        }
    };

    for (name, value) in incoming {
        hooks.insert(name.clone(), value.clone());
    }
    Ok(merged)
}
