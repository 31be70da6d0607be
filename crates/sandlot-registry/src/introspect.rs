//! Export-name introspection.
//!
//! Bundlers analyze named exports statically, so a module that only exists
//! as a runtime object has to have its export surface computed once, at
//! registration. The rules mirror what a stub can legally re-export:
//! identifier-shaped keys that are not reserved words. `default` is never a
//! named export; the stub handles it with a runtime fallback.

use serde_json::Value;

/// Keys that can never appear as `export const <name>`.
const RESERVED_WORDS: &[&str] = &[
    "default", "class", "function", "var", "let", "const", "import", "export",
];

/// `[A-Za-z_$][A-Za-z0-9_$]*`
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// The subset of a module object's enumerable keys that are legal static
/// re-export names. Non-object modules export nothing by name.
#[must_use]
pub fn export_names_of(object: &Value) -> Vec<String> {
    let Some(map) = object.as_object() else {
        return Vec::new();
    };
    map.keys()
        .filter(|key| is_valid_identifier(key) && !RESERVED_WORDS.contains(&key.as_str()))
        .cloned()
        .collect()
}
