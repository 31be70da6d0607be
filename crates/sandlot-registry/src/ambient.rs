//! Process-wide ambient table of live registries.
//!
//! Bundled stubs cannot close over a lexical variable in the host; they name
//! their registry by key. This table is the Rust analog of stamping the
//! registry onto the global object: key -> weak registry reference.

use std::sync::{Arc, LazyLock, RwLock, Weak};

use rustc_hash::FxHashMap;

use crate::SharedModuleRegistry;

static AMBIENT: LazyLock<RwLock<FxHashMap<String, Weak<SharedModuleRegistry>>>> =
    LazyLock::new(|| RwLock::new(FxHashMap::default()));

pub(crate) fn bind(registry: &Arc<SharedModuleRegistry>) {
    AMBIENT
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .insert(registry.registry_key().to_string(), Arc::downgrade(registry));
}

pub(crate) fn unbind(key: &str) {
    AMBIENT.write().unwrap_or_else(|e| e.into_inner()).remove(key);
}

/// Resolve a registry key to its live registry, as emitted stub code would
/// through the global handle. Returns `None` after disposal or once every
/// strong reference is gone.
#[must_use]
pub fn lookup_registry(key: &str) -> Option<Arc<SharedModuleRegistry>> {
    AMBIENT
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(key)
        .and_then(Weak::upgrade)
}
