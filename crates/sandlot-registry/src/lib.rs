//! Shared-module registry.
//!
//! A shared module is a module the host pins by value so that bundled code
//! reuses the host's instance at runtime instead of fetching its own copy
//! from the CDN. The bundler emits a stub that reaches the registry through
//! an ambient global handle; this crate owns that handle and the
//! introspection that turns a runtime-shaped module object into a static
//! list of legal re-export names.
//!
//! Each registry generates an instance-unique key and binds itself into a
//! process-wide ambient table under that key, so any number of independent
//! sandlots coexist without seeing each other's modules. Disposal removes
//! the binding.

mod ambient;
mod introspect;

pub use ambient::lookup_registry;
pub use introspect::{export_names_of, is_valid_identifier};

use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown shared module '{id}'; registered modules: [{}]", available.join(", "))]
    UnknownSharedModule { id: String, available: Vec<String> },
}

/// One registered module: the host's value plus its precomputed export
/// surface.
#[derive(Clone, Debug)]
pub struct SharedModule {
    /// The module object; identity is `Arc` identity.
    pub object: Arc<Value>,
    /// Enumerable keys that are legal as static `export const` names.
    pub export_names: Vec<String>,
}

/// Per-sandlot registry of host-pinned modules.
pub struct SharedModuleRegistry {
    key: String,
    modules: RwLock<FxHashMap<String, SharedModule>>,
}

impl SharedModuleRegistry {
    /// Build a registry from `module id -> module object`, introspect each
    /// module once, and bind the registry into the ambient table under a
    /// fresh unique key.
    pub fn new<I, S>(modules: I) -> Arc<Self>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let key = format!("__sandlot_registry_{}", uuid::Uuid::new_v4().simple());
        let modules: FxHashMap<String, SharedModule> = modules
            .into_iter()
            .map(|(id, object)| {
                let export_names = export_names_of(&object);
                (
                    id.into(),
                    SharedModule {
                        object: Arc::new(object),
                        export_names,
                    },
                )
            })
            .collect();
        tracing::debug!(key = %key, modules = modules.len(), "shared-module registry created");

        let registry = Arc::new(Self {
            key,
            modules: RwLock::new(modules),
        });
        ambient::bind(&registry);
        registry
    }

    /// The unique global handle name baked into emitted stubs.
    #[must_use]
    pub fn registry_key(&self) -> &str {
        &self.key
    }

    /// Look a module up by id. Unknown ids are an error naming every
    /// registered id; the registry never hands out a silent stand-in.
    pub fn get(&self, id: &str) -> Result<SharedModule, RegistryError> {
        let modules = self.modules.read().unwrap_or_else(|e| e.into_inner());
        modules
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownSharedModule {
                id: id.to_string(),
                available: {
                    let mut ids: Vec<String> = modules.keys().cloned().collect();
                    ids.sort();
                    ids
                },
            })
    }

    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.modules
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(id)
    }

    /// Registered module ids, sorted.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .modules
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn export_names(&self, id: &str) -> Result<Vec<String>, RegistryError> {
        self.get(id).map(|m| m.export_names)
    }

    /// Remove one module; returns whether it was registered.
    pub fn unregister(&self, id: &str) -> bool {
        self.modules
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
            .is_some()
    }

    /// Tear down the ambient binding. Lookups through
    /// [`lookup_registry`] fail afterwards; direct references keep working.
    pub fn dispose(&self) {
        ambient::unbind(&self.key);
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod registry_tests;
