//! The module-loader seam.
//!
//! Build step four turns bundle text into a loaded module object. The
//! default [`StaticModuleLoader`] links without executing: it checks that
//! every shared module the bundle spliced in is still resolvable through the
//! registry, captures identity-preserving handles to them, and exposes the
//! entry's export surface. A host that wants a live JavaScript namespace
//! substitutes its own implementation (for example a `deno_core` isolate
//! that installs the registry under its global key and imports the bundle
//! from a blob URL).

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use sandlot_bundler::BundleOutput;
use sandlot_registry::{RegistryError, SharedModule, SharedModuleRegistry};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("shared module registry is gone; the sandlot was disposed")]
    RegistryUnavailable,
    #[error(transparent)]
    UnknownSharedModule(#[from] RegistryError),
    #[error("module load failed: {0}")]
    Failed(String),
}

/// The loaded artifact: the bundle plus its linked surface.
pub struct LoadedModule {
    code: String,
    exports: Vec<String>,
    shared: BTreeMap<String, SharedModule>,
}

impl LoadedModule {
    #[must_use]
    pub fn new(
        code: String,
        exports: Vec<String>,
        shared: BTreeMap<String, SharedModule>,
    ) -> Self {
        Self {
            code,
            exports,
            shared,
        }
    }

    /// The bundled ES-module text.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Names the module exports (`default` included when present).
    #[must_use]
    pub fn exports(&self) -> &[String] {
        &self.exports
    }

    /// Identity-preserving handle to a spliced shared module.
    #[must_use]
    pub fn shared(&self, id: &str) -> Option<&SharedModule> {
        self.shared.get(id)
    }

    /// Ids of every shared module the bundle references.
    #[must_use]
    pub fn shared_ids(&self) -> Vec<&str> {
        self.shared.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModule")
            .field("exports", &self.exports)
            .field("shared", &self.shared.keys().collect::<Vec<_>>())
            .field("bytes", &self.code.len())
            .finish()
    }
}

pub trait ModuleLoader: Send + Sync {
    fn load(
        &self,
        bundle: &BundleOutput,
        registry: Option<&Arc<SharedModuleRegistry>>,
    ) -> Result<LoadedModule, LoadError>;
}

/// Links the bundle against the registry without executing it.
#[derive(Default)]
pub struct StaticModuleLoader;

impl StaticModuleLoader {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ModuleLoader for StaticModuleLoader {
    fn load(
        &self,
        bundle: &BundleOutput,
        registry: Option<&Arc<SharedModuleRegistry>>,
    ) -> Result<LoadedModule, LoadError> {
        let mut shared = BTreeMap::new();
        if !bundle.shared_modules.is_empty() {
            let registry = registry.ok_or(LoadError::RegistryUnavailable)?;
            for id in &bundle.shared_modules {
                shared.insert(id.clone(), registry.get(id)?);
            }
        }
        Ok(LoadedModule::new(
            bundle.code.clone(),
            bundle.entry_exports.clone(),
            shared,
        ))
    }
}
