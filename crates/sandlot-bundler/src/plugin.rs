//! The resolve/load plugin.
//!
//! Resolution routes every import to a namespace (spec order: shared
//! registration beats installed package beats external passthrough); loading
//! turns a resolved path into JS source plus a loader tag. Nothing else in
//! the bundler touches the VFS or the registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use sandlot_common::diagnostics::BundleError;
use sandlot_common::package::{is_bare_specifier, split_bare_specifier};
use sandlot_common::paths;
use sandlot_registry::SharedModuleRegistry;
use sandlot_vfs::Vfs;

use sandlot_checker::TsConfig;

use crate::stub::emit_shared_stub;

/// Extension try order for relative and absolute VFS specifiers.
const EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".mjs", ".json"];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImportKind {
    Entry,
    Static,
    Dynamic,
    Require,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
    Vfs,
    Shared,
    External,
}

/// A resolved import: where it lives and under which namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Resolved {
    pub path: String,
    pub ns: Namespace,
}

/// Loader chosen for a piece of source, by extension.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Loader {
    Ts,
    Tsx,
    Jsx,
    Js,
    Json,
    Css,
    Text,
}

impl Loader {
    fn for_path(path: &str) -> Self {
        match paths::extension(path) {
            Some("ts") => Loader::Ts,
            Some("tsx") => Loader::Tsx,
            Some("jsx") => Loader::Jsx,
            Some("js") | Some("mjs") => Loader::Js,
            Some("json") => Loader::Json,
            Some("css") => Loader::Css,
            Some("txt") | Some("text") => Loader::Text,
            _ => Loader::Js,
        }
    }
}

/// Source handed back by the load hook.
#[derive(Clone, Debug)]
pub struct Loaded {
    pub code: String,
    pub loader: Loader,
}

pub struct SandlotPlugin {
    vfs: Arc<dyn Vfs>,
    registry: Option<Arc<SharedModuleRegistry>>,
    /// Registered shared ids, snapshotted at construction.
    shared_ids: Vec<String>,
    installed: BTreeMap<String, String>,
    cdn_base: String,
    config: TsConfig,
}

impl SandlotPlugin {
    pub fn new(
        vfs: Arc<dyn Vfs>,
        registry: Option<Arc<SharedModuleRegistry>>,
        installed: BTreeMap<String, String>,
        cdn_base: impl Into<String>,
    ) -> Self {
        let shared_ids = registry.as_ref().map(|r| r.list()).unwrap_or_default();
        let config = TsConfig::load(vfs.as_ref());
        Self {
            vfs,
            registry,
            shared_ids,
            installed,
            cdn_base: cdn_base.into(),
            config,
        }
    }

    /// The resolve hook.
    pub fn resolve(
        &self,
        importer_dir: &str,
        specifier: &str,
        kind: ImportKind,
    ) -> Result<Resolved, BundleError> {
        if kind == ImportKind::Entry {
            let path = paths::normalize(specifier);
            if !self.is_file(&path) {
                return Err(BundleError::new(format!(
                    "Could not resolve entry point \"{specifier}\""
                )));
            }
            return Ok(Resolved {
                path,
                ns: Namespace::Vfs,
            });
        }

        if is_bare_specifier(specifier) {
            return Ok(self.resolve_bare(specifier));
        }

        let target = paths::join(importer_dir, specifier);
        match self.resolve_with_extensions(&target) {
            Some(path) => Ok(Resolved {
                path,
                ns: Namespace::Vfs,
            }),
            None => Err(BundleError::new(format!(
                "Could not resolve \"{specifier}\""
            ))),
        }
    }

    fn resolve_bare(&self, specifier: &str) -> Resolved {
        // Exact shared registrations win, on the full specifier or its
        // package head. Prefix matches are not sharing: a registration for
        // `react` says nothing about `react/jsx-runtime`.
        if self.shared_ids.iter().any(|id| id == specifier) {
            return Resolved {
                path: specifier.to_string(),
                ns: Namespace::Shared,
            };
        }

        // tsconfig aliases are bare-looking but point into the VFS.
        for candidate in self.config.alias_candidates(specifier) {
            if let Some(path) = self.resolve_with_extensions(&candidate) {
                return Resolved {
                    path,
                    ns: Namespace::Vfs,
                };
            }
        }

        let (package, subpath) = split_bare_specifier(specifier);
        if let Some(version) = self.installed.get(package) {
            let url = match subpath {
                Some(subpath) => format!("{}/{package}@{version}/{subpath}", self.cdn_base),
                None => format!("{}/{package}@{version}", self.cdn_base),
            };
            return Resolved {
                path: url,
                ns: Namespace::External,
            };
        }

        // Not installed: leave it external as-is. Loading it is the host
        // runtime's problem, and failing there is the documented behavior.
        Resolved {
            path: specifier.to_string(),
            ns: Namespace::External,
        }
    }

    fn resolve_with_extensions(&self, target: &str) -> Option<String> {
        if self.is_file(target) {
            return Some(target.to_string());
        }
        for ext in EXTENSIONS {
            let candidate = format!("{target}{ext}");
            if self.is_file(&candidate) {
                return Some(candidate);
            }
        }
        for ext in EXTENSIONS {
            let candidate = format!("{target}/index{ext}");
            if self.is_file(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    fn is_file(&self, path: &str) -> bool {
        self.vfs
            .stat(path)
            .is_ok_and(|meta| meta.kind == sandlot_vfs::EntryKind::File)
    }

    /// The load hook.
    pub fn load(&self, resolved: &Resolved) -> Result<Loaded, BundleError> {
        match resolved.ns {
            Namespace::Vfs => {
                let code = self.vfs.read_file(&resolved.path).map_err(|error| {
                    BundleError::new(format!("Could not load \"{}\": {error}", resolved.path))
                })?;
                Ok(Loaded {
                    code,
                    loader: Loader::for_path(&resolved.path),
                })
            }
            Namespace::Shared => {
                let registry = self.registry.as_ref().ok_or_else(|| {
                    BundleError::new(format!(
                        "shared module \"{}\" requested but no registry is attached",
                        resolved.path
                    ))
                })?;
                let module = registry
                    .get(&resolved.path)
                    .map_err(|error| BundleError::new(error.to_string()))?;
                Ok(Loaded {
                    code: emit_shared_stub(
                        &resolved.path,
                        registry.registry_key(),
                        &module.export_names,
                    ),
                    loader: Loader::Js,
                })
            }
            Namespace::External => Err(BundleError::new(format!(
                "external \"{}\" has no load hook",
                resolved.path
            ))),
        }
    }

    #[must_use]
    pub fn shared_ids(&self) -> &[String] {
        &self.shared_ids
    }
}
