//! Module-graph bundler for the sandlot build core.
//!
//! The bundler walks the import graph from one entry point through a single
//! resolve/load plugin — the only place the pipeline knows what a virtual
//! filesystem is. Every import lands in one of three namespaces:
//!
//! - `vfs` — a project file, loaded from the VFS, transformed (JSX, type
//!   stripping) and linked into the output;
//! - `shared` — a host-pinned module, replaced by a stub that reaches the
//!   shared-module registry through its global handle at runtime;
//! - `external` — an installed package rewritten to its CDN URL, or an
//!   unknown bare specifier passed through untouched.
//!
//! The output is a single ES module targeting es2020, deterministic for
//! deterministic inputs. Warnings never fail a bundle.

pub mod graph;
pub mod jsx;
pub mod plugin;
pub mod strip;
pub mod stub;

pub use graph::GraphBundler;
pub use plugin::{ImportKind, Loader, Namespace, Resolved, SandlotPlugin};

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use sandlot_common::diagnostics::{BundleError, BundleWarning};
use sandlot_registry::SharedModuleRegistry;
use sandlot_vfs::Vfs;

/// One bundling job.
pub struct BundleRequest {
    /// Absolute VFS path of the entry point.
    pub entry: String,
    /// Snapshot of `/package.json` dependencies: name -> pinned version.
    pub installed: BTreeMap<String, String>,
    /// Registry whose `list()` snapshot decides the `shared` namespace.
    pub registry: Option<Arc<SharedModuleRegistry>>,
    /// CDN origin for externalized installed packages.
    pub cdn_base: String,
    /// Strip comments and blank lines from the output.
    pub minify: bool,
}

/// A successful bundle.
#[derive(Clone, Debug)]
pub struct BundleOutput {
    /// The linked ES module.
    pub code: String,
    pub warnings: Vec<BundleWarning>,
    /// Every VFS file read during the build, in resolve-first-visit order.
    pub included_files: Vec<String>,
    /// Shared-module ids spliced into the bundle, in first-use order.
    pub shared_modules: Vec<String>,
    /// External import specifiers left in the output, in first-use order.
    pub externals: Vec<String>,
    /// Names the entry module exports (`default` included when present).
    pub entry_exports: Vec<String>,
}

/// A failed bundle: esbuild-shaped errors, one per failing resolve or load.
#[derive(Clone, Debug, thiserror::Error)]
#[error("bundling failed with {} error(s)", errors.len())]
pub struct BundleFailure {
    pub errors: Vec<BundleError>,
}

/// The engine seam. The in-crate [`GraphBundler`] is the default; a host
/// may substitute a WASM esbuild behind the same trait.
#[async_trait]
pub trait Bundler: Send + Sync {
    async fn bundle(
        &self,
        vfs: Arc<dyn Vfs>,
        request: BundleRequest,
    ) -> Result<BundleOutput, BundleFailure>;
}

#[cfg(test)]
#[path = "tests/strip_tests.rs"]
mod strip_tests;
#[cfg(test)]
#[path = "tests/jsx_tests.rs"]
mod jsx_tests;
#[cfg(test)]
#[path = "tests/plugin_tests.rs"]
mod plugin_tests;
#[cfg(test)]
#[path = "tests/bundle_tests.rs"]
mod bundle_tests;
