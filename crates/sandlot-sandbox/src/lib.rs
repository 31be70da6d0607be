//! Sandbox orchestration for the sandlot build core.
//!
//! A [`Sandlot`] owns the cross-sandbox services (shared-module registry,
//! type caches, CDN clients, the bundler engine) and hands out [`Sandbox`]
//! instances. A sandbox owns one VFS and one project: it installs package
//! types, typechecks under a long-lived language service, bundles through
//! the plugin-driven graph walker, loads the artifact through a pluggable
//! module loader, and re-exposes all of it as shell-style string commands.

pub mod build;
pub mod commands;
pub mod loader;
pub mod project;
pub mod sandbox;
pub mod sandlot;

pub use build::{BuildFailure, BuildOptions, BuildSuccess};
pub use commands::ExecResult;
pub use loader::{LoadError, LoadedModule, ModuleLoader, StaticModuleLoader};
pub use project::{InstallReport, PackageJson, UninstallReport};
pub use sandbox::{PostBundleHook, Sandbox, SandboxError, Subscriber, Validator};
pub use sandlot::{CheckerFactory, Sandlot, SandlotOptions};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
#[cfg(test)]
#[path = "tests/project_tests.rs"]
mod project_tests;
#[cfg(test)]
#[path = "tests/sandbox_tests.rs"]
mod sandbox_tests;
#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod commands_tests;
