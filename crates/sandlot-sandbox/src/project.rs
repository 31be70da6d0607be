//! The `/package.json` view of a sandbox.
//!
//! Installed packages live under `dependencies` as literal pinned version
//! strings; `main` names the default build entry. The file is re-read on
//! every operation so host edits through the VFS are always respected.

use serde::{Deserialize, Serialize};

use sandlot_common::paths;
use sandlot_vfs::{Vfs, VfsError};

pub const PACKAGE_JSON_PATH: &str = "/package.json";
pub const DEFAULT_ENTRY: &str = "/index.ts";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PackageJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(default)]
    pub dependencies: serde_json::Map<String, serde_json::Value>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

impl PackageJson {
    /// Load `/package.json`; a missing or malformed file reads as empty.
    pub fn load(vfs: &dyn Vfs) -> Self {
        match vfs.read_file(PACKAGE_JSON_PATH) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|error| {
                tracing::warn!(%error, "malformed package.json; treating as empty");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, vfs: &dyn Vfs) -> Result<(), VfsError> {
        let text = serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string());
        vfs.write_file(PACKAGE_JSON_PATH, &format!("{text}\n"))
    }

    /// The build entry: `main`, normalized, else `/index.ts`.
    #[must_use]
    pub fn entry_point(&self) -> String {
        match &self.main {
            Some(main) => paths::normalize(main),
            None => DEFAULT_ENTRY.to_string(),
        }
    }

    pub fn add_dependency(&mut self, name: &str, version: &str) {
        self.dependencies
            .insert(name.to_string(), serde_json::Value::String(version.to_string()));
    }

    pub fn remove_dependency(&mut self, name: &str) -> bool {
        self.dependencies.remove(name).is_some()
    }

    #[must_use]
    pub fn dependency_version(&self, name: &str) -> Option<&str> {
        self.dependencies.get(name).and_then(|v| v.as_str())
    }

    /// Snapshot for the bundler: name -> version, sorted.
    #[must_use]
    pub fn installed(&self) -> std::collections::BTreeMap<String, String> {
        self.dependencies
            .iter()
            .filter_map(|(name, version)| {
                version.as_str().map(|v| (name.clone(), v.to_string()))
            })
            .collect()
    }
}

/// Result of [`crate::Sandbox::install`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstallReport {
    pub name: String,
    pub version: String,
    pub types_installed: bool,
    pub type_files_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types_error: Option<String>,
    pub from_cache: bool,
}

/// Result of [`crate::Sandbox::uninstall`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UninstallReport {
    pub name: String,
    pub removed: bool,
}
