//! Persistent caches for resolved package types and TypeScript libs.
//!
//! Two stores, two key spaces: `(package name, exact version)` for resolved
//! type bundles and `(compiler version, lib name)` for `lib.*.d.ts` texts.
//! Values are deterministic for a key, so concurrent writers are
//! last-writer-wins and idempotent. Cache failures are treated as misses;
//! the caches are an optimization, never a source of truth.

use std::path::PathBuf;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use sandlot_common::package::storage_safe_name;

use crate::resolver::{PeerTypeDep, ResolvedTypes};

pub trait TypeStore: Send + Sync {
    fn get(&self, name: &str, version: &str) -> Option<ResolvedTypes>;
    fn set(&self, bundle: &ResolvedTypes);
    fn has(&self, name: &str, version: &str) -> bool;
    fn delete(&self, name: &str, version: &str);
    fn clear(&self);
}

pub trait LibStore: Send + Sync {
    fn get(&self, ts_version: &str, lib_name: &str) -> Option<String>;
    fn set(&self, ts_version: &str, lib_name: &str, text: &str);
    fn has(&self, ts_version: &str, lib_name: &str) -> bool;
    fn delete(&self, ts_version: &str, lib_name: &str);
    fn clear(&self);
}

/// In-memory [`TypeStore`]; the default for tests and short-lived hosts.
#[derive(Default)]
pub struct MemoryTypeStore {
    entries: DashMap<(String, String), ResolvedTypes>,
}

impl MemoryTypeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TypeStore for MemoryTypeStore {
    fn get(&self, name: &str, version: &str) -> Option<ResolvedTypes> {
        self.entries
            .get(&(name.to_string(), version.to_string()))
            .map(|e| e.value().clone())
    }

    fn set(&self, bundle: &ResolvedTypes) {
        self.entries.insert(
            (bundle.package_name.clone(), bundle.version.clone()),
            bundle.clone(),
        );
    }

    fn has(&self, name: &str, version: &str) -> bool {
        self.entries
            .contains_key(&(name.to_string(), version.to_string()))
    }

    fn delete(&self, name: &str, version: &str) {
        self.entries
            .remove(&(name.to_string(), version.to_string()));
    }

    fn clear(&self) {
        self.entries.clear();
    }
}

/// In-memory [`LibStore`].
#[derive(Default)]
pub struct MemoryLibStore {
    entries: DashMap<(String, String), String>,
}

impl MemoryLibStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LibStore for MemoryLibStore {
    fn get(&self, ts_version: &str, lib_name: &str) -> Option<String> {
        self.entries
            .get(&(ts_version.to_string(), lib_name.to_string()))
            .map(|e| e.value().clone())
    }

    fn set(&self, ts_version: &str, lib_name: &str, text: &str) {
        self.entries.insert(
            (ts_version.to_string(), lib_name.to_string()),
            text.to_string(),
        );
    }

    fn has(&self, ts_version: &str, lib_name: &str) -> bool {
        self.entries
            .contains_key(&(ts_version.to_string(), lib_name.to_string()))
    }

    fn delete(&self, ts_version: &str, lib_name: &str) {
        self.entries
            .remove(&(ts_version.to_string(), lib_name.to_string()));
    }

    fn clear(&self) {
        self.entries.clear();
    }
}

/// Serialized shape of a package bundle's metadata on disk; the file texts
/// live next to it under `files/`.
#[derive(Serialize, Deserialize)]
struct TypesMeta {
    package_name: String,
    version: String,
    from_types_package: bool,
    peer_type_deps: Vec<PeerTypeDep>,
}

/// On-disk [`TypeStore`]. Layout:
///
/// ```text
/// <root>/package-types/<pkg-safe>/<version>/meta.json
/// <root>/package-types/<pkg-safe>/<version>/files/<relpath>
/// ```
///
/// Scoped package names use `--` in place of `/` so directory names stay
/// flat. State persists across sandlots until an explicit `clear`.
pub struct DiskTypeStore {
    root: PathBuf,
}

impl DiskTypeStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn package_dir(&self, name: &str, version: &str) -> PathBuf {
        self.root
            .join("package-types")
            .join(storage_safe_name(name))
            .join(version)
    }
}

impl TypeStore for DiskTypeStore {
    fn get(&self, name: &str, version: &str) -> Option<ResolvedTypes> {
        let dir = self.package_dir(name, version);
        let meta_text = std::fs::read_to_string(dir.join("meta.json")).ok()?;
        let meta: TypesMeta = match serde_json::from_str(&meta_text) {
            Ok(meta) => meta,
            Err(error) => {
                tracing::warn!(package = name, %error, "corrupt type-cache meta; treating as miss");
                return None;
            }
        };

        let files_root = dir.join("files");
        let mut files = std::collections::BTreeMap::new();
        for entry in walkdir::WalkDir::new(&files_root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let rel = entry
                .path()
                .strip_prefix(&files_root)
                .ok()?
                .to_string_lossy()
                .replace('\\', "/");
            let text = std::fs::read_to_string(entry.path()).ok()?;
            files.insert(rel, text);
        }

        Some(ResolvedTypes {
            package_name: meta.package_name,
            version: meta.version,
            files,
            from_types_package: meta.from_types_package,
            peer_type_deps: meta.peer_type_deps,
        })
    }

    fn set(&self, bundle: &ResolvedTypes) {
        let dir = self.package_dir(&bundle.package_name, &bundle.version);
        let files_root = dir.join("files");
        let meta = TypesMeta {
            package_name: bundle.package_name.clone(),
            version: bundle.version.clone(),
            from_types_package: bundle.from_types_package,
            peer_type_deps: bundle.peer_type_deps.clone(),
        };
        let result: std::io::Result<()> = (|| {
            std::fs::create_dir_all(&files_root)?;
            let meta_json = serde_json::to_string_pretty(&meta)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            std::fs::write(dir.join("meta.json"), meta_json)?;
            for (rel, text) in &bundle.files {
                let path = files_root.join(rel);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, text)?;
            }
            Ok(())
        })();
        if let Err(error) = result {
            tracing::warn!(package = %bundle.package_name, %error, "type-cache write failed");
        }
    }

    fn has(&self, name: &str, version: &str) -> bool {
        self.package_dir(name, version).join("meta.json").is_file()
    }

    fn delete(&self, name: &str, version: &str) {
        let _ = std::fs::remove_dir_all(self.package_dir(name, version));
    }

    fn clear(&self) {
        let _ = std::fs::remove_dir_all(self.root.join("package-types"));
    }
}

/// On-disk [`LibStore`]: `<root>/ts-libs/<ts-version>/<libName>.d.ts`.
pub struct DiskLibStore {
    root: PathBuf,
}

impl DiskLibStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn lib_path(&self, ts_version: &str, lib_name: &str) -> PathBuf {
        self.root
            .join("ts-libs")
            .join(ts_version)
            .join(format!("{lib_name}.d.ts"))
    }
}

impl LibStore for DiskLibStore {
    fn get(&self, ts_version: &str, lib_name: &str) -> Option<String> {
        std::fs::read_to_string(self.lib_path(ts_version, lib_name)).ok()
    }

    fn set(&self, ts_version: &str, lib_name: &str, text: &str) {
        let path = self.lib_path(ts_version, lib_name);
        let result: std::io::Result<()> = (|| {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, text)
        })();
        if let Err(error) = result {
            tracing::warn!(lib = lib_name, %error, "lib-cache write failed");
        }
    }

    fn has(&self, ts_version: &str, lib_name: &str) -> bool {
        self.lib_path(ts_version, lib_name).is_file()
    }

    fn delete(&self, ts_version: &str, lib_name: &str) {
        let _ = std::fs::remove_file(self.lib_path(ts_version, lib_name));
    }

    fn clear(&self) {
        let _ = std::fs::remove_dir_all(self.root.join("ts-libs"));
    }
}
