//! Module resolution for the checker.
//!
//! Resolution order mirrors a bundler-mode TypeScript setup: relative and
//! absolute specifiers against the importer's directory with the usual
//! extension candidates, tsconfig `paths`/`baseUrl` aliases, then installed
//! type trees under `/node_modules`.

use sandlot_common::package::{is_bare_specifier, split_bare_specifier};
use sandlot_common::paths;
use sandlot_vfs::Vfs;

use crate::config::TsConfig;

/// Extensions tried when a specifier has none, in priority order.
const EXTENSIONS: &[&str] = &[".ts", ".tsx", ".d.ts", ".js", ".jsx", ".mjs", ".json"];

/// Resolve one specifier from `importer` to an absolute VFS path.
#[must_use]
pub fn resolve_specifier(
    vfs: &dyn Vfs,
    config: &TsConfig,
    importer: &str,
    specifier: &str,
) -> Option<String> {
    if !is_bare_specifier(specifier) {
        let base = paths::dirname(importer);
        let target = paths::join(&base, specifier);
        return resolve_file(vfs, &target);
    }

    for candidate in config.alias_candidates(specifier) {
        if let Some(found) = resolve_file(vfs, &candidate) {
            return Some(found);
        }
    }

    resolve_in_node_modules(vfs, specifier)
}

/// A path as a file: exact, with appended extensions, then as a directory
/// with an index file.
fn resolve_file(vfs: &dyn Vfs, target: &str) -> Option<String> {
    if is_file(vfs, target) {
        return Some(target.to_string());
    }
    for ext in EXTENSIONS {
        let candidate = format!("{target}{ext}");
        if is_file(vfs, &candidate) {
            return Some(candidate);
        }
    }
    for ext in EXTENSIONS {
        let candidate = format!("{target}/index{ext}");
        if is_file(vfs, &candidate) {
            return Some(candidate);
        }
    }
    None
}

fn resolve_in_node_modules(vfs: &dyn Vfs, specifier: &str) -> Option<String> {
    let (package, subpath) = split_bare_specifier(specifier);
    let root = format!("/node_modules/{package}");
    match subpath {
        Some(subpath) => resolve_file(vfs, &format!("{root}/{subpath}")),
        None => resolve_file(vfs, &root),
    }
}

fn is_file(vfs: &dyn Vfs, path: &str) -> bool {
    vfs.stat(path)
        .is_ok_and(|meta| meta.kind == sandlot_vfs::EntryKind::File)
}
