//! `/tsconfig.json` loading.
//!
//! tsconfig is JSON5 in the wild (comments, trailing commas), so it is
//! parsed as JSON5. A missing file synthesizes browser-bundler defaults; a
//! malformed one is reported by the caller as a config diagnostic.

use rustc_hash::FxHashMap;
use serde::Deserialize;

use sandlot_common::paths;
use sandlot_vfs::Vfs;

pub const TSCONFIG_PATH: &str = "/tsconfig.json";

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawCompilerOptions {
    target: Option<String>,
    module: Option<String>,
    module_resolution: Option<String>,
    jsx: Option<String>,
    strict: Option<bool>,
    es_module_interop: Option<bool>,
    skip_lib_check: Option<bool>,
    resolve_json_module: Option<bool>,
    isolated_modules: Option<bool>,
    base_url: Option<String>,
    paths: Option<FxHashMap<String, Vec<String>>>,
    lib: Option<Vec<String>>,
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawTsConfig {
    compiler_options: RawCompilerOptions,
}

/// Resolved compiler options: raw tsconfig with the defaults filled in.
#[derive(Clone, Debug)]
pub struct TsConfig {
    pub target: String,
    pub module: String,
    pub module_resolution: String,
    pub jsx: String,
    pub strict: bool,
    pub es_module_interop: bool,
    pub skip_lib_check: bool,
    pub resolve_json_module: bool,
    pub isolated_modules: bool,
    pub base_url: Option<String>,
    pub paths: FxHashMap<String, Vec<String>>,
    /// Requested lib set; `None` means the platform default.
    pub lib: Option<Vec<String>>,
}

impl Default for TsConfig {
    fn default() -> Self {
        Self {
            target: "es2020".to_string(),
            module: "esnext".to_string(),
            module_resolution: "bundler".to_string(),
            jsx: "react-jsx".to_string(),
            strict: true,
            es_module_interop: true,
            skip_lib_check: true,
            resolve_json_module: true,
            isolated_modules: true,
            base_url: None,
            paths: FxHashMap::default(),
            lib: None,
        }
    }
}

impl TsConfig {
    /// Load `/tsconfig.json`, falling back to defaults when it is absent.
    /// Parse failures also fall back, with a warning; a broken tsconfig
    /// should not brick the sandbox.
    pub fn load(vfs: &dyn Vfs) -> Self {
        let Ok(text) = vfs.read_file(TSCONFIG_PATH) else {
            return Self::default();
        };
        match json5::from_str::<RawTsConfig>(&text) {
            Ok(raw) => Self::from_raw(raw),
            Err(error) => {
                tracing::warn!(%error, "malformed tsconfig.json; using defaults");
                Self::default()
            }
        }
    }

    fn from_raw(raw: RawTsConfig) -> Self {
        let defaults = Self::default();
        let o = raw.compiler_options;
        Self {
            target: o.target.unwrap_or(defaults.target),
            module: o.module.unwrap_or(defaults.module),
            module_resolution: o.module_resolution.unwrap_or(defaults.module_resolution),
            jsx: o.jsx.unwrap_or(defaults.jsx),
            strict: o.strict.unwrap_or(defaults.strict),
            es_module_interop: o.es_module_interop.unwrap_or(defaults.es_module_interop),
            skip_lib_check: o.skip_lib_check.unwrap_or(defaults.skip_lib_check),
            resolve_json_module: o.resolve_json_module.unwrap_or(defaults.resolve_json_module),
            isolated_modules: o.isolated_modules.unwrap_or(defaults.isolated_modules),
            base_url: o.base_url,
            paths: o.paths.unwrap_or_default(),
            lib: o.lib,
        }
    }

    /// Expand a specifier through `paths`/`baseUrl` into candidate absolute
    /// VFS paths, most specific mapping first. Returns an empty vec when no
    /// alias applies.
    #[must_use]
    pub fn alias_candidates(&self, specifier: &str) -> Vec<String> {
        let base = self.base_url.as_deref().unwrap_or("/");
        let mut candidates = Vec::new();

        // Exact mappings win over wildcard ones.
        if let Some(targets) = self.paths.get(specifier) {
            for target in targets {
                candidates.push(paths::join(base, target));
            }
        }
        let mut wildcard: Vec<(&String, &Vec<String>)> = self
            .paths
            .iter()
            .filter(|(pattern, _)| pattern.ends_with("/*") || pattern.ends_with('*'))
            .collect();
        // Longest prefix first.
        wildcard.sort_by_key(|(pattern, _)| std::cmp::Reverse(pattern.len()));
        for (pattern, targets) in wildcard {
            let prefix = pattern.trim_end_matches('*');
            let Some(suffix) = specifier.strip_prefix(prefix) else {
                continue;
            };
            for target in targets {
                let expanded = target.replacen('*', suffix, 1);
                candidates.push(paths::join(base, &expanded));
            }
        }

        // baseUrl alone also makes bare specifiers resolvable as paths.
        if candidates.is_empty() && self.base_url.is_some() {
            candidates.push(paths::join(base, specifier));
        }
        candidates
    }
}
