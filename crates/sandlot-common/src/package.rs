//! npm package-specifier parsing.
//!
//! Two distinct grammars meet here: install specs (`name@version`, where the
//! version is optional) and import specifiers (`name/subpath`). Scoped names
//! (`@scope/name`) consume two segments in both.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("empty package specifier")]
    Empty,
    #[error("invalid package specifier '{0}'")]
    Invalid(String),
}

/// A parsed install spec: `nanoid`, `nanoid@5.1.6`, `@tanstack/react-query@5.x`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: String,
    pub version: Option<String>,
}

impl PackageSpec {
    /// Version to pin when none was requested or resolution failed.
    pub const LATEST: &'static str = "latest";

    pub fn parse(spec: &str) -> Result<Self, SpecError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(SpecError::Empty);
        }
        // A scoped name's leading `@` is not a version separator.
        let body = spec.strip_prefix('@').unwrap_or(spec);
        let (name, version) = match body.find('@') {
            Some(idx) => {
                let split = if spec.starts_with('@') { idx + 1 } else { idx };
                let (n, v) = spec.split_at(split);
                (n, Some(v[1..].to_string()))
            }
            None => (spec, None),
        };
        if name.is_empty() || version.as_deref() == Some("") {
            return Err(SpecError::Invalid(spec.to_string()));
        }
        if name.starts_with('@') && !name[1..].contains('/') {
            return Err(SpecError::Invalid(spec.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            version,
        })
    }

    #[must_use]
    pub fn version_or_latest(&self) -> &str {
        self.version.as_deref().unwrap_or(Self::LATEST)
    }
}

/// Whether an import specifier refers to a package rather than a file.
#[must_use]
pub fn is_bare_specifier(specifier: &str) -> bool {
    !specifier.starts_with('.') && !specifier.starts_with('/')
}

/// Split a bare import specifier into `(package_name, subpath)`. Scoped
/// names consume the first two segments.
///
/// `react/jsx-runtime` -> `("react", Some("jsx-runtime"))`
/// `@scope/pkg/deep/file` -> `("@scope/pkg", Some("deep/file"))`
#[must_use]
pub fn split_bare_specifier(specifier: &str) -> (&str, Option<&str>) {
    let head_segments = if specifier.starts_with('@') { 2 } else { 1 };
    let mut idx = 0;
    let mut seen = 0;
    for (i, ch) in specifier.char_indices() {
        if ch == '/' {
            seen += 1;
            if seen == head_segments {
                idx = i;
                break;
            }
        }
    }
    if idx == 0 {
        (specifier, None)
    } else {
        (&specifier[..idx], Some(&specifier[idx + 1..]))
    }
}

/// Storage-safe form of a package name: the scope separator becomes `--` so
/// cache filenames stay flat (`@tanstack/react-query` -> `@tanstack--react-query`).
#[must_use]
pub fn storage_safe_name(name: &str) -> String {
    name.replace('/', "--")
}

/// Inverse of [`storage_safe_name`].
#[must_use]
pub fn from_storage_safe_name(safe: &str) -> String {
    safe.replace("--", "/")
}
