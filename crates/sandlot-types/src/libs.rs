//! TypeScript standard-lib acquisition.
//!
//! The language service will not chase `/// <reference lib="..." />`
//! directives on its own, so a requested lib set has to be closed
//! transitively before checking starts: fetch a round in parallel, scan each
//! result for further references, repeat until nothing new appears. The
//! cache key includes the compiler version, so upgrading the compiler just
//! misses and refills.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use rustc_hash::FxHashSet;

use crate::cdn::{CdnError, LibCdn};
use crate::resolver::TypesError;
use crate::store::LibStore;

/// Default lib set for browser-targeted projects.
pub const DEFAULT_BROWSER_LIBS: &[&str] = &["es2020", "dom", "dom.iterable"];

/// `lib` attribute values of every triple-slash reference directive in a
/// lib file.
#[must_use]
pub fn parse_lib_references(text: &str) -> Vec<String> {
    let mut libs = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        let Some(directive) = trimmed.strip_prefix("///") else {
            continue;
        };
        if !directive.contains("<reference") {
            continue;
        }
        let Some(idx) = directive.find("lib=") else {
            continue;
        };
        let rest = &directive[idx + 4..];
        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        if let Some(end) = rest[1..].find(quote) {
            libs.push(rest[1..1 + end].to_string());
        }
    }
    libs
}

pub struct LibResolver {
    cdn: Arc<dyn LibCdn>,
    store: Arc<dyn LibStore>,
    ts_version: String,
}

impl LibResolver {
    pub fn new(cdn: Arc<dyn LibCdn>, store: Arc<dyn LibStore>, ts_version: impl Into<String>) -> Self {
        Self {
            cdn,
            store,
            ts_version: ts_version.into(),
        }
    }

    #[must_use]
    pub fn ts_version(&self) -> &str {
        &self.ts_version
    }

    /// Fetch the transitive closure of `names` and return every lib in it.
    ///
    /// Cached libs are reused but still scanned, so the closure invariant
    /// holds even when the initial set was fetched by an earlier session.
    pub async fn ensure_libs(&self, names: &[&str]) -> Result<BTreeMap<String, String>, TypesError> {
        let mut closure: BTreeMap<String, String> = BTreeMap::new();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut pending: Vec<String> = names
            .iter()
            .map(|n| n.to_lowercase())
            .filter(|n| seen.insert(n.clone()))
            .collect();

        while !pending.is_empty() {
            let round: Vec<String> = std::mem::take(&mut pending);
            let results = join_all(round.into_iter().map(|name| async move {
                let cached = self.store.get(&self.ts_version, &name);
                match cached {
                    Some(text) => (name, Ok(text), true),
                    None => {
                        let fetched = self.cdn.fetch_lib(&self.ts_version, &name).await;
                        (name, fetched, false)
                    }
                }
            }))
            .await;

            for (name, result, was_cached) in results {
                let text = match result {
                    Ok(text) => text,
                    Err(err @ CdnError::Network { .. }) => return Err(TypesError::Network(err)),
                    Err(CdnError::Status { url, .. }) => {
                        return Err(TypesError::MalformedTypes { url });
                    }
                };
                if !was_cached {
                    self.store.set(&self.ts_version, &name, &text);
                }
                for reference in parse_lib_references(&text) {
                    let reference = reference.to_lowercase();
                    if seen.insert(reference.clone()) {
                        pending.push(reference);
                    }
                }
                closure.insert(name, text);
            }
        }

        tracing::debug!(libs = closure.len(), "lib closure complete");
        Ok(closure)
    }
}
