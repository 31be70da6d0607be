//! Transitive type-definition resolution.
//!
//! Given `(package, version?)` the resolver probes the module-graph CDN for
//! the package's advertised type entry, falls back to the matching
//! DefinitelyTyped package, crawls every reachable `.d.ts` under the same
//! package to a fixed point, rewrites absolute CDN URLs back to bare
//! specifiers so the cached tree is portable, and reports every *other*
//! package the tree references as a peer type dependency the caller should
//! install alongside.
//!
//! Type graphs are routinely cyclic; a fetched set terminates the crawl and
//! URL rewriting runs only after the fixed point so rewrite targets are
//! stable.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sandlot_common::package::{is_bare_specifier, split_bare_specifier};

use crate::cdn::{CdnError, ModuleCdn, types_package_name};
use crate::scan::{DtsRef, scan_dts};
use crate::store::TypeStore;

/// Node builtins that never become peer type dependencies.
const NODE_BUILTINS: &[&str] = &[
    "assert", "buffer", "child_process", "crypto", "events", "fs", "http", "https", "net", "os",
    "path", "process", "stream", "tty", "url", "util", "worker_threads", "zlib",
];

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("no type definitions found for '{package}'")]
    NoTypesFound { package: String },
    #[error("network failure while resolving types: {0}")]
    Network(#[source] CdnError),
    #[error("type tree references '{url}' which could not be fetched")]
    MalformedTypes { url: String },
}

/// A package discovered while crawling another package's types, whose own
/// types must be fetched for typecheck to succeed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerTypeDep {
    pub name: String,
    pub version: String,
}

/// The persisted result of one package's type fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTypes {
    pub package_name: String,
    /// Exact version, never a range.
    pub version: String,
    /// Relative path under the package root -> file text.
    pub files: BTreeMap<String, String>,
    /// True when the tree came from `@types/<name>` rather than the package
    /// itself.
    pub from_types_package: bool,
    pub peer_type_deps: Vec<PeerTypeDep>,
}

/// Result of [`TypesResolver::resolve`].
#[derive(Clone, Debug)]
pub struct ResolveOutcome {
    pub types: ResolvedTypes,
    pub from_cache: bool,
}

pub struct TypesResolver {
    cdn: Arc<dyn ModuleCdn>,
    store: Arc<dyn TypeStore>,
}

impl TypesResolver {
    pub fn new(cdn: Arc<dyn ModuleCdn>, store: Arc<dyn TypeStore>) -> Self {
        Self { cdn, store }
    }

    /// Resolve the type tree for `name` at `version_req` (a pin, a range, or
    /// `latest`). Errors are never cached; cached successes skip the network
    /// entirely when the request names an exact version.
    pub async fn resolve(&self, name: &str, version_req: &str) -> Result<ResolveOutcome, TypesError> {
        if version_req != "latest" {
            if let Some(types) = self.store.get(name, version_req) {
                tracing::debug!(package = name, version = version_req, "types cache hit");
                return Ok(ResolveOutcome {
                    types,
                    from_cache: true,
                });
            }
        }

        let located = self.locate_entry(name, version_req).await?;
        if let Some(types) = self.store.get(name, &located.version) {
            tracing::debug!(package = name, version = %located.version, "types cache hit after probe");
            return Ok(ResolveOutcome {
                types,
                from_cache: true,
            });
        }

        let mut crawl = self.crawl(name, &located).await?;
        let base = self.cdn.base_url().to_string();

        // Installing writes `files` under `/node_modules/<name>/`, and the
        // package root must resolve no matter where the CDN put the entry.
        let entry_rel =
            relative_path_in_package(&located.entry_url).unwrap_or_else(|| "index.d.ts".to_string());
        if entry_rel != "index.d.ts" && !crawl.files.contains_key("index.d.ts") {
            let target = entry_rel
                .strip_suffix(".d.ts")
                .or_else(|| entry_rel.strip_suffix(".ts"))
                .unwrap_or(&entry_rel);
            crawl
                .files
                .insert("index.d.ts".to_string(), format!("export * from \"./{target}\";\n"));
        }

        let files: BTreeMap<String, String> = crawl
            .files
            .into_iter()
            .map(|(rel, text)| (rel, rewrite_cdn_urls(&text, &base)))
            .collect();

        let mut peer_type_deps: Vec<PeerTypeDep> = crawl
            .peers
            .into_iter()
            .map(|(name, version)| PeerTypeDep { name, version })
            .collect();
        peer_type_deps.sort_by(|a, b| a.name.cmp(&b.name));

        let types = ResolvedTypes {
            package_name: name.to_string(),
            version: located.version,
            files,
            from_types_package: located.from_types_package,
            peer_type_deps,
        };
        self.store.set(&types);
        tracing::info!(
            package = name,
            version = %types.version,
            files = types.files.len(),
            peers = types.peer_type_deps.len(),
            from_types_package = types.from_types_package,
            "resolved package types"
        );
        Ok(ResolveOutcome {
            types,
            from_cache: false,
        })
    }

    /// Probe the package itself, then `@types/<name>`.
    async fn locate_entry(&self, name: &str, version_req: &str) -> Result<LocatedEntry, TypesError> {
        match self.cdn.probe(name, version_req).await {
            Ok(probe) => {
                if let Some(entry_url) = probe.types_url {
                    return Ok(LocatedEntry {
                        entry_url,
                        version: probe.resolved_version,
                        from_types_package: false,
                    });
                }
                // Package resolved but ships no types: try DefinitelyTyped,
                // keeping the runtime package's resolved version as the pin.
                self.locate_types_package(name, Some(probe.resolved_version))
                    .await
            }
            Err(err @ CdnError::Network { .. }) => Err(TypesError::Network(err)),
            Err(CdnError::Status { .. }) => self.locate_types_package(name, None).await,
        }
    }

    async fn locate_types_package(
        &self,
        name: &str,
        runtime_version: Option<String>,
    ) -> Result<LocatedEntry, TypesError> {
        let types_name = types_package_name(name);
        match self.cdn.probe(&types_name, "latest").await {
            Ok(probe) => {
                let entry_url = probe.types_url.unwrap_or_else(|| {
                    // `@types/*` packages are all declarations; their index is
                    // a valid entry even without an advertising header.
                    format!(
                        "{}/{}@{}/index.d.ts",
                        self.cdn.base_url(),
                        types_name,
                        probe.resolved_version
                    )
                });
                Ok(LocatedEntry {
                    entry_url,
                    version: runtime_version.unwrap_or(probe.resolved_version),
                    from_types_package: true,
                })
            }
            Err(err @ CdnError::Network { .. }) => Err(TypesError::Network(err)),
            Err(CdnError::Status { .. }) => Err(TypesError::NoTypesFound {
                package: name.to_string(),
            }),
        }
    }

    /// Fetch the entry and every same-package file it references, breadth
    /// first, one round of parallel requests per depth level.
    async fn crawl(&self, name: &str, located: &LocatedEntry) -> Result<CrawlResult, TypesError> {
        let types_name = types_package_name(name);
        let mut fetched: FxHashSet<String> = FxHashSet::default();
        let mut files: BTreeMap<String, String> = BTreeMap::new();
        let mut peers: FxHashMap<String, String> = FxHashMap::default();
        let mut queue: Vec<String> = vec![located.entry_url.clone()];

        while !queue.is_empty() {
            let round: Vec<String> = queue
                .drain(..)
                .filter(|url| fetched.insert(url.clone()))
                .collect();
            let results = join_all(round.iter().map(|url| async {
                let text = self.cdn.fetch_text(url).await;
                (url.clone(), text)
            }))
            .await;

            for (url, result) in results {
                let text = match result {
                    Ok(text) => text,
                    Err(err @ CdnError::Network { .. }) => return Err(TypesError::Network(err)),
                    Err(CdnError::Status { .. }) => {
                        return Err(TypesError::MalformedTypes { url });
                    }
                };

                for reference in scan_dts(&text) {
                    match reference {
                        // Reference paths are package-relative whether or
                        // not they carry a `./` prefix.
                        DtsRef::ReferencePath(spec) if !spec.starts_with("http") => {
                            queue.push(resolve_relative_url(&url, &spec));
                        }
                        DtsRef::Module(spec) if spec.starts_with('.') => {
                            queue.push(resolve_relative_url(&url, &spec));
                        }
                        DtsRef::Module(spec) if spec.starts_with("http") => {
                            match parse_package_url(&spec) {
                                Some(parsed)
                                    if parsed.name == name || parsed.name == types_name =>
                                {
                                    queue.push(spec);
                                }
                                Some(parsed) => {
                                    let peer = runtime_package_name(&parsed.name);
                                    if peer != name {
                                        peers.insert(peer, parsed.version);
                                    }
                                }
                                None => {}
                            }
                        }
                        DtsRef::Module(spec) => {
                            let (head, _) = split_bare_specifier(&spec);
                            if is_peer_candidate(head, name) {
                                peers
                                    .entry(head.to_string())
                                    .or_insert_with(|| "latest".to_string());
                            }
                        }
                        DtsRef::ReferenceTypes(types_ref) => {
                            let peer = runtime_package_name(&format!("@types/{types_ref}"));
                            if is_peer_candidate(&peer, name) {
                                peers
                                    .entry(peer)
                                    .or_insert_with(|| "latest".to_string());
                            }
                        }
                        DtsRef::ReferencePath(_) => {}
                    }
                }

                let rel = relative_path_in_package(&url).unwrap_or_else(|| "index.d.ts".to_string());
                files.insert(rel, text);
            }
        }

        peers.remove(name);
        peers.remove(&types_name);
        Ok(CrawlResult { files, peers })
    }
}

struct LocatedEntry {
    entry_url: String,
    version: String,
    from_types_package: bool,
}

struct CrawlResult {
    files: BTreeMap<String, String>,
    peers: FxHashMap<String, String>,
}

fn is_peer_candidate(head: &str, current_package: &str) -> bool {
    if !is_bare_specifier(head) || head == current_package {
        return false;
    }
    if head.starts_with("node:") {
        return false;
    }
    !NODE_BUILTINS.contains(&head)
}

/// `(name, version, rest)` parsed out of a CDN URL like
/// `https://cdn/v135/@types/react@18.2.0/index.d.ts`.
struct ParsedPackageUrl {
    name: String,
    version: String,
    rest: String,
}

fn parse_package_url(url: &str) -> Option<ParsedPackageUrl> {
    let path_start = url.find("://").map(|i| i + 3)?;
    let path = url[path_start..].split_once('/').map(|(_, p)| p)?;
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    // Scoped names span two segments (`@scope` then `name@version`);
    // build prefixes like `v135` precede the package segment.
    for (i, seg) in segments.iter().enumerate() {
        if seg.starts_with('@') {
            continue;
        }
        let Some(at) = seg.rfind('@') else { continue };
        if at == 0 {
            continue;
        }
        let scope = (i > 0 && segments[i - 1].starts_with('@')).then(|| segments[i - 1]);
        let bare = &seg[..at];
        let version = &seg[at + 1..];
        let name = match scope {
            Some(scope) => format!("{scope}/{bare}"),
            None => bare.to_string(),
        };
        return Some(ParsedPackageUrl {
            name,
            version: version.to_string(),
            rest: segments[i + 1..].join("/"),
        });
    }
    None
}

/// Map a CDN package name back to the runtime package it declares:
/// `@types/react` -> `react`, `@types/tanstack__react-query` ->
/// `@tanstack/react-query`, anything else unchanged.
fn runtime_package_name(cdn_name: &str) -> String {
    match cdn_name.strip_prefix("@types/") {
        Some(types_part) => match types_part.split_once("__") {
            Some((scope, rest)) => format!("@{scope}/{rest}"),
            None => types_part.to_string(),
        },
        None => cdn_name.to_string(),
    }
}

/// Path of a fetched file relative to its package root.
fn relative_path_in_package(url: &str) -> Option<String> {
    let parsed = parse_package_url(url)?;
    if parsed.rest.is_empty() {
        None
    } else {
        Some(parsed.rest)
    }
}

/// Join a relative `.d.ts` specifier onto the directory of the current
/// file's URL, collapsing `.`/`..` and defaulting the extension.
fn resolve_relative_url(current_url: &str, spec: &str) -> String {
    let dir = match current_url.rfind('/') {
        Some(idx) => &current_url[..idx],
        None => current_url,
    };
    let origin_end = current_url
        .find("://")
        .map(|i| i + 3)
        .and_then(|i| current_url[i..].find('/').map(|j| i + j))
        .unwrap_or(0);
    let origin = &current_url[..origin_end];
    let dir_path = &dir[origin_end..];

    let mut segments: Vec<&str> = dir_path.split('/').filter(|s| !s.is_empty()).collect();
    for part in spec.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            seg => segments.push(seg),
        }
    }
    let mut joined = format!("{origin}/{}", segments.join("/"));
    if !has_declaration_extension(&joined) {
        joined.push_str(".d.ts");
    }
    joined
}

fn has_declaration_extension(path: &str) -> bool {
    path.ends_with(".d.ts")
        || path.ends_with(".d.mts")
        || path.ends_with(".d.cts")
        || path.ends_with(".ts")
}

/// Replace every absolute CDN URL in `text` with the bare specifier of the
/// package it points at. Runs once, after the crawl fixed point.
fn rewrite_cdn_urls(text: &str, base: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find(base) {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        let end = tail
            .find(|c: char| c == '"' || c == '\'' || c == ')' || c == '>' || c.is_whitespace())
            .unwrap_or(tail.len());
        let url = &tail[..end];
        match bare_specifier_for_url(url) {
            Some(bare) => out.push_str(&bare),
            None => out.push_str(url),
        }
        rest = &tail[end..];
    }
    out.push_str(rest);
    out
}

fn bare_specifier_for_url(url: &str) -> Option<String> {
    let parsed = parse_package_url(url)?;
    let name = runtime_package_name(&parsed.name);
    let rest = parsed.rest.trim_end_matches(".d.ts").trim_end_matches(".d.mts");
    if rest.is_empty() || rest == "index" {
        Some(name)
    } else {
        Some(format!("{name}/{rest}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_package_urls() {
        let parsed = parse_package_url("https://esm.sh/nanoid@5.1.6/index.d.ts").unwrap();
        assert_eq!(parsed.name, "nanoid");
        assert_eq!(parsed.version, "5.1.6");
        assert_eq!(parsed.rest, "index.d.ts");
    }

    #[test]
    fn parses_types_package_urls_with_build_prefix() {
        let parsed =
            parse_package_url("https://esm.sh/v135/@types/react@18.2.0/index.d.ts").unwrap();
        assert_eq!(parsed.name, "@types/react");
        assert_eq!(parsed.version, "18.2.0");
    }

    #[test]
    fn parses_scoped_package_urls() {
        let parsed = parse_package_url(
            "https://esm.sh/@tanstack/react-query@5.0.0/build/modern/index.d.ts",
        )
        .unwrap();
        assert_eq!(parsed.name, "@tanstack/react-query");
        assert_eq!(parsed.version, "5.0.0");
        assert_eq!(parsed.rest, "build/modern/index.d.ts");
    }

    #[test]
    fn runtime_names_reverse_definitely_typed_mangling() {
        assert_eq!(runtime_package_name("@types/react"), "react");
        assert_eq!(
            runtime_package_name("@types/tanstack__react-query"),
            "@tanstack/react-query"
        );
        assert_eq!(runtime_package_name("react-dom"), "react-dom");
    }

    #[test]
    fn relative_urls_resolve_and_default_extension() {
        assert_eq!(
            resolve_relative_url("https://esm.sh/pkg@1.0.0/lib/index.d.ts", "./util"),
            "https://esm.sh/pkg@1.0.0/lib/util.d.ts"
        );
        assert_eq!(
            resolve_relative_url("https://esm.sh/pkg@1.0.0/lib/index.d.ts", "../other.d.ts"),
            "https://esm.sh/pkg@1.0.0/other.d.ts"
        );
    }

    #[test]
    fn rewrites_absolute_urls_to_bare_specifiers() {
        let text = r#"import { FC } from "https://esm.sh/v135/@types/react@18.2.0/index.d.ts";
export * from "https://esm.sh/@tanstack/query-core@5.0.0/build/index.d.ts";
"#;
        let rewritten = rewrite_cdn_urls(text, "https://esm.sh");
        assert!(rewritten.contains("from \"react\""));
        assert!(rewritten.contains("from \"@tanstack/query-core/build/index\""));
        assert!(!rewritten.contains("https://esm.sh"));
    }
}
