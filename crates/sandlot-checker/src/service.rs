//! The long-lived language service.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use rustc_hash::{FxHashMap, FxHashSet, FxHasher};

use sandlot_common::diagnostics::{CheckOutcome, Diagnostic};
use sandlot_common::paths;
use sandlot_common::position::LineMap;
use sandlot_vfs::Vfs;

use crate::Typechecker;
use crate::config::TsConfig;
use crate::resolve::resolve_specifier;
use crate::scanner::{ScanResult, scan};

/// Virtual directory the cached TypeScript libs are addressable under.
pub const LIB_ROOT: &str = "/__ts_libs";

struct CachedScan {
    hash: u64,
    version: u64,
    scan: Arc<ScanResult>,
}

#[derive(Default)]
struct ServiceState {
    scans: FxHashMap<String, CachedScan>,
}

/// Long-lived checker for one sandbox.
///
/// The service survives across calls; per-file version counters let it
/// rescan only files whose text actually changed instead of rebuilding a
/// program from scratch.
pub struct LanguageService {
    vfs: Arc<dyn Vfs>,
    libs: RwLock<BTreeMap<String, String>>,
    state: RwLock<ServiceState>,
}

impl LanguageService {
    #[must_use]
    pub fn new(vfs: Arc<dyn Vfs>) -> Self {
        Self {
            vfs,
            libs: RwLock::new(BTreeMap::new()),
            state: RwLock::new(ServiceState::default()),
        }
    }

    /// Install the fetched standard-lib closure. Each lib becomes visible at
    /// `/__ts_libs/lib.<name>.d.ts`.
    pub fn set_libs(&self, libs: BTreeMap<String, String>) {
        *self.libs.write().unwrap_or_else(|e| e.into_inner()) = libs;
    }

    #[must_use]
    pub fn lib_path(name: &str) -> String {
        format!("{LIB_ROOT}/lib.{name}.d.ts")
    }

    #[must_use]
    pub fn has_lib(&self, name: &str) -> bool {
        self.libs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(name)
    }

    /// Current version counter of a file, if it has ever been scanned.
    #[must_use]
    pub fn file_version(&self, path: &str) -> Option<u64> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .scans
            .get(path)
            .map(|c| c.version)
    }

    fn scan_cached(&self, path: &str, text: &str) -> Arc<ScanResult> {
        let mut hasher = FxHasher::default();
        text.hash(&mut hasher);
        let hash = hasher.finish();

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = state.scans.get(path) {
            if cached.hash == hash {
                return cached.scan.clone();
            }
        }
        let scanned = Arc::new(scan(text));
        let version = state.scans.get(path).map_or(1, |c| c.version + 1);
        tracing::trace!(path, version, "rescanned file");
        state.scans.insert(
            path.to_string(),
            CachedScan {
                hash,
                version,
                scan: scanned.clone(),
            },
        );
        scanned
    }

    fn check_program(&self, entry: &str) -> CheckOutcome {
        let entry = paths::normalize(entry);
        if !self.vfs.exists(&entry) {
            return CheckOutcome {
                success: false,
                diagnostics: vec![Diagnostic {
                    file: Some(entry.clone()),
                    line: None,
                    column: None,
                    message: format!("File '{entry}' not found."),
                    severity: sandlot_common::diagnostics::Severity::Error,
                }],
            };
        }

        let config = TsConfig::load(self.vfs.as_ref());
        let mut diagnostics = Vec::new();
        let mut visited: FxHashSet<String> = FxHashSet::default();
        let mut queue: Vec<String> = vec![entry];

        while let Some(path) = queue.pop() {
            if !visited.insert(path.clone()) {
                continue;
            }
            let Ok(text) = self.vfs.read_file(&path) else {
                continue;
            };
            let scanned = self.scan_cached(&path, &text);
            let line_map = LineMap::build(&text);
            let is_declaration = path.ends_with(".d.ts");

            for import in &scanned.imports {
                match resolve_specifier(self.vfs.as_ref(), &config, &path, &import.specifier) {
                    Some(target) => {
                        if is_checkable(&target) && !visited.contains(&target) {
                            queue.push(target);
                        }
                    }
                    None => {
                        let (line, column) = line_map.line_col(import.offset);
                        diagnostics.push(Diagnostic::error(
                            path.clone(),
                            line,
                            column,
                            format!(
                                "Cannot find module '{}' or its corresponding type declarations.",
                                import.specifier
                            ),
                        ));
                    }
                }
            }

            if !is_declaration {
                for decl in &scanned.decls {
                    let actual = decl.literal.type_name();
                    if actual != decl.type_name {
                        let (line, column) = line_map.line_col(decl.offset);
                        diagnostics.push(Diagnostic::error(
                            path.clone(),
                            line,
                            column,
                            format!(
                                "Type '{actual}' is not assignable to type '{}'.",
                                decl.type_name
                            ),
                        ));
                    }
                }
            }
        }

        let outcome = CheckOutcome::from_diagnostics(diagnostics);
        tracing::debug!(
            files = visited.len(),
            diagnostics = outcome.diagnostics.len(),
            success = outcome.success,
            "typecheck complete"
        );
        outcome
    }
}

/// Files whose imports are worth following.
fn is_checkable(path: &str) -> bool {
    matches!(
        paths::extension(path),
        Some("ts") | Some("tsx") | Some("js") | Some("jsx") | Some("mjs")
    )
}

impl Typechecker for LanguageService {
    fn check(&self, entry: &str) -> CheckOutcome {
        self.check_program(entry)
    }
}
