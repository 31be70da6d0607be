//! One isolated project: a VFS, an installed-packages view, and a build
//! history.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use thiserror::Error;

use sandlot_bundler::{BundleRequest, Bundler};
use sandlot_checker::Typechecker;
use sandlot_common::diagnostics::{BundleError, CheckOutcome};
use sandlot_common::package::{PackageSpec, SpecError};
use sandlot_common::paths;
use sandlot_vfs::{EntryKind, Vfs, VfsError};

use crate::build::{BuildFailure, BuildOptions, BuildSuccess};
use crate::loader::LoadedModule;
use crate::project::{InstallReport, PackageJson, UninstallReport};
use crate::sandlot::Services;

/// Inspects (and may replace) the loaded module at the end of a build.
pub type Validator = Box<dyn Fn(&LoadedModule) -> Result<Option<LoadedModule>, String> + Send + Sync>;

/// Runs after every successful build. Errors are logged and swallowed.
pub type Subscriber = Arc<dyn Fn(&BuildSuccess) -> Result<(), String> + Send + Sync>;

/// Optional post-bundle rewrite (the Tailwind seam).
pub type PostBundleHook = Box<dyn Fn(&str) -> Result<String, String> + Send + Sync>;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Vfs(#[from] VfsError),
}

pub struct Sandbox {
    vfs: Arc<dyn Vfs>,
    services: Arc<Services>,
    checker: Arc<dyn Typechecker>,
    validator: RwLock<Option<Validator>>,
    post_bundle: RwLock<Option<PostBundleHook>>,
    subscribers: Mutex<Vec<(u64, Subscriber)>>,
    next_subscriber_id: AtomicU64,
    last_build: RwLock<Option<Arc<BuildSuccess>>>,
    /// Serializes build/typecheck/install/uninstall; a second call queues
    /// behind the first instead of interleaving.
    op_lock: tokio::sync::Mutex<()>,
    disposed: AtomicBool,
}

impl Sandbox {
    pub(crate) fn new(
        vfs: Arc<dyn Vfs>,
        services: Arc<Services>,
        checker: Arc<dyn Typechecker>,
    ) -> Self {
        Self {
            vfs,
            services,
            checker,
            validator: RwLock::new(None),
            post_bundle: RwLock::new(None),
            subscribers: Mutex::new(Vec::new()),
            next_subscriber_id: AtomicU64::new(1),
            last_build: RwLock::new(None),
            op_lock: tokio::sync::Mutex::new(()),
            disposed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn vfs(&self) -> &Arc<dyn Vfs> {
        &self.vfs
    }

    pub fn write_file(&self, path: &str, contents: &str) -> Result<(), VfsError> {
        self.vfs.write_file(path, contents)
    }

    pub fn read_file(&self, path: &str) -> Result<String, VfsError> {
        self.vfs.read_file(path)
    }

    /// Replace (or clear) the validator closure.
    pub fn set_validator(&self, validator: Option<Validator>) {
        *self.validator.write().unwrap_or_else(|e| e.into_inner()) = validator;
    }

    /// Install (or clear) the post-bundle hook driven by `--tailwind`.
    pub fn set_post_bundle_hook(&self, hook: Option<PostBundleHook>) {
        *self.post_bundle.write().unwrap_or_else(|e| e.into_inner()) = hook;
    }

    /// Register a build subscriber; returns an id for [`Self::unsubscribe`].
    pub fn subscribe(&self, subscriber: Subscriber) -> u64 {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, subscriber));
        id
    }

    pub fn unsubscribe(&self, id: u64) -> bool {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    #[must_use]
    pub fn last_build(&self) -> Option<Arc<BuildSuccess>> {
        self.last_build
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Mark the sandbox dead. An in-flight build completes but its result is
    /// discarded: `lastBuild` is not updated and subscribers are not
    /// invoked.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn resolve_entry(&self, explicit: Option<&str>) -> Result<String, BuildFailure> {
        let entry = match explicit {
            Some(entry) => paths::normalize(entry),
            None => PackageJson::load(self.vfs.as_ref()).entry_point(),
        };
        let is_file = self
            .vfs
            .stat(&entry)
            .is_ok_and(|meta| meta.kind == EntryKind::File);
        if is_file {
            Ok(entry)
        } else {
            Err(BuildFailure::Entry {
                message: format!("entry point '{entry}' does not exist"),
            })
        }
    }

    /// Run the full pipeline: entry -> typecheck -> bundle -> load ->
    /// validate -> publish.
    pub async fn build(&self, options: BuildOptions) -> Result<BuildSuccess, BuildFailure> {
        let _guard = self.op_lock.lock().await;
        let entry = self.resolve_entry(options.entry.as_deref())?;
        tracing::info!(entry = %entry, "build started");

        if !options.skip_typecheck {
            let outcome = self.checker.check(&entry);
            if !outcome.success {
                return Err(BuildFailure::Typecheck { outcome });
            }
        }

        let installed = PackageJson::load(self.vfs.as_ref()).installed();
        let request = BundleRequest {
            entry: entry.clone(),
            installed,
            registry: Some(self.services.registry.clone()),
            cdn_base: self.services.cdn_base.clone(),
            minify: options.minify,
        };
        let mut output = self
            .services
            .bundler
            .bundle(self.vfs.clone(), request)
            .await
            .map_err(|failure| BuildFailure::Bundle {
                errors: failure.errors,
            })?;

        if options.tailwind {
            let hook = self.post_bundle.read().unwrap_or_else(|e| e.into_inner());
            if let Some(hook) = hook.as_ref() {
                output.code = hook(&output.code).map_err(|message| BuildFailure::Bundle {
                    errors: vec![BundleError::new(format!("post-bundle hook failed: {message}"))],
                })?;
            }
        }

        let module = self
            .services
            .loader
            .load(&output, Some(&self.services.registry))
            .map_err(|error| BuildFailure::Load {
                message: error.to_string(),
            })?;

        let mut module = Arc::new(module);
        {
            let validator = self.validator.read().unwrap_or_else(|e| e.into_inner());
            if let Some(validator) = validator.as_ref() {
                match validator(&module) {
                    Ok(Some(replacement)) => module = Arc::new(replacement),
                    Ok(None) => {}
                    Err(message) => return Err(BuildFailure::Validate { message }),
                }
            }
        }

        let success = BuildSuccess {
            entry,
            code: output.code,
            warnings: output.warnings,
            included_files: output.included_files,
            module,
        };

        if self.is_disposed() {
            tracing::debug!("sandbox disposed mid-build; discarding result");
            return Ok(success);
        }

        *self.last_build.write().unwrap_or_else(|e| e.into_inner()) =
            Some(Arc::new(success.clone()));
        // Snapshot so a subscriber can subscribe/unsubscribe re-entrantly.
        let subscribers: Vec<(u64, Subscriber)> = self
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(id, s)| (*id, s.clone()))
            .collect();
        for (id, subscriber) in subscribers {
            if let Err(error) = subscriber(&success) {
                tracing::warn!(subscriber = id, error, "build subscriber failed");
            }
        }

        Ok(success)
    }

    /// Build step two, reported directly.
    pub async fn typecheck(&self, entry: Option<&str>) -> CheckOutcome {
        let _guard = self.op_lock.lock().await;
        let entry = match entry {
            Some(entry) => paths::normalize(entry),
            None => PackageJson::load(self.vfs.as_ref()).entry_point(),
        };
        self.checker.check(&entry)
    }

    /// Install a package: pin its version, fetch its type tree (and every
    /// discovered peer's), and write everything under `/node_modules`.
    /// Type-resolution failures are recorded in the report, not raised;
    /// typecheck surfaces them later as missing-module diagnostics.
    pub async fn install(&self, spec: &str) -> Result<InstallReport, SandboxError> {
        let spec = PackageSpec::parse(spec)?;
        let _guard = self.op_lock.lock().await;
        tracing::info!(package = %spec.name, "install started");

        let mut pkg = PackageJson::load(self.vfs.as_ref());
        let report = match self
            .services
            .types_resolver
            .resolve(&spec.name, spec.version_or_latest())
            .await
        {
            Ok(outcome) => {
                let types = &outcome.types;
                self.write_type_tree(&types.package_name, &types.files)?;
                pkg.add_dependency(&spec.name, &types.version);

                // Peers install transitively; a peer failure only costs its
                // own types.
                let mut queue: Vec<(String, String)> = types
                    .peer_type_deps
                    .iter()
                    .map(|p| (p.name.clone(), p.version.clone()))
                    .collect();
                let mut seen: std::collections::BTreeSet<String> =
                    std::collections::BTreeSet::new();
                seen.insert(spec.name.clone());
                while let Some((peer_name, peer_version)) = queue.pop() {
                    if !seen.insert(peer_name.clone()) {
                        continue;
                    }
                    match self
                        .services
                        .types_resolver
                        .resolve(&peer_name, &peer_version)
                        .await
                    {
                        Ok(peer) => {
                            self.write_type_tree(&peer_name, &peer.types.files)?;
                            pkg.add_dependency(&peer_name, &peer.types.version);
                            queue.extend(
                                peer.types
                                    .peer_type_deps
                                    .iter()
                                    .map(|p| (p.name.clone(), p.version.clone())),
                            );
                        }
                        Err(error) => {
                            tracing::warn!(peer = %peer_name, %error, "peer type fetch failed");
                            pkg.add_dependency(&peer_name, &peer_version);
                        }
                    }
                }

                InstallReport {
                    name: spec.name.clone(),
                    version: types.version.clone(),
                    types_installed: true,
                    type_files_count: types.files.len(),
                    types_error: None,
                    from_cache: outcome.from_cache,
                }
            }
            Err(error) => {
                // Install still succeeds; the pin lands in package.json and
                // typecheck reports the missing module.
                let version = spec.version_or_latest().to_string();
                pkg.add_dependency(&spec.name, &version);
                InstallReport {
                    name: spec.name.clone(),
                    version,
                    types_installed: false,
                    type_files_count: 0,
                    types_error: Some(error.to_string()),
                    from_cache: false,
                }
            }
        };
        pkg.save(self.vfs.as_ref())?;
        Ok(report)
    }

    fn write_type_tree(
        &self,
        name: &str,
        files: &std::collections::BTreeMap<String, String>,
    ) -> Result<(), SandboxError> {
        for (rel, text) in files {
            self.vfs
                .write_file(&format!("/node_modules/{name}/{rel}"), text)?;
        }
        Ok(())
    }

    /// Remove a dependency and its installed type tree.
    pub async fn uninstall(&self, name: &str) -> Result<UninstallReport, SandboxError> {
        let _guard = self.op_lock.lock().await;
        let mut pkg = PackageJson::load(self.vfs.as_ref());
        let removed = pkg.remove_dependency(name);
        if removed {
            pkg.save(self.vfs.as_ref())?;
        }
        let tree = format!("/node_modules/{name}");
        if self.vfs.exists(&tree) {
            self.vfs.rm(&tree)?;
        }
        Ok(UninstallReport {
            name: name.to_string(),
            removed,
        })
    }
}
