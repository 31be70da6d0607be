//! The sandbox factory.
//!
//! A sandlot owns everything sandboxes share: the shared-module registry,
//! the type and lib caches, the CDN clients, the bundler engine and the
//! module loader. Every service is pluggable; the defaults are the in-crate
//! implementations with in-memory caches, and a cache directory switches
//! both stores to disk. Disk caches persist across sandlots until
//! [`Sandlot::clear_caches`]; `dispose` never touches them.

use std::path::PathBuf;
use std::sync::Arc;

use sandlot_bundler::{Bundler, GraphBundler};
use sandlot_checker::{LanguageService, Typechecker};
use sandlot_registry::SharedModuleRegistry;
use sandlot_types::{
    DEFAULT_BROWSER_LIBS, DEFAULT_CDN_BASE, DEFAULT_TS_VERSION, DiskLibStore, DiskTypeStore,
    HttpLibCdn, HttpModuleCdn, LibCdn, LibResolver, LibStore, MemoryLibStore, MemoryTypeStore,
    ModuleCdn, TypeStore, TypesResolver,
};
use sandlot_vfs::{MemoryVfs, Vfs};

use crate::loader::{ModuleLoader, StaticModuleLoader};
use crate::project::PackageJson;
use crate::sandbox::Sandbox;

/// Builds a [`Typechecker`] bound to one sandbox's VFS, handed the
/// prefetched standard-lib closure (`lib name -> text`).
pub type CheckerFactory = Box<
    dyn Fn(Arc<dyn Vfs>, std::collections::BTreeMap<String, String>) -> Arc<dyn Typechecker>
        + Send
        + Sync,
>;

pub struct SandlotOptions {
    /// Host modules pinned by value: `module id -> module object`.
    pub shared_modules: Vec<(String, serde_json::Value)>,
    /// Module-graph CDN origin.
    pub cdn_base: String,
    /// TypeScript compiler version the lib cache is keyed by.
    pub ts_version: String,
    /// Initial lib set; closed transitively at sandbox creation.
    pub libs: Vec<String>,
    /// When set, the type and lib caches persist here on disk.
    pub cache_dir: Option<PathBuf>,

    module_cdn: Option<Arc<dyn ModuleCdn>>,
    lib_cdn: Option<Arc<dyn LibCdn>>,
    type_store: Option<Arc<dyn TypeStore>>,
    lib_store: Option<Arc<dyn LibStore>>,
    bundler: Option<Arc<dyn Bundler>>,
    loader: Option<Arc<dyn ModuleLoader>>,
    checker_factory: Option<CheckerFactory>,
}

impl Default for SandlotOptions {
    fn default() -> Self {
        Self {
            shared_modules: Vec::new(),
            cdn_base: DEFAULT_CDN_BASE.to_string(),
            ts_version: DEFAULT_TS_VERSION.to_string(),
            libs: DEFAULT_BROWSER_LIBS.iter().map(|s| s.to_string()).collect(),
            cache_dir: None,
            module_cdn: None,
            lib_cdn: None,
            type_store: None,
            lib_store: None,
            bundler: None,
            loader: None,
            checker_factory: None,
        }
    }
}

impl SandlotOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_shared_module(mut self, id: impl Into<String>, module: serde_json::Value) -> Self {
        self.shared_modules.push((id.into(), module));
        self
    }

    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_module_cdn(mut self, cdn: Arc<dyn ModuleCdn>) -> Self {
        self.module_cdn = Some(cdn);
        self
    }

    #[must_use]
    pub fn with_lib_cdn(mut self, cdn: Arc<dyn LibCdn>) -> Self {
        self.lib_cdn = Some(cdn);
        self
    }

    #[must_use]
    pub fn with_type_store(mut self, store: Arc<dyn TypeStore>) -> Self {
        self.type_store = Some(store);
        self
    }

    #[must_use]
    pub fn with_lib_store(mut self, store: Arc<dyn LibStore>) -> Self {
        self.lib_store = Some(store);
        self
    }

    #[must_use]
    pub fn with_bundler(mut self, bundler: Arc<dyn Bundler>) -> Self {
        self.bundler = Some(bundler);
        self
    }

    #[must_use]
    pub fn with_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    #[must_use]
    pub fn with_checker_factory(mut self, factory: CheckerFactory) -> Self {
        self.checker_factory = Some(factory);
        self
    }
}

/// Cross-sandbox services, assembled once per sandlot.
pub(crate) struct Services {
    pub registry: Arc<SharedModuleRegistry>,
    pub types_resolver: TypesResolver,
    pub lib_resolver: LibResolver,
    pub bundler: Arc<dyn Bundler>,
    pub loader: Arc<dyn ModuleLoader>,
    pub cdn_base: String,
    pub type_store: Arc<dyn TypeStore>,
    pub lib_store: Arc<dyn LibStore>,
}

pub struct Sandlot {
    services: Arc<Services>,
    libs: Vec<String>,
    checker_factory: CheckerFactory,
}

impl Sandlot {
    #[must_use]
    pub fn new(options: SandlotOptions) -> Self {
        let registry = SharedModuleRegistry::new(options.shared_modules);

        let type_store: Arc<dyn TypeStore> = match (&options.type_store, &options.cache_dir) {
            (Some(store), _) => store.clone(),
            (None, Some(dir)) => Arc::new(DiskTypeStore::new(dir.clone())),
            (None, None) => Arc::new(MemoryTypeStore::new()),
        };
        let lib_store: Arc<dyn LibStore> = match (&options.lib_store, &options.cache_dir) {
            (Some(store), _) => store.clone(),
            (None, Some(dir)) => Arc::new(DiskLibStore::new(dir.clone())),
            (None, None) => Arc::new(MemoryLibStore::new()),
        };

        let module_cdn: Arc<dyn ModuleCdn> = options
            .module_cdn
            .unwrap_or_else(|| Arc::new(HttpModuleCdn::new(options.cdn_base.clone())));
        let lib_cdn: Arc<dyn LibCdn> = options
            .lib_cdn
            .unwrap_or_else(|| Arc::new(HttpLibCdn::new()));

        let services = Arc::new(Services {
            registry,
            types_resolver: TypesResolver::new(module_cdn, type_store.clone()),
            lib_resolver: LibResolver::new(lib_cdn, lib_store.clone(), options.ts_version),
            bundler: options
                .bundler
                .unwrap_or_else(|| Arc::new(GraphBundler::new())),
            loader: options
                .loader
                .unwrap_or_else(|| Arc::new(StaticModuleLoader::new())),
            cdn_base: options.cdn_base,
            type_store,
            lib_store,
        });

        let checker_factory = options.checker_factory.unwrap_or_else(|| {
            Box::new(|vfs: Arc<dyn Vfs>, libs| {
                let service = LanguageService::new(vfs);
                service.set_libs(libs);
                Arc::new(service) as Arc<dyn Typechecker>
            })
        });

        Self {
            services,
            libs: options.libs,
            checker_factory,
        }
    }

    /// Create a sandbox: a fresh VFS seeded with an empty `/package.json`,
    /// a long-lived typechecker, and the standard-lib closure prefetched
    /// into the shared cache. Lib fetch failures are logged, not fatal.
    pub async fn create_sandbox(&self) -> Arc<Sandbox> {
        let vfs: Arc<dyn Vfs> = Arc::new(MemoryVfs::new());
        PackageJson::default()
            .save(vfs.as_ref())
            .unwrap_or_else(|error| tracing::warn!(%error, "failed to seed package.json"));

        let lib_names: Vec<&str> = self.libs.iter().map(String::as_str).collect();
        let libs = match self.services.lib_resolver.ensure_libs(&lib_names).await {
            Ok(libs) => libs,
            Err(error) => {
                tracing::warn!(%error, "standard-lib prefetch failed; continuing without libs");
                Default::default()
            }
        };

        let checker = (self.checker_factory)(vfs.clone(), libs);
        Arc::new(Sandbox::new(vfs, self.services.clone(), checker))
    }

    /// The registry shared by every sandbox of this sandlot.
    #[must_use]
    pub fn registry(&self) -> Arc<SharedModuleRegistry> {
        self.services.registry.clone()
    }

    /// Wipe both persistent caches (memory or disk alike).
    pub fn clear_caches(&self) {
        self.services.type_store.clear();
        self.services.lib_store.clear();
    }

    /// Tear down the registry's global binding. Cache state is untouched:
    /// disk caches outlive the sandlot by design.
    pub fn dispose(&self) {
        self.services.registry.dispose();
    }
}
