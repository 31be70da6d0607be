//! Type-definition acquisition for the sandlot build core.
//!
//! Installing a package in a sandbox does not download executable code; it
//! pins a version and fetches the package's `.d.ts` tree from a module-graph
//! CDN so the typechecker can see the package's surface. This crate owns
//! that pipeline: the CDN protocol, the transitive crawl with peer-type
//! discovery, the URL-to-bare-specifier rewrite that makes cached trees
//! portable, TypeScript lib closure fetching, and the two persistent caches.

pub mod cdn;
pub mod libs;
pub mod resolver;
pub mod store;

mod scan;

pub use cdn::{CdnError, HttpLibCdn, HttpModuleCdn, LibCdn, ModuleCdn, PackageProbe};
pub use libs::{DEFAULT_BROWSER_LIBS, LibResolver, parse_lib_references};
pub use resolver::{PeerTypeDep, ResolvedTypes, TypesError, TypesResolver};
pub use store::{
    DiskLibStore, DiskTypeStore, LibStore, MemoryLibStore, MemoryTypeStore, TypeStore,
};

/// TypeScript compiler version the lib cache is keyed by.
pub const DEFAULT_TS_VERSION: &str = "5.8.3";

/// Module-graph CDN the default HTTP client points at.
pub const DEFAULT_CDN_BASE: &str = "https://esm.sh";

#[cfg(test)]
#[path = "tests/resolver_tests.rs"]
mod resolver_tests;
#[cfg(test)]
#[path = "tests/libs_tests.rs"]
mod libs_tests;
#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod store_tests;
