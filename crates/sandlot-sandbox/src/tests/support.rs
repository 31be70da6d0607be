//! Canned CDNs and sandlot wiring for sandbox tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use sandlot_types::{CdnError, LibCdn, ModuleCdn, PackageProbe};

use crate::sandlot::{Sandlot, SandlotOptions};

pub(crate) const TEST_CDN: &str = "https://cdn.test";

#[derive(Default)]
pub(crate) struct CannedCdn {
    probes: HashMap<String, PackageProbe>,
    files: HashMap<String, String>,
}

impl CannedCdn {
    pub(crate) fn probe(
        mut self,
        name: &str,
        version: &str,
        resolved: &str,
        types_url: Option<&str>,
    ) -> Self {
        self.probes.insert(
            format!("{name}@{version}"),
            PackageProbe {
                resolved_version: resolved.to_string(),
                types_url: types_url.map(str::to_string),
            },
        );
        self
    }

    pub(crate) fn file(mut self, url: &str, text: &str) -> Self {
        self.files.insert(url.to_string(), text.to_string());
        self
    }
}

#[async_trait]
impl ModuleCdn for CannedCdn {
    async fn probe(&self, name: &str, version: &str) -> Result<PackageProbe, CdnError> {
        self.probes
            .get(&format!("{name}@{version}"))
            .cloned()
            .ok_or_else(|| CdnError::Status {
                url: format!("{TEST_CDN}/{name}@{version}"),
                status: 404,
            })
    }

    async fn fetch_text(&self, url: &str) -> Result<String, CdnError> {
        self.files.get(url).cloned().ok_or_else(|| CdnError::Status {
            url: url.to_string(),
            status: 404,
        })
    }

    fn base_url(&self) -> &str {
        TEST_CDN
    }
}

pub(crate) struct CannedLibCdn;

#[async_trait]
impl LibCdn for CannedLibCdn {
    async fn fetch_lib(&self, _ts_version: &str, lib_name: &str) -> Result<String, CdnError> {
        Ok(format!("// lib.{lib_name}.d.ts\ninterface __Lib {{}}\n"))
    }
}

/// A sandlot against canned CDNs with the standard in-crate services.
pub(crate) fn sandlot(cdn: CannedCdn, options: SandlotOptions) -> Sandlot {
    let options = options
        .with_module_cdn(Arc::new(cdn))
        .with_lib_cdn(Arc::new(CannedLibCdn));
    let mut options = options;
    options.cdn_base = TEST_CDN.to_string();
    Sandlot::new(options)
}

/// The canned `nanoid` package used across tests.
pub(crate) fn nanoid_cdn() -> CannedCdn {
    CannedCdn::default()
        .probe(
            "nanoid",
            "5.1.6",
            "5.1.6",
            Some("https://cdn.test/nanoid@5.1.6/index.d.ts"),
        )
        .file(
            "https://cdn.test/nanoid@5.1.6/index.d.ts",
            "export declare function nanoid(size?: number): string;\n",
        )
}
