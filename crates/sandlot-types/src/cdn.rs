//! Module-graph CDN protocol.
//!
//! The resolver speaks to any CDN that serves `GET /<name>@<version>[/path]`
//! and advertises the package's type entry in a response header
//! (`X-TypeScript-Types` by convention). The trait keeps the resolver
//! testable against canned responses; the `reqwest` implementations are the
//! production path.

use async_trait::async_trait;
use thiserror::Error;

/// Header carrying the absolute URL of a package's type entry.
pub const TYPES_HEADER: &str = "x-typescript-types";

#[derive(Debug, Error)]
pub enum CdnError {
    #[error("network failure fetching {url}: {message}")]
    Network { url: String, message: String },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// Outcome of probing a package root on the CDN.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageProbe {
    /// Exact version the CDN resolved the request to.
    pub resolved_version: String,
    /// Absolute URL of the type entry, when the package ships types.
    pub types_url: Option<String>,
}

#[async_trait]
pub trait ModuleCdn: Send + Sync {
    /// Request the package root and report the resolved version plus the
    /// advertised type entry, if any.
    async fn probe(&self, name: &str, version: &str) -> Result<PackageProbe, CdnError>;

    /// Fetch one file by absolute URL.
    async fn fetch_text(&self, url: &str) -> Result<String, CdnError>;

    /// Origin every absolute type URL is rewritten against.
    fn base_url(&self) -> &str;
}

#[async_trait]
pub trait LibCdn: Send + Sync {
    /// Fetch `lib.<name>.d.ts` for one compiler version.
    async fn fetch_lib(&self, ts_version: &str, lib_name: &str) -> Result<String, CdnError>;
}

/// `reqwest`-backed [`ModuleCdn`].
pub struct HttpModuleCdn {
    client: reqwest::Client,
    base: String,
}

impl HttpModuleCdn {
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.into(),
        }
    }
}

#[async_trait]
impl ModuleCdn for HttpModuleCdn {
    async fn probe(&self, name: &str, version: &str) -> Result<PackageProbe, CdnError> {
        let url = format!("{}/{}@{}", self.base, name, version);
        tracing::debug!(url = %url, "probing package");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CdnError::Network {
                url: url.clone(),
                message: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(CdnError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let types_url = response
            .headers()
            .get(TYPES_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| absolutize(&self.base, v));

        // The CDN resolves ranges to exact versions; the final URL (after
        // redirects) and the types URL both carry the pin.
        let final_url = response.url().to_string();
        let resolved_version = types_url
            .as_deref()
            .and_then(|u| extract_version(u, name))
            .or_else(|| extract_version(&final_url, name))
            .unwrap_or_else(|| version.to_string());

        Ok(PackageProbe {
            resolved_version,
            types_url,
        })
    }

    async fn fetch_text(&self, url: &str) -> Result<String, CdnError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CdnError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(CdnError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        response.text().await.map_err(|e| CdnError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn base_url(&self) -> &str {
        &self.base
    }
}

/// `reqwest`-backed [`LibCdn`] serving `lib.<name>.d.ts` files keyed by
/// compiler version.
pub struct HttpLibCdn {
    client: reqwest::Client,
    base: String,
}

impl HttpLibCdn {
    pub const DEFAULT_BASE: &'static str = "https://cdn.jsdelivr.net/npm/typescript";

    #[must_use]
    pub fn new() -> Self {
        Self::with_base(Self::DEFAULT_BASE)
    }

    #[must_use]
    pub fn with_base(base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.into(),
        }
    }
}

impl Default for HttpLibCdn {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LibCdn for HttpLibCdn {
    async fn fetch_lib(&self, ts_version: &str, lib_name: &str) -> Result<String, CdnError> {
        let url = format!("{}@{}/lib/lib.{}.d.ts", self.base, ts_version, lib_name);
        tracing::debug!(url = %url, "fetching ts lib");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CdnError::Network {
                url: url.clone(),
                message: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(CdnError::Status {
                url,
                status: response.status().as_u16(),
            });
        }
        response.text().await.map_err(|e| CdnError::Network {
            url: url.clone(),
            message: e.to_string(),
        })
    }
}

/// Resolve a possibly-relative header value against the CDN origin.
fn absolutize(base: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else if let Some(rest) = url.strip_prefix('/') {
        format!("{base}/{rest}")
    } else {
        format!("{base}/{url}")
    }
}

/// Pull the exact version out of a CDN URL for `name`, tolerating a
/// `@types/` relocation and path prefixes like `/v135`.
pub(crate) fn extract_version(url: &str, name: &str) -> Option<String> {
    let needles = [format!("/{name}@"), format!("/{}@", types_package_name(name))];
    for needle in &needles {
        if let Some(idx) = url.find(needle.as_str()) {
            let rest = &url[idx + needle.len()..];
            let version: &str = rest.split('/').next().unwrap_or(rest);
            if !version.is_empty() {
                return Some(version.to_string());
            }
        }
    }
    None
}

/// DefinitelyTyped package name for a runtime package:
/// `react` -> `@types/react`, `@tanstack/react-query` ->
/// `@types/tanstack__react-query`.
#[must_use]
pub fn types_package_name(name: &str) -> String {
    match name.strip_prefix('@') {
        Some(scoped) => format!("@types/{}", scoped.replacen('/', "__", 1)),
        None => format!("@types/{name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_package_names() {
        assert_eq!(types_package_name("react"), "@types/react");
        assert_eq!(
            types_package_name("@tanstack/react-query"),
            "@types/tanstack__react-query"
        );
    }

    #[test]
    fn extracts_versions_from_cdn_urls() {
        assert_eq!(
            extract_version("https://esm.sh/nanoid@5.1.6/index.d.ts", "nanoid"),
            Some("5.1.6".to_string())
        );
        assert_eq!(
            extract_version("https://esm.sh/v135/@types/react@18.2.0/index.d.ts", "react"),
            Some("18.2.0".to_string())
        );
        assert_eq!(extract_version("https://esm.sh/other@1.0.0", "nanoid"), None);
    }

    #[test]
    fn absolutize_handles_relative_headers() {
        assert_eq!(
            absolutize("https://esm.sh", "/v135/nanoid@5.1.6/index.d.ts"),
            "https://esm.sh/v135/nanoid@5.1.6/index.d.ts"
        );
        assert_eq!(
            absolutize("https://esm.sh", "https://esm.sh/x.d.ts"),
            "https://esm.sh/x.d.ts"
        );
    }
}
