//! Build pipeline result types.

use std::sync::Arc;

use sandlot_common::diagnostics::{BundleError, BundleWarning, CheckOutcome};

use crate::loader::LoadedModule;

#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    /// Entry point; defaults to `/package.json` `main`, else `/index.ts`.
    pub entry: Option<String>,
    pub skip_typecheck: bool,
    pub minify: bool,
    /// Run the host's post-bundle hook (the Tailwind seam).
    pub tailwind: bool,
}

/// A successful build, published as `lastBuild` and to subscribers.
#[derive(Clone, Debug)]
pub struct BuildSuccess {
    pub entry: String,
    pub code: String,
    pub warnings: Vec<BundleWarning>,
    pub included_files: Vec<String>,
    pub module: Arc<LoadedModule>,
}

/// A failed build. Each variant is one pipeline phase; a failure at phase
/// `P` guarantees no later phase ran and `lastBuild` is untouched.
#[derive(Clone, Debug, thiserror::Error)]
pub enum BuildFailure {
    #[error("entry point not found: {message}")]
    Entry { message: String },
    #[error("typecheck failed with {} diagnostic(s)", outcome.diagnostics.len())]
    Typecheck { outcome: CheckOutcome },
    #[error("bundling failed with {} error(s)", errors.len())]
    Bundle { errors: Vec<BundleError> },
    #[error("load failed: {message}")]
    Load { message: String },
    #[error("validation failed: {message}")]
    Validate { message: String },
}

impl BuildFailure {
    /// The failing phase, as the stable public string.
    #[must_use]
    pub fn phase(&self) -> &'static str {
        match self {
            BuildFailure::Entry { .. } => "entry",
            BuildFailure::Typecheck { .. } => "typecheck",
            BuildFailure::Bundle { .. } => "bundle",
            BuildFailure::Load { .. } => "load",
            BuildFailure::Validate { .. } => "validate",
        }
    }
}
