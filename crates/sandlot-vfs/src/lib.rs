//! Virtual filesystem for the sandlot build pipeline.
//!
//! The VFS is a synchronous, string-keyed tree of UTF-8 text files under
//! absolute POSIX paths. It is the single source of truth for everything the
//! pipeline compiles: project sources, `/package.json`, `/tsconfig.json`,
//! and the `.d.ts` trees the types resolver installs under `/node_modules`.
//!
//! Directories are implicit (a directory exists iff a file lives under it)
//! but `mkdir` can also materialize empty ones. Every successful write is
//! immediately visible to every later read.
//!
//! Two decorators layer on top of any [`Vfs`]: a line-addressed read
//! ([`read_numbered`]) and a targeted string-replacement edit
//! ([`edit_file`]).

mod edit;
mod memory;
mod numbered;

pub use edit::{EditError, EditRequest, edit_file};
pub use memory::MemoryVfs;
pub use numbered::{ReadOptions, read_numbered};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VfsError {
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("path is a directory: {0}")]
    PathIsDirectory(String),
}

pub type VfsResult<T> = Result<T, VfsError>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Metadata for a single path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    pub kind: EntryKind,
    /// Size in bytes; zero for directories.
    pub size: u64,
}

/// One entry of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// The filesystem contract the pipeline builds on.
///
/// All operations are synchronous and normalize their path arguments.
/// Implementations must allow concurrent reads; writes are serialized.
pub trait Vfs: Send + Sync {
    fn read_file(&self, path: &str) -> VfsResult<String>;
    fn write_file(&self, path: &str, contents: &str) -> VfsResult<()>;
    fn exists(&self, path: &str) -> bool;
    fn stat(&self, path: &str) -> VfsResult<Metadata>;
    fn mkdir(&self, path: &str) -> VfsResult<()>;
    /// Remove a file, or a directory and everything under it.
    fn rm(&self, path: &str) -> VfsResult<()>;
    /// Immediate children of a directory, sorted by name.
    fn list(&self, dir: &str) -> VfsResult<Vec<DirEntry>>;
}

#[cfg(test)]
#[path = "tests/vfs_tests.rs"]
mod vfs_tests;
