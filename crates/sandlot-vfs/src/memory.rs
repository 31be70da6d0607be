//! In-memory [`Vfs`] implementation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use sandlot_common::paths;

use crate::{DirEntry, EntryKind, Metadata, Vfs, VfsError, VfsResult};

#[derive(Default)]
struct Tree {
    files: BTreeMap<String, String>,
    /// Directories materialized by `mkdir`; implicit directories are derived
    /// from file paths.
    dirs: BTreeSet<String>,
}

impl Tree {
    fn dir_exists(&self, dir: &str) -> bool {
        if dir == "/" {
            return true;
        }
        if self.dirs.iter().any(|d| paths::is_within(d, dir)) {
            return true;
        }
        self.files.keys().any(|f| paths::is_within(f, dir) && f != dir)
    }
}

/// The default VFS: a locked tree of path -> text.
///
/// Reads take the lock shared, writes take it exclusive, which gives the
/// single-writer / concurrent-reader contract for free.
#[derive(Default)]
pub struct MemoryVfs {
    tree: RwLock<Tree>,
}

impl MemoryVfs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a VFS from `(path, contents)` pairs; handy in tests.
    #[must_use]
    pub fn with_files<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: Into<String>,
    {
        let vfs = Self::new();
        {
            let mut tree = vfs.tree.write().unwrap_or_else(|e| e.into_inner());
            for (path, contents) in files {
                tree.files
                    .insert(paths::normalize(path.as_ref()), contents.into());
            }
        }
        vfs
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tree> {
        self.tree.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tree> {
        self.tree.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Vfs for MemoryVfs {
    fn read_file(&self, path: &str) -> VfsResult<String> {
        let path = paths::normalize(path);
        let tree = self.read();
        match tree.files.get(&path) {
            Some(text) => Ok(text.clone()),
            None if tree.dir_exists(&path) => Err(VfsError::PathIsDirectory(path)),
            None => Err(VfsError::FileNotFound(path)),
        }
    }

    fn write_file(&self, path: &str, contents: &str) -> VfsResult<()> {
        let path = paths::normalize(path);
        let mut tree = self.write();
        if !tree.files.contains_key(&path) && tree.dir_exists(&path) {
            return Err(VfsError::PathIsDirectory(path));
        }
        tracing::trace!(path = %path, bytes = contents.len(), "vfs write");
        tree.files.insert(path, contents.to_string());
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        let path = paths::normalize(path);
        let tree = self.read();
        tree.files.contains_key(&path) || tree.dir_exists(&path)
    }

    fn stat(&self, path: &str) -> VfsResult<Metadata> {
        let path = paths::normalize(path);
        let tree = self.read();
        if let Some(text) = tree.files.get(&path) {
            return Ok(Metadata {
                kind: EntryKind::File,
                size: text.len() as u64,
            });
        }
        if tree.dir_exists(&path) {
            return Ok(Metadata {
                kind: EntryKind::Directory,
                size: 0,
            });
        }
        Err(VfsError::FileNotFound(path))
    }

    fn mkdir(&self, path: &str) -> VfsResult<()> {
        let path = paths::normalize(path);
        let mut tree = self.write();
        if tree.files.contains_key(&path) {
            return Err(VfsError::NotADirectory(path));
        }
        if path != "/" {
            tree.dirs.insert(path);
        }
        Ok(())
    }

    fn rm(&self, path: &str) -> VfsResult<()> {
        let path = paths::normalize(path);
        let mut tree = self.write();
        if tree.files.remove(&path).is_some() {
            return Ok(());
        }
        if !tree.dir_exists(&path) {
            return Err(VfsError::FileNotFound(path));
        }
        tree.files.retain(|f, _| !paths::is_within(f, &path));
        tree.dirs.retain(|d| !paths::is_within(d, &path));
        Ok(())
    }

    fn list(&self, dir: &str) -> VfsResult<Vec<DirEntry>> {
        let dir = paths::normalize(dir);
        let tree = self.read();
        if tree.files.contains_key(&dir) {
            return Err(VfsError::NotADirectory(dir));
        }
        if !tree.dir_exists(&dir) {
            return Err(VfsError::FileNotFound(dir));
        }

        let prefix = if dir == "/" {
            String::from("/")
        } else {
            format!("{dir}/")
        };
        let mut names: BTreeMap<String, EntryKind> = BTreeMap::new();
        for file in tree.files.keys() {
            if let Some(rest) = file.strip_prefix(&prefix) {
                match rest.split_once('/') {
                    Some((head, _)) => {
                        names.insert(head.to_string(), EntryKind::Directory);
                    }
                    None => {
                        names.entry(rest.to_string()).or_insert(EntryKind::File);
                    }
                }
            }
        }
        for d in &tree.dirs {
            if let Some(rest) = d.strip_prefix(&prefix) {
                let head = rest.split('/').next().unwrap_or(rest);
                if !head.is_empty() {
                    names.insert(head.to_string(), EntryKind::Directory);
                }
            }
        }

        Ok(names
            .into_iter()
            .map(|(name, kind)| DirEntry { name, kind })
            .collect())
    }
}
