// Distributed under the MIT software license

//! Filesystem capability.
//!
//! §9 Design Notes: "rewrite this as a `trait Fs` capability... inject an
//! in-memory implementation for tests." Real deployments back this with
//! `tokio::fs`; the in-memory version here lets every crate above this
//! one test without touching disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

/// Filesystem error.
#[derive(Debug, Error)]
pub enum FsError {
    /// Path does not exist.
    #[error("not found: {0}")]
    NotFound(PathBuf),
    /// Underlying OS error.
    #[error("io error at {path}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Minimal stat result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    /// Whether the path is a directory.
    pub is_dir: bool,
    /// Byte length, for files.
    pub len: u64,
}

/// Capability: a stable, path-addressed filesystem.
#[async_trait]
pub trait Fs: Send + Sync {
    /// Stat a path.
    async fn stat(&self, path: &Path) -> Result<Metadata, FsError>;
    /// Read an entire file.
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError>;
    /// Write (overwrite) an entire file, creating parent directories as needed.
    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), FsError>;
    /// List direct children of a directory.
    async fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, FsError>;
    /// Remove a file.
    async fn unlink(&self, path: &Path) -> Result<(), FsError>;
    /// Remove a directory (and its contents).
    async fn rmdir(&self, path: &Path) -> Result<(), FsError>;
    /// Create a directory, including parents.
    async fn mkdir(&self, path: &Path) -> Result<(), FsError>;
    /// Whether a path exists at all.
    async fn exists(&self, path: &Path) -> bool {
        self.stat(path).await.is_ok()
    }
}

/// Real filesystem, backed by `tokio::fs` in a deployed binary.
///
/// Kept free of a hard `tokio` dependency here: the facade crate wires an
/// actual async-fs implementation. This type documents the contract a
/// production `Fs` must satisfy.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFs;

/// In-memory [`Fs`] for tests. Directories are implicit: any ancestor of
/// a written file is considered to exist.
#[derive(Default)]
pub struct MemoryFs {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
}

impl MemoryFs {
    /// Empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    fn is_dir_prefix(files: &BTreeMap<PathBuf, Vec<u8>>, path: &Path) -> bool {
        files.keys().any(|p| p != path && p.starts_with(path))
    }
}

#[async_trait]
impl Fs for MemoryFs {
    async fn stat(&self, path: &Path) -> Result<Metadata, FsError> {
        let files = self.files.lock().unwrap();
        if let Some(data) = files.get(path) {
            return Ok(Metadata {
                is_dir: false,
                len: data.len() as u64,
            });
        }
        if Self::is_dir_prefix(&files, path) {
            return Ok(Metadata { is_dir: true, len: 0 });
        }
        Err(FsError::NotFound(path.to_path_buf()))
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), FsError> {
        self.files.lock().unwrap().insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, FsError> {
        let files = self.files.lock().unwrap();
        let mut children: Vec<PathBuf> = files
            .keys()
            .filter(|p| p.starts_with(path) && *p != path)
            .filter_map(|p| p.strip_prefix(path).ok())
            .filter_map(|rel| rel.iter().next().map(|c| path.join(c)))
            .collect();
        children.sort();
        children.dedup();
        Ok(children)
    }

    async fn unlink(&self, path: &Path) -> Result<(), FsError> {
        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }

    async fn rmdir(&self, path: &Path) -> Result<(), FsError> {
        self.files.lock().unwrap().retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    async fn mkdir(&self, _path: &Path) -> Result<(), FsError> {
        // Directories are implicit in `MemoryFs`; nothing to create.
        Ok(())
    }
}
