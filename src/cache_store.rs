//! Directory-backed cache of project archives and extracted members.
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   saao-saa13.zip              # one archive per project, written once
//!   saao/saa13/catalogue.json   # optional extracted members, mirroring
//!   saao/saa13/gloss-akk.json   # the logical artifact path
//! ```
//!
//! Paths passed to the store are relative to the root and may only contain
//! normal components. Archives are never overwritten: a write to a populated
//! path fails with [`ResolveError::AlreadyExists`].

use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{ResolveError, Result};

/// Directory name of the default cache root under the system temp directory.
pub const DEFAULT_CACHE_DIR: &str = "oracc-json-cache";

/// One file found in the cache.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Path relative to the cache root, `/`-separated.
    pub relative_path: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Open the default root (`<tmp>/oracc-json-cache`), creating it if absent.
    pub fn open_default() -> Result<Self> {
        let root = std::env::temp_dir().join(DEFAULT_CACHE_DIR);
        fs::create_dir_all(&root).map_err(|source| ResolveError::WriteFailed {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    /// Open a user-supplied root. The directory must already exist.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ResolveError::InvalidRoot(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Point the store at another existing directory.
    pub fn set_root(&mut self, root: impl Into<PathBuf>) -> Result<()> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ResolveError::InvalidRoot(root));
        }
        debug!("Cache root set to {}", root.display());
        self.root = root;
        Ok(())
    }

    /// Absolute location of `relative` inside the root.
    pub fn path_for(&self, relative: &str) -> Result<PathBuf> {
        let rel = Path::new(relative);
        if relative.is_empty() || !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(ResolveError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(rel))
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path_for(relative)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    pub fn read_bytes(&self, relative: &str) -> Result<Vec<u8>> {
        let path = self.path_for(relative)?;
        if !path.is_file() {
            return Err(ResolveError::NotFound(path));
        }
        fs::read(&path).map_err(|source| ResolveError::ReadFailed { path, source })
    }

    /// Write `bytes` to `relative`, refusing to replace an existing file.
    ///
    /// Data goes to a uniquely named staging file in the destination
    /// directory and is moved into place only if the destination is still
    /// empty. Of several concurrent writers exactly one succeeds; the others
    /// get [`ResolveError::AlreadyExists`].
    pub fn write_bytes(&self, relative: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(relative)?;
        if path.exists() {
            return Err(ResolveError::AlreadyExists(path));
        }
        let parent = path.parent().unwrap_or(self.root.as_path());
        fs::create_dir_all(parent).map_err(|source| ResolveError::WriteFailed {
            path: parent.to_path_buf(),
            source,
        })?;

        let write_failed = |source: io::Error| ResolveError::WriteFailed {
            path: path.clone(),
            source,
        };
        let mut staged = staging_file(parent).map_err(write_failed)?;
        staged.write_all(bytes).map_err(write_failed)?;
        match persist_new(staged, &path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(ResolveError::AlreadyExists(path));
            }
            Err(e) => return Err(write_failed(e)),
        }
        debug!("Cached {} bytes at {}", bytes.len(), path.display());
        Ok(path)
    }

    /// Remove everything under the root and recreate it empty.
    pub fn clear(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root).map_err(|source| ResolveError::ClearFailed {
                path: self.root.clone(),
                source,
            })?;
        }
        fs::create_dir_all(&self.root).map_err(|source| ResolveError::ClearFailed {
            path: self.root.clone(),
            source,
        })?;
        info!("Cleared cache at {}", self.root.display());
        Ok(())
    }

    /// Every file currently cached, sorted by relative path.
    pub fn entries(&self) -> Result<Vec<CacheEntry>> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1) {
            let entry = entry.map_err(|e| ResolveError::ReadFailed {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone()),
                source: e.into(),
            })?;
            if !entry.file_type().is_file()
                || entry.file_name().to_string_lossy().ends_with(STAGING_SUFFIX)
            {
                continue;
            }
            let metadata = entry.metadata().map_err(|e| ResolveError::ReadFailed {
                path: entry.path().to_path_buf(),
                source: e.into(),
            })?;
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path())
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            entries.push(CacheEntry {
                relative_path: relative,
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }
        entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(entries)
    }
}

/// Suffix of in-flight staging files. They are skipped by [`CacheStore::entries`].
pub(crate) const STAGING_SUFFIX: &str = ".part";

/// A new, uniquely named staging file in `dir`. It is deleted on drop unless
/// persisted.
pub(crate) fn staging_file(dir: &Path) -> io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(".")
        .suffix(STAGING_SUFFIX)
        .tempfile_in(dir)
}

/// Move `staged` to `destination` unless something is already there. Fails
/// with [`io::ErrorKind::AlreadyExists`] in that case and removes the
/// staging file.
pub(crate) fn persist_new(staged: NamedTempFile, destination: &Path) -> io::Result<()> {
    staged
        .persist_noclobber(destination)
        .map(|_| ())
        .map_err(|e| e.error)
}
