//! Member extraction from project zip archives.
//!
//! Archives are opened from disk for every call; nothing is held open between
//! loads. Decompressed member data is streamed in fixed-size chunks, either
//! to a callback ([`extract_with`]), into memory ([`extract_to_memory`]), or
//! to a file ([`extract_to_file`]). Every read is bounded by a size ceiling.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::cache_store::{persist_new, staging_file};
use crate::error::{ResolveError, Result};

const CHUNK_SIZE: usize = 64 * 1024;

/// Opens archives and extracts members, enforcing a per-member size limit.
#[derive(Debug, Clone, Copy)]
pub struct Extractor {
    max_member_bytes: u64,
}

impl Extractor {
    pub fn new(max_member_bytes: u64) -> Self {
        Self { max_member_bytes }
    }

    pub fn max_member_bytes(&self) -> u64 {
        self.max_member_bytes
    }

    /// Names of every file member, sorted.
    pub fn list_members(&self, archive_path: &Path) -> Result<Vec<String>> {
        let archive = open_archive(archive_path)?;
        let mut names: Vec<String> = archive
            .file_names()
            .filter(|n| !n.ends_with('/'))
            .map(|n| n.to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Stream `member` out of the archive, handing each decompressed chunk to
    /// `consume`. Returns the total number of bytes produced.
    pub fn extract_with<F>(&self, member: &str, archive_path: &Path, mut consume: F) -> Result<u64>
    where
        F: FnMut(&[u8]) -> std::io::Result<()>,
    {
        let mut archive = open_archive(archive_path)?;
        let file = archive.by_name(member).map_err(|e| match e {
            ZipError::FileNotFound => ResolveError::MemberNotFound {
                member: member.to_string(),
                archive: archive_path.to_path_buf(),
            },
            other => ResolveError::ArchiveOpenFailed {
                path: archive_path.to_path_buf(),
                reason: other.to_string(),
            },
        })?;

        // One byte past the limit tells "exactly at the limit" from "over".
        let mut reader = file.take(self.max_member_bytes.saturating_add(1));
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut total = 0u64;
        loop {
            let n = reader.read(&mut buf).map_err(|e| ResolveError::ArchiveOpenFailed {
                path: archive_path.to_path_buf(),
                reason: format!("reading '{}': {}", member, e),
            })?;
            if n == 0 {
                break;
            }
            total += n as u64;
            if total > self.max_member_bytes {
                return Err(ResolveError::MemberTooLarge {
                    member: member.to_string(),
                    limit: self.max_member_bytes,
                });
            }
            consume(&buf[..n]).map_err(|source| ResolveError::ExtractWriteFailed {
                path: PathBuf::from(member),
                source,
            })?;
        }
        debug!(
            "Extracted {} ({} bytes) from {}",
            member,
            total,
            archive_path.display()
        );
        Ok(total)
    }

    /// Decompress `member` into memory.
    pub fn extract_to_memory(&self, member: &str, archive_path: &Path) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.extract_with(member, archive_path, |chunk| {
            data.extend_from_slice(chunk);
            Ok(())
        })?;
        Ok(data)
    }

    /// Decompress `member` to `destination`, creating parent directories.
    ///
    /// The member is staged in a uniquely named file next to `destination`
    /// and moved into place only if nothing is there yet; otherwise the
    /// result is [`ResolveError::AlreadyExists`] and the existing file is
    /// left untouched.
    pub fn extract_to_file(
        &self,
        member: &str,
        archive_path: &Path,
        destination: &Path,
    ) -> Result<PathBuf> {
        let write_failed = |source: io::Error| ResolveError::ExtractWriteFailed {
            path: destination.to_path_buf(),
            source,
        };

        let parent = destination.parent().unwrap_or_else(|| Path::new(""));
        fs::create_dir_all(parent).map_err(write_failed)?;
        let mut staged = staging_file(parent).map_err(write_failed)?;

        self.extract_with(member, archive_path, |chunk| staged.write_all(chunk))
            .map_err(|err| match err {
                // extract_with only knows the member name
                ResolveError::ExtractWriteFailed { source, .. } => write_failed(source),
                other => other,
            })?;
        staged.flush().map_err(write_failed)?;

        match persist_new(staged, destination) {
            Ok(()) => Ok(destination.to_path_buf()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(ResolveError::AlreadyExists(destination.to_path_buf()))
            }
            Err(e) => Err(write_failed(e)),
        }
    }
}

fn open_archive(archive_path: &Path) -> Result<ZipArchive<File>> {
    let open_failed = |reason: String| ResolveError::ArchiveOpenFailed {
        path: archive_path.to_path_buf(),
        reason,
    };
    let file = File::open(archive_path).map_err(|e| open_failed(e.to_string()))?;
    ZipArchive::new(file).map_err(|e| open_failed(e.to_string()))
}
