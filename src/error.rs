//! Error types for artifact resolution.
//!
//! Every library operation returns [`Result<T>`]. Lower layers (directory,
//! archive index, cache store, extractor) raise specific kinds; the
//! [`Resolver`](crate::resolver::Resolver) wraps anything that goes wrong on
//! the archive branch of a load in [`ResolveError::Archive`], keeping the
//! original kind boxed inside so callers can still inspect it through
//! [`ResolveError::root_cause`].

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// All failures the resolver and its collaborators can report.
#[derive(Error, Debug)]
pub enum ResolveError {
    // Remote directory / listing
    #[error("project directory unreachable: {0}")]
    RemoteUnavailable(String),

    #[error("archive listing unreachable: {0}")]
    ArchiveListUnavailable(String),

    #[error("failed to decode {what}: {detail}")]
    DecodeFailed { what: String, detail: String },

    #[error("no archive available for project '{0}'")]
    ProjectNotFound(String),

    #[error("failed to build HTTP client: {0}")]
    ClientSetup(String),

    // Download
    #[error("download of {url} failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("already cached: {0}")]
    AlreadyExists(PathBuf),

    // Archive extraction
    #[error("cannot open archive {path}: {reason}")]
    ArchiveOpenFailed { path: PathBuf, reason: String },

    #[error("'{member}' not found in archive {archive}")]
    MemberNotFound { member: String, archive: PathBuf },

    #[error("'{member}' exceeds the {limit} byte extraction limit")]
    MemberTooLarge { member: String, limit: u64 },

    #[error("failed to write extracted member to {path}: {source}")]
    ExtractWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Cache store
    #[error("not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid cache path '{0}'")]
    InvalidPath(String),

    #[error("cache root does not exist: {0}")]
    InvalidRoot(PathBuf),

    #[error("failed to clear cache at {path}: {source}")]
    ClearFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Degraded direct-site profile
    #[error("not implemented: {0}")]
    Unimplemented(String),

    /// A failure on the archive branch of a load. The boxed value is the
    /// original error.
    #[error("error reading archive: {0}")]
    Archive(#[source] Box<ResolveError>),
}

impl ResolveError {
    pub(crate) fn decode(what: impl Into<String>, err: serde_json::Error) -> Self {
        ResolveError::DecodeFailed {
            what: what.into(),
            detail: err.to_string(),
        }
    }

    /// Wrap as an archive-branch failure. Already wrapped errors are returned
    /// unchanged.
    pub(crate) fn into_archive(self) -> Self {
        match self {
            ResolveError::Archive(_) => self,
            other => ResolveError::Archive(Box::new(other)),
        }
    }

    /// The innermost error, looking through any [`ResolveError::Archive`]
    /// wrappers.
    pub fn root_cause(&self) -> &ResolveError {
        let mut current = self;
        while let ResolveError::Archive(inner) = current {
            current = inner;
        }
        current
    }

    /// True for errors that mean "the requested artifact does not exist",
    /// whether reported by the cache or by the archive.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.root_cause(),
            ResolveError::NotFound(_)
                | ResolveError::MemberNotFound { .. }
                | ResolveError::ProjectNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_cause_looks_through_archive_wrapper() {
        let err = ResolveError::ProjectNotFound("saao/saa13".to_string()).into_archive();
        assert!(matches!(err, ResolveError::Archive(_)));
        assert!(matches!(
            err.root_cause(),
            ResolveError::ProjectNotFound(p) if p == "saao/saa13"
        ));
    }

    #[test]
    fn into_archive_does_not_double_wrap() {
        let err = ResolveError::NotFound(PathBuf::from("x")).into_archive();
        let again = err.into_archive();
        match again {
            ResolveError::Archive(inner) => {
                assert!(matches!(*inner, ResolveError::NotFound(_)))
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn member_not_found_counts_as_not_found() {
        let err = ResolveError::MemberNotFound {
            member: "a/corpusjson/P1.json".to_string(),
            archive: PathBuf::from("a.zip"),
        }
        .into_archive();
        assert!(err.is_not_found());
        assert!(!ResolveError::Unimplemented("x".into()).is_not_found());
    }

    #[test]
    fn archive_message_carries_cause() {
        let err = ResolveError::ProjectNotFound("cams/gkab".to_string()).into_archive();
        assert_eq!(
            err.to_string(),
            "error reading archive: no archive available for project 'cams/gkab'"
        );
    }
}
