//! Repository fetching.
//!
//! A [`Fetcher`] turns a [`RepositoryReference`] into a local directory.
//! Local paths are used in place; archives are downloaded and extracted
//! under the external directory, once. A directory that is already
//! populated is reused without touching the network, which keeps repeated
//! runs idempotent.

pub mod archive;
pub mod path;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::repository::{RepositoryOrigin, RepositoryReference};
use crate::util::fs::is_non_empty_dir;

/// Why a repository could not be materialized.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to download {url}: {message}")]
    Network { url: String, message: String },

    #[error("failed to download {url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("unsupported archive format: {url}")]
    ArchiveFormat { url: String },

    #[error("failed to extract {url}: {message}")]
    Extraction { url: String, message: String },

    #[error("checksum mismatch for {url}:\n  expected: {expected}\n  actual:   {actual}")]
    Checksum {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("path does not exist: {}", path.display())]
    MissingPath { path: PathBuf },

    #[error("offline mode: refusing to download {url}")]
    Offline { url: String },

    #[error("no URLs given")]
    NoUrls,

    #[error("version-control repositories are not supported ({remote})")]
    VersionControl { remote: String },
}

impl FetchError {
    /// Whether the repository can be skipped and conversion continue.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FetchError::VersionControl { .. })
    }
}

/// Materializes repositories.
pub trait Fetcher {
    /// Produce a local directory holding `reference`'s contents.
    ///
    /// `external_dir` is where downloaded repositories live.
    fn fetch(
        &self,
        reference: &RepositoryReference,
        external_dir: &Path,
    ) -> Result<PathBuf, FetchError>;
}

/// Fetcher backed by the filesystem and a blocking HTTP client.
#[derive(Debug, Clone, Default)]
pub struct DefaultFetcher {
    offline: bool,
}

impl DefaultFetcher {
    pub fn new(offline: bool) -> Self {
        DefaultFetcher { offline }
    }
}

impl Fetcher for DefaultFetcher {
    fn fetch(
        &self,
        reference: &RepositoryReference,
        external_dir: &Path,
    ) -> Result<PathBuf, FetchError> {
        match &reference.origin {
            RepositoryOrigin::LocalPath { path } => path::fetch_local(path, &reference.parent),

            RepositoryOrigin::Archive {
                urls,
                strip_prefix,
                sha256,
            } => {
                let dest = external_dir.join(&reference.name);
                if is_non_empty_dir(&dest) {
                    tracing::debug!("Using materialized {} at {}", reference, dest.display());
                    return Ok(dest);
                }

                let mut last_error = FetchError::NoUrls;
                for url in urls {
                    match archive::fetch_archive(
                        url,
                        &dest,
                        strip_prefix.as_deref(),
                        sha256.as_deref(),
                        self.offline,
                    ) {
                        Ok(()) => return Ok(dest),
                        Err(e) => {
                            tracing::debug!("{}: {}", reference, e);
                            last_error = e;
                        }
                    }
                }
                Err(last_error)
            }

            RepositoryOrigin::Git { remote } => Err(FetchError::VersionControl {
                remote: remote.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_materialized_archive_is_reused_offline() {
        let tmp = TempDir::new().unwrap();
        let external = tmp.path().join("external");
        fs::create_dir_all(external.join("zlib")).unwrap();
        fs::write(external.join("zlib/BUILD"), "").unwrap();

        let reference = RepositoryReference::archive(
            "zlib",
            vec!["https://example.invalid/zlib.tar.gz".into()],
            None,
            None,
            tmp.path(),
        );

        let dir = DefaultFetcher::new(true).fetch(&reference, &external).unwrap();
        assert_eq!(dir, external.join("zlib"));
    }

    #[test]
    fn test_urls_tried_in_order() {
        let tmp = TempDir::new().unwrap();
        let external = tmp.path().join("external");

        let reference = RepositoryReference::archive(
            "dep",
            vec![
                "https://example.invalid/dep.tar.gz".into(),
                "https://example.invalid/dep.rar".into(),
            ],
            None,
            None,
            tmp.path(),
        );

        let err = DefaultFetcher::new(true).fetch(&reference, &external).unwrap_err();
        assert!(matches!(err, FetchError::ArchiveFormat { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_no_urls() {
        let tmp = TempDir::new().unwrap();
        let reference = RepositoryReference::archive("dep", Vec::new(), None, None, tmp.path());
        let err = DefaultFetcher::default()
            .fetch(&reference, tmp.path())
            .unwrap_err();
        assert!(matches!(err, FetchError::NoUrls));
    }

    #[test]
    fn test_git_is_not_recoverable() {
        let tmp = TempDir::new().unwrap();
        let reference = RepositoryReference::git("dep", "https://x.org/dep.git", tmp.path());
        let err = DefaultFetcher::default()
            .fetch(&reference, tmp.path())
            .unwrap_err();
        assert!(!err.is_recoverable());
    }
}
