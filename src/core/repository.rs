//! External repository references declared in WORKSPACE files.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Where a repository's contents come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepositoryOrigin {
    /// A directory on the local filesystem
    LocalPath { path: PathBuf },

    /// One or more candidate archive URLs, tried in order
    Archive {
        urls: Vec<String>,
        strip_prefix: Option<String>,
        sha256: Option<String>,
    },

    /// A version-control checkout (never fetched)
    Git { remote: String },
}

impl RepositoryOrigin {
    /// Short description for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RepositoryOrigin::LocalPath { .. } => "local",
            RepositoryOrigin::Archive { .. } => "archive",
            RepositoryOrigin::Git { .. } => "git",
        }
    }
}

/// A named external dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryReference {
    /// Declared repository name (`@name`)
    pub name: String,

    /// Origin of the contents
    pub origin: RepositoryOrigin,

    /// Directory of the file that declared the reference; local paths
    /// are relative to it
    pub parent: PathBuf,
}

impl RepositoryReference {
    /// A local-path repository.
    pub fn local(name: impl Into<String>, path: impl Into<PathBuf>, parent: &Path) -> Self {
        RepositoryReference {
            name: name.into(),
            origin: RepositoryOrigin::LocalPath { path: path.into() },
            parent: parent.to_path_buf(),
        }
    }

    /// An archive repository.
    pub fn archive(
        name: impl Into<String>,
        urls: Vec<String>,
        strip_prefix: Option<String>,
        sha256: Option<String>,
        parent: &Path,
    ) -> Self {
        RepositoryReference {
            name: name.into(),
            origin: RepositoryOrigin::Archive {
                urls,
                strip_prefix,
                sha256,
            },
            parent: parent.to_path_buf(),
        }
    }

    /// A version-control repository.
    pub fn git(name: impl Into<String>, remote: impl Into<String>, parent: &Path) -> Self {
        RepositoryReference {
            name: name.into(),
            origin: RepositoryOrigin::Git {
                remote: remote.into(),
            },
            parent: parent.to_path_buf(),
        }
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{} ({})", self.name, self.origin.kind())
    }
}
