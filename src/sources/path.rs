//! Local-path repositories.

use std::path::{Path, PathBuf};

use crate::sources::FetchError;

/// Resolve a `local_repository` path against the directory that declared
/// it. Nothing is copied; the directory is used in place.
pub fn fetch_local(path: &Path, parent: &Path) -> Result<PathBuf, FetchError> {
    let full = parent.join(path);
    if !full.is_dir() {
        return Err(FetchError::MissingPath { path: full });
    }

    Ok(full.canonicalize().unwrap_or(full))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relative_to_parent() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("third_party/dep")).unwrap();

        let dir = fetch_local(Path::new("third_party/dep"), tmp.path()).unwrap();
        assert!(dir.ends_with("third_party/dep"));
        assert!(dir.is_absolute());
    }

    #[test]
    fn test_missing_path() {
        let tmp = TempDir::new().unwrap();
        let err = fetch_local(Path::new("nope"), tmp.path()).unwrap_err();
        assert!(matches!(err, FetchError::MissingPath { .. }));
        assert!(err.is_recoverable());
    }
}
