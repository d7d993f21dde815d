//! Well-known file names and repository layout detection.

use std::path::{Path, PathBuf};

/// Workspace description file names, in lookup order.
pub const WORKSPACE_FILES: &[&str] = &["WORKSPACE", "WORKSPACE.bazel"];

/// Build rule file names, in lookup order.
pub const BUILD_FILES: &[&str] = &["BUILD", "BUILD.bazel"];

/// Native CMake build description.
pub const CMAKE_FILE: &str = "CMakeLists.txt";

/// What a repository directory contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoLayout {
    /// A nested workspace: resolved as its own subproject
    Workspace(PathBuf),
    /// A single build file: evaluated into the including project
    BuildFile(PathBuf),
    /// Already a CMake project: used as-is
    NativeCMake(PathBuf),
    /// Nothing this converter understands
    Unknown,
}

fn find_first(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    names
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Find the workspace description in `dir`.
pub fn find_workspace_file(dir: &Path) -> Option<PathBuf> {
    find_first(dir, WORKSPACE_FILES)
}

/// Find the build rule file in `dir`.
pub fn find_build_file(dir: &Path) -> Option<PathBuf> {
    find_first(dir, BUILD_FILES)
}

/// Classify a fetched repository directory.
///
/// A workspace wins over a lone build file, which wins over a native
/// CMake project.
pub fn inspect(dir: &Path) -> RepoLayout {
    if let Some(ws) = find_workspace_file(dir) {
        return RepoLayout::Workspace(ws);
    }
    if let Some(build) = find_build_file(dir) {
        return RepoLayout::BuildFile(build);
    }
    let cmake = dir.join(CMAKE_FILE);
    if cmake.is_file() {
        return RepoLayout::NativeCMake(cmake);
    }
    RepoLayout::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_inspect_prefers_workspace() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("BUILD"), "").unwrap();
        fs::write(tmp.path().join("CMakeLists.txt"), "").unwrap();
        assert!(matches!(inspect(tmp.path()), RepoLayout::BuildFile(_)));

        fs::write(tmp.path().join("WORKSPACE.bazel"), "").unwrap();
        assert!(matches!(inspect(tmp.path()), RepoLayout::Workspace(_)));
    }

    #[test]
    fn test_inspect_native_and_unknown() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(inspect(tmp.path()), RepoLayout::Unknown);

        fs::write(tmp.path().join("CMakeLists.txt"), "").unwrap();
        assert_eq!(
            inspect(tmp.path()),
            RepoLayout::NativeCMake(tmp.path().join("CMakeLists.txt"))
        );
    }

    #[test]
    fn test_build_file_lookup_order() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("BUILD.bazel"), "").unwrap();
        assert_eq!(
            find_build_file(tmp.path()),
            Some(tmp.path().join("BUILD.bazel"))
        );

        fs::write(tmp.path().join("BUILD"), "").unwrap();
        assert_eq!(find_build_file(tmp.path()), Some(tmp.path().join("BUILD")));
    }

    #[test]
    fn test_directory_named_build_is_ignored() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("BUILD")).unwrap();
        assert_eq!(find_build_file(tmp.path()), None);
    }
}
