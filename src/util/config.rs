//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `<platform config dir>/bzl2cmake/config.toml` - User-wide defaults
//! - Project: `<workspace>/.bzl2cmake/config.toml` - Workspace-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Name of the per-workspace configuration directory.
pub const CONFIG_DIR_NAME: &str = ".bzl2cmake";

/// Converter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repository fetching settings
    pub fetch: FetchConfig,

    /// Rule translation settings
    pub rules: RulesConfig,
}

/// Repository fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Directory (relative to the workspace root) where external
    /// repositories are materialized
    pub external_dir: PathBuf,

    /// Never touch the network; only reuse materialized repositories
    /// and `file://` archives
    pub offline: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            external_dir: PathBuf::from(CONFIG_DIR_NAME).join("external"),
            offline: false,
        }
    }
}

/// How `select()` expressions are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectPolicy {
    /// Reaching `select()` aborts the conversion
    #[default]
    Error,
    /// `select()` evaluates to an empty list
    Empty,
}

/// Rule translation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Policy for `select()` expressions
    pub select: SelectPolicy,

    /// `cc_library` target names that are never translated
    pub skip_targets: Vec<String>,

    /// File extensions (without the dot) that mark a compiled source
    pub source_extensions: Vec<String>,

    /// Label prefixes whose loads are skipped with a warning
    pub skip_loads: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            select: SelectPolicy::Error,
            skip_targets: Vec::new(),
            source_extensions: ["c", "cc", "cpp", "cxx"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            skip_loads: vec!["//closure".to_string()],
        }
    }
}

impl RulesConfig {
    /// Check whether loads of `label` are skipped.
    pub fn skips_load(&self, label: &str) -> bool {
        self.skip_loads.iter().any(|prefix| label.starts_with(prefix.as_str()))
    }

    /// Check whether a file name carries a compiled-source extension.
    pub fn is_source_file(&self, file: &str) -> bool {
        match file.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                self.source_extensions.iter().any(|e| e == ext)
            }
            _ => false,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist
    /// or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Load the effective configuration for a workspace.
    ///
    /// The project file, when present, replaces the global one wholesale.
    pub fn for_workspace(workspace_root: &Path) -> Self {
        let project = project_config_path(workspace_root);
        if project.exists() {
            return Self::load_or_default(&project);
        }

        match global_config_path() {
            Some(global) => Self::load_or_default(&global),
            None => Self::default(),
        }
    }
}

/// Path of the workspace-local config file.
pub fn project_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(CONFIG_DIR_NAME).join("config.toml")
}

/// Path of the user-wide config file, if a config dir can be determined.
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "bzl2cmake").map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.rules.select, SelectPolicy::Error);
        assert!(!config.fetch.offline);
        assert_eq!(
            config.fetch.external_dir,
            PathBuf::from(".bzl2cmake").join("external")
        );
    }

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(
            r#"
[fetch]
offline = true

[rules]
select = "empty"
skip_targets = ["amalgamation"]
"#,
        )
        .unwrap();

        assert!(config.fetch.offline);
        assert_eq!(config.rules.select, SelectPolicy::Empty);
        assert_eq!(config.rules.skip_targets, vec!["amalgamation"]);
        // Unset keys keep their defaults
        assert!(config.rules.source_extensions.contains(&"cc".to_string()));
    }

    #[test]
    fn test_project_config_is_loaded() {
        let tmp = TempDir::new().unwrap();
        let path = project_config_path(tmp.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[rules]\nselect = \"empty\"\n").unwrap();

        let config = Config::for_workspace(tmp.path());
        assert_eq!(config.rules.select, SelectPolicy::Empty);
    }

    #[test]
    fn test_invalid_config_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        let config = Config::load_or_default(&path);
        assert_eq!(config.rules.select, SelectPolicy::Error);
    }

    #[test]
    fn test_is_source_file() {
        let rules = RulesConfig::default();
        assert!(rules.is_source_file("a.c"));
        assert!(rules.is_source_file("src/b.cc"));
        assert!(!rules.is_source_file("a.h"));
        assert!(!rules.is_source_file("Makefile"));
        assert!(!rules.is_source_file(".c"));
    }

    #[test]
    fn test_skips_load() {
        let rules = RulesConfig::default();
        assert!(rules.skips_load("//closure/compiler:closure_js_library.bzl"));
        assert!(!rules.skips_load("//tools:defs.bzl"));
    }
}
