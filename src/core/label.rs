//! Bazel labels.
//!
//! A label names a target or a file, optionally qualified by a repository
//! and a package path:
//!
//! ```text
//! @zlib//contrib/minizip:unzip.c
//! ^^^^^ ^^^^^^^^^^^^^^^^ ^^^^^^^
//! repo  package          name
//! ```
//!
//! Relative forms (`:name`, plain `name`) refer to the package of the file
//! being evaluated. Label syntax is not validated: anything that does not
//! look qualified is taken as a relative name.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:@(?P<repo>[^/:]+))?(?://(?P<pkg>[^:]*))?(?::(?P<name>.*))?$")
        .expect("label regex is valid")
});

/// A parsed label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    /// External repository (`@repo`), if qualified
    pub repository: Option<String>,
    /// Package path (after `//`), if absolute
    pub package: Option<String>,
    /// Target or file name; `None` for `//pkg` and `@repo` shorthands
    pub name: Option<String>,
}

impl Label {
    /// Parse a label string. Never fails.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        if let Some(caps) = LABEL_RE.captures(raw) {
            let repository = caps.name("repo").map(|m| m.as_str().to_string());
            let package = caps.name("pkg").map(|m| m.as_str().trim_matches('/').to_string());
            let name = caps.name("name").map(|m| m.as_str().to_string());

            if repository.is_some() || package.is_some() || name.is_some() {
                return Label {
                    repository,
                    package,
                    name,
                };
            }
        }

        Label {
            repository: None,
            package: None,
            name: Some(raw.to_string()),
        }
    }

    /// Whether the label is relative to the current package.
    pub fn is_relative(&self) -> bool {
        self.repository.is_none() && self.package.is_none()
    }

    /// The name a translated target is known by, with the label sigils
    /// stripped: `:a`, `//pkg:a` and `@repo//pkg:a` all yield `a`;
    /// `//pkg/a` yields `a` and `@repo` yields `repo`.
    pub fn target_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }

        if let Some(last) = self
            .package
            .as_deref()
            .and_then(|p| p.rsplit('/').next())
            .filter(|s| !s.is_empty())
        {
            return last.to_string();
        }

        self.repository.clone().unwrap_or_default()
    }

    /// The file this label names, relative to its package root
    /// (`//pkg:sub/x.bzl` gives `pkg/sub/x.bzl`, `:x.bzl` gives `x.bzl`).
    pub fn file_path(&self) -> String {
        let name = self.name.clone().unwrap_or_else(|| self.target_name());
        match self.package.as_deref() {
            Some(pkg) if !pkg.is_empty() => format!("{}/{}", pkg, name),
            _ => name,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(repo) = &self.repository {
            write!(f, "@{}", repo)?;
        }
        if let Some(pkg) = &self.package {
            write!(f, "//{}", pkg)?;
        }
        match (&self.name, self.is_relative()) {
            (Some(name), true) => write!(f, "{}", name),
            (Some(name), false) => write!(f, ":{}", name),
            (None, _) => Ok(()),
        }
    }
}

/// Strip label syntax from a dependency, leaving the target name.
pub fn strip_label(dep: &str) -> String {
    Label::parse(dep).target_name()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fully_qualified() {
        let label = Label::parse("@zlib//contrib/minizip:unzip.c");
        assert_eq!(label.repository.as_deref(), Some("zlib"));
        assert_eq!(label.package.as_deref(), Some("contrib/minizip"));
        assert_eq!(label.name.as_deref(), Some("unzip.c"));
        assert!(!label.is_relative());
        assert_eq!(label.file_path(), "contrib/minizip/unzip.c");
    }

    #[test]
    fn test_parse_relative_forms() {
        let colon = Label::parse(":defs.bzl");
        assert!(colon.is_relative());
        assert_eq!(colon.file_path(), "defs.bzl");

        let bare = Label::parse("src/a.c");
        assert!(bare.is_relative());
        assert_eq!(bare.file_path(), "src/a.c");
    }

    #[test]
    fn test_target_name_strips_sigils() {
        assert_eq!(strip_label(":a"), "a");
        assert_eq!(strip_label("b"), "b");
        assert_eq!(strip_label("//pkg:core"), "core");
        assert_eq!(strip_label("//pkg/util"), "util");
        assert_eq!(strip_label("@zlib//:zlib"), "zlib");
        assert_eq!(strip_label("@abseil"), "abseil");
    }

    #[test]
    fn test_root_package() {
        let label = Label::parse("//:BUILD.zlib");
        assert_eq!(label.package.as_deref(), Some(""));
        assert_eq!(label.file_path(), "BUILD.zlib");
    }

    #[test]
    fn test_display_round_trips_common_forms() {
        for raw in ["@zlib//:zlib", "//pkg:core", "a"] {
            assert_eq!(Label::parse(raw).to_string(), raw);
        }
    }
}
