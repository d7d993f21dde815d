//! Translated build description of one workspace.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::cache::ResolutionCache;
use crate::dsl::value::Bindings;

/// The kind of target being translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Library with at least one compiled source
    Library,
    /// Header-only library; link declarations are INTERFACE-scoped
    Interface,
}

impl TargetKind {
    /// CMake visibility keyword for usage requirements.
    pub fn scope_keyword(&self) -> &'static str {
        match self {
            TargetKind::Library => "PUBLIC",
            TargetKind::Interface => "INTERFACE",
        }
    }
}

/// One `cc_library` after translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub name: String,
    pub kind: TargetKind,
    /// Sources then headers, relative to the root workspace
    pub files: Vec<String>,
    /// Dependency target names, labels already stripped
    pub deps: Vec<String>,
    /// Include directories, relative to the root workspace
    pub includes: Vec<String>,
    pub defines: Vec<String>,
    pub copts: Vec<String>,
}

impl Target {
    /// Create a target without usage requirements.
    pub fn new(name: impl Into<String>, kind: TargetKind, files: Vec<String>) -> Self {
        Target {
            name: name.into(),
            kind,
            files,
            deps: Vec::new(),
            includes: Vec::new(),
            defines: Vec::new(),
            copts: Vec::new(),
        }
    }

    pub fn with_deps(mut self, deps: Vec<String>) -> Self {
        self.deps = deps;
        self
    }
}

/// Translation state of one resolved workspace.
///
/// Owns its subprojects. Once the resolver returns a project it is not
/// modified again.
#[derive(Debug, Default, Serialize)]
pub struct Project {
    /// Workspace directory
    pub root: PathBuf,

    /// Name from `workspace(name = ...)`
    pub name: Option<String>,

    /// Workspace-level statements, e.g. `project(name)`
    pub prelude: String,

    /// Targets in declaration order
    pub targets: Vec<Target>,

    /// Directories of native CMake repositories, relative to the root
    /// workspace
    pub native_subdirs: Vec<String>,

    /// Nested workspaces in declaration order
    pub subprojects: Vec<Project>,

    /// Rule files already evaluated into this project
    #[serde(skip)]
    pub files: ResolutionCache<Bindings>,
}

impl Project {
    /// Create an empty project rooted at `root`.
    pub fn new(root: &Path) -> Self {
        Project {
            root: root.to_path_buf(),
            ..Default::default()
        }
    }

    /// Append a line to the prelude.
    pub fn push_prelude(&mut self, line: &str) {
        self.prelude.push_str(line);
        self.prelude.push('\n');
    }

    pub fn add_target(&mut self, target: Target) {
        tracing::debug!("target `{}` ({:?})", target.name, target.kind);
        self.targets.push(target);
    }

    /// Find a target by name.
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Total number of targets in this project and all subprojects.
    pub fn target_count(&self) -> usize {
        self.targets.len()
            + self
                .subprojects
                .iter()
                .map(Project::target_count)
                .sum::<usize>()
    }
}
