//! Rule dispatch table.
//!
//! Every rule kind the converter understands maps to a handler function
//! and the kind of file it may appear in. Rule calls reach a handler
//! through [`RuleContext`], the evaluator [`Host`] that holds the project
//! being built and the resolver driving the run.

pub mod cc;
pub mod inert;
pub mod load;
pub mod workspace;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::context::DirContext;
use crate::core::project::Project;
use crate::dsl::eval::Host;
use crate::dsl::value::{Invocation, Value};
use crate::resolver::{ConvertError, Resolver};
use crate::util::config::SelectPolicy;
use crate::util::fs::{normalize_path, relative_path, to_slash};

/// Which kind of file is being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileScope {
    /// WORKSPACE and files it loads
    Workspace,
    /// BUILD and files it loads
    Build,
}

impl fmt::Display for FileScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileScope::Workspace => write!(f, "WORKSPACE"),
            FileScope::Build => write!(f, "BUILD"),
        }
    }
}

/// Where a rule may be called.
///
/// WORKSPACE files accept the whole BUILD vocabulary as well, so only
/// repository declarations are restricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    Workspace,
    Any,
}

impl RuleScope {
    pub fn allows(&self, scope: FileScope) -> bool {
        matches!(
            (self, scope),
            (RuleScope::Any, _) | (RuleScope::Workspace, FileScope::Workspace)
        )
    }

    fn describe(&self) -> &'static str {
        match self {
            RuleScope::Workspace => "WORKSPACE",
            RuleScope::Any => "any",
        }
    }
}

/// Translation action for one rule kind.
pub type RuleHandler = fn(&mut RuleContext<'_, '_>, &Invocation) -> Result<Value, ConvertError>;

/// A registered rule.
#[derive(Clone, Copy)]
pub struct RuleSpec {
    pub scope: RuleScope,
    pub handler: RuleHandler,
}

impl fmt::Debug for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSpec").field("scope", &self.scope).finish()
    }
}

/// Mapping from rule kind to handler.
#[derive(Debug, Default)]
pub struct RuleTable {
    rules: HashMap<&'static str, RuleSpec>,
}

impl RuleTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The full vocabulary.
    pub fn standard() -> Self {
        let mut table = RuleTable::new();
        workspace::register(&mut table);
        cc::register(&mut table);
        load::register(&mut table);
        inert::register(&mut table);
        table
    }

    /// Register (or replace) a rule.
    pub fn register(&mut self, kind: &'static str, scope: RuleScope, handler: RuleHandler) {
        self.rules.insert(kind, RuleSpec { scope, handler });
    }

    pub fn get(&self, kind: &str) -> Option<RuleSpec> {
        self.rules.get(kind).copied()
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.rules.contains_key(kind)
    }
}

/// Evaluation host for one rule file.
pub struct RuleContext<'r, 'a> {
    pub resolver: &'r mut Resolver<'a>,
    pub project: &'r mut Project,
    pub dirs: &'r mut DirContext,
    pub scope: FileScope,
    /// Root of the repository the file belongs to; `//pkg` labels are
    /// relative to it
    pub repo_root: PathBuf,
}

impl RuleContext<'_, '_> {
    /// Resolve a file reference (`a.c`, `:a.c`, `//pkg:a.c`) to a path
    /// relative to the root workspace, `/`-separated.
    pub fn output_path(&self, file: &str) -> String {
        let absolute = self.file_path(file);
        let relative = to_slash(&relative_path(self.resolver.root(), &absolute));
        if relative.is_empty() {
            ".".to_string()
        } else {
            relative
        }
    }

    /// Resolve a file reference to a filesystem path.
    pub fn file_path(&self, file: &str) -> PathBuf {
        let label = crate::core::label::Label::parse(file);
        let base: &Path = if label.is_relative() {
            self.dirs.current()
        } else {
            &self.repo_root
        };
        normalize_path(&base.join(label.file_path()))
    }
}

impl Host for RuleContext<'_, '_> {
    fn current_dir(&self) -> &Path {
        self.dirs.current()
    }

    fn select_policy(&self) -> SelectPolicy {
        self.resolver.config().rules.select
    }

    fn call(&mut self, invocation: Invocation) -> Result<Value, ConvertError> {
        let spec = self
            .resolver
            .rules()
            .get(&invocation.kind)
            .ok_or_else(|| ConvertError::UnknownRule {
                kind: invocation.kind.clone(),
                location: invocation.location.clone(),
            })?;

        if !spec.scope.allows(self.scope) {
            return Err(ConvertError::WrongScope {
                kind: invocation.kind.clone(),
                allowed: spec.scope.describe(),
                location: invocation.location.clone(),
            });
        }

        (spec.handler)(self, &invocation)
    }
}
