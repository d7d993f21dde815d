//! Project resolution.
//!
//! The resolver walks a workspace depth-first: WORKSPACE first, resolving
//! every external repository as it is declared, then BUILD. Rule files
//! are evaluated through the dispatch table, whose handlers call back into
//! the resolver for nested loads and repository declarations.
//!
//! Two memos keep the walk finite. Repositories are memoized process-wide
//! by name, so each is fetched and evaluated at most once and a cyclic
//! repository graph stops at the first repeat. Rule files are memoized per
//! project, so a file loaded twice into one project is evaluated once and
//! a file that loads itself is reported as a cycle.

pub mod errors;

pub use errors::ConvertError;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::cache::{CacheKey, ResolutionCache, ResolutionState};
use crate::core::context::DirContext;
use crate::core::layout::{find_build_file, find_workspace_file, inspect, RepoLayout};
use crate::core::project::Project;
use crate::core::repository::RepositoryReference;
use crate::dsl::eval::Interpreter;
use crate::dsl::parser::parse;
use crate::dsl::value::Bindings;
use crate::rules::{FileScope, RuleContext, RuleTable};
use crate::sources::{FetchError, Fetcher};
use crate::util::config::Config;
use crate::util::fs::{normalize_path, relative_path, to_slash};

/// What resolving a repository produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepoOutcome {
    /// Nested workspace, recorded as a subproject
    Subproject { dir: PathBuf },
    /// Single BUILD file, evaluated into the declaring project
    Merged { dir: PathBuf },
    /// Native CMake project, added as a subdirectory
    Native { dir: PathBuf },
    /// Workspace already being resolved further up the walk
    Enclosing { dir: PathBuf },
    /// Fetch failed; contributes nothing
    Skipped,
}

impl RepoOutcome {
    /// Local directory of the repository, unless it was skipped.
    pub fn dir(&self) -> Option<&Path> {
        match self {
            RepoOutcome::Subproject { dir }
            | RepoOutcome::Merged { dir }
            | RepoOutcome::Native { dir }
            | RepoOutcome::Enclosing { dir } => Some(dir),
            RepoOutcome::Skipped => None,
        }
    }
}

/// Drives one conversion run.
pub struct Resolver<'a> {
    rules: &'a RuleTable,
    fetcher: &'a dyn Fetcher,
    config: &'a Config,
    /// Canonical root workspace directory
    root: PathBuf,
    external_dir: PathBuf,
    repos: ResolutionCache<RepoOutcome>,
    /// Workspace directories whose projects are still being built
    open_projects: Vec<PathBuf>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver for the workspace at `root`.
    pub fn new(
        root: &Path,
        rules: &'a RuleTable,
        fetcher: &'a dyn Fetcher,
        config: &'a Config,
    ) -> Result<Self, ConvertError> {
        let root = root.canonicalize().map_err(|e| ConvertError::io(root, e))?;
        let external_dir = root.join(&config.fetch.external_dir);

        Ok(Resolver {
            rules,
            fetcher,
            config,
            root,
            external_dir,
            repos: ResolutionCache::new(),
            open_projects: Vec::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    pub fn rules(&self) -> &'a RuleTable {
        self.rules
    }

    /// Repository memo, for reporting.
    pub fn repositories(&self) -> &ResolutionCache<RepoOutcome> {
        &self.repos
    }

    /// Local directory of an already-resolved repository.
    pub fn repository_dir(&self, name: &str) -> Option<&Path> {
        match self.repos.state(&CacheKey::repository(name)) {
            ResolutionState::Resolved(outcome) => outcome.dir(),
            _ => None,
        }
    }

    /// Resolve the root workspace into a complete project tree.
    pub fn resolve(&mut self) -> Result<Project, ConvertError> {
        let root = self.root.clone();
        if find_workspace_file(&root).is_none() {
            return Err(ConvertError::NoWorkspace { dir: root });
        }

        let mut dirs = DirContext::new();
        let project = self.load_project(&root, &mut dirs)?;
        debug_assert_eq!(dirs.depth(), 0);

        tracing::info!(
            "Resolved {} target(s) across {} repository(s)",
            project.target_count(),
            self.repos.len()
        );
        Ok(project)
    }

    /// Resolve a workspace directory into a new project.
    fn load_project(&mut self, dir: &Path, dirs: &mut DirContext) -> Result<Project, ConvertError> {
        self.open_projects.push(dir.to_path_buf());
        let project = self.build_project(dir, dirs);
        self.open_projects.pop();
        project
    }

    fn build_project(&mut self, dir: &Path, dirs: &mut DirContext) -> Result<Project, ConvertError> {
        dirs.scoped(dir, |dirs| {
            let mut project = Project::new(dir);

            if let Some(workspace) = find_workspace_file(dir) {
                self.eval_file(&mut project, dirs, &workspace, FileScope::Workspace, dir)?;
            }
            if let Some(build) = find_build_file(dir) {
                self.eval_file(&mut project, dirs, &build, FileScope::Build, dir)?;
            }

            Ok(project)
        })
    }

    /// Evaluate a rule file into `project`, returning its exports.
    ///
    /// A file already evaluated into this project is not evaluated again.
    pub fn eval_file(
        &mut self,
        project: &mut Project,
        dirs: &mut DirContext,
        path: &Path,
        scope: FileScope,
        repo_root: &Path,
    ) -> Result<Bindings, ConvertError> {
        let path = normalize_path(path);
        let key = CacheKey::file(&path);

        match project.files.state(&key) {
            ResolutionState::Resolved(exports) => {
                tracing::debug!("{} already evaluated", key);
                return Ok(exports.clone());
            }
            ResolutionState::InProgress => return Err(ConvertError::CyclicLoad { file: path }),
            ResolutionState::Unresolved => {}
        }

        let source = std::fs::read_to_string(&path).map_err(|e| ConvertError::io(&path, e))?;
        let shown = self.display_path(&path);
        let module = parse(&source, &shown.to_string_lossy())?;

        tracing::info!("Evaluating {}", shown.display());
        project.files.begin(key.clone());

        let dir = path.parent().unwrap_or(repo_root).to_path_buf();
        let exports = dirs.scoped(&dir, |dirs| {
            let mut ctx = RuleContext {
                resolver: &mut *self,
                project: &mut *project,
                dirs,
                scope,
                repo_root: repo_root.to_path_buf(),
            };
            let mut interpreter = Interpreter::new(&shown);
            interpreter.run(&module, &mut ctx)?;
            Ok::<_, ConvertError>(interpreter.into_exports())
        })?;

        project.files.finish(key, exports.clone());
        Ok(exports)
    }

    /// Fetch and resolve a declared repository, once per run.
    pub fn resolve_repository(
        &mut self,
        project: &mut Project,
        dirs: &mut DirContext,
        reference: &RepositoryReference,
    ) -> Result<(), ConvertError> {
        let key = CacheKey::repository(&reference.name);
        if !self.repos.begin(key.clone()) {
            tracing::debug!("{} already resolved", reference);
            return Ok(());
        }

        let outcome = self.materialize(project, dirs, reference)?;
        self.repos.finish(key, outcome);
        Ok(())
    }

    fn materialize(
        &mut self,
        project: &mut Project,
        dirs: &mut DirContext,
        reference: &RepositoryReference,
    ) -> Result<RepoOutcome, ConvertError> {
        tracing::info!("Fetching {}", reference);

        let dir = match self.fetcher.fetch(reference, &self.external_dir) {
            Ok(dir) => normalize_path(&dir),
            Err(FetchError::VersionControl { remote }) => {
                return Err(ConvertError::VcsUnsupported {
                    name: reference.name.clone(),
                    remote,
                })
            }
            Err(e) if e.is_recoverable() => {
                tracing::warn!("Skipping {}: {}", reference, e);
                return Ok(RepoOutcome::Skipped);
            }
            Err(e) => {
                return Err(ConvertError::Fetch {
                    name: reference.name.clone(),
                    source: e,
                })
            }
        };

        if self.open_projects.contains(&dir) {
            tracing::debug!("{} points back at {}; not loading it again", reference, dir.display());
            return Ok(RepoOutcome::Enclosing { dir });
        }

        match inspect(&dir) {
            RepoLayout::Workspace(_) => {
                let child = self.load_project(&dir, dirs)?;
                project.subprojects.push(child);
                Ok(RepoOutcome::Subproject { dir })
            }
            RepoLayout::BuildFile(build) => {
                self.eval_file(project, dirs, &build, FileScope::Build, &dir)?;
                Ok(RepoOutcome::Merged { dir })
            }
            RepoLayout::NativeCMake(_) => {
                tracing::info!("{} is a CMake project; adding it as a subdirectory", reference);
                project
                    .native_subdirs
                    .push(to_slash(&relative_path(&self.root, &dir)));
                Ok(RepoOutcome::Native { dir })
            }
            RepoLayout::Unknown => Err(ConvertError::InvalidRepository {
                name: reference.name.clone(),
                dir,
            }),
        }
    }

    fn display_path(&self, path: &Path) -> PathBuf {
        match path.strip_prefix(&self.root) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => path.to_path_buf(),
        }
    }
}

/// Resolve the workspace at `root` with the standard rule table.
pub fn resolve_workspace(
    root: &Path,
    config: &Config,
    fetcher: &dyn Fetcher,
) -> Result<Project, ConvertError> {
    let rules = RuleTable::standard();
    let mut resolver = Resolver::new(root, &rules, fetcher, config)?;
    resolver.resolve()
}
