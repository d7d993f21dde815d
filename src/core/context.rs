//! Directory context for resolving relative file references.
//!
//! The context is a stack of base directories. It is threaded by `&mut`
//! through the resolver and evaluator instead of living in global state,
//! and it can only be pushed through [`DirContext::scoped`], which pops on
//! the way out whatever the closure returns.

use std::path::{Path, PathBuf};

/// Stack of base directories, innermost last.
#[derive(Debug, Clone, Default)]
pub struct DirContext {
    stack: Vec<PathBuf>,
}

impl DirContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with `dir` pushed as the current directory.
    pub fn scoped<R>(&mut self, dir: &Path, f: impl FnOnce(&mut Self) -> R) -> R {
        self.stack.push(dir.to_path_buf());
        let depth = self.stack.len();
        let result = f(self);
        debug_assert_eq!(self.stack.len(), depth, "unbalanced directory context");
        self.stack.pop();
        result
    }

    /// The innermost directory.
    ///
    /// An empty context resolves against the process working directory.
    pub fn current(&self) -> &Path {
        self.stack
            .last()
            .map(PathBuf::as_path)
            .unwrap_or_else(|| Path::new("."))
    }

    /// Resolve a relative reference against the current directory.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.current().join(relative)
    }

    /// Number of pushed directories.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
