//! Memo of resolved repositories and loaded files.
//!
//! Every entry moves through three states: unresolved (absent), in
//! progress (resolution has started but not returned, which is how a
//! cycle is detected), and resolved (carrying the result).

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// What is being resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    /// An external repository, by declared name
    Repository(String),
    /// A rule file, by canonical path
    File(PathBuf),
}

impl CacheKey {
    /// Key for a repository name.
    pub fn repository(name: impl Into<String>) -> Self {
        CacheKey::Repository(name.into())
    }

    /// Key for a file path.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        CacheKey::File(path.into())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Repository(name) => write!(f, "@{}", name),
            CacheKey::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
enum Entry<V> {
    InProgress,
    Resolved(V),
}

/// Observed state of a cache key.
#[derive(Debug, PartialEq)]
pub enum ResolutionState<'a, V> {
    Unresolved,
    InProgress,
    Resolved(&'a V),
}

/// Memo keyed by [`CacheKey`].
#[derive(Debug, Clone)]
pub struct ResolutionCache<V> {
    entries: BTreeMap<CacheKey, Entry<V>>,
}

impl<V> Default for ResolutionCache<V> {
    fn default() -> Self {
        ResolutionCache {
            entries: BTreeMap::new(),
        }
    }
}

impl<V> ResolutionCache<V> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a key.
    pub fn state(&self, key: &CacheKey) -> ResolutionState<'_, V> {
        match self.entries.get(key) {
            None => ResolutionState::Unresolved,
            Some(Entry::InProgress) => ResolutionState::InProgress,
            Some(Entry::Resolved(v)) => ResolutionState::Resolved(v),
        }
    }

    /// Mark a key as in progress.
    ///
    /// Returns `false` (and changes nothing) if the key was already known.
    pub fn begin(&mut self, key: CacheKey) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, Entry::InProgress);
        true
    }

    /// Record the final result for a key.
    pub fn finish(&mut self, key: CacheKey, value: V) {
        self.entries.insert(key, Entry::Resolved(value));
    }

    /// Resolved value for a key, if any.
    pub fn get(&self, key: &CacheKey) -> Option<&V> {
        match self.entries.get(key) {
            Some(Entry::Resolved(v)) => Some(v),
            _ => None,
        }
    }

    /// Number of known keys, in any state.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over resolved entries in key order.
    pub fn resolved(&self) -> impl Iterator<Item = (&CacheKey, &V)> {
        self.entries.iter().filter_map(|(k, e)| match e {
            Entry::Resolved(v) => Some((k, v)),
            Entry::InProgress => None,
        })
    }
}
