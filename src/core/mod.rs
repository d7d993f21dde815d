//! Core data structures.
//!
//! - Labels and repository references declared by rule files
//! - The translated [`Project`] tree and its targets
//! - The resolution memo and directory context used while resolving

pub mod cache;
pub mod context;
pub mod label;
pub mod layout;
pub mod project;
pub mod repository;

pub use cache::{CacheKey, ResolutionCache, ResolutionState};
pub use context::DirContext;
pub use label::{strip_label, Label};
pub use project::{Project, Target, TargetKind};
pub use repository::{RepositoryOrigin, RepositoryReference};
