//! bzl2cmake - translate Bazel workspaces into CMake
//!
//! This crate provides the library behind the `bzl2cmake` binary: a
//! parser and evaluator for the Starlark subset used by WORKSPACE and
//! BUILD files, the rule dispatch table, the project resolver that
//! fetches external repositories, and the CMake emitter.

pub mod core;
pub mod dsl;
pub mod emit;
pub mod ops;
pub mod resolver;
pub mod rules;
pub mod sources;
pub mod util;

pub use core::{Project, Target, TargetKind};
pub use resolver::{resolve_workspace, ConvertError, Resolver};
pub use util::Config;
