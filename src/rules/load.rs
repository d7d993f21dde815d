//! Nested loads of `.bzl` files.

use std::path::PathBuf;

use crate::core::label::Label;
use crate::dsl::value::{Invocation, Value};
use crate::resolver::ConvertError;
use crate::rules::{RuleContext, RuleScope, RuleTable};

pub fn register(table: &mut RuleTable) {
    table.register("load", RuleScope::Any, load);
    table.register("exports_files", RuleScope::Any, exports_files);
}

/// `load("label", "sym", ...)`: evaluate the referenced file into the
/// current project and return its exports as a dict.
fn load(ctx: &mut RuleContext<'_, '_>, invocation: &Invocation) -> Result<Value, ConvertError> {
    let args = invocation.positional_strs()?;
    let module = args
        .first()
        .ok_or_else(|| invocation.invalid("expected a file label"))?;

    load_label(ctx, module)
}

/// `exports_files([...])` is otherwise inert, but the `.bzl` files it
/// lists are loaded.
fn exports_files(
    ctx: &mut RuleContext<'_, '_>,
    invocation: &Invocation,
) -> Result<Value, ConvertError> {
    let files = match (invocation.args.first(), invocation.get("srcs")) {
        (Some(value), _) | (None, Some(value)) => value
            .to_string_list()
            .map_err(|found| invocation.invalid(format!("expected a list of files, got {}", found)))?,
        (None, None) => Vec::new(),
    };

    for file in files.iter().filter(|f| f.ends_with(".bzl")) {
        load_label(ctx, file)?;
    }

    Ok(Value::None)
}

fn load_label(ctx: &mut RuleContext<'_, '_>, raw: &str) -> Result<Value, ConvertError> {
    if ctx.resolver.config().rules.skips_load(raw) {
        tracing::warn!("Skipping load of {}", raw);
        return Ok(Value::Dict(Vec::new()));
    }

    let label = Label::parse(raw);

    let (path, repo_root): (PathBuf, PathBuf) = match &label.repository {
        Some(repo) => match ctx.resolver.repository_dir(repo) {
            Some(dir) => (dir.join(label.file_path()), dir.to_path_buf()),
            None => {
                tracing::warn!("Skipping load of {}: repository @{} is not available", raw, repo);
                return Ok(Value::Dict(Vec::new()));
            }
        },
        None if label.package.is_some() => {
            (ctx.repo_root.join(label.file_path()), ctx.repo_root.clone())
        }
        None => (ctx.dirs.resolve(label.file_path()), ctx.repo_root.clone()),
    };

    let exports = ctx
        .resolver
        .eval_file(ctx.project, ctx.dirs, &path, ctx.scope, &repo_root)?;

    Ok(Value::Dict(exports.into_iter().collect()))
}

#[cfg(test)]
mod tests {
    use crate::resolver::tests::{convert_fixture, Fixture};
    use crate::resolver::ConvertError;

    #[test]
    fn test_loaded_values_are_bound() {
        let fixture = Fixture::new()
            .file("WORKSPACE", "")
            .file("build_defs.bzl", "COPTS = [\"-Wall\"]\n_HIDDEN = 1\n")
            .file(
                "BUILD",
                r#"
load(":build_defs.bzl", "COPTS")
cc_library(name = "a", srcs = ["a.c"], copts = COPTS)
"#,
            );

        let project = convert_fixture(&fixture).unwrap();
        assert_eq!(project.target("a").unwrap().copts, vec!["-Wall"]);
    }

    #[test]
    fn test_package_label_and_alias() {
        let fixture = Fixture::new()
            .file("WORKSPACE", "")
            .file("tools/defs.bzl", "FLAGS = [\"-O2\"]\n")
            .file(
                "BUILD",
                r#"
load("//tools:defs.bzl", opts = "FLAGS")
cc_library(name = "a", srcs = ["a.c"], copts = opts)
"#,
            );

        let project = convert_fixture(&fixture).unwrap();
        assert_eq!(project.target("a").unwrap().copts, vec!["-O2"]);
    }

    #[test]
    fn test_file_loaded_once_per_project() {
        let fixture = Fixture::new()
            .file("WORKSPACE", "")
            .file("lib.bzl", "cc_library(name = \"from_bzl\", hdrs = [\"x.h\"])\n")
            .file(
                "BUILD",
                r#"
load(":lib.bzl")
load("lib.bzl")
exports_files(["lib.bzl", "README"])
"#,
            );

        let project = convert_fixture(&fixture).unwrap();
        let count = project.targets.iter().filter(|t| t.name == "from_bzl").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_unknown_repository_is_skipped() {
        let fixture = Fixture::new()
            .file("WORKSPACE", r#"load("@bazel_tools//tools/build_defs/repo:http.bzl", "http_archive")"#)
            .file("BUILD", "");

        assert!(convert_fixture(&fixture).is_ok());
    }

    #[test]
    fn test_closure_load_is_skipped() {
        let fixture = Fixture::new()
            .file("WORKSPACE", "")
            .file(
                "BUILD",
                r#"
load("//closure:defs.bzl", "closure_js_library")
cc_library(name = "a", hdrs = ["a.h"])
"#,
            );

        let project = convert_fixture(&fixture).unwrap();
        assert!(project.target("a").is_some());
    }

    #[test]
    fn test_cyclic_load() {
        let fixture = Fixture::new()
            .file("WORKSPACE", "")
            .file("a.bzl", "load(\":b.bzl\")\n")
            .file("b.bzl", "load(\":a.bzl\")\n")
            .file("BUILD", "load(\":a.bzl\")\n");

        let err = convert_fixture(&fixture).unwrap_err();
        assert!(matches!(err, ConvertError::CyclicLoad { .. }));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let fixture = Fixture::new()
            .file("WORKSPACE", "")
            .file("BUILD", "load(\":nope.bzl\", \"X\")\n");

        let err = convert_fixture(&fixture).unwrap_err();
        assert!(matches!(err, ConvertError::Io { .. }));
    }
}
