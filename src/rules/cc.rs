//! `cc_library` translation.

use crate::core::label::strip_label;
use crate::core::project::{Target, TargetKind};
use crate::dsl::value::{Invocation, Value};
use crate::resolver::ConvertError;
use crate::rules::{RuleContext, RuleScope, RuleTable};

pub fn register(table: &mut RuleTable) {
    table.register("cc_library", RuleScope::Any, cc_library);
}

/// Append a library target.
///
/// The target is a regular library when any file carries a compiled-source
/// extension, and an interface library otherwise.
fn cc_library(ctx: &mut RuleContext<'_, '_>, invocation: &Invocation) -> Result<Value, ConvertError> {
    let name = invocation.require_str("name")?;

    let rules = &ctx.resolver.config().rules;
    if rules.skip_targets.iter().any(|skip| *skip == name) {
        tracing::debug!("{}: skipping `{}`", invocation.location, name);
        return Ok(Value::None);
    }

    let mut files = Vec::new();
    for key in ["srcs", "hdrs"] {
        for file in invocation.str_list(key)? {
            files.push(ctx.output_path(&file));
        }
    }

    let kind = if files.iter().any(|f| rules.is_source_file(f)) {
        TargetKind::Library
    } else {
        TargetKind::Interface
    };

    let deps = invocation
        .str_list("deps")?
        .iter()
        .map(|dep| strip_label(dep))
        .collect();

    let mut target = Target::new(name, kind, files).with_deps(deps);
    target.includes = invocation
        .str_list("includes")?
        .iter()
        .map(|dir| ctx.output_path(dir))
        .collect();
    target.defines = invocation.str_list("defines")?;
    target.copts = invocation.str_list("copts")?;

    ctx.project.add_target(target);
    Ok(Value::None)
}

#[cfg(test)]
mod tests {
    use crate::core::project::TargetKind;
    use crate::resolver::tests::{convert_fixture, Fixture};

    #[test]
    fn test_library_with_sources() {
        let fixture = Fixture::new()
            .file("WORKSPACE", "")
            .file(
                "BUILD",
                r#"cc_library(name = "core", srcs = ["a.c"], hdrs = ["a.h"], deps = [":base", "//util:log"])"#,
            );

        let project = convert_fixture(&fixture).unwrap();
        let core = project.target("core").unwrap();
        assert_eq!(core.kind, TargetKind::Library);
        assert_eq!(core.files, vec!["a.c", "a.h"]);
        assert_eq!(core.deps, vec!["base", "log"]);
    }

    #[test]
    fn test_header_only_library() {
        let fixture = Fixture::new()
            .file("WORKSPACE", "")
            .file("BUILD", r#"cc_library(name = "iface", hdrs = ["a.h"])"#);

        let project = convert_fixture(&fixture).unwrap();
        assert_eq!(project.target("iface").unwrap().kind, TargetKind::Interface);
    }

    #[test]
    fn test_nested_package_paths() {
        let fixture = Fixture::new()
            .file("WORKSPACE", "")
            .file("lib/a.cc", "")
            .file(
                "BUILD",
                r#"cc_library(name = "lib", srcs = ["//lib:a.cc"], includes = ["lib"], defines = ["X=1"])"#,
            );

        let project = convert_fixture(&fixture).unwrap();
        let lib = project.target("lib").unwrap();
        assert_eq!(lib.files, vec!["lib/a.cc"]);
        assert_eq!(lib.includes, vec!["lib"]);
        assert_eq!(lib.defines, vec!["X=1"]);
    }

    #[test]
    fn test_skip_targets() {
        let fixture = Fixture::new()
            .file("WORKSPACE", "")
            .file(".bzl2cmake/config.toml", "[rules]\nskip_targets = [\"amalgamation\"]\n")
            .file(
                "BUILD",
                r#"
cc_library(name = "amalgamation", srcs = ["upb.c"])
cc_library(name = "kept", hdrs = ["k.h"])
"#,
            );

        let project = convert_fixture(&fixture).unwrap();
        assert!(project.target("amalgamation").is_none());
        assert!(project.target("kept").is_some());
    }

    #[test]
    fn test_missing_name() {
        let fixture = Fixture::new()
            .file("WORKSPACE", "")
            .file("BUILD", r#"cc_library(srcs = ["a.c"])"#);

        let err = convert_fixture(&fixture).unwrap_err();
        assert!(err.to_string().contains("missing argument `name`"));
    }
}
