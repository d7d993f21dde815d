//! Rules that are accepted and ignored, and rules that are rejected.

use crate::dsl::value::{Invocation, Value};
use crate::resolver::ConvertError;
use crate::rules::{RuleContext, RuleScope, RuleTable};

/// Workspace-flavoured rules with no effect on the translation.
pub const INERT_WORKSPACE_RULES: &[&str] = &[
    "register_toolchains",
    "bind",
    "closure_repositories",
    "java_import_external",
    "bazel_toolchains_repositories",
    "bazel_toolchains_archive",
    "container_repositories",
    "check_bazel_version_at_least",
    "android_configure",
    "android_workspace",
    "swift_rules_dependencies",
    "remote_config_workspace",
    "tf_bind",
    "tf_repositories",
];

/// Build-flavoured rules with no effect on the translation.
pub const INERT_BUILD_RULES: &[&str] = &["package", "licenses", "filegroup", "skylark_library"];

/// Rules with no CMake translation. Reaching one aborts the conversion.
pub const UNSUPPORTED_RULES: &[&str] = &[
    "cc_binary",
    "cc_test",
    "py_library",
    "py_binary",
    "py_test",
    "sh_test",
    "sh_binary",
    "proto_library",
    "cc_proto_library",
    "genrule",
    "config_setting",
    "lua_cclibrary",
    "lua_library",
    "lua_binary",
    "lua_test",
    "upb_amalgamation",
    "upb_proto_library",
    "upb_proto_reflection_library",
    "generated_file_staleness_test",
    "make_shell_script",
    "map_dep",
];

pub fn register(table: &mut RuleTable) {
    // Inert rules are accepted in either file.
    for &kind in INERT_WORKSPACE_RULES.iter().chain(INERT_BUILD_RULES) {
        table.register(kind, RuleScope::Any, ignore);
    }
    for &kind in UNSUPPORTED_RULES {
        table.register(kind, RuleScope::Any, unsupported);
    }
}

fn ignore(_ctx: &mut RuleContext<'_, '_>, invocation: &Invocation) -> Result<Value, ConvertError> {
    tracing::debug!("{}: ignoring `{}`", invocation.location, invocation.kind);
    Ok(Value::None)
}

fn unsupported(
    _ctx: &mut RuleContext<'_, '_>,
    invocation: &Invocation,
) -> Result<Value, ConvertError> {
    Err(ConvertError::UnsupportedRule {
        kind: invocation.kind.clone(),
        location: invocation.location.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::tests::{convert_fixture, Fixture};

    #[test]
    fn test_lists_are_disjoint() {
        for kind in UNSUPPORTED_RULES {
            assert!(!INERT_BUILD_RULES.contains(kind));
            assert!(!INERT_WORKSPACE_RULES.contains(kind));
        }
    }

    #[test]
    fn test_inert_rules_are_accepted() {
        let fixture = Fixture::new()
            .file(
                "WORKSPACE",
                r#"
workspace(name = "w")
register_toolchains("//toolchains:all")
bind(name = "x", actual = "//y")
"#,
            )
            .file(
                "BUILD",
                r#"
package(default_visibility = ["//visibility:public"])
licenses(["notice"])
filegroup(name = "data", srcs = glob(["*.txt"]))
"#,
            );

        let project = convert_fixture(&fixture).unwrap();
        assert!(project.targets.is_empty());
    }

    #[test]
    fn test_inert_rules_accepted_in_either_file() {
        let fixture = Fixture::new()
            .file(
                "WORKSPACE",
                r#"
workspace(name = "w")
licenses(["notice"])
"#,
            )
            .file(
                "BUILD",
                r#"
register_toolchains("//tc:all")
tf_bind()
cc_library(name = "lib", hdrs = ["lib.h"])
"#,
            );

        let project = convert_fixture(&fixture).unwrap();
        assert_eq!(project.targets.len(), 1);
    }

    #[test]
    fn test_unsupported_rule_is_fatal() {
        let fixture = Fixture::new()
            .file("WORKSPACE", "")
            .file(
                "BUILD",
                r#"
cc_library(name = "lib", srcs = ["lib.c"])
cc_binary(name = "app", srcs = ["main.c"], deps = [":lib"])
"#,
            );

        let err = convert_fixture(&fixture).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedRule { ref kind, .. } if kind == "cc_binary"));
    }

    #[test]
    fn test_unknown_rule_is_fatal() {
        let fixture = Fixture::new()
            .file("WORKSPACE", "")
            .file("BUILD", r#"objc_library(name = "x")"#);

        let err = convert_fixture(&fixture).unwrap_err();
        assert!(matches!(err, ConvertError::UnknownRule { .. }));
    }
}
