//! CMakeLists.txt generation.
//!
//! Emission is a pure function of the project tree: targets in
//! declaration order, then native CMake subdirectories, then subprojects
//! in declaration order, each rendered the same way.

use std::path::Path;

use crate::core::project::{Project, Target, TargetKind};
use crate::util::fs::{relative_path, to_slash};

const HEADER: &str = "\
# This file was generated from Bazel WORKSPACE and BUILD files by bzl2cmake.
# Edit the Bazel files and regenerate instead of changing it by hand.

cmake_minimum_required(VERSION 3.5)

if(${CMAKE_VERSION} VERSION_LESS 3.12)
  cmake_policy(VERSION ${CMAKE_MAJOR_VERSION}.${CMAKE_MINOR_VERSION})
else()
  cmake_policy(VERSION 3.12)
endif()

";

const SETTINGS: &str = "
# Prevent CMake from setting -rdynamic on Linux.
set(CMAKE_SHARED_LIBRARY_LINK_C_FLAGS \"\")
set(CMAKE_SHARED_LIBRARY_LINK_CXX_FLAGS \"\")

# Set default build type.
if(NOT CMAKE_BUILD_TYPE)
  message(STATUS \"Setting build type to 'RelWithDebInfo' as none was specified.\")
  set(CMAKE_BUILD_TYPE \"RelWithDebInfo\" CACHE STRING
      \"Choose the type of build, options are: Debug Release RelWithDebInfo MinSizeRel.\"
      FORCE)
endif()

# When using Ninja, compiler output won't be colorized without this.
include(CheckCXXCompilerFlag)
CHECK_CXX_COMPILER_FLAG(-fdiagnostics-color=always SUPPORTS_COLOR_ALWAYS)
if(SUPPORTS_COLOR_ALWAYS)
  set(CMAKE_CXX_FLAGS \"${CMAKE_CXX_FLAGS} -fdiagnostics-color=always\")
endif()

include_directories(.)
include_directories(${CMAKE_CURRENT_BINARY_DIR})

if(APPLE)
  set(CMAKE_SHARED_LINKER_FLAGS \"${CMAKE_SHARED_LINKER_FLAGS} -undefined dynamic_lookup -flat_namespace\")
elseif(UNIX)
  set(CMAKE_EXE_LINKER_FLAGS \"${CMAKE_EXE_LINKER_FLAGS} -Wl,--build-id\")
endif()

enable_testing()

";

/// Render the complete CMakeLists.txt for a root project.
pub fn emit(project: &Project) -> String {
    let mut out = String::from(HEADER);
    out.push_str(&project.prelude);
    out.push_str(SETTINGS);
    out.push_str(&toplevel(project, &project.root));
    out
}

/// Target declarations of `project` and, recursively, its subprojects.
///
/// Paths in comments are relative to `root`.
pub fn toplevel(project: &Project, root: &Path) -> String {
    let mut out = String::new();

    for target in &project.targets {
        render_target(&mut out, target);
    }

    for dir in &project.native_subdirs {
        out.push_str(&add_subdirectory(dir));
    }

    for sub in &project.subprojects {
        let dir = to_slash(&relative_path(root, &sub.root));
        out.push_str(&format!("\n# Subproject: {}\n", dir));
        out.push_str(&sub.prelude);
        out.push_str(&toplevel(sub, root));
    }

    out
}

fn render_target(out: &mut String, target: &Target) {
    match target.kind {
        TargetKind::Library => {
            out.push_str(&command(&target.name, None, &target.files, "add_library"));
            out.push_str(&command(&target.name, None, &target.deps, "target_link_libraries"));
        }
        TargetKind::Interface => {
            out.push_str(&format!("add_library({} INTERFACE)\n", quote(&target.name)));
            out.push_str(&command(
                &target.name,
                Some("INTERFACE"),
                &target.deps,
                "target_link_libraries",
            ));
        }
    }

    let scope = Some(target.kind.scope_keyword());
    out.push_str(&command(&target.name, scope, &target.includes, "target_include_directories"));
    out.push_str(&command(&target.name, scope, &target.defines, "target_compile_definitions"));
    out.push_str(&command(&target.name, scope, &target.copts, "target_compile_options"));
}

/// `name(target [KEYWORD]\n  arg\n  arg)`, or nothing without arguments.
fn command(target: &str, keyword: Option<&str>, args: &[String], name: &str) -> String {
    if args.is_empty() {
        return String::new();
    }

    let mut out = format!("{}({}", name, quote(target));
    if let Some(keyword) = keyword {
        out.push(' ');
        out.push_str(keyword);
    }
    for arg in args {
        out.push_str("\n  ");
        out.push_str(&quote(arg));
    }
    out.push_str(")\n");
    out
}

fn add_subdirectory(dir: &str) -> String {
    if dir.starts_with("../") || Path::new(dir).is_absolute() {
        // Out-of-tree sources need an explicit binary directory
        let name = dir.rsplit('/').next().unwrap_or(dir);
        format!(
            "add_subdirectory({} ${{CMAKE_CURRENT_BINARY_DIR}}/external/{})\n",
            quote(dir),
            name
        )
    } else {
        format!("add_subdirectory({})\n", quote(dir))
    }
}

/// Quote a CMake argument when it would otherwise be split or misread.
fn quote(arg: &str) -> String {
    let needs_quotes = arg.is_empty()
        || arg
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"' | ';' | '#' | '\\'));

    if needs_quotes {
        format!("\"{}\"", arg.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}
