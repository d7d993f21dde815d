//! Evaluator for parsed rule files.
//!
//! Statements are evaluated in source order and every call is handed to
//! the [`Host`] as soon as its arguments are known, so a `load` finishes
//! before the statements after it run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::dsl::ast::{Argument, Expr, Module, Stmt};
use crate::dsl::value::{Bindings, Invocation, Location, Value};
use crate::resolver::ConvertError;
use crate::util::config::SelectPolicy;
use crate::util::fs::glob_relative;

/// The side of evaluation that knows about rules and the filesystem.
pub trait Host {
    /// Directory that relative file patterns resolve against.
    fn current_dir(&self) -> &Path;

    /// How `select()` is handled.
    fn select_policy(&self) -> SelectPolicy;

    /// Dispatch one rule call. For `load` the returned value is a dict of
    /// the loaded file's exported bindings.
    fn call(&mut self, invocation: Invocation) -> Result<Value, ConvertError>;
}

/// Evaluates one file's statements against a [`Host`].
pub struct Interpreter {
    file: PathBuf,
    globals: Bindings,
    loaded: Bindings,
    exported: HashSet<String>,
}

impl Interpreter {
    /// Create an interpreter for `file`.
    pub fn new(file: &Path) -> Self {
        Interpreter {
            file: file.to_path_buf(),
            globals: Bindings::new(),
            loaded: Bindings::new(),
            exported: HashSet::new(),
        }
    }

    /// Run every statement in order.
    pub fn run(&mut self, module: &Module, host: &mut dyn Host) -> Result<(), ConvertError> {
        for stmt in &module.statements {
            self.exec(stmt, host)?;
        }
        Ok(())
    }

    /// Top-level assignments visible to files that load this one.
    /// Names starting with `_` stay private.
    pub fn into_exports(self) -> Bindings {
        self.globals
            .into_iter()
            .filter(|(name, _)| self.exported.contains(name) && !name.starts_with('_'))
            .collect()
    }

    fn location(&self, line: usize) -> Location {
        Location::new(&self.file, line)
    }

    fn exec(&mut self, stmt: &Stmt, host: &mut dyn Host) -> Result<(), ConvertError> {
        match stmt {
            Stmt::Expr(expr) => {
                self.eval(expr, host)?;
            }
            Stmt::Assign { target, value, .. } => {
                let value = self.eval(value, host)?;
                self.globals.insert(target.clone(), value);
                self.exported.insert(target.clone());
            }
            Stmt::Load {
                module,
                symbols,
                line,
            } => {
                let mut invocation = Invocation::new("load", self.location(*line))
                    .arg(Value::Str(module.clone()));
                for symbol in symbols {
                    invocation = if symbol.aliased {
                        invocation.kwarg(symbol.local.clone(), Value::Str(symbol.exported.clone()))
                    } else {
                        invocation.arg(Value::Str(symbol.exported.clone()))
                    };
                }

                let exports = match host.call(invocation)? {
                    Value::Dict(entries) => entries,
                    _ => Vec::new(),
                };

                for symbol in symbols {
                    if let Some((_, value)) = exports.iter().find(|(k, _)| *k == symbol.exported) {
                        self.loaded.insert(symbol.local.clone(), value.clone());
                    }
                }
            }
        }
        Ok(())
    }

    fn eval(&mut self, expr: &Expr, host: &mut dyn Host) -> Result<Value, ConvertError> {
        match expr {
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::None => Ok(Value::None),
            Expr::Name { name, line } => self
                .globals
                .get(name)
                .or_else(|| self.loaded.get(name))
                .cloned()
                .ok_or_else(|| ConvertError::UndefinedName {
                    name: name.clone(),
                    location: self.location(*line),
                }),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item, host))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Expr::Dict { entries, line } => {
                let mut out = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = match self.eval(key, host)? {
                        Value::Str(s) => s,
                        other => {
                            return Err(ConvertError::InvalidArgument {
                                rule: "dict".to_string(),
                                message: format!(
                                    "keys must be strings, got {}",
                                    other.type_name()
                                ),
                                location: self.location(*line),
                            })
                        }
                    };
                    out.push((key, self.eval(value, host)?));
                }
                Ok(Value::Dict(out))
            }
            Expr::Add { lhs, rhs, line } => {
                let lhs = self.eval(lhs, host)?;
                let rhs = self.eval(rhs, host)?;
                self.add(lhs, rhs, *line)
            }
            Expr::Call(call) => {
                let kind = call
                    .callee
                    .strip_prefix("native.")
                    .unwrap_or(&call.callee)
                    .to_string();
                let invocation = self.invocation(kind, &call.args, call.line, host)?;
                host.call(invocation)
            }
            Expr::Glob { args, line } => {
                let invocation = self.invocation("glob".to_string(), args, *line, host)?;
                self.glob(&invocation, host)
            }
            Expr::Select { line, .. } => match host.select_policy() {
                SelectPolicy::Error => Err(ConvertError::SelectUnsupported {
                    location: self.location(*line),
                }),
                SelectPolicy::Empty => {
                    tracing::warn!("{}: select() replaced by an empty list", self.location(*line));
                    Ok(Value::List(Vec::new()))
                }
            },
        }
    }

    fn invocation(
        &mut self,
        kind: String,
        args: &[Argument],
        line: usize,
        host: &mut dyn Host,
    ) -> Result<Invocation, ConvertError> {
        let mut invocation = Invocation::new(kind, self.location(line));

        for arg in args {
            match arg {
                Argument::Positional(expr) => {
                    let value = self.eval(expr, host)?;
                    invocation.args.push(value);
                }
                Argument::Keyword(key, expr) => {
                    if invocation.has(key) {
                        return Err(invocation.invalid(format!(
                            "keyword argument `{}` repeated",
                            key
                        )));
                    }
                    let value = self.eval(expr, host)?;
                    invocation.kwargs.push((key.clone(), value));
                }
            }
        }

        Ok(invocation)
    }

    fn add(&self, lhs: Value, rhs: Value, line: usize) -> Result<Value, ConvertError> {
        match (lhs, rhs) {
            (Value::Str(mut a), Value::Str(b)) => {
                a.push_str(&b);
                Ok(Value::Str(a))
            }
            (Value::List(mut a), Value::List(b)) => {
                a.extend(b);
                Ok(Value::List(a))
            }
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(b))),
            (a, b) => Err(ConvertError::InvalidArgument {
                rule: "+".to_string(),
                message: format!(
                    "unsupported operand types: {} + {}",
                    a.type_name(),
                    b.type_name()
                ),
                location: self.location(line),
            }),
        }
    }

    /// Expand `glob(include, exclude = [...])` against the host directory.
    fn glob(&self, invocation: &Invocation, host: &dyn Host) -> Result<Value, ConvertError> {
        let include = match (invocation.args.first(), invocation.get("include")) {
            (Some(value), None) | (None, Some(value)) => value
                .to_string_list()
                .map_err(|found| invocation.invalid(format!("include must be a list of strings, got {}", found)))?,
            (None, None) => Vec::new(),
            (Some(_), Some(_)) => {
                return Err(invocation.invalid("include given both positionally and by keyword"))
            }
        };
        let exclude = invocation.str_list("exclude")?;

        let base = host.current_dir();
        let matches = glob_relative(base, &include)
            .map_err(|e| invocation.invalid(format!("{:#}", e)))?;
        let excluded: HashSet<String> = glob_relative(base, &exclude)
            .map_err(|e| invocation.invalid(format!("{:#}", e)))?
            .into_iter()
            .chain(exclude.iter().cloned())
            .collect();

        let files: Vec<String> = matches
            .into_iter()
            .filter(|f| !excluded.contains(f))
            .collect();

        tracing::debug!(
            "{}: glob({:?}) matched {} file(s)",
            invocation.location,
            include,
            files.len()
        );

        Ok(Value::string_list(files))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Records invocations; `load` returns a fixed export set.
    struct RecordingHost {
        dir: PathBuf,
        policy: SelectPolicy,
        calls: Vec<Invocation>,
        exports: Vec<(String, Value)>,
    }

    impl RecordingHost {
        fn new(dir: &Path) -> Self {
            RecordingHost {
                dir: dir.to_path_buf(),
                policy: SelectPolicy::Error,
                calls: Vec::new(),
                exports: Vec::new(),
            }
        }
    }

    impl Host for RecordingHost {
        fn current_dir(&self) -> &Path {
            &self.dir
        }

        fn select_policy(&self) -> SelectPolicy {
            self.policy
        }

        fn call(&mut self, invocation: Invocation) -> Result<Value, ConvertError> {
            let is_load = invocation.kind == "load";
            self.calls.push(invocation);
            if is_load {
                Ok(Value::Dict(self.exports.clone()))
            } else {
                Ok(Value::None)
            }
        }
    }

    fn run(source: &str, host: &mut RecordingHost) -> Result<Bindings, ConvertError> {
        let module = crate::dsl::parser::parse(source, "BUILD")?;
        let mut interpreter = Interpreter::new(Path::new("BUILD"));
        interpreter.run(&module, host)?;
        Ok(interpreter.into_exports())
    }

    #[test]
    fn test_calls_dispatched_in_order() {
        let tmp = TempDir::new().unwrap();
        let mut host = RecordingHost::new(tmp.path());

        run(
            r#"
package(default_visibility = ["//visibility:public"])
cc_library(name = "a", srcs = ["a.c"])
native.cc_library(name = "b", hdrs = ["b.h"], deps = [":a"])
"#,
            &mut host,
        )
        .unwrap();

        let kinds: Vec<_> = host.calls.iter().map(|c| c.kind.as_str()).collect();
        assert_eq!(kinds, vec!["package", "cc_library", "cc_library"]);
        assert_eq!(host.calls[2].str_list("deps").unwrap(), vec![":a"]);
        assert_eq!(host.calls[1].location.line, 3);
    }

    #[test]
    fn test_glob_with_exclude() {
        let tmp = TempDir::new().unwrap();
        for name in ["x.c", "y.c", "z.h"] {
            fs::write(tmp.path().join(name), "").unwrap();
        }
        let mut host = RecordingHost::new(tmp.path());

        run(
            r#"cc_library(name = "g", srcs = glob(["*.c"], exclude = ["y.c"]))"#,
            &mut host,
        )
        .unwrap();

        assert_eq!(host.calls[0].str_list("srcs").unwrap(), vec!["x.c"]);
    }

    #[test]
    fn test_glob_include_keyword_and_pattern_exclude() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src/test")).unwrap();
        fs::write(tmp.path().join("src/a.c"), "").unwrap();
        fs::write(tmp.path().join("src/test/a_test.c"), "").unwrap();
        let mut host = RecordingHost::new(tmp.path());

        run(
            r#"SRCS = glob(include = ["src/**/*.c"], exclude = ["src/test/*.c"])
cc_library(name = "g", srcs = SRCS)"#,
            &mut host,
        )
        .unwrap();

        assert_eq!(host.calls[0].str_list("srcs").unwrap(), vec!["src/a.c"]);
    }

    #[test]
    fn test_variables_and_concatenation() {
        let tmp = TempDir::new().unwrap();
        let mut host = RecordingHost::new(tmp.path());

        let exports = run(
            r#"
COMMON = ["a.h"]
_PRIVATE = "x"
cc_library(name = "lib" + "core", hdrs = COMMON + ["b.h"])
"#,
            &mut host,
        )
        .unwrap();

        let call = &host.calls[0];
        assert_eq!(call.require_str("name").unwrap(), "libcore");
        assert_eq!(call.str_list("hdrs").unwrap(), vec!["a.h", "b.h"]);
        assert!(exports.contains_key("COMMON"));
        assert!(!exports.contains_key("_PRIVATE"));
    }

    #[test]
    fn test_load_binds_exported_symbols() {
        let tmp = TempDir::new().unwrap();
        let mut host = RecordingHost::new(tmp.path());
        host.exports = vec![("COPTS".to_string(), Value::string_list(["-Wall"]))];

        let exports = run(
            r#"
load(":defs.bzl", "COPTS", my_rule = "my_rule")
cc_library(name = "x", copts = COPTS)
"#,
            &mut host,
        )
        .unwrap();

        let load = &host.calls[0];
        assert_eq!(load.kind, "load");
        assert_eq!(load.positional_strs().unwrap(), vec![":defs.bzl", "COPTS"]);
        assert_eq!(load.get("my_rule"), Some(&Value::Str("my_rule".into())));
        assert_eq!(host.calls[1].str_list("copts").unwrap(), vec!["-Wall"]);
        // Loaded names are not re-exported
        assert!(!exports.contains_key("COPTS"));
    }

    #[test]
    fn test_dict_keys_must_be_strings() {
        let tmp = TempDir::new().unwrap();
        let mut host = RecordingHost::new(tmp.path());

        let err = run("M = {1: \"a\"}", &mut host).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::InvalidArgument { ref message, .. } if message.contains("keys must be strings")
        ));
    }

    #[test]
    fn test_undefined_name() {
        let tmp = TempDir::new().unwrap();
        let mut host = RecordingHost::new(tmp.path());

        let err = run("cc_library(name = NAME)", &mut host).unwrap_err();
        assert!(matches!(err, ConvertError::UndefinedName { ref name, .. } if name == "NAME"));
        assert!(host.calls.is_empty());
    }

    #[test]
    fn test_select_policies() {
        let tmp = TempDir::new().unwrap();
        let source = r#"cc_library(name = "s", srcs = ["a.c"] + select({"//conditions:default": []}))"#;

        let mut host = RecordingHost::new(tmp.path());
        let err = run(source, &mut host).unwrap_err();
        assert!(matches!(err, ConvertError::SelectUnsupported { .. }));
        assert!(host.calls.is_empty());

        let mut host = RecordingHost::new(tmp.path());
        host.policy = SelectPolicy::Empty;
        run(source, &mut host).unwrap();
        assert_eq!(host.calls[0].str_list("srcs").unwrap(), vec!["a.c"]);
    }

    #[test]
    fn test_duplicate_keyword_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let mut host = RecordingHost::new(tmp.path());

        let err = run(r#"cc_library(name = "a", name = "b")"#, &mut host).unwrap_err();
        assert!(err.to_string().contains("repeated"));
    }

    #[test]
    fn test_bad_operands() {
        let tmp = TempDir::new().unwrap();
        let mut host = RecordingHost::new(tmp.path());

        let err = run(r#"x = "a" + ["b"]"#, &mut host).unwrap_err();
        assert!(err.to_string().contains("string + list"));
    }
}
