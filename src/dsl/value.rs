//! Runtime values and rule invocations.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::resolver::ConvertError;

/// A value produced by evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Value>),
    /// String-keyed dictionary, in insertion order
    Dict(Vec<(String, Value)>),
}

impl Value {
    /// Name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
        }
    }

    /// Borrow the string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Build a list of strings.
    pub fn string_list<I, S>(items: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(|s| Value::Str(s.into())).collect())
    }

    /// Interpret the value as a list of strings.
    ///
    /// Returns the offending type name on mismatch.
    pub fn to_string_list(&self) -> Result<Vec<String>, &'static str> {
        match self {
            Value::None => Ok(Vec::new()),
            Value::List(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or(item.type_name()))
                .collect(),
            other => Err(other.type_name()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Dict(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Names bound at the top level of a file.
pub type Bindings = BTreeMap<String, Value>;

/// A position in a rule file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
}

impl Location {
    pub fn new(file: &Path, line: usize) -> Self {
        Location {
            file: file.to_path_buf(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// One rule call with evaluated arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Rule kind, e.g. `cc_library`
    pub kind: String,
    /// Positional arguments
    pub args: Vec<Value>,
    /// Keyword arguments, in call order
    pub kwargs: Vec<(String, Value)>,
    /// Where the call appears
    pub location: Location,
}

impl Invocation {
    /// Create an invocation without arguments.
    pub fn new(kind: impl Into<String>, location: Location) -> Self {
        Invocation {
            kind: kind.into(),
            args: Vec::new(),
            kwargs: Vec::new(),
            location,
        }
    }

    /// Add a keyword argument.
    pub fn kwarg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.kwargs.push((key.into(), value));
        self
    }

    /// Add a positional argument.
    pub fn arg(mut self, value: Value) -> Self {
        self.args.push(value);
        self
    }

    /// Look up a keyword argument.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.kwargs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether a keyword argument was passed.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// A required string keyword argument.
    pub fn require_str(&self, key: &str) -> Result<String, ConvertError> {
        match self.get(key) {
            Some(Value::Str(s)) => Ok(s.clone()),
            Some(other) => Err(self.type_error(key, "string", other.type_name())),
            None => Err(ConvertError::MissingArgument {
                rule: self.kind.clone(),
                argument: key.to_string(),
                location: self.location.clone(),
            }),
        }
    }

    /// An optional string keyword argument; `None` counts as absent.
    pub fn opt_str(&self, key: &str) -> Result<Option<String>, ConvertError> {
        match self.get(key) {
            Some(Value::Str(s)) => Ok(Some(s.clone())),
            Some(Value::None) | None => Ok(None),
            Some(other) => Err(self.type_error(key, "string", other.type_name())),
        }
    }

    /// A list-of-strings keyword argument; absent means empty.
    pub fn str_list(&self, key: &str) -> Result<Vec<String>, ConvertError> {
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(value) => value
                .to_string_list()
                .map_err(|found| self.type_error(key, "list of strings", found)),
        }
    }

    /// Positional arguments as strings.
    pub fn positional_strs(&self) -> Result<Vec<String>, ConvertError> {
        self.args
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.invalid(format!("expected string, got {}", v.type_name())))
            })
            .collect()
    }

    /// Build an `InvalidArgument` error for this call.
    pub fn invalid(&self, message: impl Into<String>) -> ConvertError {
        ConvertError::InvalidArgument {
            rule: self.kind.clone(),
            message: message.into(),
            location: self.location.clone(),
        }
    }

    fn type_error(&self, key: &str, expected: &str, found: &str) -> ConvertError {
        self.invalid(format!("`{}` must be a {}, got {}", key, expected, found))
    }
}
