//! User-friendly diagnostic messages.
//!
//! Every fatal error is rendered with its root cause, the file it came
//! from, and a suggested fix where one exists.

use std::fmt;
use std::path::PathBuf;

use miette::{Diagnostic as MietteDiagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when no WORKSPACE file is found.
    pub const NO_WORKSPACE: &str =
        "Run bzl2cmake from the directory containing the WORKSPACE file, or pass -C <dir>";

    /// Suggestion when an unsupported rule is reached.
    pub const UNSUPPORTED_RULE: &str =
        "Remove the rule from the BUILD file or convert that part of the project by hand";

    /// Suggestion when `select()` is reached.
    pub const SELECT: &str =
        "Set `select = \"empty\"` under [rules] in .bzl2cmake/config.toml to drop select() values";

    /// Suggestion for version-control repositories.
    pub const VCS: &str = "Replace the repository with an http_archive of a release tarball";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Warning,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Syntax error in a WORKSPACE, BUILD or `.bzl` file.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("{message} ({file}:{line}:{column})")]
#[diagnostic(code(bzl2cmake::dsl::syntax))]
pub struct ParseError {
    pub message: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: SourceSpan,
}

impl ParseError {
    /// Build a parse error pointing at `offset` in `source`.
    pub fn new(message: impl Into<String>, file: &str, source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let column = before.rfind('\n').map_or(offset, |nl| offset - nl - 1) + 1;

        ParseError {
            message: message.into(),
            file: file.to_string(),
            line,
            column,
            src: NamedSource::new(file, source.to_string()),
            span: SourceSpan::from((offset, 0)),
        }
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("unsupported rule `cc_test`")
            .with_location("pkg/BUILD")
            .with_context("cc_test cannot be expressed by this converter")
            .with_suggestion(suggestions::UNSUPPORTED_RULE);

        let output = diag.format(false);
        assert!(output.contains("error: unsupported rule `cc_test`"));
        assert!(output.contains("--> pkg/BUILD"));
        assert!(output.contains("cannot be expressed"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("1. Remove the rule"));
    }

    #[test]
    fn test_parse_error_position() {
        let source = "a = 1\nb = (\n";
        let err = ParseError::new("unexpected end of file", "BUILD", source, 12);
        assert_eq!(err.line, 3);
        assert_eq!(err.column, 1);

        let err = ParseError::new("bad", "BUILD", source, 8);
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 3);
        assert!(err.to_string().contains("BUILD:2:3"));
    }
}
