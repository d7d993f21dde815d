//! Conversion error types and diagnostics.
//!
//! Every variant here is fatal: the run stops and no output is written.
//! Recoverable repository fetch failures are `FetchError`s and never
//! reach this type unless the fetcher reports them as unrecoverable.

use std::path::PathBuf;

use thiserror::Error;

use crate::dsl::value::Location;
use crate::sources::FetchError;
use crate::util::diagnostic::{suggestions, Diagnostic, ParseError};

/// Fatal error while resolving and translating a workspace.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("no WORKSPACE file found in {}", dir.display())]
    NoWorkspace { dir: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("unknown rule `{kind}` ({location})")]
    UnknownRule { kind: String, location: Location },

    #[error("unsupported rule `{kind}` ({location})")]
    UnsupportedRule { kind: String, location: Location },

    #[error("rule `{kind}` is only valid in {allowed} files ({location})")]
    WrongScope {
        kind: String,
        allowed: &'static str,
        location: Location,
    },

    #[error("missing argument `{argument}` to `{rule}` ({location})")]
    MissingArgument {
        rule: String,
        argument: String,
        location: Location,
    },

    #[error("invalid argument to `{rule}`: {message} ({location})")]
    InvalidArgument {
        rule: String,
        message: String,
        location: Location,
    },

    #[error("`{name}` is not defined ({location})")]
    UndefinedName { name: String, location: Location },

    #[error("select() is not supported ({location})")]
    SelectUnsupported { location: Location },

    #[error("cyclic load of {}", file.display())]
    CyclicLoad { file: PathBuf },

    #[error("repository `{name}` uses version control, which is not supported ({remote})")]
    VcsUnsupported { name: String, remote: String },

    #[error("repository `{name}` could not be fetched: {source}")]
    Fetch {
        name: String,
        #[source]
        source: FetchError,
    },

    #[error("repository `{name}` at {} has no WORKSPACE, BUILD or CMakeLists.txt", dir.display())]
    InvalidRepository { name: String, dir: PathBuf },
}

impl ConvertError {
    /// Wrap an I/O error with the path that caused it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ConvertError::NoWorkspace { dir } => Diagnostic::error("no WORKSPACE file found")
                .with_location(dir)
                .with_suggestion(suggestions::NO_WORKSPACE),

            ConvertError::UnsupportedRule { kind, location } => {
                Diagnostic::error(format!("unsupported rule `{}`", kind))
                    .with_location(location.to_string())
                    .with_context(format!(
                        "`{}` has no CMake translation; converting without it would \
                         produce an incomplete build",
                        kind
                    ))
                    .with_suggestion(suggestions::UNSUPPORTED_RULE)
            }

            ConvertError::UnknownRule { kind, location } => {
                Diagnostic::error(format!("unknown rule `{}`", kind))
                    .with_location(location.to_string())
                    .with_context("the rule is neither built in nor defined by a loaded file")
                    .with_suggestion(suggestions::UNSUPPORTED_RULE)
            }

            ConvertError::SelectUnsupported { location } => {
                Diagnostic::error("select() is not supported")
                    .with_location(location.to_string())
                    .with_suggestion(suggestions::SELECT)
            }

            ConvertError::VcsUnsupported { name, remote } => Diagnostic::error(format!(
                "repository `{}` uses version control, which is not supported",
                name
            ))
            .with_context(format!("remote: {}", remote))
            .with_suggestion(suggestions::VCS),

            ConvertError::CyclicLoad { file } => {
                Diagnostic::error("cyclic load detected")
                    .with_location(file)
                    .with_context("the file is loaded, directly or indirectly, by itself")
            }

            ConvertError::Parse(err) => Diagnostic::error(err.message.clone())
                .with_location(format!("{}:{}:{}", err.file, err.line, err.column)),

            other => Diagnostic::error(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_unsupported_rule_diagnostic() {
        let err = ConvertError::UnsupportedRule {
            kind: "cc_test".into(),
            location: Location::new(Path::new("BUILD"), 4),
        };

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("error: unsupported rule `cc_test`"));
        assert!(output.contains("--> BUILD:4"));
        assert!(output.contains("help: consider:"));
    }

    #[test]
    fn test_fallback_diagnostic_uses_display() {
        let err = ConvertError::MissingArgument {
            rule: "cc_library".into(),
            argument: "name".into(),
            location: Location::new(Path::new("BUILD"), 1),
        };
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("missing argument `name` to `cc_library` (BUILD:1)"));
    }
}
