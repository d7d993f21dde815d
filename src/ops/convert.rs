//! Implementation of `bzl2cmake`.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::cache::CacheKey;
use crate::core::project::Project;
use crate::emit::cmake;
use crate::resolver::{RepoOutcome, Resolver};
use crate::rules::RuleTable;
use crate::sources::DefaultFetcher;
use crate::util::config::Config;
use crate::util::fs::write_string;

/// Options for a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Root workspace directory
    pub workspace: PathBuf,

    /// Where the generated CMakeLists.txt goes
    pub output: PathBuf,

    /// Print the resolved project tree as JSON instead of writing CMake
    pub plan: bool,
}

/// What a conversion produced.
#[derive(Debug)]
pub struct ConvertResult {
    pub project: Project,

    /// Rendered output: CMake, or JSON with `plan`
    pub rendered: String,

    /// Set when the output file was written
    pub written: Option<PathBuf>,

    /// Repositories whose fetch failed, by name
    pub skipped: Vec<String>,
}

/// Resolve the workspace and write the generated CMake file.
///
/// Nothing is written unless resolution and emission both succeed.
pub fn convert(opts: &ConvertOptions) -> Result<ConvertResult> {
    let config = Config::for_workspace(&opts.workspace);
    let fetcher = DefaultFetcher::new(config.fetch.offline);

    tracing::debug!("Converting {}", opts.workspace.display());
    let rules = RuleTable::standard();
    let mut resolver = Resolver::new(&opts.workspace, &rules, &fetcher, &config)?;
    let project = resolver.resolve()?;

    let skipped: Vec<String> = resolver
        .repositories()
        .resolved()
        .filter_map(|(key, outcome)| match (key, outcome) {
            (CacheKey::Repository(name), RepoOutcome::Skipped) => Some(name.clone()),
            _ => None,
        })
        .collect();

    if opts.plan {
        let rendered =
            serde_json::to_string_pretty(&project).context("failed to serialize project tree")?;
        return Ok(ConvertResult {
            project,
            rendered,
            written: None,
            skipped,
        });
    }

    let rendered = cmake::emit(&project);
    write_string(&opts.output, &rendered)?;
    tracing::info!("Wrote {}", opts.output.display());

    Ok(ConvertResult {
        project,
        rendered,
        written: Some(opts.output.clone()),
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ConvertError;
    use std::fs;
    use tempfile::TempDir;

    fn workspace(build: &str) -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("WORKSPACE"), "workspace(name = \"demo\")\n").unwrap();
        fs::write(tmp.path().join("BUILD"), build).unwrap();
        tmp
    }

    fn options(tmp: &TempDir, plan: bool) -> ConvertOptions {
        ConvertOptions {
            workspace: tmp.path().to_path_buf(),
            output: tmp.path().join("out/CMakeLists.txt"),
            plan,
        }
    }

    #[test]
    fn test_convert_writes_output() {
        let tmp = workspace("cc_library(name = \"core\", srcs = [\"a.c\"], hdrs = [\"a.h\"])\n");
        let opts = options(&tmp, false);

        let result = convert(&opts).unwrap();

        assert_eq!(result.written.as_deref(), Some(opts.output.as_path()));
        let written = fs::read_to_string(&opts.output).unwrap();
        assert_eq!(written, result.rendered);
        assert!(written.contains("project(demo)\n"));
        assert!(written.contains("add_library(core\n  a.c\n  a.h)\n"));
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_reports_skipped_repositories() {
        let tmp = workspace("");
        fs::write(
            tmp.path().join("WORKSPACE"),
            "local_repository(name = \"gone\", path = \"missing\")\n",
        )
        .unwrap();

        let result = convert(&options(&tmp, false)).unwrap();
        assert_eq!(result.skipped, vec!["gone".to_string()]);
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let tmp = workspace("cc_library(name = \"iface\", hdrs = [\"a.h\"], deps = [\":core\"])\n");
        let opts = options(&tmp, false);

        let first = convert(&opts).unwrap().rendered;
        let second = convert(&opts).unwrap().rendered;
        assert_eq!(first, second);
    }

    #[test]
    fn test_fatal_error_writes_nothing() {
        let tmp = workspace("cc_test(name = \"t\", srcs = [\"t.c\"])\n");
        let opts = options(&tmp, false);

        let err = convert(&opts).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::UnsupportedRule { .. })
        ));
        assert!(!opts.output.exists());
    }

    #[test]
    fn test_plan_does_not_write() {
        let tmp = workspace("cc_library(name = \"core\", srcs = [\"a.c\"])\n");
        let opts = options(&tmp, true);

        let result = convert(&opts).unwrap();
        assert!(result.written.is_none());
        assert!(!opts.output.exists());

        let json: serde_json::Value = serde_json::from_str(&result.rendered).unwrap();
        assert_eq!(json["name"], "demo");
        assert_eq!(json["targets"][0]["kind"], "library");
    }
}
