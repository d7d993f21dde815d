//! bzl2cmake CLI - Bazel WORKSPACE/BUILD to CMake translator

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use bzl2cmake::ops::{convert, ConvertOptions};
use bzl2cmake::resolver::ConvertError;
use bzl2cmake::util::diagnostic::{self, Diagnostic};
use cli::Cli;

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("bzl2cmake=debug")
    } else {
        EnvFilter::new("bzl2cmake=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(&cli) {
        report(e, !cli.no_color);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let opts = ConvertOptions {
        workspace: cli.directory.clone().unwrap_or_else(|| PathBuf::from(".")),
        output: cli.output.clone(),
        plan: cli.plan,
    };

    let result = convert(&opts)?;

    if !result.skipped.is_empty() {
        let mut warning = Diagnostic::warning(format!(
            "{} repository(s) could not be fetched and were left out",
            result.skipped.len()
        ));
        for name in &result.skipped {
            warning = warning.with_context(format!("@{}", name));
        }
        diagnostic::emit(&warning, !cli.no_color);
    }

    if cli.plan {
        println!("{}", result.rendered);
    } else {
        eprintln!(
            "Generated {} ({} target(s), {} subproject(s))",
            opts.output.display(),
            result.project.target_count(),
            result.project.subprojects.len()
        );
    }

    Ok(())
}

/// Print an error, with a source snippet for parse errors.
fn report(error: anyhow::Error, color: bool) {
    match error.downcast::<ConvertError>() {
        Ok(ConvertError::Parse(parse)) => {
            eprintln!("{:?}", miette::Report::new(parse));
        }
        Ok(other) => diagnostic::emit(&other.to_diagnostic(), color),
        Err(other) => eprintln!("error: {:#}", other),
    }
}
