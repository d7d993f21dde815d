//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

/// Translate a Bazel workspace into a single CMakeLists.txt
#[derive(Parser)]
#[command(name = "bzl2cmake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output file to write (e.g. CMakeLists.txt)
    pub output: PathBuf,

    /// Workspace directory (defaults to the current directory)
    #[arg(short = 'C', long = "directory", value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Print the resolved project tree as JSON instead of writing CMake
    #[arg(long)]
    pub plan: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}
