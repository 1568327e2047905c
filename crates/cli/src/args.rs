use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use msbuild_issues::LogFormat;

use crate::conf::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "msbuild-issues",
    version,
    about = "Extract MSBuild warnings and errors as repository-relative issues"
)]
pub struct Cli {
    /// Log file to read.
    pub log: PathBuf,

    /// Log format: xml, binary or auto.
    #[arg(short, long, default_value = "auto")]
    pub format: FormatArg,

    /// Repository root [env: MSBUILD_ISSUES_REPO_ROOT, default: current directory].
    #[arg(short, long)]
    pub repo: Option<String>,

    /// TOML configuration file [env: MSBUILD_ISSUES_CONFIG].
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format; overrides the configuration file.
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Print read statistics as JSON to stderr.
    #[arg(long)]
    pub stats: bool,

    /// Debug logging unless RUST_LOG is set.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Auto,
    Fixed(LogFormat),
}

impl FromStr for FormatArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(FormatArg::Auto);
        }
        s.parse().map(FormatArg::Fixed)
    }
}
