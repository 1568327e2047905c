//! Run: read the log and print issues.

use std::io::Write;

use msbuild_issues::{Issue, IssueReader, ReadReport};

use crate::args::{Cli, FormatArg};
use crate::conf::{self, CliConfig, OutputFormat};

pub fn run(
    cli: &Cli,
    config: &CliConfig,
    out: &mut impl Write,
) -> Result<ReadReport, Box<dyn std::error::Error>> {
    let repo_root = conf::repo_root(cli.repo.as_deref())?;
    let reader = IssueReader::new(&repo_root, config.read.clone())?;

    let content = std::fs::read(&cli.log).map_err(|e| {
        tracing::error!("Failed to read {}: {}", cli.log.display(), e);
        e
    })?;

    let report = match cli.format {
        FormatArg::Auto => reader.read_auto(&content)?,
        FormatArg::Fixed(format) => reader.read_report(format, &content)?,
    };

    let output = cli.output.unwrap_or(config.output);
    write_issues(&report.issues, output, out)?;

    if cli.stats {
        eprintln!("{}", serde_json::to_string(&report.stats)?);
    }
    Ok(report)
}

pub fn write_issues(
    issues: &[Issue],
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, issues)?;
            writeln!(out)?;
        }
        OutputFormat::JsonLines => {
            for issue in issues {
                serde_json::to_writer(&mut *out, issue)?;
                writeln!(out)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
