//! MSBuild binary log (`msbuild -bl`, `.binlog`).
//!
//! # Layout
//!
//! ```text
//! gzip(
//!   version: i32 LE
//!   minimum reader version: i32 LE          (version >= 18)
//!   record*
//! )
//! record  = kind: 7-bit int | body
//! String  = 24 | length: 7-bit int | UTF-8 bytes
//! other   = kind | length: 7-bit int | payload   (version >= 18)
//! ```
//!
//! String records fill a string table that event fields refer to (`0` =
//! null, `1` = empty, `n >= 10` = `table[n - 10]`); logs before version 10
//! store strings inline. Warning (10) and error (9) payloads start with a
//! field mask announcing which of message, build event context, thread id,
//! help keyword, sender, timestamp, subcategory, code, file, project file,
//! line, column, end line, end column and message arguments follow.
//!
//! From version 18 on every record except strings carries its length, so
//! unknown kinds are skipped by length. Older logs have no lengths; only
//! records whose layout is known can be stepped over there.

mod reader;
pub mod record;
mod writer;

use thiserror::Error;

use super::LogFileFormat;
use crate::error::Result;
use crate::metrics::ReadStats;
use crate::model::{Issue, LogFormat, Position};
use crate::normalize::{self, DiagnosticFields, DiagnosticNormalizer, DropReason, Lookup};

pub use reader::BinaryLogReader;
pub use record::BuildEvent;
pub use writer::BinaryLogWriter;

pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// First version with deduplicated strings.
pub const STRING_TABLE_VERSION: i32 = 10;
/// First version with length-prefixed records and a minimum reader version.
pub const FORWARD_COMPATIBLE_VERSION: i32 = 18;
/// Newest format version this reader knows; also what the writer emits.
pub const READER_VERSION: i32 = 25;

/// Largest single record accepted (16 MiB).
pub const MAX_RECORD_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum BinaryLogError {
    #[error("unsupported file format version {0}")]
    UnsupportedVersion(i32),

    #[error("file format version {version} needs a reader for version {minimum_reader_version} or newer")]
    NewerThanReader {
        version: i32,
        minimum_reader_version: i32,
    },

    #[error("record kind {kind} cannot be skipped in file format version {version}")]
    UnskippableRecord { kind: u32, version: i32 },

    #[error("unexpected end of data while reading {0}")]
    Truncated(&'static str),

    #[error("malformed 7-bit encoded integer")]
    InvalidVarint,

    #[error("string reference {0} does not point into the string table")]
    InvalidStringRef(u32),

    #[error("string is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("failed to decompress log: {0}")]
    Decompression(#[source] std::io::Error),

    #[error("record of {size} bytes exceeds the limit of {limit} bytes")]
    OversizedRecord { size: usize, limit: usize },

    #[error("decompressed log exceeds the limit of {limit} bytes")]
    InflatedTooLarge { limit: usize },
}

pub struct BinaryLogFormat;

impl LogFileFormat for BinaryLogFormat {
    fn format(&self) -> LogFormat {
        LogFormat::Binary
    }

    fn read_issues(
        &self,
        content: &[u8],
        normalizer: &DiagnosticNormalizer<'_>,
        stats: &mut ReadStats,
    ) -> Result<Vec<Issue>> {
        let reader = BinaryLogReader::with_max_size(content, normalizer.options().max_log_size)?;

        let mut issues = Vec::new();
        for event in reader {
            let event = event?;
            stats.record_inspected();
            match read_event(event, normalizer) {
                Ok(issue) => {
                    stats.record_emitted();
                    issues.push(issue);
                }
                Err(reason) => {
                    tracing::info!(reason = reason.as_str(), "Skip build event");
                    stats.record_drop(reason);
                }
            }
        }

        tracing::debug!(
            issues = issues.len(),
            dropped = stats.total_dropped(),
            "Read binary log"
        );
        Ok(issues)
    }
}

fn read_event(
    event: BuildEvent,
    normalizer: &DiagnosticNormalizer<'_>,
) -> std::result::Result<Issue, DropReason> {
    let message = normalizer
        .message(event.message.as_deref().unwrap_or_default())
        .required(DropReason::MissingMessage)?;

    // A project that cannot be mapped only loses its project information.
    let project = match normalizer.project(event.project_file.as_deref()) {
        Lookup::Found(project) => Some(project),
        Lookup::NotFound | Lookup::Invalid(_) => None,
    };

    let file = normalizer
        .file(event.file.as_deref(), event.project_file.as_deref())
        .optional()?;

    let rule = normalizer.rule(event.code.as_deref()).optional()?;

    Ok(normalizer.assemble(DiagnosticFields {
        message,
        severity: event.severity,
        project,
        file,
        position: Position {
            line: normalize::position(event.line.into()),
            end_line: normalize::position(event.end_line.into()),
            column: normalize::position(event.column.into()),
            end_column: normalize::position(event.end_column.into()),
        },
        rule,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::ReadOptions;
    use crate::error::Error;
    use crate::model::Severity;
    use crate::paths::RepositoryRoot;
    use crate::rule::ResolverChain;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const ROOT: &str = r"c:\Source\Cake.Issues.MsBuild";
    const PROJECT: &str = r"c:\Source\Cake.Issues.MsBuild\src\ClassLibrary1\ClassLibrary1.csproj";

    fn read(events: &[BuildEvent]) -> Result<(Vec<Issue>, ReadStats)> {
        let mut writer = BinaryLogWriter::new();
        for event in events {
            writer.write_event(event);
        }
        read_bytes(&writer.finish_compressed().unwrap())
    }

    fn read_bytes(content: &[u8]) -> Result<(Vec<Issue>, ReadStats)> {
        let repo = RepositoryRoot::new(ROOT).unwrap();
        let resolvers = ResolverChain::with_defaults();
        let options = ReadOptions::default();
        let normalizer = DiagnosticNormalizer::new(&repo, &resolvers, &options);
        let mut stats = ReadStats::new(LogFormat::Binary);
        let issues = BinaryLogFormat.read_issues(content, &normalizer, &mut stats)?;
        Ok((issues, stats))
    }

    #[test]
    fn test_reads_warning_relative_to_project() {
        let (issues, _) = read(&[BuildEvent::warning(
            "The variable 'foo' is assigned but its value is never used",
        )
        .with_code("CS0219")
        .in_project(PROJECT)
        .at("Class1.cs", 10, 17)])
        .unwrap();

        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.project_name(), "ClassLibrary1");
        assert_eq!(issue.file_path().unwrap().as_str(), "src/ClassLibrary1/Class1.cs");
        assert_eq!((issue.line(), issue.column()), (Some(10), Some(17)));
        assert_eq!(issue.severity(), Severity::Warning);
    }

    #[test]
    fn test_error_event_has_error_severity() {
        let (issues, _) = read(&[BuildEvent::error("boom").in_project(PROJECT)]).unwrap();
        assert_eq!(issues[0].severity(), Severity::Error);
        assert_eq!(issues[0].priority(), 400);
    }

    #[test]
    fn test_missing_positions_are_kept_absent() {
        let (issues, _) = read(&[BuildEvent::warning("Sign assembly").with_code("CA2210")]).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line(), None);
        assert_eq!(issues[0].column(), None);
        assert!(issues[0].rule_url().unwrap().as_str().contains("CA2210"));
    }

    #[test]
    fn test_end_positions() {
        let (issues, _) = read(&[BuildEvent::warning("range")
            .at("Class1.cs", 1, 2)
            .in_project(PROJECT)
            .ending_at(3, -4)])
        .unwrap();
        assert_eq!(issues[0].end_line(), Some(3));
        assert_eq!(issues[0].end_column(), None);
    }

    #[test]
    fn test_project_outside_repository_is_cleared() {
        let (issues, stats) = read(&[BuildEvent::warning("msg")
            .in_project(r"c:\Other\Other.csproj")
            .at(r"c:\Source\Cake.Issues.MsBuild\src\A.cs", 1, 1)])
        .unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].project_path().is_none());
        assert_eq!(issues[0].project_name(), "");
        assert_eq!(issues[0].file_path().unwrap().as_str(), "src/A.cs");
        assert_eq!(stats.total_dropped(), 0);
    }

    #[test]
    fn test_file_outside_repository_drops_event() {
        let (issues, stats) = read(&[BuildEvent::warning("msg").at(r"c:\Other\A.cs", 1, 1)]).unwrap();
        assert!(issues.is_empty());
        assert_eq!(stats.dropped.get(&DropReason::FileOutsideRepository), Some(&1));
    }

    #[test]
    fn test_blank_or_null_message_drops_event() {
        let mut null_message = BuildEvent::warning("");
        null_message.message = None;
        let (issues, stats) = read(&[BuildEvent::warning(" "), null_message]).unwrap();
        assert!(issues.is_empty());
        assert_eq!(stats.dropped.get(&DropReason::MissingMessage), Some(&2));
    }

    #[test]
    fn test_corrupt_log_is_error() {
        assert!(matches!(
            read_bytes(b"<build/>"),
            Err(Error::Binary(BinaryLogError::NewerThanReader { .. }))
        ));
    }

    #[test]
    fn test_compressed_header_only_log_has_no_issues() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&9i32.to_le_bytes()).unwrap();
        encoder.write_all(&[0]).unwrap();
        let content = encoder.finish().unwrap();

        let (issues, stats) = read_bytes(&content).unwrap();
        assert!(issues.is_empty());
        assert_eq!(stats.elements_inspected, 0);
    }
}
