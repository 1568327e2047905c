//! MSBuild log issue extraction.
//!
//! Turns raw MSBuild logs into canonical, repository-relative [`Issue`]
//! records.
//!
//! # Architecture
//!
//! - `paths.rs`: repository-root validation and relativization
//! - `rule.rs`: rule code parsing and the priority-ordered URL resolver chain
//! - `normalize.rs`: per-field lookups and issue assembly shared by all formats
//! - `formats/`: one strategy per log format (XML file logger, binary log)
//! - `detect.rs`: content sniffing for automatic format selection
//! - `reader.rs`: the `read_issues` entry point
//! - `metrics.rs`: per-call and cumulative read counters
//! - `conf/`: read options and TOML loading

pub mod conf;
pub mod detect;
pub mod error;
pub mod formats;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod paths;
pub mod reader;
pub mod rule;

pub use conf::{EmptyRulePolicy, ReadOptions};
pub use error::{ArgumentProblem, Error, Result};
pub use formats::binary::{BinaryLogError, BinaryLogReader, BinaryLogWriter, BuildEvent};
pub use formats::LogFileFormat;
pub use metrics::{MetricsSnapshot, ReadStats, ReaderMetrics};
pub use model::{Issue, IssueBuilder, LogFormat, Position, RepoRelativePath, Severity};
pub use normalize::{DiagnosticNormalizer, DropReason, Lookup};
pub use paths::{validate_file_path, PathCase, PathValidation, RepositoryRoot};
pub use reader::{read_issues, IssueReader, ReadReport};
pub use rule::{RuleDescription, ResolverChain, UrlTemplate};

/// Name reported as the issue provider.
pub const PROVIDER_NAME: &str = "MSBuild";

/// Fully qualified type reported as the issue provider.
pub const PROVIDER_TYPE: &str = "msbuild_issues::MsBuildIssuesProvider";

/// Upper bound on the size of a single log accepted by default (256 MiB).
pub const DEFAULT_MAX_LOG_SIZE: usize = 256 * 1024 * 1024;
