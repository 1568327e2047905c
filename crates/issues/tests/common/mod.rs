//! Shared fixtures for the issue reading harnesses.
//!
//! Import via `mod common; use common::*;` at the top of each harness.

pub mod fixtures;

pub use fixtures::*;

use msbuild_issues::{Issue, IssueReader, LogFormat, ReadOptions};

/// Repository root used by the fixtures.
pub const REPO_ROOT: &str = r"c:\Source\Cake.Issues.MsBuild";

pub fn reader() -> IssueReader {
    IssueReader::new(REPO_ROOT, ReadOptions::default()).unwrap()
}

pub fn read_xml(xml: &str) -> Vec<Issue> {
    reader().read(LogFormat::Xml, xml.as_bytes()).unwrap()
}

/// `(file, line, column, rule, severity)` of an issue, for compact asserts.
pub fn summary(issue: &Issue) -> (Option<&str>, Option<u32>, Option<u32>, Option<&str>, &'static str) {
    (
        issue.file_path().map(|p| p.as_str()),
        issue.line(),
        issue.column(),
        issue.rule(),
        issue.severity().as_str(),
    )
}
