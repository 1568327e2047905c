use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::paths;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// XML written by the MSBuild Extension Pack `XmlFileLogger`
    Xml,
    /// MSBuild binary log (`.binlog`)
    Binary,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Xml => "xml",
            LogFormat::Binary => "binary",
        }
    }

    /// Sniff the format from raw log content.
    pub fn detect(content: &[u8]) -> Option<Self> {
        crate::detect::quick_detect_format(content)
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xml" | "xmlfilelogger" | "xml_file_logger" => Ok(LogFormat::Xml),
            "binary" | "binlog" => Ok(LogFormat::Binary),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    /// Severity for a diagnostic element or event name (`error` / `warning`).
    pub fn from_kind(kind: &str) -> Self {
        if kind.eq_ignore_ascii_case("error") {
            Severity::Error
        } else {
            Severity::Warning
        }
    }

    /// Numeric priority understood by issue reporting tools.
    pub fn priority(&self) -> u32 {
        match self {
            Severity::Warning => 300,
            Severity::Error => 400,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path relative to the repository root.
///
/// Never starts with a separator and always uses `/` between segments, so
/// `root + "/" + value` rebuilds the normalized absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RepoRelativePath(String);

impl RepoRelativePath {
    pub(crate) fn new(value: String) -> Self {
        debug_assert!(!value.starts_with('/'));
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name without its extension (`src/App/App.csproj` → `App`).
    pub fn file_stem(&self) -> &str {
        paths::file_stem(&self.0)
    }
}

impl fmt::Display for RepoRelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RepoRelativePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 1-based source range; non-positive raw values never make it in here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: Option<u32>,
    pub end_line: Option<u32>,
    pub column: Option<u32>,
    pub end_column: Option<u32>,
}

impl Position {
    pub fn at(line: Option<u32>, column: Option<u32>) -> Self {
        Self {
            line,
            column,
            ..Self::default()
        }
    }
}

/// Canonical diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    message: String,
    severity: Severity,
    priority: u32,
    project_path: Option<RepoRelativePath>,
    project_name: String,
    file_path: Option<RepoRelativePath>,
    line: Option<u32>,
    end_line: Option<u32>,
    column: Option<u32>,
    end_column: Option<u32>,
    rule: Option<String>,
    rule_url: Option<Url>,
    provider_type: &'static str,
    provider_name: &'static str,
}

impl Issue {
    pub fn builder(message: impl Into<String>) -> IssueBuilder {
        IssueBuilder::new(message)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn project_path(&self) -> Option<&RepoRelativePath> {
        self.project_path.as_ref()
    }

    /// Empty when the project is unknown.
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn file_path(&self) -> Option<&RepoRelativePath> {
        self.file_path.as_ref()
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn end_line(&self) -> Option<u32> {
        self.end_line
    }

    pub fn column(&self) -> Option<u32> {
        self.column
    }

    pub fn end_column(&self) -> Option<u32> {
        self.end_column
    }

    pub fn rule(&self) -> Option<&str> {
        self.rule.as_deref()
    }

    pub fn rule_url(&self) -> Option<&Url> {
        self.rule_url.as_ref()
    }

    pub fn provider_type(&self) -> &'static str {
        self.provider_type
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider_name
    }
}

/// Step-wise construction of an [`Issue`].
#[derive(Debug, Clone)]
pub struct IssueBuilder {
    issue: Issue,
}

impl IssueBuilder {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            issue: Issue {
                message: message.into(),
                severity: Severity::Warning,
                priority: Severity::Warning.priority(),
                project_path: None,
                project_name: String::new(),
                file_path: None,
                line: None,
                end_line: None,
                column: None,
                end_column: None,
                rule: None,
                rule_url: None,
                provider_type: crate::PROVIDER_TYPE,
                provider_name: crate::PROVIDER_NAME,
            },
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.issue.severity = severity;
        self.issue.priority = severity.priority();
        self
    }

    /// Project name follows the project file name.
    pub fn in_project(mut self, project: Option<RepoRelativePath>) -> Self {
        self.issue.project_name = project
            .as_ref()
            .map(|p| p.file_stem().to_string())
            .unwrap_or_default();
        self.issue.project_path = project;
        self
    }

    pub fn in_file(mut self, file: Option<RepoRelativePath>, position: Position) -> Self {
        self.issue.file_path = file;
        self.issue.line = position.line;
        self.issue.end_line = position.end_line;
        self.issue.column = position.column;
        self.issue.end_column = position.end_column;
        self
    }

    pub fn of_rule(mut self, rule: Option<String>, rule_url: Option<Url>) -> Self {
        self.issue.rule = rule;
        self.issue.rule_url = rule_url;
        self
    }

    pub fn build(self) -> Issue {
        self.issue
    }
}
