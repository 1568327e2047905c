//! Entry point: pick the format strategy and read issues from a log.

use std::sync::Arc;

use serde::Serialize;

use crate::conf::ReadOptions;
use crate::error::{ArgumentProblem, Error, Result};
use crate::formats;
use crate::metrics::{ReadStats, ReaderMetrics};
use crate::model::{Issue, LogFormat};
use crate::normalize::DiagnosticNormalizer;
use crate::paths::RepositoryRoot;
use crate::rule::ResolverChain;

/// Issues of one read plus what happened along the way.
#[derive(Debug, Clone, Serialize)]
pub struct ReadReport {
    pub issues: Vec<Issue>,
    pub stats: ReadStats,
}

/// Reads logs against one repository root.
///
/// The resolver chain is shared: custom resolvers registered on it after
/// construction apply to later reads.
#[derive(Debug, Clone)]
pub struct IssueReader {
    repo: RepositoryRoot,
    resolvers: Arc<ResolverChain>,
    options: ReadOptions,
    metrics: Arc<ReaderMetrics>,
}

impl IssueReader {
    /// Reader with the built-in resolvers plus the templates from `options`.
    pub fn new(repo_root: &str, options: ReadOptions) -> Result<Self> {
        let resolvers = ResolverChain::with_defaults();
        for template in &options.rule_urls {
            resolvers.add_template(template.clone());
        }
        Self::with_resolvers(repo_root, options, Arc::new(resolvers))
    }

    /// Reader using a caller-owned resolver chain as is.
    pub fn with_resolvers(
        repo_root: &str,
        options: ReadOptions,
        resolvers: Arc<ResolverChain>,
    ) -> Result<Self> {
        options.validate().map_err(Error::Config)?;
        let repo = RepositoryRoot::with_case(repo_root, options.path_case)?;

        tracing::debug!(
            repo_root = %repo.original(),
            case_insensitive = repo.is_case_insensitive(),
            resolvers = resolvers.len(),
            "Created issue reader"
        );

        Ok(Self {
            repo,
            resolvers,
            options,
            metrics: Arc::new(ReaderMetrics::new()),
        })
    }

    pub fn repository_root(&self) -> &RepositoryRoot {
        &self.repo
    }

    pub fn resolvers(&self) -> &Arc<ResolverChain> {
        &self.resolvers
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    pub fn metrics(&self) -> &Arc<ReaderMetrics> {
        &self.metrics
    }

    /// Issues in log order.
    pub fn read(&self, format: LogFormat, content: &[u8]) -> Result<Vec<Issue>> {
        self.read_report(format, content).map(|report| report.issues)
    }

    pub fn read_report(&self, format: LogFormat, content: &[u8]) -> Result<ReadReport> {
        self.check_content(content)?;

        let normalizer = DiagnosticNormalizer::new(&self.repo, &self.resolvers, &self.options);
        let mut stats = ReadStats::new(format);
        let result = formats::strategy(format).read_issues(content, &normalizer, &mut stats);

        match result {
            Ok(issues) => {
                self.metrics.record(&stats);
                tracing::info!(
                    format = %format,
                    issues = issues.len(),
                    inspected = stats.elements_inspected,
                    dropped = stats.total_dropped(),
                    "Read issues from log"
                );
                Ok(ReadReport { issues, stats })
            }
            Err(e) => {
                self.metrics.record_failure();
                tracing::warn!(format = %format, "Failed to read log: {}", e);
                Err(e)
            }
        }
    }

    /// Detect the format from the content, then read.
    pub fn read_auto(&self, content: &[u8]) -> Result<ReadReport> {
        self.check_content(content)?;
        let format = LogFormat::detect(content)
            .ok_or_else(|| Error::invalid("log_content", ArgumentProblem::UnknownFormat))?;
        tracing::debug!(format = %format, "Detected log format");
        self.read_report(format, content)
    }

    fn check_content(&self, content: &[u8]) -> Result<()> {
        if content.is_empty() {
            return Err(Error::invalid("log_content", ArgumentProblem::Missing));
        }
        if content.len() > self.options.max_log_size {
            return Err(Error::invalid("log_content", ArgumentProblem::TooLarge));
        }
        Ok(())
    }
}

/// Read issues from `content` with default options.
pub fn read_issues(
    format: LogFormat,
    content: &[u8],
    repo_root: &str,
    resolvers: &ResolverChain,
) -> Result<Vec<Issue>> {
    if content.is_empty() {
        return Err(Error::invalid("log_content", ArgumentProblem::Missing));
    }
    let repo = RepositoryRoot::new(repo_root)?;
    let options = ReadOptions::default();
    if content.len() > options.max_log_size {
        return Err(Error::invalid("log_content", ArgumentProblem::TooLarge));
    }

    let normalizer = DiagnosticNormalizer::new(&repo, resolvers, &options);
    let mut stats = ReadStats::new(format);
    formats::strategy(format).read_issues(content, &normalizer, &mut stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::UrlTemplate;

    const XML: &str = r#"<build><project file="c:\repo\src\A.csproj"><warning file="c:\repo\src\A.cs" line="13" column="5" code="CS0219">msg</warning></project></build>"#;

    #[test]
    fn test_empty_content_is_rejected() {
        let reader = IssueReader::new(r"c:\repo", ReadOptions::default()).unwrap();
        let err = reader.read(LogFormat::Xml, b"").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidArgument { name: "log_content", problem: ArgumentProblem::Missing }
        ));
    }

    #[test]
    fn test_oversized_content_is_rejected() {
        let options = ReadOptions {
            max_log_size: 8,
            ..ReadOptions::default()
        };
        let reader = IssueReader::new(r"c:\repo", options).unwrap();
        let err = reader.read(LogFormat::Xml, XML.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidArgument { name: "log_content", problem: ArgumentProblem::TooLarge }
        ));
    }

    #[test]
    fn test_blank_repo_root_is_rejected() {
        let err = IssueReader::new("  ", ReadOptions::default()).unwrap_err();
        assert_eq!(err.argument_name(), Some("repo_root"));

        let err = read_issues(LogFormat::Xml, XML.as_bytes(), "", &ResolverChain::new()).unwrap_err();
        assert_eq!(err.argument_name(), Some("repo_root"));
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let options = ReadOptions {
            rule_urls: vec![UrlTemplate::new("CS", "https://example.com/")],
            ..ReadOptions::default()
        };
        assert!(matches!(
            IssueReader::new(r"c:\repo", options),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_read_report_and_metrics() {
        let reader = IssueReader::new(r"c:\repo", ReadOptions::default()).unwrap();
        let report = reader.read_report(LogFormat::Xml, XML.as_bytes()).unwrap();

        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.stats.elements_inspected, 1);

        let _ = reader.read(LogFormat::Xml, b"<broken");
        let snap = reader.metrics().snapshot();
        assert_eq!(snap.xml_logs, 1);
        assert_eq!(snap.failed_reads, 1);
        assert_eq!(snap.issues_emitted, 1);
    }

    #[test]
    fn test_option_templates_are_registered() {
        let options = ReadOptions {
            rule_urls: vec![UrlTemplate::new("CS", "https://docs.example/cs/{id}")],
            ..ReadOptions::default()
        };
        let reader = IssueReader::new(r"c:\repo", options).unwrap();
        let issues = reader.read(LogFormat::Xml, XML.as_bytes()).unwrap();
        assert_eq!(
            issues[0].rule_url().map(|u| u.as_str()),
            Some("https://docs.example/cs/219")
        );
    }

    #[test]
    fn test_read_auto() {
        let reader = IssueReader::new(r"c:\repo", ReadOptions::default()).unwrap();
        let report = reader.read_auto(XML.as_bytes()).unwrap();
        assert_eq!(report.stats.format, LogFormat::Xml);

        let err = reader.read_auto(b"Build succeeded.").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidArgument { problem: ArgumentProblem::UnknownFormat, .. }
        ));
    }

    #[test]
    fn test_free_function_uses_given_chain() {
        let chain = ResolverChain::new();
        chain.add_resolver(|r| url::Url::parse(&format!("https://rules.example/{}", r.rule())).ok(), 0);

        let issues = read_issues(LogFormat::Xml, XML.as_bytes(), r"c:\repo", &chain).unwrap();
        assert_eq!(
            issues[0].rule_url().map(|u| u.as_str()),
            Some("https://rules.example/CS0219")
        );
    }
}
