//! Field lookups and issue assembly shared by every log format.
//!
//! Each lookup returns a [`Lookup`]: `Found`, `NotFound` (the field is simply
//! not there) or `Invalid` (the whole diagnostic must be dropped). Format
//! readers decide per field whether `NotFound` is acceptable via
//! [`Lookup::optional`] and [`Lookup::required`], and chain the steps with `?`
//! so the first failing step drops the element.

use serde::Serialize;
use url::Url;

use crate::conf::{EmptyRulePolicy, ReadOptions};
use crate::model::{Issue, Position, RepoRelativePath, Severity};
use crate::paths::{self, PathValidation, RepositoryRoot};
use crate::rule::ResolverChain;

/// Why a diagnostic was left out of the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MissingMessage,
    ProjectOutsideRepository,
    FileOutsideRepository,
    MissingLine,
    InvalidLine,
    MissingColumn,
    InvalidColumn,
    EmptyRule,
}

impl DropReason {
    pub const ALL: [DropReason; 8] = [
        DropReason::MissingMessage,
        DropReason::ProjectOutsideRepository,
        DropReason::FileOutsideRepository,
        DropReason::MissingLine,
        DropReason::InvalidLine,
        DropReason::MissingColumn,
        DropReason::InvalidColumn,
        DropReason::EmptyRule,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::MissingMessage => "missing_message",
            DropReason::ProjectOutsideRepository => "project_outside_repository",
            DropReason::FileOutsideRepository => "file_outside_repository",
            DropReason::MissingLine => "missing_line",
            DropReason::InvalidLine => "invalid_line",
            DropReason::MissingColumn => "missing_column",
            DropReason::InvalidColumn => "invalid_column",
            DropReason::EmptyRule => "empty_rule",
        }
    }
}

/// Outcome of reading one field of a raw diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    Invalid(DropReason),
}

impl<T> Lookup<T> {
    /// Absence is fine; only `Invalid` drops the diagnostic.
    pub fn optional(self) -> Result<Option<T>, DropReason> {
        match self {
            Lookup::Found(value) => Ok(Some(value)),
            Lookup::NotFound => Ok(None),
            Lookup::Invalid(reason) => Err(reason),
        }
    }

    /// Absence drops the diagnostic with `missing`.
    pub fn required(self, missing: DropReason) -> Result<T, DropReason> {
        match self {
            Lookup::Found(value) => Ok(value),
            Lookup::NotFound => Err(missing),
            Lookup::Invalid(reason) => Err(reason),
        }
    }
}

/// Normalized fields of one diagnostic, ready to become an [`Issue`].
#[derive(Debug, Clone)]
pub struct DiagnosticFields {
    pub message: String,
    pub severity: Severity,
    pub project: Option<RepoRelativePath>,
    pub file: Option<RepoRelativePath>,
    pub position: Position,
    pub rule: Option<String>,
}

/// 1-based position from a raw log value; zero, negative and out of range
/// values become absent.
pub fn position(raw: i64) -> Option<u32> {
    u32::try_from(raw).ok().filter(|value| *value > 0)
}

/// Per-read view of the repository root, resolver chain and options.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticNormalizer<'a> {
    repo: &'a RepositoryRoot,
    resolvers: &'a ResolverChain,
    options: &'a ReadOptions,
}

impl<'a> DiagnosticNormalizer<'a> {
    pub fn new(
        repo: &'a RepositoryRoot,
        resolvers: &'a ResolverChain,
        options: &'a ReadOptions,
    ) -> Self {
        Self {
            repo,
            resolvers,
            options,
        }
    }

    pub fn repo(&self) -> &RepositoryRoot {
        self.repo
    }

    pub fn options(&self) -> &ReadOptions {
        self.options
    }

    /// Message text; blank messages drop the diagnostic.
    pub fn message(&self, raw: &str) -> Lookup<String> {
        if raw.trim().is_empty() {
            tracing::debug!("Skip diagnostic without message");
            return Lookup::Invalid(DropReason::MissingMessage);
        }
        Lookup::Found(raw.to_string())
    }

    /// Project file below the repository. Relative project paths are taken
    /// relative to the repository root.
    pub fn project(&self, raw: Option<&str>) -> Lookup<RepoRelativePath> {
        let raw = match raw.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Lookup::NotFound,
        };

        let absolute = paths::combine(self.repo.as_str(), raw);
        match self.validate(&absolute) {
            Some(path) => Lookup::Found(path),
            None => {
                tracing::warn!(
                    path = %raw,
                    repo_root = %self.repo.original(),
                    "Ignored project since it is outside of the repository"
                );
                Lookup::Invalid(DropReason::ProjectOutsideRepository)
            }
        }
    }

    /// Affected file below the repository.
    ///
    /// A relative path is taken relative to the directory of `base_file`
    /// (itself resolved against the repository root when relative), or to
    /// the repository root when there is no base.
    pub fn file(&self, raw: Option<&str>, base_file: Option<&str>) -> Lookup<RepoRelativePath> {
        let raw = match raw.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                tracing::debug!("Diagnostic has no file");
                return Lookup::NotFound;
            }
        };

        let absolute = if paths::is_full_path(raw) {
            raw.to_string()
        } else {
            let base_dir = base_file
                .map(str::trim)
                .filter(|base| !base.is_empty())
                .and_then(paths::directory_name)
                .map(|dir| paths::combine(self.repo.as_str(), dir))
                .unwrap_or_else(|| self.repo.as_str().to_string());
            paths::combine(&base_dir, raw)
        };

        match self.validate(&absolute) {
            Some(path) => Lookup::Found(path),
            None => {
                tracing::warn!(
                    path = %raw,
                    repo_root = %self.repo.original(),
                    "Ignored issue for file since it is outside of the repository"
                );
                Lookup::Invalid(DropReason::FileOutsideRepository)
            }
        }
    }

    /// Rule code verbatim; an empty code follows [`EmptyRulePolicy`].
    pub fn rule(&self, raw: Option<&str>) -> Lookup<String> {
        let raw = match raw {
            Some(raw) => raw,
            None => return Lookup::NotFound,
        };

        if !raw.trim().is_empty() {
            return Lookup::Found(raw.to_string());
        }

        match self.options.empty_rule {
            EmptyRulePolicy::Preserve => Lookup::Found(raw.to_string()),
            EmptyRulePolicy::Absent => Lookup::NotFound,
            EmptyRulePolicy::Drop => {
                tracing::debug!("Skip diagnostic with empty rule code");
                Lookup::Invalid(DropReason::EmptyRule)
            }
        }
    }

    /// Documentation link for a non-blank rule.
    pub fn rule_url(&self, rule: Option<&str>) -> Option<Url> {
        let rule = rule.filter(|r| !r.trim().is_empty())?;
        // Blank input is filtered above, so lookup errors cannot occur here.
        self.resolvers.resolve_rule_url(rule).ok().flatten()
    }

    pub fn assemble(&self, fields: DiagnosticFields) -> Issue {
        let rule_url = self.rule_url(fields.rule.as_deref());
        Issue::builder(fields.message)
            .with_severity(fields.severity)
            .in_project(fields.project)
            .in_file(fields.file, fields.position)
            .of_rule(fields.rule, rule_url)
            .build()
    }

    fn validate(&self, path: &str) -> Option<RepoRelativePath> {
        paths::validate_file_path(path, self.repo)
            .ok()
            .and_then(PathValidation::into_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        repo: RepositoryRoot,
        resolvers: ResolverChain,
        options: ReadOptions,
    }

    impl Fixture {
        fn new(root: &str) -> Self {
            Self {
                repo: RepositoryRoot::new(root).unwrap(),
                resolvers: ResolverChain::with_defaults(),
                options: ReadOptions::default(),
            }
        }

        fn normalizer(&self) -> DiagnosticNormalizer<'_> {
            DiagnosticNormalizer::new(&self.repo, &self.resolvers, &self.options)
        }
    }

    fn rel(path: &str) -> RepoRelativePath {
        RepoRelativePath::new(path.to_string())
    }

    #[test]
    fn test_lookup_optional_and_required() {
        assert_eq!(Lookup::Found(1).optional(), Ok(Some(1)));
        assert_eq!(Lookup::<i32>::NotFound.optional(), Ok(None));
        assert_eq!(
            Lookup::<i32>::Invalid(DropReason::InvalidLine).optional(),
            Err(DropReason::InvalidLine)
        );
        assert_eq!(
            Lookup::<i32>::NotFound.required(DropReason::MissingLine),
            Err(DropReason::MissingLine)
        );
    }

    #[test]
    fn test_position_normalizes_non_positive() {
        assert_eq!(position(13), Some(13));
        assert_eq!(position(0), None);
        assert_eq!(position(-5), None);
        assert_eq!(position(i64::from(u32::MAX) + 1), None);
    }

    #[test]
    fn test_message_rejects_blank() {
        let fixture = Fixture::new(r"c:\repo");
        let normalizer = fixture.normalizer();
        assert_eq!(normalizer.message("  \n"), Lookup::Invalid(DropReason::MissingMessage));
        assert_eq!(normalizer.message("msg"), Lookup::Found("msg".to_string()));
    }

    #[test]
    fn test_project_inside_and_outside() {
        let fixture = Fixture::new(r"c:\repo");
        let normalizer = fixture.normalizer();

        assert_eq!(
            normalizer.project(Some(r"c:\repo\src\App\App.csproj")),
            Lookup::Found(rel("src/App/App.csproj"))
        );
        assert_eq!(
            normalizer.project(Some(r"src\App\App.csproj")),
            Lookup::Found(rel("src/App/App.csproj"))
        );
        assert_eq!(normalizer.project(None), Lookup::NotFound);
        assert_eq!(normalizer.project(Some(" ")), Lookup::NotFound);
        assert_eq!(
            normalizer.project(Some(r"c:\other\App.csproj")),
            Lookup::Invalid(DropReason::ProjectOutsideRepository)
        );
    }

    #[test]
    fn test_file_relative_to_base_directory() {
        let fixture = Fixture::new(r"c:\Source\Cake.Issues.MsBuild");
        let normalizer = fixture.normalizer();

        assert_eq!(
            normalizer.file(
                Some("Class1.cs"),
                Some(r"c:\Source\Cake.Issues.MsBuild\src\ClassLibrary1\ClassLibrary1.csproj")
            ),
            Lookup::Found(rel("src/ClassLibrary1/Class1.cs"))
        );
    }

    #[test]
    fn test_file_relative_without_base_uses_repo_root() {
        let fixture = Fixture::new(r"c:\repo");
        let normalizer = fixture.normalizer();

        assert_eq!(
            normalizer.file(Some(r"src\A.cs"), None),
            Lookup::Found(rel("src/A.cs"))
        );
    }

    #[test]
    fn test_file_relative_base_is_anchored_at_repo_root() {
        let fixture = Fixture::new("/work/repo");
        let normalizer = fixture.normalizer();

        assert_eq!(
            normalizer.file(Some("A.cs"), Some("src/A.csproj")),
            Lookup::Found(rel("src/A.cs"))
        );
    }

    #[test]
    fn test_file_outside_repository_is_invalid() {
        let fixture = Fixture::new(r"c:\repo");
        let normalizer = fixture.normalizer();

        assert_eq!(
            normalizer.file(Some(r"c:\repository\A.cs"), None),
            Lookup::Invalid(DropReason::FileOutsideRepository)
        );
        assert_eq!(
            normalizer.file(Some(r"..\elsewhere\A.cs"), None),
            Lookup::Invalid(DropReason::FileOutsideRepository)
        );
    }

    #[test]
    fn test_file_missing_is_not_found() {
        let fixture = Fixture::new(r"c:\repo");
        let normalizer = fixture.normalizer();
        assert_eq!(normalizer.file(None, None), Lookup::NotFound);
        assert_eq!(normalizer.file(Some(""), None), Lookup::NotFound);
    }

    #[test]
    fn test_empty_rule_policies() {
        let mut fixture = Fixture::new(r"c:\repo");
        assert_eq!(fixture.normalizer().rule(Some("")), Lookup::Found(String::new()));
        assert_eq!(fixture.normalizer().rule(None), Lookup::NotFound);

        fixture.options.empty_rule = EmptyRulePolicy::Absent;
        assert_eq!(fixture.normalizer().rule(Some("")), Lookup::NotFound);

        fixture.options.empty_rule = EmptyRulePolicy::Drop;
        assert_eq!(
            fixture.normalizer().rule(Some("")),
            Lookup::Invalid(DropReason::EmptyRule)
        );
        assert_eq!(
            fixture.normalizer().rule(Some("CA1000")),
            Lookup::Found("CA1000".to_string())
        );
    }

    #[test]
    fn test_assemble_resolves_rule_url() {
        let fixture = Fixture::new(r"c:\repo");
        let normalizer = fixture.normalizer();

        let issue = normalizer.assemble(DiagnosticFields {
            message: "Do not raise reserved exception types".to_string(),
            severity: Severity::Error,
            project: Some(rel("src/App/App.csproj")),
            file: Some(rel("src/App/Program.cs")),
            position: Position::at(Some(3), None),
            rule: Some("CA2201".to_string()),
        });

        assert_eq!(issue.project_name(), "App");
        assert_eq!(issue.priority(), 400);
        assert!(issue.rule_url().unwrap().as_str().contains("CA2201"));
    }

    #[test]
    fn test_assemble_skips_url_for_empty_rule() {
        let fixture = Fixture::new(r"c:\repo");
        let issue = fixture.normalizer().assemble(DiagnosticFields {
            message: "msg".to_string(),
            severity: Severity::Warning,
            project: None,
            file: None,
            position: Position::default(),
            rule: Some(String::new()),
        });

        assert_eq!(issue.rule(), Some(""));
        assert!(issue.rule_url().is_none());
    }

    #[test]
    fn test_drop_reason_names_are_unique() {
        let mut names: Vec<_> = DropReason::ALL.iter().map(|r| r.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), DropReason::ALL.len());
    }
}
