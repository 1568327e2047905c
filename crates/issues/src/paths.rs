//! Repository-root validation and path relativization.
//!
//! Log paths come from Windows and POSIX build hosts alike, so everything
//! here works on strings rather than `std::path`: both `\` and `/` count as
//! separators, drive letters (`c:`) and UNC prefixes (`\\server`) are
//! recognised on every platform, and results always use `/`.

use serde::{Deserialize, Serialize};

use crate::error::{require_text, Result};
use crate::model::RepoRelativePath;

/// Separator used in every normalized path.
pub const SEPARATOR: char = '/';

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// How path segments are compared against the repository root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathCase {
    /// Case-insensitive for drive-letter and UNC roots, sensitive otherwise
    #[default]
    Auto,
    Sensitive,
    Insensitive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathValidation {
    Accepted(RepoRelativePath),
    /// Path lies outside the repository
    Rejected,
}

impl PathValidation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, PathValidation::Accepted(_))
    }

    pub fn into_path(self) -> Option<RepoRelativePath> {
        match self {
            PathValidation::Accepted(path) => Some(path),
            PathValidation::Rejected => None,
        }
    }
}

/// Absolute repository root all log paths are validated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRoot {
    original: String,
    normalized: String,
    case_insensitive: bool,
}

impl RepositoryRoot {
    pub fn new(root: &str) -> Result<Self> {
        Self::with_case(root, PathCase::Auto)
    }

    pub fn with_case(root: &str, case: PathCase) -> Result<Self> {
        let root = require_text(root, "repo_root")?.trim();
        let normalized = normalize(root);
        let case_insensitive = match case {
            PathCase::Auto => has_drive(&normalized) || normalized.starts_with("//"),
            PathCase::Sensitive => false,
            PathCase::Insensitive => true,
        };

        Ok(Self {
            original: root.to_string(),
            normalized,
            case_insensitive,
        })
    }

    /// Normalized form (`/` separators, no trailing separator).
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Root exactly as configured.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Remainder of a normalized path after the root, if the path is the root
    /// itself or nested beneath it. Siblings sharing a name prefix never match.
    fn strip_root<'p>(&self, normalized: &'p str) -> Option<&'p str> {
        let root = self.normalized.as_str();
        if normalized.len() < root.len() || !normalized.is_char_boundary(root.len()) {
            return None;
        }

        let (head, tail) = normalized.split_at(root.len());
        let same = if self.case_insensitive {
            head.to_lowercase() == root.to_lowercase()
        } else {
            head == root
        };
        if !same {
            return None;
        }

        if tail.is_empty() || tail.starts_with(SEPARATOR) || root.ends_with(SEPARATOR) {
            Some(tail)
        } else {
            None
        }
    }
}

/// Check a path against the repository root and make it relative.
///
/// Fails for empty or whitespace-only paths. A path outside the root is
/// [`PathValidation::Rejected`]; callers drop the diagnostic in that case.
pub fn validate_file_path(file_path: &str, repo: &RepositoryRoot) -> Result<PathValidation> {
    let file_path = require_text(file_path, "file_path")?.trim();

    if !is_in_repository(file_path, repo) {
        return Ok(PathValidation::Rejected);
    }

    Ok(make_relative(file_path, repo)
        .map(PathValidation::Accepted)
        .unwrap_or(PathValidation::Rejected))
}

pub fn is_in_repository(path: &str, repo: &RepositoryRoot) -> bool {
    repo.strip_root(&normalize(path)).is_some()
}

/// Strip the root prefix and the separator following it.
pub fn make_relative(path: &str, repo: &RepositoryRoot) -> Option<RepoRelativePath> {
    let normalized = normalize(path);
    let tail = repo.strip_root(&normalized)?;
    Some(RepoRelativePath::new(remove_leading_separator(tail).to_string()))
}

/// Drop leading separators; normalized input has at most one.
pub fn remove_leading_separator(path: &str) -> &str {
    path.trim_start_matches(is_separator)
}

fn has_drive(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Absolute on any host: POSIX root, drive letter or UNC share.
pub fn is_full_path(path: &str) -> bool {
    path.starts_with(is_separator) || has_drive(path)
}

/// Canonical form: `/` separators, `.` and empty segments removed, `..`
/// folded into its parent, no trailing separator.
pub fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");

    let (prefix, rest) = if let Some(rest) = unified.strip_prefix("//") {
        ("//".to_string(), rest)
    } else if has_drive(&unified) {
        let (drive, rest) = unified.split_at(2);
        (format!("{}/", drive), rest)
    } else if let Some(rest) = unified.strip_prefix('/') {
        ("/".to_string(), rest)
    } else {
        (String::new(), unified.as_str())
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split(SEPARATOR) {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.last().map_or(false, |last| *last != "..") {
                    segments.pop();
                } else if prefix.is_empty() {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    format!("{}{}", prefix, segments.join("/"))
}

/// Directory part of a path, `None` for a bare file name.
pub fn directory_name(path: &str) -> Option<&str> {
    let index = path.rfind(is_separator)?;
    if index == 0 {
        Some(&path[..1])
    } else {
        Some(&path[..index])
    }
}

/// Join `relative` onto `base`; absolute `relative` paths win.
pub fn combine(base: &str, relative: &str) -> String {
    if is_full_path(relative) || base.is_empty() {
        return relative.to_string();
    }
    format!("{}{}{}", base.trim_end_matches(is_separator), SEPARATOR, relative)
}

/// File name without extension.
pub fn file_stem(path: &str) -> &str {
    let name = path.rsplit(is_separator).next().unwrap_or(path);
    match name.rfind('.') {
        Some(index) if index > 0 => &name[..index],
        _ => name,
    }
}
