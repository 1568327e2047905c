//! Reader for logs written by the MSBuild Extension Pack `XmlFileLogger`.
//!
//! Diagnostics are `<warning>` and `<error>` elements anywhere in the tree,
//! usually nested as `build > project > target > task > warning`. Attributes
//! used: `file`, `line`, `column`, `endLine`, `endColumn`, `code`; the
//! message is the element text.

use std::borrow::Cow;

use roxmltree::{Document, Node, ParsingOptions};

use super::LogFileFormat;
use crate::error::Result;
use crate::metrics::ReadStats;
use crate::model::{Issue, LogFormat, Position, Severity};
use crate::normalize::{self, DiagnosticFields, DiagnosticNormalizer, DropReason, Lookup};

const BOM: char = '\u{feff}';

pub struct XmlFileLoggerFormat;

impl LogFileFormat for XmlFileLoggerFormat {
    fn format(&self) -> LogFormat {
        LogFormat::Xml
    }

    fn read_issues(
        &self,
        content: &[u8],
        normalizer: &DiagnosticNormalizer<'_>,
        stats: &mut ReadStats,
    ) -> Result<Vec<Issue>> {
        let decoded = String::from_utf8_lossy(content);
        let text: &str = &decoded;
        let text = text.strip_prefix(BOM).unwrap_or(text);
        let options = normalizer.options();
        let text = if options.strip_control_chars {
            strip_control_chars(text, options.keep_xml_whitespace)
        } else {
            Cow::Borrowed(text)
        };

        if text.trim().is_empty() {
            tracing::debug!("XML log has no content after filtering");
            return Ok(Vec::new());
        }

        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let document = Document::parse_with_options(&text, options)?;

        let mut issues = Vec::new();
        for element in document.descendants().filter(is_diagnostic) {
            stats.record_inspected();
            match read_element(element, normalizer) {
                Ok(issue) => {
                    stats.record_emitted();
                    issues.push(issue);
                }
                Err(reason) => {
                    tracing::info!(
                        element = element.tag_name().name(),
                        offset = element.range().start,
                        reason = reason.as_str(),
                        "Skip element"
                    );
                    stats.record_drop(reason);
                }
            }
        }

        tracing::debug!(
            issues = issues.len(),
            dropped = stats.total_dropped(),
            "Read XML file logger log"
        );
        Ok(issues)
    }
}

fn is_diagnostic(node: &Node<'_, '_>) -> bool {
    node.is_element() && matches!(node.tag_name().name(), "warning" | "error")
}

fn read_element(
    element: Node<'_, '_>,
    normalizer: &DiagnosticNormalizer<'_>,
) -> std::result::Result<Issue, DropReason> {
    let message = normalizer
        .message(&element_text(element))
        .required(DropReason::MissingMessage)?;

    let project_file = element
        .ancestors()
        .skip(1)
        .find(|n| n.has_tag_name("project"))
        .and_then(|p| p.attribute("file"));
    let project = normalizer.project(project_file).optional()?;

    let base_file = element.parent_element().and_then(|p| p.attribute("file"));
    let file = normalizer
        .file(element.attribute("file"), base_file)
        .optional()?;

    let line = position_attribute(element, "line", DropReason::InvalidLine)
        .required(DropReason::MissingLine)?;
    let column = position_attribute(element, "column", DropReason::InvalidColumn)
        .required(DropReason::MissingColumn)?;
    let position = Position {
        line,
        end_line: optional_position(element, "endLine"),
        column,
        end_column: optional_position(element, "endColumn"),
    };

    let rule = normalizer.rule(element.attribute("code")).optional()?;

    Ok(normalizer.assemble(DiagnosticFields {
        message,
        severity: Severity::from_kind(element.tag_name().name()),
        project,
        file,
        position,
        rule,
    }))
}

/// Concatenated text of all descendant text nodes.
fn element_text(element: Node<'_, '_>) -> String {
    element
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Mandatory position attribute. Present values that are not integers drop
/// the element; non-positive values become an absent position.
fn position_attribute(
    element: Node<'_, '_>,
    name: &str,
    invalid: DropReason,
) -> Lookup<Option<u32>> {
    let raw = match element.attribute(name) {
        Some(raw) => raw.trim(),
        None => return Lookup::NotFound,
    };

    match raw.parse::<i64>() {
        Ok(value) => {
            if value <= 0 {
                tracing::debug!(attribute = name, value, "Ignore position outside of the allowed range");
            }
            Lookup::Found(normalize::position(value))
        }
        Err(_) => Lookup::Invalid(invalid),
    }
}

fn optional_position(element: Node<'_, '_>, name: &str) -> Option<u32> {
    element
        .attribute(name)
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .and_then(normalize::position)
}

/// Remove C0/C1 control characters, line breaks and tabs included unless
/// `keep_whitespace` is set.
///
/// Returns `Cow::Borrowed` when nothing had to be removed.
pub fn strip_control_chars(input: &str, keep_whitespace: bool) -> Cow<'_, str> {
    let is_stripped =
        |c: char| c.is_control() && !(keep_whitespace && matches!(c, '\t' | '\n' | '\r'));

    if !input.chars().any(is_stripped) {
        return Cow::Borrowed(input);
    }
    Cow::Owned(input.chars().filter(|c| !is_stripped(*c)).collect())
}
