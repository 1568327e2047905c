//! Model: ReadOptions and related enums.

use serde::{Deserialize, Serialize};

use crate::paths::PathCase;
use crate::rule::UrlTemplate;

/// Handling of a rule code attribute that is present but empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyRulePolicy {
    /// Keep the empty string as the rule
    #[default]
    Preserve,
    /// Treat it like a missing attribute
    Absent,
    /// Drop the diagnostic
    Drop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    pub empty_rule: EmptyRulePolicy,
    pub path_case: PathCase,
    /// Remove C0/C1 control characters from XML logs before parsing
    pub strip_control_chars: bool,
    /// Spare tabs and line breaks when stripping control characters
    pub keep_xml_whitespace: bool,
    /// Largest log accepted, in bytes
    pub max_log_size: usize,
    /// Extra URL templates registered on top of the built-in resolvers
    pub rule_urls: Vec<UrlTemplate>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            empty_rule: EmptyRulePolicy::default(),
            path_case: PathCase::default(),
            strip_control_chars: true,
            keep_xml_whitespace: false,
            max_log_size: crate::DEFAULT_MAX_LOG_SIZE,
            rule_urls: Vec::new(),
        }
    }
}
