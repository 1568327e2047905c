use std::fmt;
use thiserror::Error;

use crate::formats::binary::BinaryLogError;

/// Result type for issue extraction operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required argument was empty, blank or otherwise unusable.
    #[error("Invalid argument `{name}`: {problem}")]
    InvalidArgument {
        name: &'static str,
        problem: ArgumentProblem,
    },

    #[error("Malformed XML log: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Malformed binary log: {0}")]
    Binary(#[from] BinaryLogError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentProblem {
    /// Value is empty
    Missing,
    /// Value only contains whitespace
    Blank,
    /// Value exceeds the configured size limit
    TooLarge,
    /// Log content matches no known format
    UnknownFormat,
}

impl fmt::Display for ArgumentProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ArgumentProblem::Missing => "value is empty",
            ArgumentProblem::Blank => "value only contains whitespace",
            ArgumentProblem::TooLarge => "value exceeds the size limit",
            ArgumentProblem::UnknownFormat => "content does not match a known log format",
        };
        f.write_str(text)
    }
}

impl Error {
    pub(crate) fn invalid(name: &'static str, problem: ArgumentProblem) -> Self {
        Error::InvalidArgument { name, problem }
    }

    /// Name of the offending parameter for argument errors.
    pub fn argument_name(&self) -> Option<&'static str> {
        match self {
            Error::InvalidArgument { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Fail fast on empty or whitespace-only text arguments.
pub(crate) fn require_text<'a>(value: &'a str, name: &'static str) -> Result<&'a str> {
    if value.is_empty() {
        return Err(Error::invalid(name, ArgumentProblem::Missing));
    }
    if value.trim().is_empty() {
        return Err(Error::invalid(name, ArgumentProblem::Blank));
    }
    Ok(value)
}
