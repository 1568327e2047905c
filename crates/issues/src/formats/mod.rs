//! Log format strategies.
//!
//! Each format turns raw log bytes into issues through the shared
//! [`DiagnosticNormalizer`], counting what it inspects and drops.

pub mod binary;
pub mod xml;

use crate::error::Result;
use crate::metrics::ReadStats;
use crate::model::{Issue, LogFormat};
use crate::normalize::DiagnosticNormalizer;

pub use binary::BinaryLogFormat;
pub use xml::XmlFileLoggerFormat;

pub trait LogFileFormat: Send + Sync {
    fn format(&self) -> LogFormat;

    /// Read all issues from `content`, in log order.
    fn read_issues(
        &self,
        content: &[u8],
        normalizer: &DiagnosticNormalizer<'_>,
        stats: &mut ReadStats,
    ) -> Result<Vec<Issue>>;
}

/// Strategy implementing `format`.
pub fn strategy(format: LogFormat) -> &'static dyn LogFileFormat {
    match format {
        LogFormat::Xml => &XmlFileLoggerFormat,
        LogFormat::Binary => &BinaryLogFormat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_matches_format() {
        assert_eq!(strategy(LogFormat::Xml).format(), LogFormat::Xml);
        assert_eq!(strategy(LogFormat::Binary).format(), LogFormat::Binary);
    }
}
