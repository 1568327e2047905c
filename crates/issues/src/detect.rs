//! Log format detection from the first bytes of a log.

use crate::formats::binary::GZIP_MAGIC;
use crate::model::LogFormat;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Fast byte-level format sniffing (no decoding, no allocation).
/// - gzip magic → Binary (`.binlog` files are always compressed)
/// - first non-whitespace byte `<`, after an optional UTF-8 BOM → Xml
/// - anything else → `None`
pub fn quick_detect_format(content: &[u8]) -> Option<LogFormat> {
    if content.starts_with(&GZIP_MAGIC) {
        return Some(LogFormat::Binary);
    }

    let text = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    match text.iter().copied().find(|b| !b.is_ascii_whitespace()) {
        Some(b'<') => Some(LogFormat::Xml),
        _ => None,
    }
}
