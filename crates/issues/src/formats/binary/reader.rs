use std::io::Read;

use bytes::{Buf, Bytes};
use flate2::read::GzDecoder;

use super::record::{read_7bit, read_string, BuildEvent, FieldReader, RecordKind};
use super::{
    BinaryLogError, FORWARD_COMPATIBLE_VERSION, GZIP_MAGIC, MAX_RECORD_SIZE, READER_VERSION,
};

/// Streams build warnings and errors out of a binary log.
///
/// String records are collected into the string table as they pass; all
/// other non-diagnostic records are skipped. Iteration stops at the
/// end-of-file record, at the end of the data, or after the first error.
#[derive(Debug)]
pub struct BinaryLogReader {
    buf: Bytes,
    version: i32,
    minimum_reader_version: i32,
    strings: Vec<String>,
    finished: bool,
}

impl BinaryLogReader {
    pub fn new(content: &[u8]) -> Result<Self, BinaryLogError> {
        Self::with_max_size(content, crate::DEFAULT_MAX_LOG_SIZE)
    }

    /// `max_size` bounds the inflated size of the log.
    ///
    /// Content without the gzip wrapper is read as an already inflated
    /// record stream.
    pub fn with_max_size(content: &[u8], max_size: usize) -> Result<Self, BinaryLogError> {
        let mut buf = if content.starts_with(&GZIP_MAGIC) {
            Bytes::from(inflate(content, max_size)?)
        } else {
            Bytes::copy_from_slice(content)
        };

        if buf.remaining() < 4 {
            return Err(BinaryLogError::Truncated("file format version"));
        }
        let version = buf.get_i32_le();
        if version < 1 {
            return Err(BinaryLogError::UnsupportedVersion(version));
        }

        let minimum_reader_version = if version >= FORWARD_COMPATIBLE_VERSION {
            if buf.remaining() < 4 {
                return Err(BinaryLogError::Truncated("minimum reader version"));
            }
            buf.get_i32_le()
        } else {
            version
        };
        if minimum_reader_version > READER_VERSION {
            return Err(BinaryLogError::NewerThanReader {
                version,
                minimum_reader_version,
            });
        }

        tracing::debug!(
            version,
            minimum_reader_version,
            size = buf.remaining(),
            "Opened binary log"
        );
        Ok(Self {
            buf,
            version,
            minimum_reader_version,
            strings: Vec::new(),
            finished: false,
        })
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn minimum_reader_version(&self) -> i32 {
        self.minimum_reader_version
    }

    fn next_event(&mut self) -> Result<Option<BuildEvent>, BinaryLogError> {
        while self.buf.has_remaining() {
            let kind = RecordKind::from_u32(read_7bit(&mut self.buf)?);
            match kind {
                RecordKind::EndOfFile => return Ok(None),
                RecordKind::String => {
                    let text = read_string(&mut self.buf)?;
                    self.strings.push(text);
                    continue;
                }
                _ => {}
            }

            let event = if self.version >= FORWARD_COMPATIBLE_VERSION {
                self.sized_record(kind)?
            } else {
                self.unsized_record(kind)?
            };
            if event.is_some() {
                return Ok(event);
            }
        }
        Ok(None)
    }

    fn sized_record(&mut self, kind: RecordKind) -> Result<Option<BuildEvent>, BinaryLogError> {
        let length = read_7bit(&mut self.buf)? as usize;
        if length > MAX_RECORD_SIZE {
            return Err(BinaryLogError::OversizedRecord {
                size: length,
                limit: MAX_RECORD_SIZE,
            });
        }
        if self.buf.remaining() < length {
            return Err(BinaryLogError::Truncated("record payload"));
        }
        let mut payload = self.buf.split_to(length);

        match kind.severity() {
            Some(severity) => FieldReader::new(&mut payload, &self.strings, self.version)
                .event(severity, false)
                .map(Some),
            None => Ok(None),
        }
    }

    fn unsized_record(&mut self, kind: RecordKind) -> Result<Option<BuildEvent>, BinaryLogError> {
        let mut fields = FieldReader::new(&mut self.buf, &self.strings, self.version);
        if let Some(severity) = kind.severity() {
            return fields.event(severity, true).map(Some);
        }

        match kind {
            RecordKind::Message => fields.skip_message().map(|_| None),
            RecordKind::NameValueList => {
                // key and value references per entry
                let count = fields.int()?;
                for _ in 0..count.max(0) {
                    fields.int()?;
                    fields.int()?;
                }
                Ok(None)
            }
            RecordKind::ProjectImportArchive => fields.skip_blob().map(|_| None),
            other => Err(BinaryLogError::UnskippableRecord {
                kind: other.as_u32(),
                version: self.version,
            }),
        }
    }
}

impl Iterator for BinaryLogReader {
    type Item = Result<BuildEvent, BinaryLogError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

fn inflate(content: &[u8], max_size: usize) -> Result<Vec<u8>, BinaryLogError> {
    let limit = max_size as u64;
    let mut inflated = Vec::new();
    GzDecoder::new(content)
        .take(limit + 1)
        .read_to_end(&mut inflated)
        .map_err(BinaryLogError::Decompression)?;
    if inflated.len() as u64 > limit {
        return Err(BinaryLogError::InflatedTooLarge { limit: max_size });
    }
    Ok(inflated)
}
