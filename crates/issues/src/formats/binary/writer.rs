use std::collections::HashMap;
use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};
use flate2::write::GzEncoder;
use flate2::Compression;

use super::record::{
    flags, write_7bit, write_7bit_i32, write_string, BuildEvent, RecordKind, EMPTY_STRING,
    NULL_STRING, STRING_TABLE_OFFSET,
};
use super::{BinaryLogError, FORWARD_COMPATIBLE_VERSION, READER_VERSION, STRING_TABLE_VERSION};

/// Message importance `normal`.
const NORMAL_IMPORTANCE: i32 = 1;

/// Produces binary logs in the layout MSBuild's binary logger writes, for
/// [`super::BinaryLogReader`] and anything else that reads `.binlog` files.
///
/// Strings are interned: each distinct value is written once as a string
/// record right before the first event that uses it. Events carry a zeroed
/// build event context and timestamp.
#[derive(Debug)]
pub struct BinaryLogWriter {
    version: i32,
    out: BytesMut,
    strings: HashMap<String, u32>,
}

impl BinaryLogWriter {
    pub fn new() -> Self {
        Self::create(READER_VERSION)
    }

    /// Versions before the string table are not written.
    pub fn with_version(version: i32) -> Result<Self, BinaryLogError> {
        if !(STRING_TABLE_VERSION..=READER_VERSION).contains(&version) {
            return Err(BinaryLogError::UnsupportedVersion(version));
        }
        Ok(Self::create(version))
    }

    fn create(version: i32) -> Self {
        let mut out = BytesMut::with_capacity(1024);
        out.put_i32_le(version);
        if version >= FORWARD_COMPATIBLE_VERSION {
            out.put_i32_le(FORWARD_COMPATIBLE_VERSION);
        }
        Self {
            version,
            out,
            strings: HashMap::new(),
        }
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn write_event(&mut self, event: &BuildEvent) {
        let message = self.intern(event.message.as_deref());
        let sender_name = self.intern(event.sender_name.as_deref());
        let subcategory = self.intern(event.subcategory.as_deref());
        let code = self.intern(event.code.as_deref());
        let file = self.intern(event.file.as_deref());
        let project_file = self.intern(event.project_file.as_deref());

        let mut mask = flags::BUILD_EVENT_CONTEXT | flags::TIMESTAMP;
        let strings = [
            (flags::MESSAGE, message),
            (flags::SENDER_NAME, sender_name),
            (flags::SUBCATEGORY, subcategory),
            (flags::CODE, code),
            (flags::FILE, file),
            (flags::PROJECT_FILE, project_file),
        ];
        for (flag, reference) in strings {
            if reference != NULL_STRING {
                mask |= flag;
            }
        }
        let positions = [
            (flags::LINE_NUMBER, event.line),
            (flags::COLUMN_NUMBER, event.column),
            (flags::END_LINE_NUMBER, event.end_line),
            (flags::END_COLUMN_NUMBER, event.end_column),
        ];
        for (flag, value) in positions {
            if value != 0 {
                mask |= flag;
            }
        }

        let mut payload = BytesMut::new();
        write_7bit(&mut payload, mask);
        if message != NULL_STRING {
            write_7bit(&mut payload, message);
        }
        write_context(&mut payload);
        if sender_name != NULL_STRING {
            write_7bit(&mut payload, sender_name);
        }
        write_timestamp(&mut payload);
        for reference in [subcategory, code, file, project_file] {
            if reference != NULL_STRING {
                write_7bit(&mut payload, reference);
            }
        }
        for (_, value) in positions {
            if value != 0 {
                write_7bit_i32(&mut payload, value);
            }
        }

        self.record(event.kind(), &payload);
    }

    /// Plain build message; readers skip these.
    pub fn write_message(&mut self, text: &str) {
        let reference = self.intern(Some(text));
        let mut mask = flags::MESSAGE | flags::BUILD_EVENT_CONTEXT | flags::TIMESTAMP;
        if self.version >= 13 {
            mask |= flags::IMPORTANCE;
        }

        let mut payload = BytesMut::new();
        write_7bit(&mut payload, mask);
        write_7bit(&mut payload, reference);
        write_context(&mut payload);
        write_timestamp(&mut payload);
        write_7bit_i32(&mut payload, NORMAL_IMPORTANCE);
        self.record(RecordKind::Message, &payload);
    }

    /// Append the end-of-file record and return the inflated log bytes.
    pub fn finish(mut self) -> Bytes {
        write_7bit(&mut self.out, RecordKind::EndOfFile.as_u32());
        self.out.freeze()
    }

    /// Like [`finish`](Self::finish), wrapped in gzip as `.binlog` files are.
    pub fn finish_compressed(self) -> std::io::Result<Vec<u8>> {
        let raw = self.finish();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw)?;
        encoder.finish()
    }

    fn intern(&mut self, value: Option<&str>) -> u32 {
        let value = match value {
            None => return NULL_STRING,
            Some("") => return EMPTY_STRING,
            Some(value) => value,
        };
        if let Some(reference) = self.strings.get(value) {
            return *reference;
        }

        let reference = STRING_TABLE_OFFSET + self.strings.len() as u32;
        write_7bit(&mut self.out, RecordKind::String.as_u32());
        write_string(&mut self.out, value);
        self.strings.insert(value.to_string(), reference);
        reference
    }

    fn record(&mut self, kind: RecordKind, payload: &[u8]) {
        write_7bit(&mut self.out, kind.as_u32());
        if self.version >= FORWARD_COMPATIBLE_VERSION {
            write_7bit(&mut self.out, payload.len() as u32);
        }
        self.out.put_slice(payload);
    }
}

impl Default for BinaryLogWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_context(payload: &mut BytesMut) {
    for _ in 0..7 {
        write_7bit(payload, 0);
    }
}

fn write_timestamp(payload: &mut BytesMut) {
    payload.put_i64_le(0);
    write_7bit(payload, 0);
}
