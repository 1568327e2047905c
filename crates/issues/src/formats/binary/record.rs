//! Record kinds, primitive encodings and the event field layout.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{BinaryLogError, MAX_RECORD_SIZE, STRING_TABLE_VERSION};
use crate::model::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    EndOfFile,
    Error,
    Warning,
    Message,
    ProjectImportArchive,
    NameValueList,
    String,
    /// Build, project, target and task events and anything newer
    Other(u32),
}

impl RecordKind {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => RecordKind::EndOfFile,
            9 => RecordKind::Error,
            10 => RecordKind::Warning,
            11 => RecordKind::Message,
            17 => RecordKind::ProjectImportArchive,
            23 => RecordKind::NameValueList,
            24 => RecordKind::String,
            other => RecordKind::Other(other),
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            RecordKind::EndOfFile => 0,
            RecordKind::Error => 9,
            RecordKind::Warning => 10,
            RecordKind::Message => 11,
            RecordKind::ProjectImportArchive => 17,
            RecordKind::NameValueList => 23,
            RecordKind::String => 24,
            RecordKind::Other(value) => *value,
        }
    }

    /// Severity of diagnostic records, `None` for everything else.
    pub fn severity(&self) -> Option<Severity> {
        match self {
            RecordKind::Warning => Some(Severity::Warning),
            RecordKind::Error => Some(Severity::Error),
            _ => None,
        }
    }
}

/// Bits of the leading field mask of an event payload. Fields are stored
/// in the order the reader checks them, which is not bit order.
pub mod flags {
    pub const BUILD_EVENT_CONTEXT: u32 = 1 << 0;
    pub const HELP_KEYWORD: u32 = 1 << 1;
    pub const MESSAGE: u32 = 1 << 2;
    pub const SENDER_NAME: u32 = 1 << 3;
    pub const THREAD_ID: u32 = 1 << 4;
    pub const TIMESTAMP: u32 = 1 << 5;
    pub const SUBCATEGORY: u32 = 1 << 6;
    pub const CODE: u32 = 1 << 7;
    pub const FILE: u32 = 1 << 8;
    pub const PROJECT_FILE: u32 = 1 << 9;
    pub const LINE_NUMBER: u32 = 1 << 10;
    pub const COLUMN_NUMBER: u32 = 1 << 11;
    pub const END_LINE_NUMBER: u32 = 1 << 12;
    pub const END_COLUMN_NUMBER: u32 = 1 << 13;
    pub const ARGUMENTS: u32 = 1 << 14;
    pub const IMPORTANCE: u32 = 1 << 15;
    pub const EXTENDED: u32 = 1 << 16;
}

/// String reference for "no value".
pub const NULL_STRING: u32 = 0;
/// String reference for the empty string.
pub const EMPTY_STRING: u32 = 1;
/// First string table reference; `n` maps to `table[n - STRING_TABLE_OFFSET]`.
pub const STRING_TABLE_OFFSET: u32 = 10;

/// Message importance is always present on message events before this version.
const IMPORTANCE_FLAG_VERSION: i32 = 13;

/// Read a 7-bit encoded integer (little-endian groups, high bit = more).
pub fn read_7bit(buf: &mut impl Buf) -> Result<u32, BinaryLogError> {
    let mut value: u32 = 0;
    for index in 0..5 {
        if !buf.has_remaining() {
            return Err(BinaryLogError::Truncated("7-bit integer"));
        }
        let byte = buf.get_u8();
        if index == 4 && byte > 0x0f {
            return Err(BinaryLogError::InvalidVarint);
        }
        value |= u32::from(byte & 0x7f) << (7 * index);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(BinaryLogError::InvalidVarint)
}

pub fn write_7bit(out: &mut BytesMut, mut value: u32) {
    while value >= 0x80 {
        out.put_u8((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.put_u8(value as u8);
}

/// Signed values are stored as their two's complement bit pattern.
pub fn read_7bit_i32(buf: &mut impl Buf) -> Result<i32, BinaryLogError> {
    read_7bit(buf).map(|value| value as i32)
}

pub fn write_7bit_i32(out: &mut BytesMut, value: i32) {
    write_7bit(out, value as u32);
}

/// Length-prefixed UTF-8 string (.NET `BinaryWriter.Write(string)`).
pub fn read_string(buf: &mut Bytes) -> Result<String, BinaryLogError> {
    let length = read_7bit(buf)? as usize;
    if length > MAX_RECORD_SIZE {
        return Err(BinaryLogError::OversizedRecord {
            size: length,
            limit: MAX_RECORD_SIZE,
        });
    }
    if buf.remaining() < length {
        return Err(BinaryLogError::Truncated("string"));
    }
    let bytes = buf.split_to(length);
    Ok(String::from_utf8(bytes.to_vec())?)
}

pub fn write_string(out: &mut BytesMut, value: &str) {
    write_7bit(out, value.len() as u32);
    out.put_slice(value.as_bytes());
}

/// A build warning or error as stored in the log.
///
/// Positions are raw values; zero means "not set".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEvent {
    pub severity: Severity,
    pub message: Option<String>,
    pub code: Option<String>,
    pub file: Option<String>,
    pub project_file: Option<String>,
    pub subcategory: Option<String>,
    pub sender_name: Option<String>,
    pub line: i32,
    pub column: i32,
    pub end_line: i32,
    pub end_column: i32,
}

impl BuildEvent {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: Some(message.into()),
            code: None,
            file: None,
            project_file: None,
            subcategory: None,
            sender_name: None,
            line: 0,
            column: 0,
            end_line: 0,
            end_column: 0,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn in_project(mut self, project_file: impl Into<String>) -> Self {
        self.project_file = Some(project_file.into());
        self
    }

    pub fn at(mut self, file: impl Into<String>, line: i32, column: i32) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self.column = column;
        self
    }

    pub fn ending_at(mut self, end_line: i32, end_column: i32) -> Self {
        self.end_line = end_line;
        self.end_column = end_column;
        self
    }

    pub fn kind(&self) -> RecordKind {
        match self.severity {
            Severity::Warning => RecordKind::Warning,
            Severity::Error => RecordKind::Error,
        }
    }
}

/// Reads the fields of one event, resolving string references against the
/// table collected so far.
///
/// Logs older than the string table version store strings inline.
pub(crate) struct FieldReader<'a> {
    buf: &'a mut Bytes,
    strings: &'a [String],
    version: i32,
}

impl<'a> FieldReader<'a> {
    pub fn new(buf: &'a mut Bytes, strings: &'a [String], version: i32) -> Self {
        Self {
            buf,
            strings,
            version,
        }
    }

    pub fn int(&mut self) -> Result<i32, BinaryLogError> {
        read_7bit_i32(self.buf)
    }

    /// Skip a length-prefixed blob.
    pub fn skip_blob(&mut self) -> Result<(), BinaryLogError> {
        let length = read_7bit(self.buf)? as usize;
        if self.buf.remaining() < length {
            return Err(BinaryLogError::Truncated("embedded blob"));
        }
        self.buf.advance(length);
        Ok(())
    }

    fn string(&mut self) -> Result<Option<String>, BinaryLogError> {
        if self.version < STRING_TABLE_VERSION {
            return read_string(self.buf).map(Some);
        }
        match read_7bit(self.buf)? {
            NULL_STRING => Ok(None),
            EMPTY_STRING => Ok(Some(String::new())),
            n if n >= STRING_TABLE_OFFSET => self
                .strings
                .get((n - STRING_TABLE_OFFSET) as usize)
                .cloned()
                .map(Some)
                .ok_or(BinaryLogError::InvalidStringRef(n)),
            n => Err(BinaryLogError::InvalidStringRef(n)),
        }
    }

    fn optional_string(&mut self) -> Result<Option<String>, BinaryLogError> {
        if self.version >= STRING_TABLE_VERSION {
            return self.string();
        }
        if !self.buf.has_remaining() {
            return Err(BinaryLogError::Truncated("optional string"));
        }
        if self.buf.get_u8() == 0 {
            return Ok(None);
        }
        read_string(self.buf).map(Some)
    }

    fn skip_context(&mut self) -> Result<(), BinaryLogError> {
        // node, project context, target, task, submission, project instance,
        // then evaluation from version 2 on
        let count = if self.version > 1 { 7 } else { 6 };
        for _ in 0..count {
            self.int()?;
        }
        Ok(())
    }

    fn skip_timestamp(&mut self) -> Result<(), BinaryLogError> {
        if self.buf.remaining() < 8 {
            return Err(BinaryLogError::Truncated("timestamp"));
        }
        // ticks, then the date time kind
        self.buf.advance(8);
        self.int()?;
        Ok(())
    }

    fn skip_string_dictionary(&mut self) -> Result<(), BinaryLogError> {
        if self.version >= STRING_TABLE_VERSION {
            // name-value list reference
            self.int()?;
            return Ok(());
        }
        let count = self.int()?;
        for _ in 0..count.max(0) {
            read_string(self.buf)?;
            read_string(self.buf)?;
        }
        Ok(())
    }

    /// A warning or error payload.
    ///
    /// With `complete` set the reader also consumes the trailing fields a
    /// diagnostic never carries, so that the next record starts right after.
    pub fn event(&mut self, severity: Severity, complete: bool) -> Result<BuildEvent, BinaryLogError> {
        self.fields(severity, false, complete)
    }

    /// Step over a message payload in logs without record lengths.
    pub fn skip_message(&mut self) -> Result<(), BinaryLogError> {
        self.fields(Severity::Warning, true, true).map(|_| ())
    }

    fn fields(
        &mut self,
        severity: Severity,
        read_importance: bool,
        complete: bool,
    ) -> Result<BuildEvent, BinaryLogError> {
        let mask = read_7bit(self.buf)?;
        let has = |flag: u32| mask & flag != 0;
        let mut event = BuildEvent {
            message: None,
            ..BuildEvent::new(severity, String::new())
        };

        if has(flags::MESSAGE) {
            event.message = self.string()?;
        }
        if has(flags::BUILD_EVENT_CONTEXT) {
            self.skip_context()?;
        }
        if has(flags::THREAD_ID) {
            self.int()?;
        }
        if has(flags::HELP_KEYWORD) {
            self.string()?;
        }
        if has(flags::SENDER_NAME) {
            event.sender_name = self.string()?;
        }
        if has(flags::TIMESTAMP) {
            self.skip_timestamp()?;
        }
        if has(flags::SUBCATEGORY) {
            event.subcategory = self.string()?;
        }
        if has(flags::CODE) {
            event.code = self.string()?;
        }
        if has(flags::FILE) {
            event.file = self.string()?;
        }
        if has(flags::PROJECT_FILE) {
            event.project_file = self.string()?;
        }
        if has(flags::LINE_NUMBER) {
            event.line = self.int()?;
        }
        if has(flags::COLUMN_NUMBER) {
            event.column = self.int()?;
        }
        if has(flags::END_LINE_NUMBER) {
            event.end_line = self.int()?;
        }
        if has(flags::END_COLUMN_NUMBER) {
            event.end_column = self.int()?;
        }
        if has(flags::ARGUMENTS) {
            let count = self.int()?;
            let mut arguments = Vec::with_capacity(count.clamp(0, 16) as usize);
            for _ in 0..count.max(0) {
                arguments.push(self.string()?.unwrap_or_default());
            }
            event.message = event
                .message
                .map(|template| format_message(&template, &arguments));
        }

        if !complete {
            return Ok(event);
        }
        if read_importance && (self.version < IMPORTANCE_FLAG_VERSION || has(flags::IMPORTANCE)) {
            self.int()?;
        }
        if has(flags::EXTENDED) {
            self.optional_string()?;
            self.skip_string_dictionary()?;
            self.optional_string()?;
        }
        Ok(event)
    }
}

/// Substitute `{0}`-style placeholders. Alignment and format parts of a
/// placeholder are ignored; `{{` and `}}` are literal braces. Placeholders
/// without a matching argument stay as they are.
pub fn format_message(template: &str, arguments: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(|c| c == '{' || c == '}') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('{') {
            if let Some(end) = tail.find('}') {
                let index = tail[1..end].split(|c| c == ',' || c == ':').next().unwrap_or_default();
                if let Some(argument) = index.trim().parse::<usize>().ok().and_then(|i| arguments.get(i)) {
                    out.push_str(argument);
                    rest = &tail[end + 1..];
                    continue;
                }
            }
        }
        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    out.push_str(rest);
    out
}
