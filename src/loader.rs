//! Transcript loader: delimited file → `ChatRecord` rows
//!
//! Only the five consumed columns are read; anything else in the dump is
//! ignored. Non-blank time cells must parse; blank cells of any consumed
//! column are read as missing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::chat::ChatRecord;
use crate::{Error, Result};

pub const COL_CLOSED_BY: &str = "ClosedBy";
pub const COL_CHAT_START: &str = "ChatStartTime";
pub const COL_CHAT_END: &str = "ChatEndTime";
pub const COL_FIRST_RESPONSE: &str = "AgentFirstResponseTime";
pub const COL_CSAT: &str = "CSATScore";

/// Naive layouts tried in order before RFC 3339 and bare dates.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Positions of the consumed columns in the header record.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    closed_by: usize,
    chat_start: usize,
    chat_end: usize,
    first_response: usize,
    csat: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| Error::MissingColumn(column.to_string()))
        };
        Ok(Self {
            closed_by: find(COL_CLOSED_BY)?,
            chat_start: find(COL_CHAT_START)?,
            chat_end: find(COL_CHAT_END)?,
            first_response: find(COL_FIRST_RESPONSE)?,
            csat: find(COL_CSAT)?,
        })
    }
}

/// The consumed cells of one row. Cells past the end of a short row are blank.
#[derive(Debug)]
struct RawChatRow<'r> {
    closed_by: &'r str,
    chat_start: &'r str,
    chat_end: &'r str,
    first_response: &'r str,
    csat: &'r str,
}

impl<'r> RawChatRow<'r> {
    fn read(row: &'r csv::StringRecord, index: ColumnIndex) -> Self {
        let cell = |i: usize| row.get(i).unwrap_or("");
        Self {
            closed_by: cell(index.closed_by),
            chat_start: cell(index.chat_start),
            chat_end: cell(index.chat_end),
            first_response: cell(index.first_response),
            csat: cell(index.csat),
        }
    }

    fn into_record(self, line: u64) -> Result<ChatRecord> {
        Ok(ChatRecord {
            closed_by: Some(self.closed_by.to_string()).filter(|s| !s.is_empty()),
            chat_start: parse_time_cell(self.chat_start, COL_CHAT_START, line)?,
            chat_end: parse_time_cell(self.chat_end, COL_CHAT_END, line)?,
            first_response_secs: parse_number(self.first_response, COL_FIRST_RESPONSE, line),
            csat_score: parse_number(self.csat, COL_CSAT, line),
        })
    }
}

/// A blank cell is a missing time; anything else must parse.
fn parse_time_cell(
    value: &str,
    column: &'static str,
    line: u64,
) -> Result<Option<NaiveDateTime>> {
    if value.trim().is_empty() {
        debug!(column, line, "Blank timestamp treated as missing");
        return Ok(None);
    }
    parse_timestamp(value)
        .map(Some)
        .ok_or_else(|| Error::InvalidTimestamp {
            line,
            column,
            value: value.to_string(),
        })
}

/// Parse a timestamp cell. Offsets are dropped, keeping the written wall-clock time.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_local())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Blank and non-numeric cells are treated as missing.
fn parse_number(value: &str, column: &'static str, line: u64) -> Option<f64> {
    if value.is_empty() {
        return None;
    }
    match value.parse::<f64>() {
        Ok(n) if !n.is_nan() => Some(n),
        Ok(_) => None,
        Err(_) => {
            warn!(column, line, value, "Non-numeric value treated as missing");
            None
        }
    }
}

/// Reads transcript dumps into memory.
#[derive(Debug, Clone)]
pub struct ChatLoader {
    delimiter: u8,
}

impl Default for ChatLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatLoader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Load every row of the file at `path`.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Vec<ChatRecord>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::InputNotFound(path.to_path_buf()),
            _ => Error::IoError(e),
        })?;

        let records = self.load_reader(file)?;
        info!(path = %path.display(), rows = records.len(), "📥 Loaded chat transcript");
        Ok(records)
    }

    /// Load rows from any reader; the first record must be the header. Short
    /// rows are padded with blank cells.
    pub fn load_reader<R: Read>(&self, reader: R) -> Result<Vec<ChatRecord>> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?;
        let index = ColumnIndex::from_headers(headers)?;
        debug!(columns = headers.len(), "Header validated");

        let mut records = Vec::new();
        for result in rdr.records() {
            let row = result?;
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            records.push(RawChatRow::read(&row, index).into_record(line)?);
        }

        Ok(records)
    }
}

/// Load a comma-delimited dump with default settings.
pub fn load_chats<P: AsRef<Path>>(path: P) -> Result<Vec<ChatRecord>> {
    ChatLoader::new().load(path)
}
