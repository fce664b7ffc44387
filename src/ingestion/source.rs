//! Delimited Input Source
//!
//! Yields the header row followed by every data row as raw column values.
//! Rows keep whatever length they have in the file; matching them against the
//! header is the ingestor's job.

use super::types::IngestError;

use csv::{ByteRecordsIntoIter, ReaderBuilder};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const DEFAULT_DELIMITER: u8 = b',';

pub struct DelimitedSource<R> {
    records: ByteRecordsIntoIter<R>,
}

fn builder(delimiter: u8) -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .delimiter(delimiter)
        .quote(b'"')
        .has_headers(false)
        .flexible(true);
    builder
}

impl DelimitedSource<File> {
    pub fn open(path: impl AsRef<Path>, delimiter: u8) -> Result<Self, IngestError> {
        let reader = builder(delimiter).from_path(path)?;
        Ok(Self {
            records: reader.into_byte_records(),
        })
    }
}

impl<R: Read> DelimitedSource<R> {
    pub fn from_reader(reader: R, delimiter: u8) -> Self {
        Self {
            records: builder(delimiter).from_reader(reader).into_byte_records(),
        }
    }
}

impl<R: Read> Iterator for DelimitedSource<R> {
    type Item = Result<Vec<String>, csv::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(record.map(|record| {
            record
                .iter()
                .map(|value| String::from_utf8_lossy(value).into_owned())
                .collect()
        }))
    }
}

/// Parses a delimiter flag. Accepts one ASCII character or the escapes `\t`
/// and `tab`.
pub fn parse_delimiter(value: &str) -> Result<u8, IngestError> {
    match value {
        "\\t" | "tab" => return Ok(b'\t'),
        _ => {}
    }

    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => Err(IngestError::InvalidOptions(format!(
            "delimiter must be a single ASCII character, got '{}'",
            value
        ))),
    }
}
