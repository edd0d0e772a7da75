//! Measurement file parsing
//!
//! Files are `;`-separated text. Rows whose first field is a plain
//! non-negative decimal (`12`, `12.5`, `.5`, `5.`) are data; every other row
//! is metadata and skipped. Empty fields in data rows are dropped.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};

use super::grid::{GridBuilder, MeasurementGrid};
use crate::error::ParseError;

/// Field delimiter of the thermal export
pub const FIELD_DELIMITER: u8 = b';';

/// Whether `field` is a data-row marker: ASCII digits with at most one `.`
///
/// No sign, no exponent, no surrounding whitespace, at least one digit.
pub fn is_numeric_token(field: &str) -> bool {
    is_numeric_bytes(field.as_bytes())
}

fn is_numeric_bytes(field: &[u8]) -> bool {
    let mut digits = 0usize;
    let mut seen_dot = false;

    for &byte in field {
        match byte {
            b'0'..=b'9' => digits += 1,
            b'.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }

    digits > 0
}

/// Parse a measurement file into a grid
pub fn parse(path: &Path) -> Result<MeasurementGrid, ParseError> {
    let file = File::open(path)?;
    parse_reader(BufReader::new(file))
}

/// Parse measurement text from any reader
pub fn parse_reader<R: Read>(input: R) -> Result<MeasurementGrid, ParseError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(FIELD_DELIMITER)
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut builder = GridBuilder::default();
    let mut record = ByteRecord::new();
    let mut metadata_rows = 0usize;

    while reader.read_byte_record(&mut record)? {
        let line = record.position().map_or(0, |pos| pos.line());

        let is_data = record.get(0).is_some_and(is_numeric_bytes);
        if !is_data {
            metadata_rows += 1;
            continue;
        }

        builder.push_row(line, parse_row(line, &record)?)?;
    }

    trace!("Skipped {} metadata rows", metadata_rows);
    builder.finish()
}

fn parse_row(line: u64, record: &ByteRecord) -> Result<Vec<f64>, ParseError> {
    let mut row = Vec::with_capacity(record.len());

    for (index, field) in record.iter().enumerate() {
        // Metadata may be Latin-1; data fields must be ASCII to parse anyway
        let text = String::from_utf8_lossy(field);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => row.push(value),
            _ => {
                return Err(ParseError::InvalidValue {
                    line,
                    column: index + 1,
                    value: text.to_string(),
                })
            }
        }
    }

    Ok(row)
}
