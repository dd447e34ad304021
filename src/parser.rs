//! CSV parsing for equipment uploads.
//!
//! Turns raw upload bytes into [`RawRow`]s. The header must carry every
//! column in [`REQUIRED_COLUMNS`] (any order, extra columns ignored), and
//! every measurement cell must be a finite number. Any bad cell rejects the
//! whole upload.

use crate::error::{ParseError, Result, ValidationError};
use crate::types::{Measurement, RawRow, REQUIRED_COLUMNS};
use csv::{ReaderBuilder, StringRecord};
use log::debug;

/// Parse an uploaded CSV file into validated rows.
pub fn parse(raw: &[u8]) -> Result<Vec<RawRow>> {
    let text = std::str::from_utf8(raw).map_err(|e| ParseError::EncodingInvalid { offset: e.valid_up_to() })?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = ReaderBuilder::new().flexible(true).from_reader(text.as_bytes());

    let headers = reader.headers().map_err(malformed)?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ParseError::Empty.into());
    }

    let columns = ColumnMap::resolve(&headers)?;
    debug!("CSV header resolved: {:?}", headers);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(malformed)?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        rows.push(columns.read_row(&record, line)?);
    }

    if rows.is_empty() {
        return Err(ParseError::Empty.into());
    }

    debug!("Parsed {} equipment rows", rows.len());
    Ok(rows)
}

fn malformed(err: csv::Error) -> ParseError {
    ParseError::Malformed(err.to_string())
}

/// Positions of the required columns within the source header
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    name: usize,
    category: usize,
    flowrate: usize,
    pressure: usize,
    temperature: usize,
}

impl ColumnMap {
    fn resolve(headers: &StringRecord) -> std::result::Result<Self, ParseError> {
        let find = |wanted: &str| headers.iter().position(|h| h.trim() == wanted);
        let positions: Vec<Option<usize>> = REQUIRED_COLUMNS.iter().map(|c| find(*c)).collect();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .zip(&positions)
            .filter(|(_, pos)| pos.is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::MissingColumns(missing));
        }

        match positions[..] {
            [Some(name), Some(category), Some(flowrate), Some(pressure), Some(temperature)] => {
                Ok(Self { name, category, flowrate, pressure, temperature })
            }
            _ => Err(ParseError::MissingColumns(Vec::new())),
        }
    }

    fn read_row(&self, record: &StringRecord, line: u64) -> Result<RawRow> {
        Ok(RawRow {
            name: text_cell(record, self.name, REQUIRED_COLUMNS[0], line)?,
            category: text_cell(record, self.category, REQUIRED_COLUMNS[1], line)?,
            flowrate: numeric_cell(record, self.flowrate, Measurement::Flowrate, line)?,
            pressure: numeric_cell(record, self.pressure, Measurement::Pressure, line)?,
            temperature: numeric_cell(record, self.temperature, Measurement::Temperature, line)?,
        })
    }
}

fn text_cell(record: &StringRecord, idx: usize, column: &str, line: u64) -> Result<String> {
    let value = record.get(idx).unwrap_or("").trim();
    if value.is_empty() {
        return Err(ValidationError::BlankField { line, column: column.to_string() }.into());
    }
    Ok(value.to_string())
}

fn numeric_cell(record: &StringRecord, idx: usize, measurement: Measurement, line: u64) -> Result<f64> {
    let raw = record.get(idx).unwrap_or("");
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ParseError::BadNumericField {
            line,
            column: measurement.column().to_string(),
            value: raw.to_string(),
        }
        .into()),
    }
}
