//! Error types for the ingest, storage and report pipeline.
//!
//! Each stage has its own error enum so callers can match on the exact
//! failure; [`Error`] unifies them for the service layer and the binary.

use crate::types::DatasetId;
use thiserror::Error;

/// Failures while turning uploaded bytes into rows.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The upload is not UTF-8 text.
    #[error("file is not valid UTF-8 text (invalid byte at offset {offset})")]
    EncodingInvalid { offset: usize },

    /// The upload has no data rows.
    #[error("the CSV file is empty")]
    Empty,

    /// One or more required header columns are absent.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A measurement cell does not hold a finite number.
    #[error("line {line}: column '{column}' has non-numeric value '{value}'")]
    BadNumericField { line: u64, column: String, value: String },

    /// The CSV framing itself is broken (unterminated quote and similar).
    #[error("malformed CSV: {0}")]
    Malformed(String),
}

/// Row-level and upload-level rules that are not about CSV syntax.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("line {line}: column '{column}' must not be blank")]
    BlankField { line: u64, column: String },

    #[error("unsupported file type '{name}': please upload a .csv file")]
    UnsupportedFileType { name: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("cannot aggregate an empty row set")]
    NoRows,
}

/// Record store errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No dataset with this id is visible to the requesting owner.
    #[error("dataset {id} not found")]
    NotFound { id: DatasetId },

    /// Retention eviction failed; the whole ingest was rolled back.
    #[error("retention eviction failed: {0}")]
    Retention(String),

    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid record: {0}")]
    Invalid(String),

    #[error("store db error: {0}")]
    Db(String),

    #[error("store corruption: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Db(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The dataset carries no statistics bundle, or it cannot be decoded.
    #[error("dataset has no readable statistics bundle")]
    MissingBundle,

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

impl From<lopdf::Error> for RenderError {
    fn from(err: lopdf::Error) -> Self {
        RenderError::Pdf(err.to_string())
    }
}

/// Unified error for the service layer.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True when the error is an owner-scoped lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Store(StoreError::NotFound { .. }))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
