//! Report generation module.
//!
//! This module handles:
//! - Laying out a stored dataset as a titled document with three tables
//! - Rendering that layout to PDF bytes
//! - Rendering the same layout as terminal text
//! - Exporting datasets and listings as JSON
//!
//! # Module Organization
//!
//! - `layout` - Backend-independent report model and styling
//! - `pdf` - A4 PDF backend (lopdf)
//! - `text` - Box-drawing terminal backend
//! - `export` - JSON export

pub mod layout;
mod export;
mod pdf;
mod text;

use crate::error::RenderError;
use crate::types::{Dataset, Record};
use chrono::{DateTime, Utc};

pub use layout::{build_report, Palette, ReportDocument, Rgb, RowStyle, TableBlock, REPORT_TITLE};

pub use export::{dataset_json, summaries_json, write_json};

pub use pdf::render_pdf;

pub use text::{render_text, write_text};

/// Render `dataset` as PDF bytes, stamped with the current time.
///
/// Does not touch storage. Fails with [`RenderError::MissingBundle`] when the
/// dataset has no readable statistics bundle.
pub fn render(dataset: &Dataset, records: &[Record]) -> Result<Vec<u8>, RenderError> {
    render_at(dataset, records, Utc::now())
}

/// Render as PDF bytes with an explicit render timestamp.
pub fn render_at(dataset: &Dataset, records: &[Record], rendered_at: DateTime<Utc>) -> Result<Vec<u8>, RenderError> {
    let doc = build_report(dataset, records, rendered_at)?;
    render_pdf(&doc)
}
