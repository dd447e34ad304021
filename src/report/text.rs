//! Terminal rendering of the report layout.

use super::layout::{ReportDocument, RowStyle, TableBlock};
use crate::console_format::{RowPaint, TableWriter};
use std::io::{self, Write};

/// Points per character cell when mapping PDF column widths to the terminal
const POINTS_PER_CHAR: f32 = 7.2;
const MIN_COLUMN_CHARS: usize = 6;

/// Character widths for `table`, shrunk proportionally to fit `max_width`.
fn column_widths(table: &TableBlock, max_width: usize) -> Vec<usize> {
    let natural: Vec<usize> = table
        .columns
        .iter()
        .map(|c| ((c.width / POINTS_PER_CHAR).round() as usize).max(MIN_COLUMN_CHARS))
        .collect();
    // borders: one per column plus the closing one
    let budget = max_width.saturating_sub(natural.len() + 1);
    let total: usize = natural.iter().sum();
    if total <= budget || total == 0 {
        return natural;
    }
    natural.iter().map(|w| (w * budget / total).max(MIN_COLUMN_CHARS)).collect()
}

fn paint(table: &TableBlock, style: RowStyle) -> RowPaint {
    RowPaint {
        background: style.background(&table.palette),
        foreground: style.text_color(),
        bold: style == RowStyle::Header,
    }
}

fn write_table<W: Write>(out: &mut TableWriter<W>, table: &TableBlock, max_width: usize) -> io::Result<()> {
    let widths = column_widths(table, max_width);
    out.write_heading(&table.heading)?;
    out.write_top_border(&widths)?;
    out.write_row(&table.header(), &widths, Some(paint(table, RowStyle::Header)))?;
    out.write_separator_line(&widths)?;
    for (index, row) in table.rows.iter().enumerate() {
        let cells: Vec<&str> = row.iter().map(|c| c.as_str()).collect();
        out.write_row(&cells, &widths, Some(paint(table, RowStyle::for_body_row(index))))?;
    }
    out.write_bottom_border(&widths)
}

/// Write the report as box-drawing tables.
pub fn write_text<W: Write>(writer: W, doc: &ReportDocument, use_colors: bool, max_width: usize) -> io::Result<W> {
    let mut out = TableWriter::new(writer, use_colors);
    out.write_heading(&doc.title)?;
    out.write_line(&doc.subtitle)?;
    out.write_blank()?;
    out.write_heading(&doc.info_heading)?;
    for (label, value) in &doc.metadata {
        out.write_line(&format!("{}: {}", label, value))?;
    }
    for table in &doc.tables {
        out.write_blank()?;
        write_table(&mut out, table, max_width)?;
    }
    Ok(out.into_inner())
}

/// Render the report to a plain or coloured string.
pub fn render_text(doc: &ReportDocument, use_colors: bool, max_width: usize) -> String {
    match write_text(Vec::new(), doc, use_colors, max_width) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        // writes into a Vec do not fail
        Err(_) => String::new(),
    }
}
