//! PDF backend for the report layout.
//!
//! Draws a [`ReportDocument`] onto A4 pages with the standard Helvetica
//! fonts. Tables flow across pages; when a table continues on a new page
//! its header row is drawn again. Every page gets a "Page n of m" footer.

use super::layout::{ReportDocument, Rgb, RowStyle, TableBlock, HEADING_COLOR, TITLE_COLOR};
use crate::error::RenderError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN_X: f32 = 72.0;
const MARGIN_TOP: f32 = 36.0;
const MARGIN_BOTTOM: f32 = 36.0;
const FOOTER_BASELINE: f32 = 18.0;
const FOOTER_COLOR: Rgb = Rgb(0x6b, 0x72, 0x80);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Approximate Helvetica advance width (1/1000 em) for centring and clipping.
fn glyph_width(c: char, font: Font) -> f32 {
    let base = match c {
        ' ' | '.' | ',' | ':' | ';' | '!' | '\'' | '|' | 'i' | 'j' | 'l' | 'I' => 278.0,
        '-' | '(' | ')' | '[' | ']' | 'f' | 't' | 'r' => 333.0,
        'm' | 'M' => 833.0,
        'w' | 'W' => 800.0,
        '0'..='9' | '$' | '_' => 556.0,
        'A'..='Z' => 680.0,
        'a'..='z' => 540.0,
        _ => 600.0,
    };
    match font {
        Font::Regular => base,
        Font::Bold => base * 1.06,
    }
}

fn text_width(text: &str, font: Font, size: f32) -> f32 {
    text.chars().map(|c| glyph_width(c, font)).sum::<f32>() * size / 1000.0
}

/// Clip `text` with a trailing "..." so it fits in `max_width` points.
fn fit_text(text: &str, font: Font, size: f32, max_width: f32) -> String {
    if text_width(text, font, size) <= max_width {
        return text.to_string();
    }
    let ellipsis = text_width("...", font, size);
    let mut result = String::new();
    let mut width = 0.0;
    for c in text.chars() {
        let w = glyph_width(c, font) * size / 1000.0;
        if width + w + ellipsis > max_width {
            break;
        }
        result.push(c);
        width += w;
    }
    result.push_str("...");
    result
}

/// Byte for `c` under WinAnsiEncoding, '?' when the encoding has no glyph for it.
fn win_ansi_byte(c: char) -> u8 {
    match c {
        '\u{0000}'..='\u{007f}' | '\u{00a0}'..='\u{00ff}' => c as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8a,
        '‹' => 0x8b,
        'Œ' => 0x8c,
        'Ž' => 0x8e,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '•' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9a,
        '›' => 0x9b,
        'œ' => 0x9c,
        'ž' => 0x9e,
        'Ÿ' => 0x9f,
        // C1 controls and everything else outside the code page
        _ => b'?',
    }
}

/// Encode for the standard fonts, which use WinAnsiEncoding.
fn encode_text(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn color_op(op: &str, color: Rgb) -> Operation {
    let [r, g, b] = color.unit();
    Operation::new(op, vec![r.into(), g.into(), b.into()])
}

/// Page-by-page drawing state
struct PdfWriter {
    finished: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    /// Top of the remaining free space on the current page
    y: f32,
}

impl PdfWriter {
    fn new() -> Self {
        Self { finished: Vec::new(), current: Vec::new(), y: PAGE_HEIGHT - MARGIN_TOP }
    }

    fn new_page(&mut self) {
        let page = std::mem::take(&mut self.current);
        self.finished.push(page);
        self.y = PAGE_HEIGHT - MARGIN_TOP;
    }

    /// Start a new page unless `height` points still fit. Returns true on a page break.
    fn ensure_space(&mut self, height: f32) -> bool {
        if self.y - height < MARGIN_BOTTOM && self.y < PAGE_HEIGHT - MARGIN_TOP {
            self.new_page();
            return true;
        }
        false
    }

    fn text(&mut self, x: f32, baseline: f32, font: Font, size: f32, color: Rgb, text: &str) {
        self.current.push(Operation::new("BT", vec![]));
        self.current.push(color_op("rg", color));
        self.current.push(Operation::new("Tf", vec![font.resource().into(), size.into()]));
        self.current.push(Operation::new("Td", vec![x.into(), baseline.into()]));
        self.current.push(Operation::new("Tj", vec![Object::String(encode_text(text), StringFormat::Literal)]));
        self.current.push(Operation::new("ET", vec![]));
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        self.current.push(color_op("rg", color));
        self.current.push(Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]));
        self.current.push(Operation::new("f", vec![]));
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        self.current.push(color_op("RG", color));
        self.current.push(Operation::new("w", vec![1.0_f32.into()]));
        self.current.push(Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]));
        self.current.push(Operation::new("S", vec![]));
    }

    /// A single-line paragraph; `centered` or left-aligned at the margin.
    fn paragraph(&mut self, text: &str, font: Font, size: f32, color: Rgb, centered: bool, space_after: f32) {
        let line_height = size * 1.2;
        self.ensure_space(line_height);
        let content_width = PAGE_WIDTH - 2.0 * MARGIN_X;
        let text = fit_text(text, font, size, content_width);
        let x = if centered { (PAGE_WIDTH - text_width(&text, font, size)) / 2.0 } else { MARGIN_X };
        self.text(x, self.y - size, font, size, color, &text);
        self.y -= line_height + space_after;
    }

    /// "Label: value" line with a bold label
    fn labelled_line(&mut self, label: &str, value: &str, size: f32) {
        let line_height = size * 1.2;
        self.ensure_space(line_height);
        let label = format!("{}: ", label);
        let label_width = text_width(&label, Font::Bold, size);
        let value = fit_text(value, Font::Regular, size, PAGE_WIDTH - 2.0 * MARGIN_X - label_width);
        self.text(MARGIN_X, self.y - size, Font::Bold, size, Rgb::BLACK, &label);
        self.text(MARGIN_X + label_width, self.y - size, Font::Regular, size, Rgb::BLACK, &value);
        self.y -= line_height;
    }

    fn spacer(&mut self, height: f32) {
        self.y -= height;
    }

    fn row(&mut self, table: &TableBlock, cells: &[&str], style: RowStyle, height: f32) {
        let (font, size) = match style {
            RowStyle::Header => (Font::Bold, table.header_font_size),
            _ => (Font::Regular, table.body_font_size),
        };
        let bottom = self.y - height;
        let mut x = (PAGE_WIDTH - table.width()) / 2.0;
        for (column, cell) in table.columns.iter().zip(cells) {
            self.fill_rect(x, bottom, column.width, height, style.background(&table.palette));
            self.stroke_rect(x, bottom, column.width, height, table.palette.grid);
            let text = fit_text(cell, font, size, column.width - 2.0 * table.padding);
            let tx = x + (column.width - text_width(&text, font, size)) / 2.0;
            let baseline = bottom + (height - size) / 2.0 + size * 0.22;
            self.text(tx, baseline, font, size, style.text_color(), &text);
            x += column.width;
        }
        self.y = bottom;
    }

    fn table(&mut self, table: &TableBlock) {
        let heading_size = 14.0;
        let heading_height = heading_size * 1.2 + 12.0;
        let header_height = table.header_font_size + table.padding + table.padding.max(12.0);
        let body_height = table.body_font_size + 2.0 * table.padding;

        let first_row = if table.rows.is_empty() { 0.0 } else { body_height };
        self.ensure_space(heading_height + header_height + first_row);
        self.paragraph(&table.heading, Font::Bold, heading_size, HEADING_COLOR, false, 12.0);

        let header = table.header();
        self.row(table, &header, RowStyle::Header, header_height);

        for (index, row) in table.rows.iter().enumerate() {
            if self.ensure_space(body_height) {
                self.row(table, &header, RowStyle::Header, header_height);
            }
            let cells: Vec<&str> = row.iter().map(|c| c.as_str()).collect();
            self.row(table, &cells, RowStyle::for_body_row(index), body_height);
        }
    }

    fn finish(mut self, title: &str) -> Result<Vec<u8>, RenderError> {
        self.new_page();
        let total = self.finished.len();

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let pages = std::mem::take(&mut self.finished);
        let mut kids: Vec<Object> = Vec::with_capacity(total);
        for (index, operations) in pages.into_iter().enumerate() {
            self.current = operations;
            let footer = format!("Page {} of {}", index + 1, total);
            let x = (PAGE_WIDTH - text_width(&footer, Font::Regular, 8.0)) / 2.0;
            self.text(x, FOOTER_BASELINE, Font::Regular, 8.0, FOOTER_COLOR, &footer);

            let content = Content { operations: std::mem::take(&mut self.current) };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(total as i64),
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH as i64),
                Object::Integer(PAGE_HEIGHT as i64),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(encode_text(title), StringFormat::Literal),
            "Producer" => Object::string_literal("chemviz"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).map_err(|e| RenderError::Pdf(e.to_string()))?;
        Ok(buffer)
    }
}

/// Render the laid-out report as PDF bytes.
pub fn render_pdf(doc: &ReportDocument) -> Result<Vec<u8>, RenderError> {
    let mut writer = PdfWriter::new();

    writer.paragraph(&doc.title, Font::Bold, 20.0, TITLE_COLOR, true, 30.0);
    writer.paragraph(&doc.subtitle, Font::Regular, 10.0, Rgb::BLACK, false, 0.0);
    writer.spacer(20.0);

    writer.paragraph(&doc.info_heading, Font::Bold, 14.0, HEADING_COLOR, false, 12.0);
    for (label, value) in &doc.metadata {
        writer.labelled_line(label, value, 10.0);
    }

    for table in &doc.tables {
        writer.spacer(20.0);
        writer.table(table);
    }

    writer.finish(&doc.title)
}
