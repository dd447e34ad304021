//! Report layout model - what goes on the page, independent of the backend.
//!
//! [`build_report`] turns a stored dataset into a [`ReportDocument`]: a title
//! block, dataset metadata, and three styled tables. The PDF and text
//! backends only decide how to draw it.

use crate::error::RenderError;
use crate::stats::format_decimal;
use crate::types::{format_timestamp, Dataset, Record};
use chrono::{DateTime, Utc};

pub const REPORT_TITLE: &str = "Chemical Equipment Parameter Report";
pub const REPORT_SUBTITLE: &str = "ChemViz - Generated Report";

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xff, 0xff, 0xff);
    pub const BLACK: Rgb = Rgb(0x00, 0x00, 0x00);

    /// Components scaled to 0.0..=1.0 for PDF colour operators
    pub fn unit(&self) -> [f32; 3] {
        [self.0 as f32 / 255.0, self.1 as f32 / 255.0, self.2 as f32 / 255.0]
    }
}

pub const TITLE_COLOR: Rgb = Rgb(0x1a, 0x56, 0xdb);
pub const HEADING_COLOR: Rgb = Rgb(0x1e, 0x40, 0xaf);

/// Colours for one table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Header row background
    pub accent: Rgb,
    /// Background of the first, third, ... body rows
    pub body: Rgb,
    /// Background of the second, fourth, ... body rows
    pub band: Rgb,
    pub grid: Rgb,
}

impl Palette {
    pub const BLUE: Palette =
        Palette { accent: Rgb(0x1a, 0x56, 0xdb), body: Rgb(0xf0, 0xf7, 0xff), band: Rgb::WHITE, grid: Rgb(0x93, 0xc5, 0xfd) };
    pub const GREEN: Palette =
        Palette { accent: Rgb(0x05, 0x96, 0x69), body: Rgb(0xec, 0xfd, 0xf5), band: Rgb::WHITE, grid: Rgb(0x6e, 0xe7, 0xb7) };
    pub const PURPLE: Palette =
        Palette { accent: Rgb(0x7c, 0x3a, 0xed), body: Rgb(0xf5, 0xf3, 0xff), band: Rgb::WHITE, grid: Rgb(0xc4, 0xb5, 0xfd) };
}

/// How a table row is painted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStyle {
    /// Accent background, white bold text
    Header,
    Body,
    /// Alternate band, starting with the second body row
    Banded,
}

impl RowStyle {
    /// Style for the body row at zero-based `index`.
    pub fn for_body_row(index: usize) -> RowStyle {
        if index % 2 == 1 { RowStyle::Banded } else { RowStyle::Body }
    }

    pub fn background(&self, palette: &Palette) -> Rgb {
        match self {
            RowStyle::Header => palette.accent,
            RowStyle::Body => palette.body,
            RowStyle::Banded => palette.band,
        }
    }

    pub fn text_color(&self) -> Rgb {
        match self {
            RowStyle::Header => Rgb::WHITE,
            _ => Rgb::BLACK,
        }
    }
}

/// Column title and width in points
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub title: String,
    pub width: f32,
}

impl Column {
    fn new(title: &str, inches: f32) -> Self {
        Self { title: title.to_string(), width: inches * 72.0 }
    }
}

/// A titled table with its styling
#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock {
    pub heading: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
    pub palette: Palette,
    pub header_font_size: f32,
    pub body_font_size: f32,
    pub padding: f32,
}

impl TableBlock {
    pub fn width(&self) -> f32 {
        self.columns.iter().map(|c| c.width).sum()
    }

    pub fn header(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.title.as_str()).collect()
    }
}

/// Everything a backend needs to draw the report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub subtitle: String,
    pub info_heading: String,
    /// (label, value) pairs shown under the dataset heading
    pub metadata: Vec<(String, String)>,
    /// Summary statistics, type distribution, equipment details - in that order
    pub tables: Vec<TableBlock>,
}

/// Lay out the report for `dataset`.
///
/// Fails with [`RenderError::MissingBundle`] when the stored statistics are
/// absent or unreadable. An empty `records` slice is fine.
pub fn build_report(
    dataset: &Dataset,
    records: &[Record],
    rendered_at: DateTime<Utc>,
) -> Result<ReportDocument, RenderError> {
    let bundle = dataset.statistics().ok_or(RenderError::MissingBundle)?;

    let metadata = vec![
        ("Filename".to_string(), dataset.source_name.clone()),
        ("Uploaded".to_string(), format_timestamp(&dataset.created_at_utc())),
        ("Generated".to_string(), format_timestamp(&rendered_at)),
    ];

    let summary = TableBlock {
        heading: "Summary Statistics".to_string(),
        columns: vec![Column::new("Metric", 3.0), Column::new("Value", 2.0)],
        rows: vec![
            vec!["Total Equipment Count".to_string(), bundle.total_count.to_string()],
            vec!["Average Flowrate".to_string(), format_decimal(bundle.avg_flowrate)],
            vec!["Average Pressure".to_string(), format_decimal(bundle.avg_pressure)],
            vec!["Average Temperature".to_string(), format_decimal(bundle.avg_temperature)],
        ],
        palette: Palette::BLUE,
        header_font_size: 12.0,
        body_font_size: 10.0,
        padding: 8.0,
    };

    let distribution = TableBlock {
        heading: "Equipment Type Distribution".to_string(),
        columns: vec![Column::new("Equipment Type", 3.0), Column::new("Count", 2.0)],
        rows: bundle.type_distribution.iter().map(|(name, count)| vec![name.clone(), count.to_string()]).collect(),
        palette: Palette::GREEN,
        header_font_size: 12.0,
        body_font_size: 10.0,
        padding: 8.0,
    };

    let mut ordered: Vec<&Record> = records.iter().collect();
    ordered.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));

    let details = TableBlock {
        heading: "Equipment Details".to_string(),
        columns: vec![
            Column::new("Name", 1.5),
            Column::new("Type", 1.3),
            Column::new("Flowrate", 1.0),
            Column::new("Pressure", 1.0),
            Column::new("Temperature", 1.1),
        ],
        rows: ordered
            .iter()
            .map(|r| {
                vec![
                    r.name.clone(),
                    r.category.clone(),
                    format_decimal(r.flowrate),
                    format_decimal(r.pressure),
                    format_decimal(r.temperature),
                ]
            })
            .collect(),
        palette: Palette::PURPLE,
        header_font_size: 10.0,
        body_font_size: 9.0,
        padding: 6.0,
    };

    Ok(ReportDocument {
        title: REPORT_TITLE.to_string(),
        subtitle: REPORT_SUBTITLE.to_string(),
        info_heading: "Dataset Information".to_string(),
        metadata,
        tables: vec![summary, distribution, details],
    })
}
