/// Console formatting module - Pure rendering concerns
///
/// This module handles box-drawing table output for the terminal:
/// - Table borders and rows
/// - Optional 24-bit colour for header and banded rows
/// - Text truncation, padding and centring by display width
///
/// It accepts pre-formatted cell text from the report module and renders it.
/// `TableWriter` writes to any `std::io::Write` destination, so the same code
/// produces coloured console output and plain text for files or tests.

use crate::report::Rgb;
use std::io::{self, Write};
use std::sync::OnceLock;
use terminal_size::{Width, terminal_size};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Width used when the terminal size is unknown (pipes, CI)
pub const DEFAULT_CONSOLE_WIDTH: usize = 100;

static CONSOLE_WIDTH: OnceLock<usize> = OnceLock::new();

/// Fix the console width for the rest of the process (first call wins).
pub fn set_console_width(width: usize) {
    let _ = CONSOLE_WIDTH.set(width);
}

/// Terminal width, detected once
pub fn console_width() -> usize {
    *CONSOLE_WIDTH.get_or_init(|| match terminal_size() {
        Some((Width(w), _)) => w as usize,
        None => DEFAULT_CONSOLE_WIDTH,
    })
}

/// How a row's cells are painted when colours are on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPaint {
    pub background: Rgb,
    pub foreground: Rgb,
    pub bold: bool,
}

/// Writer for table output - configurable for color/plain text
pub struct TableWriter<W: Write> {
    writer: W,
    use_colors: bool,
}

impl<W: Write> TableWriter<W> {
    pub fn new(writer: W, use_colors: bool) -> Self {
        Self { writer, use_colors }
    }

    /// Give back the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write a line of free text, bold when colours are on
    pub fn write_heading(&mut self, text: &str) -> io::Result<()> {
        if self.use_colors {
            writeln!(self.writer, "\x1b[1m{}\x1b[0m", text)
        } else {
            writeln!(self.writer, "{}", text)
        }
    }

    /// Write a plain line
    pub fn write_line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", text)
    }

    pub fn write_blank(&mut self) -> io::Result<()> {
        writeln!(self.writer)
    }

    pub fn write_top_border(&mut self, widths: &[usize]) -> io::Result<()> {
        writeln!(self.writer, "{}", border_line('┌', '┬', '┐', widths))
    }

    pub fn write_separator_line(&mut self, widths: &[usize]) -> io::Result<()> {
        writeln!(self.writer, "{}", border_line('├', '┼', '┤', widths))
    }

    pub fn write_bottom_border(&mut self, widths: &[usize]) -> io::Result<()> {
        writeln!(self.writer, "{}", border_line('└', '┴', '┘', widths))
    }

    /// Write one row of centred cells; `widths` are inner column widths.
    pub fn write_row(&mut self, cells: &[&str], widths: &[usize], paint: Option<RowPaint>) -> io::Result<()> {
        write!(self.writer, "│")?;
        for (cell, width) in cells.iter().zip(widths) {
            let text = format!(" {} ", center_with_padding(cell, width.saturating_sub(2)));
            match paint {
                Some(p) if self.use_colors => {
                    let Rgb(br, bg, bb) = p.background;
                    let Rgb(fr, fg, fb) = p.foreground;
                    let weight = if p.bold { "\x1b[1m" } else { "" };
                    write!(
                        self.writer,
                        "\x1b[48;2;{};{};{}m\x1b[38;2;{};{};{}m{}{}\x1b[0m",
                        br, bg, bb, fr, fg, fb, weight, text
                    )?;
                }
                _ => write!(self.writer, "{}", text)?,
            }
            write!(self.writer, "│")?;
        }
        writeln!(self.writer)
    }
}

fn border_line(left: char, join: char, right: char, widths: &[usize]) -> String {
    let inner: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    format!("{}{}{}", left, inner.join(&join.to_string()), right)
}

/// Get display width of a string (accounts for wide and zero-width characters)
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate to `width` columns, ending with "..." when clipped
fn truncate(s: &str, width: usize) -> (String, usize) {
    let display_w = display_width(s);
    if display_w <= width {
        return (s.to_string(), display_w);
    }

    let target_width = if width >= 3 { width - 3 } else { width };
    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let c_width = UnicodeWidthChar::width(c).unwrap_or(1);
        if current_width + c_width > target_width {
            break;
        }
        result.push(c);
        current_width += c_width;
    }
    if width >= 3 {
        result.push_str("...");
        current_width += 3;
    }
    (result, current_width)
}

/// Truncate and left-align to exactly `width` display columns
pub fn truncate_with_padding(s: &str, width: usize) -> String {
    let (text, used) = truncate(s, width);
    format!("{}{}", text, " ".repeat(width.saturating_sub(used)))
}

/// Truncate and centre in exactly `width` display columns; odd slack goes right
pub fn center_with_padding(s: &str, width: usize) -> String {
    let (text, used) = truncate(s, width);
    let slack = width.saturating_sub(used);
    let left = slack / 2;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(slack - left))
}

#[cfg(test)]
#[path = "console_format_test.rs"]
mod console_format_test;
