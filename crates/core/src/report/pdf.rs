//! PDF renderer.
//!
//! Rendering happens in two steps. `layout_pdf` places every string and cell
//! border on A4 pages and returns the result as plain data; `render_pdf` then
//! paints that layout with `printpdf` using the built-in Helvetica faces.
//! Coordinates in a layout are millimetres from the top-left corner of the
//! page. All text is folded to ASCII before it is placed.

use std::io::BufWriter;

use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, Point};

use super::fold::fold_diacritics;
use super::{
    report_file_name, RenderError, ReportArtifact, ReportContent, ReportOptions, PDF_MIME,
};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
const TOP: f32 = 15.0;
/// Rows that would end below this line go on the next page.
const BOTTOM_LIMIT: f32 = 272.0;
/// Footer baseline on the last page.
const FOOTER_Y: f32 = 284.0;

const COLUMN_WIDTHS: [f32; 4] = [50.0, 30.0, 50.0, 70.0];
const LINE_HEIGHT: f32 = 5.0;
const CELL_PADDING: f32 = 1.5;

const TITLE_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 12.0;
const DISCLAIMER_SIZE: f32 = 10.0;
const TABLE_SIZE: f32 = 10.0;
const FOOTER_SIZE: f32 = 8.0;

/// Approximate Helvetica advance per character at 10pt, in mm.
const CHAR_WIDTH_10PT: f32 = 1.764;
const DISCLAIMER_WRAP: usize = 95;
const PT_TO_MM: f32 = 0.3528;

const SIGNATURE_RULE: &str = "______________________________";
const DATE_RULE: &str = "______________";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

/// One drawing instruction. `page` is zero-based.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfOp {
    Text {
        page: usize,
        x_mm: f32,
        /// Baseline, measured from the top of the page.
        y_mm: f32,
        size: f32,
        style: FontStyle,
        text: String,
    },
    /// Stroked cell border; `y_mm` is the top edge.
    Rect {
        page: usize,
        x_mm: f32,
        y_mm: f32,
        width_mm: f32,
        height_mm: f32,
    },
}

/// A fully positioned document.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfLayout {
    pub title: String,
    pub pages: usize,
    pub ops: Vec<PdfOp>,
}

impl PdfLayout {
    /// Every placed string, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            PdfOp::Text { text, .. } => Some(text.as_str()),
            PdfOp::Rect { .. } => None,
        })
    }

    /// Strings placed on `page`, in drawing order.
    pub fn page_texts(&self, page: usize) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PdfOp::Text { page: p, text, .. } if *p == page => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Tracks the page and vertical cursor while ops are placed.
struct Cursor {
    page: usize,
    y: f32,
    ops: Vec<PdfOp>,
}

impl Cursor {
    fn text(&mut self, x_mm: f32, size: f32, style: FontStyle, text: impl Into<String>) {
        self.ops.push(PdfOp::Text {
            page: self.page,
            x_mm,
            y_mm: self.y,
            size,
            style,
            text: text.into(),
        });
    }

    fn new_page(&mut self) {
        self.page += 1;
        self.y = TOP;
    }

    fn advance(&mut self, mm: f32) {
        self.y += mm;
    }

    /// Start a new page when `height` would cross the bottom limit.
    /// Returns true when a page break happened.
    fn ensure_room(&mut self, height: f32) -> bool {
        if self.y + height > BOTTOM_LIMIT {
            self.new_page();
            return true;
        }
        false
    }

    /// Cell lines that still fit above the bottom limit from the current position.
    fn lines_left(&self) -> usize {
        ((BOTTOM_LIMIT - self.y - CELL_PADDING * 2.0) / LINE_HEIGHT).floor().max(0.0) as usize
    }

    /// A table row whose cells are already wrapped. `self.y` is the row's top edge.
    fn row(&mut self, cells: &[Vec<String>; 4], style: FontStyle) {
        let height = row_height(cells);
        let mut x = MARGIN;
        for (lines, width) in cells.iter().zip(COLUMN_WIDTHS) {
            self.ops.push(PdfOp::Rect {
                page: self.page,
                x_mm: x,
                y_mm: self.y,
                width_mm: width,
                height_mm: height,
            });
            for (i, line) in lines.iter().enumerate() {
                self.ops.push(PdfOp::Text {
                    page: self.page,
                    x_mm: x + CELL_PADDING,
                    y_mm: self.y + CELL_PADDING + LINE_HEIGHT * (i as f32 + 0.75),
                    size: TABLE_SIZE,
                    style,
                    text: line.clone(),
                });
            }
            x += width;
        }
        self.y += height;
    }
}

fn row_lines(cells: &[Vec<String>; 4]) -> usize {
    cells.iter().map(Vec::len).max().unwrap_or(1).max(1)
}

fn row_height(cells: &[Vec<String>; 4]) -> f32 {
    row_lines(cells) as f32 * LINE_HEIGHT + CELL_PADDING * 2.0
}

/// Keep the first `at` lines of every cell in `cells` and return the rest.
fn split_row(cells: &mut [Vec<String>; 4], at: usize) -> [Vec<String>; 4] {
    let mut rest: [Vec<String>; 4] = Default::default();
    for (cell, tail) in cells.iter_mut().zip(rest.iter_mut()) {
        if cell.len() > at {
            *tail = cell.split_off(at);
        }
    }
    rest
}

/// Characters that fit on one line of a cell `width_mm` wide.
fn cell_capacity(width_mm: f32) -> usize {
    (((width_mm - CELL_PADDING * 2.0) / CHAR_WIDTH_10PT).floor() as usize).max(1)
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5 * PT_TO_MM
}

/// Greedy word wrap. Words longer than a line are split across lines.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        if !current.is_empty() && current.chars().count() + word.chars().count() + 1 > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn wrap_cells(cells: [&str; 4]) -> [Vec<String>; 4] {
    let mut wrapped: [Vec<String>; 4] = Default::default();
    for (i, (cell, width)) in cells.iter().zip(COLUMN_WIDTHS).enumerate() {
        wrapped[i] = wrap_text(&fold_diacritics(cell), cell_capacity(width));
    }
    wrapped
}

/// Place every element of the report on A4 pages.
///
/// The column headers are repeated at the top of each page the table
/// continues onto. A row taller than the space below the header on a fresh
/// page is split across pages. The attribution footer sits at the bottom of
/// the last page.
pub fn layout_pdf(
    content: &ReportContent,
    options: &ReportOptions,
) -> Result<PdfLayout, RenderError> {
    content.ensure_records()?;
    let labels = options.locale.labels();

    let title = fold_diacritics(labels.title);
    let mut cursor = Cursor { page: 0, y: TOP, ops: Vec::new() };

    let title_x = ((PAGE_WIDTH - text_width(&title, TITLE_SIZE)) / 2.0).max(MARGIN);
    cursor.text(title_x, TITLE_SIZE, FontStyle::Regular, title.clone());
    cursor.advance(10.0);

    let mut metadata = vec![
        format!("{}: {}", labels.patient, content.patient.name),
        format!("{}: {}", labels.date_of_birth, content.date_of_birth_text()),
    ];
    if let Some(facility) = &content.patient.facility {
        metadata.push(format!("{}: {}", labels.facility, facility));
    }
    metadata.push(format!("{}: {}", labels.report_date, content.generated_at_text()));
    for line in metadata {
        cursor.text(MARGIN, BODY_SIZE, FontStyle::Regular, fold_diacritics(&line));
        cursor.advance(10.0);
    }

    for line in wrap_text(&fold_diacritics(&labels.disclaimer_line()), DISCLAIMER_WRAP) {
        cursor.text(MARGIN, DISCLAIMER_SIZE, FontStyle::Bold, line);
        cursor.advance(LINE_HEIGHT + 1.0);
    }
    cursor.advance(5.0);

    let header = wrap_cells(labels.short_headers);
    let header_height = row_height(&header);
    cursor.ensure_room(header_height);
    cursor.row(&header, FontStyle::Bold);

    for row in content.rows() {
        let mut cells = wrap_cells(row);
        if cursor.ensure_room(row_height(&cells)) {
            cursor.row(&header, FontStyle::Bold);
        }
        while row_lines(&cells) > cursor.lines_left() {
            let rest = split_row(&mut cells, cursor.lines_left().max(1));
            cursor.row(&cells, FontStyle::Regular);
            cursor.new_page();
            cursor.row(&header, FontStyle::Bold);
            cells = rest;
        }
        cursor.row(&cells, FontStyle::Regular);
    }

    if options.signature_lines {
        cursor.advance(10.0);
        for role in labels.signature_roles {
            cursor.ensure_room(LINE_HEIGHT * 2.0);
            let line = format!("{role}: {SIGNATURE_RULE}   {}: {DATE_RULE}", labels.signature_date);
            cursor.text(MARGIN, TABLE_SIZE, FontStyle::Regular, fold_diacritics(&line));
            cursor.advance(LINE_HEIGHT * 2.0);
        }
    }

    let attribution = fold_diacritics(&options.attribution);
    let footer_x = (PAGE_WIDTH - MARGIN - text_width(&attribution, FOOTER_SIZE)).max(MARGIN);
    cursor.y = FOOTER_Y;
    cursor.text(footer_x, FOOTER_SIZE, FontStyle::Italic, attribution);

    Ok(PdfLayout { title, pages: cursor.page + 1, ops: cursor.ops })
}

/// Render the report as a PDF document.
pub fn render_pdf(
    content: &ReportContent,
    options: &ReportOptions,
) -> Result<ReportArtifact, RenderError> {
    let layout = layout_pdf(content, options)?;
    let bytes = paint(&layout)?;
    tracing::debug!(pages = layout.pages, bytes = bytes.len(), "rendered pdf");
    Ok(ReportArtifact {
        bytes,
        mime_type: PDF_MIME,
        file_name: report_file_name(&content.patient, "pdf"),
    })
}

fn pdf_error(err: impl std::fmt::Display) -> RenderError {
    RenderError::Pdf(err.to_string())
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }
}

fn paint(layout: &PdfLayout) -> Result<Vec<u8>, RenderError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(&layout.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?,
        italic: doc.add_builtin_font(BuiltinFont::HelveticaOblique).map_err(pdf_error)?,
    };

    let mut pages = vec![(first_page, first_layer)];
    for n in 1..layout.pages {
        pages.push(doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("Page {}", n + 1)));
    }
    let layers: Vec<_> = pages
        .iter()
        .map(|(page, layer)| {
            let layer = doc.get_page(*page).get_layer(*layer);
            layer.set_outline_thickness(0.3);
            layer
        })
        .collect();

    for op in &layout.ops {
        match op {
            PdfOp::Text { page, x_mm, y_mm, size, style, text } => {
                if let Some(layer) = layers.get(*page) {
                    let y = Mm(PAGE_HEIGHT - *y_mm);
                    layer.use_text(text.as_str(), *size, Mm(*x_mm), y, fonts.get(*style));
                }
            }
            PdfOp::Rect { page, x_mm, y_mm, width_mm, height_mm } => {
                if let Some(layer) = layers.get(*page) {
                    let top = PAGE_HEIGHT - *y_mm;
                    let bottom = top - *height_mm;
                    let right = *x_mm + *width_mm;
                    layer.add_line(Line {
                        points: vec![
                            (Point::new(Mm(*x_mm), Mm(top)), false),
                            (Point::new(Mm(right), Mm(top)), false),
                            (Point::new(Mm(right), Mm(bottom)), false),
                            (Point::new(Mm(*x_mm), Mm(bottom)), false),
                        ],
                        is_closed: true,
                    });
                }
            }
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf).map_err(pdf_error)?;
    buf.into_inner().map_err(|e| RenderError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_keeps_short_text_on_one_line() {
        assert_eq!(wrap_text("Safe to crush", 26), vec!["Safe to crush"]);
    }

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        let lines = wrap_text("Disperse in water and give immediately via tube", 20);
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
        assert_eq!(lines.join(" "), "Disperse in water and give immediately via tube");
    }

    #[test]
    fn wrap_splits_words_longer_than_a_line() {
        let lines = wrap_text("Hydroxychloroquinesulfate", 10);
        assert_eq!(lines, vec!["Hydroxychl", "oroquinesu", "lfate"]);
    }

    #[test]
    fn wrap_of_empty_text_is_one_blank_line() {
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }

    #[test]
    fn split_row_keeps_head_and_returns_tail() {
        let line = |s: &str| s.to_string();
        let mut cells = [
            vec![line("Drug")],
            vec![line("No")],
            vec![],
            vec![line("a"), line("b"), line("c")],
        ];
        let rest = split_row(&mut cells, 2);
        assert_eq!(cells[0], vec!["Drug"]);
        assert_eq!(cells[3], vec!["a", "b"]);
        assert_eq!(rest[3], vec!["c"]);
        assert!(rest[0].is_empty() && rest[1].is_empty());
        assert_eq!(row_lines(&rest), 1);
    }

    #[test]
    fn cell_capacity_scales_with_width() {
        assert!(cell_capacity(70.0) > cell_capacity(30.0));
        assert_eq!(cell_capacity(1.0), 1);
    }
}
