//! Band-grid report writer.
//!
//! Renders the visual score-band report: one colored grid per assessment,
//! at most ten rows per page, a bold header line on every page, and the
//! bell-curve image centered on the first page when the file is available.
//! The document is assembled object-by-object with lopdf; no drawing
//! library is involved, the content streams are written by hand.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use log::warn;
use lopdf::{dictionary, Document, Object, Stream};

use crate::PdfError;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// An opaque RGB fill color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Header fill for the name column.
    pub const HEADER_GRAY: Color = Color { r: 0xF0, g: 0xF0, b: 0xF0 };

    /// Parse a `#RRGGBB` hex color.
    pub fn from_hex(hex: &str) -> Option<Color> {
        let hex = hex.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Color { r, g, b })
    }

    /// The `r g b` operand triple for `rg`/`RG`, each in 0..1.
    fn operands(self) -> String {
        format!(
            "{:.3} {:.3} {:.3}",
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0
        )
    }
}

/// A grid column: its header label and the fill used for the header cell
/// and for any body cell that lands in this column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridColumn {
    pub label: String,
    pub fill: Option<Color>,
}

/// One body cell: possibly multi-line text (embedded `\n`) and an optional
/// fill. Empty-text cells render as plain white grid squares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCell {
    pub text: String,
    pub fill: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub cells: Vec<GridCell>,
}

/// A titled grid for one assessment. Rows are pre-ordered; the writer only
/// paginates and draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridTable {
    pub title: String,
    pub columns: Vec<GridColumn>,
    pub rows: Vec<GridRow>,
}

/// Rendering knobs supplied by the caller.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Bold header line printed at the top of every page.
    pub header: String,
    /// Bell-curve image for the first page; unreadable or missing files
    /// degrade to a logged warning.
    pub image_path: Option<PathBuf>,
    pub rows_per_page: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            header: String::new(),
            image_path: None,
            rows_per_page: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Geometry (US Letter, points)
// ---------------------------------------------------------------------------

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN_X: f32 = 36.0;
const GRID_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_X;

const HEADER_BASELINE: f32 = 756.0;
const HEADER_FONT_SIZE: f32 = 10.0;
const TITLE_FONT_SIZE: f32 = 14.0;
const CELL_FONT_SIZE: f32 = 6.5;
const CELL_LEADING: f32 = 8.0;

const NAME_COLUMN_WIDTH: f32 = 150.0;
const HEADER_ROW_HEIGHT: f32 = 20.0;
const ROW_HEIGHT: f32 = 28.0;

/// Image box height as a fraction of the page, the cap on its width as a
/// fraction of the page width.
const IMAGE_HEIGHT_FRACTION: f32 = 0.40;
const IMAGE_MAX_WIDTH_FRACTION: f32 = 0.90;

/// Same flat-width estimate the extractor uses; good enough to center text.
fn estimated_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.5
}

/// Escape a string for a PDF literal string operand.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            _ => out.push(ch),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Image loading
// ---------------------------------------------------------------------------

/// Decoded raw RGB pixels ready for a DeviceRGB image XObject.
struct RgbImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

fn load_image(path: &Path) -> Result<RgbImage, PdfError> {
    let img = image::open(path)
        .map_err(|e| PdfError::Image(format!("{}: {}", path.display(), e)))?
        .to_rgb8();
    let (width, height) = img.dimensions();
    Ok(RgbImage {
        width,
        height,
        data: img.into_raw(),
    })
}

// ---------------------------------------------------------------------------
// Content-stream assembly
// ---------------------------------------------------------------------------

/// Incrementally builds one page's content stream.
struct PageContent {
    ops: String,
    /// Y position the next element draws below.
    cursor: f32,
}

impl PageContent {
    fn new(header: &str) -> Self {
        let mut page = PageContent {
            ops: String::new(),
            cursor: HEADER_BASELINE,
        };
        if !header.is_empty() {
            page.text_at(header, MARGIN_X, page.cursor, HEADER_FONT_SIZE, true);
        }
        page.cursor -= 28.0;
        page
    }

    fn text_at(&mut self, text: &str, x: f32, baseline: f32, font_size: f32, bold: bool) {
        let font = if bold { "F2" } else { "F1" };
        let _ = write!(
            self.ops,
            "BT\n/{} {} Tf\n0 0 0 rg\n{:.2} {:.2} Td\n({}) Tj\nET\n",
            font,
            font_size,
            x,
            baseline,
            escape_text(text)
        );
    }

    fn centered_text(&mut self, text: &str, center_x: f32, baseline: f32, font_size: f32, bold: bool) {
        let x = center_x - estimated_text_width(text, font_size) / 2.0;
        self.text_at(text, x, baseline, font_size, bold);
    }

    fn filled_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        let _ = write!(
            self.ops,
            "{} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\n",
            color.operands(),
            x,
            y,
            w,
            h
        );
    }

    fn stroked_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let _ = write!(
            self.ops,
            "0.5 w\n0 0 0 RG\n{:.2} {:.2} {:.2} {:.2} re\nS\n",
            x, y, w, h
        );
    }

    fn image(&mut self, img: &RgbImage) {
        let box_height = IMAGE_HEIGHT_FRACTION * PAGE_HEIGHT;
        let aspect = img.width as f32 / img.height as f32;
        let box_width = (box_height * aspect).min(IMAGE_MAX_WIDTH_FRACTION * PAGE_WIDTH);
        // Re-derive height in case the width cap kicked in.
        let box_height = box_width / aspect;

        let x = (PAGE_WIDTH - box_width) / 2.0;
        let y = self.cursor - box_height;
        let _ = write!(
            self.ops,
            "q\n{:.2} 0 0 {:.2} {:.2} {:.2} cm\n/Im0 Do\nQ\n",
            box_width, box_height, x, y
        );
        self.cursor = y - 20.0;
    }

    fn title(&mut self, title: &str) {
        self.cursor -= TITLE_FONT_SIZE;
        self.centered_text(title, PAGE_WIDTH / 2.0, self.cursor, TITLE_FONT_SIZE, true);
        self.cursor -= 14.0;
    }

    /// Draw one chunk of grid rows under the cursor.
    fn grid(&mut self, columns: &[GridColumn], rows: &[&GridRow]) {
        let band_columns = columns.len().saturating_sub(1).max(1);
        let band_width = (GRID_WIDTH - NAME_COLUMN_WIDTH) / band_columns as f32;
        let column_x = |index: usize| -> (f32, f32) {
            if index == 0 {
                (MARGIN_X, NAME_COLUMN_WIDTH)
            } else {
                (
                    MARGIN_X + NAME_COLUMN_WIDTH + (index - 1) as f32 * band_width,
                    band_width,
                )
            }
        };

        // Header row: name column gray, band columns in their band colors.
        let header_y = self.cursor - HEADER_ROW_HEIGHT;
        for (i, column) in columns.iter().enumerate() {
            let (x, w) = column_x(i);
            let fill = if i == 0 {
                Some(Color::HEADER_GRAY)
            } else {
                column.fill
            };
            if let Some(color) = fill {
                self.filled_rect(x, header_y, w, HEADER_ROW_HEIGHT, color);
            }
            self.stroked_rect(x, header_y, w, HEADER_ROW_HEIGHT);
            let baseline = header_y + HEADER_ROW_HEIGHT / 2.0 - CELL_FONT_SIZE * 0.35;
            self.centered_text(&column.label, x + w / 2.0, baseline, CELL_FONT_SIZE, true);
        }
        self.cursor = header_y;

        // Body rows: only the cell holding the score gets its band color.
        for row in rows {
            let row_y = self.cursor - ROW_HEIGHT;
            for (i, cell) in row.cells.iter().enumerate() {
                let (x, w) = column_x(i);
                if let Some(color) = cell.fill {
                    self.filled_rect(x, row_y, w, ROW_HEIGHT, color);
                }
                self.stroked_rect(x, row_y, w, ROW_HEIGHT);

                if cell.text.is_empty() {
                    continue;
                }
                let lines: Vec<&str> = cell.text.split('\n').collect();
                let first_baseline = row_y + ROW_HEIGHT / 2.0
                    + (lines.len() - 1) as f32 * CELL_LEADING / 2.0
                    - CELL_FONT_SIZE * 0.35;
                for (line_index, line) in lines.iter().enumerate() {
                    let baseline = first_baseline - line_index as f32 * CELL_LEADING;
                    self.centered_text(line, x + w / 2.0, baseline, CELL_FONT_SIZE, false);
                }
            }
            self.cursor = row_y;
        }
    }
}

// ---------------------------------------------------------------------------
// Document assembly
// ---------------------------------------------------------------------------

/// Render the band-grid report and return the finished PDF bytes.
///
/// Tables render in order, each paginated at `rows_per_page`; a report with
/// no rows still produces a single header page.
pub fn render_band_report(
    tables: &[GridTable],
    options: &RenderOptions,
) -> Result<Vec<u8>, PdfError> {
    let image = options.image_path.as_deref().and_then(|path| match load_image(path) {
        Ok(img) => Some(img),
        Err(e) => {
            warn!("skipping bell-curve image: {}", e);
            None
        }
    });

    let rows_per_page = options.rows_per_page.max(1);

    // Lay out every page's content stream first.
    let mut pages: Vec<PageContent> = Vec::new();
    let mut is_first_page = true;

    for table in tables {
        if table.rows.is_empty() {
            continue;
        }
        for chunk in table.rows.chunks(rows_per_page) {
            let mut page = PageContent::new(&options.header);
            if is_first_page {
                if let Some(img) = &image {
                    page.image(img);
                }
                is_first_page = false;
            }
            page.title(&table.title);
            let row_refs: Vec<&GridRow> = chunk.iter().collect();
            page.grid(&table.columns, &row_refs);
            pages.push(page);
        }
    }

    if pages.is_empty() {
        pages.push(PageContent::new(&options.header));
    }

    // Assemble the object graph.
    let mut doc = Document::with_version("1.5");

    let regular_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });

    let image_id = image.as_ref().map(|img| {
        doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => img.width as i64,
                "Height" => img.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            img.data.clone(),
        ))
    });

    let mut page_ids = Vec::with_capacity(pages.len());
    for page in &pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page.ops.clone().into_bytes()));

        let mut resources = dictionary! {
            "Font" => dictionary! {
                "F1" => regular_font_id,
                "F2" => bold_font_id,
            },
        };
        if let Some(id) = image_id {
            resources.set("XObject", dictionary! { "Im0" => id });
        }

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(PAGE_WIDTH),
                Object::Real(PAGE_HEIGHT),
            ],
            "Contents" => content_id,
            "Resources" => resources,
        });
        page_ids.push(page_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| (*id).into()).collect();
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_ids.len() as i64,
    });

    for page_id in &page_ids {
        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(*page_id) {
            dict.set("Parent", pages_id);
        }
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| PdfError::Render(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band_columns() -> Vec<GridColumn> {
        let bands = [
            ("Very Low", "#FF4C4C"),
            ("Low", "#FFA500"),
            ("Low Average", "#FFFF66"),
            ("Average", "#66B2FF"),
            ("High Average", "#00CED1"),
            ("Superior", "#32CD32"),
        ];
        let mut columns = vec![GridColumn {
            label: "Composite".to_string(),
            fill: None,
        }];
        columns.extend(bands.iter().map(|(label, hex)| GridColumn {
            label: label.to_string(),
            fill: Color::from_hex(hex),
        }));
        columns
    }

    /// A row with the score text placed in band column `band_index` (0-5).
    fn score_row(name: &str, score: &str, band_index: usize) -> GridRow {
        let columns = band_columns();
        let mut cells = vec![GridCell {
            text: name.to_string(),
            fill: None,
        }];
        for i in 0..6 {
            cells.push(GridCell {
                text: if i == band_index { score.to_string() } else { String::new() },
                fill: if i == band_index { columns[i + 1].fill } else { None },
            });
        }
        GridRow { cells }
    }

    fn table_with_rows(count: usize) -> GridTable {
        GridTable {
            title: "Woodcock-Johnson IV Tests of Achievement".to_string(),
            columns: band_columns(),
            rows: (0..count)
                .map(|i| score_row(&format!("TEST {i}"), "100", 3))
                .collect(),
        }
    }

    fn options() -> RenderOptions {
        RenderOptions {
            header: "Doe, Jane   Triennial Assessment".to_string(),
            ..Default::default()
        }
    }

    // -- Color --------------------------------------------------------------

    #[test]
    fn color_from_hex_parses() {
        assert_eq!(Color::from_hex("#FF4C4C"), Some(Color { r: 255, g: 76, b: 76 }));
        assert_eq!(Color::from_hex("#000000"), Some(Color { r: 0, g: 0, b: 0 }));
    }

    #[test]
    fn color_from_hex_rejects_malformed() {
        assert_eq!(Color::from_hex("FF4C4C"), None);
        assert_eq!(Color::from_hex("#FFF"), None);
        assert_eq!(Color::from_hex("#GGGGGG"), None);
    }

    #[test]
    fn color_operands_are_unit_range() {
        assert_eq!(Color { r: 255, g: 0, b: 0 }.operands(), "1.000 0.000 0.000");
    }

    // -- escaping -----------------------------------------------------------

    #[test]
    fn escape_parentheses_and_backslash() {
        assert_eq!(escape_text("Oral (Extended)"), "Oral \\(Extended\\)");
        assert_eq!(escape_text("a\\b"), "a\\\\b");
    }

    // -- rendering ----------------------------------------------------------

    #[test]
    fn renders_a_loadable_pdf() {
        let bytes = render_band_report(&[table_with_rows(3)], &options()).unwrap();

        assert!(bytes.starts_with(b"%PDF"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn paginates_at_rows_per_page() {
        let bytes = render_band_report(&[table_with_rows(23)], &options()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn two_tables_render_on_separate_pages() {
        let tables = [table_with_rows(2), table_with_rows(2)];
        let bytes = render_band_report(&tables, &options()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn empty_report_still_has_a_header_page() {
        let bytes = render_band_report(&[], &options()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn empty_tables_are_skipped() {
        let tables = [table_with_rows(0), table_with_rows(1)];
        let bytes = render_band_report(&tables, &options()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn missing_image_degrades_to_no_image() {
        let opts = RenderOptions {
            image_path: Some(PathBuf::from("/nonexistent/bell_curve.png")),
            ..options()
        };
        let bytes = render_band_report(&[table_with_rows(1)], &opts).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn rendered_text_extracts_back_out() {
        // Drive the writer's output through our own extractor: the row name,
        // its score, and the page header must all come back.
        let bytes = render_band_report(&[table_with_rows(2)], &options()).unwrap();
        let pages = crate::extract_page_lines(&bytes).unwrap();

        let all_text = pages.concat().join("\n");
        assert!(all_text.contains("TEST 0"), "missing row name in: {all_text}");
        assert!(all_text.contains("100"), "missing score in: {all_text}");
        assert!(all_text.contains("Triennial Assessment"), "missing header in: {all_text}");
    }

    #[test]
    fn header_and_score_share_their_grid_line() {
        let table = GridTable {
            title: "t".to_string(),
            columns: band_columns(),
            rows: vec![score_row("SPELLING", "95", 3)],
        };
        let bytes = render_band_report(&[table], &options()).unwrap();
        let pages = crate::extract_page_lines(&bytes).unwrap();

        assert!(pages[0]
            .iter()
            .any(|line| line.contains("SPELLING") && line.contains("95")));
    }
}
