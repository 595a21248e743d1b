//! Content-stream text extraction and line reassembly.
//!
//! A score report page is drawn as hundreds of positioned text runs. This
//! module walks the text operators with a small state machine, collects
//! [`TextSpan`]s, and regroups them into top-to-bottom [`TextLine`]s whose
//! text reads the way the page does:
//!
//! ```text
//! content ops  ->  TextSpan[]       ->  TextLine[]
//!   (per page)     extract_page_spans   group_spans_into_lines
//! ```
//!
//! Everything here is pure over fixture operation lists; I/O stays behind
//! [`PdfBackend`].

use super::backend::{number_from_value, PageId, PdfBackend, PdfValue};
use crate::PdfError;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A single run of text at a specific position on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
}

/// A horizontal line assembled from spans sharing (approximately) one Y
/// coordinate. Each span is a word run; [`TextLine::text`] joins them with
/// single spaces.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
    pub x: f32,
    pub y: f32,
}

impl TextLine {
    /// The line's text, word runs joined with single spaces.
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Spans whose Y coordinates differ by less than this share a line.
const Y_TOLERANCE: f32 = 1.0;

/// Approximate glyph width as a fraction of font size. We never load font
/// metrics; 0.5 is close enough for the proportional fonts these reports
/// use, and only relative gaps matter.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Horizontal gap (points) at which two adjacent spans become separate
/// words rather than fragments of one.
const MIN_WORD_GAP: f32 = 1.5;

const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

// ---------------------------------------------------------------------------
// Text-state machine
// ---------------------------------------------------------------------------

/// Mutable state tracked while walking a page's content stream.
#[derive(Debug, Clone)]
struct TextState {
    /// Current font resource key (the `/F1`-style name).
    font_key: Vec<u8>,
    font_size: f32,
    /// [a, b, c, d, tx, ty] of the current text matrix.
    text_matrix: [f32; 6],
    /// Line matrix: set by BT/Tm, advanced by Td/TD/T*.
    line_matrix: [f32; 6],
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn x(&self) -> f32 {
        self.text_matrix[4]
    }

    fn y(&self) -> f32 {
        self.text_matrix[5]
    }

    /// Rendered size: `font_size` scaled by the text matrix's vertical
    /// component.
    fn effective_font_size(&self) -> f32 {
        let scale = (self.text_matrix[1].powi(2) + self.text_matrix[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    /// Advance the text matrix horizontally by `dx` text-space units.
    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Translate the line matrix (Td / TD / T*) and restart the text matrix
    /// from it.
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let new_tx = self.line_matrix[0] * tx + self.line_matrix[2] * ty + self.line_matrix[4];
        let new_ty = self.line_matrix[1] * tx + self.line_matrix[3] * ty + self.line_matrix[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }

    fn estimated_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale
    }

    /// Advance past a shown string, including character and word spacing.
    fn advance_after_show(&mut self, text: &str) {
        let mut dx = 0.0;
        for ch in text.chars() {
            dx += self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale + self.char_spacing;
            if ch == ' ' {
                dx += self.word_spacing;
            }
        }
        self.advance_x(dx);
    }
}

fn decode_string(
    val: &PdfValue,
    backend: &dyn PdfBackend,
    page_id: PageId,
    font_key: &[u8],
) -> String {
    match val {
        PdfValue::Str(bytes) => backend.decode_text(page_id, font_key, bytes),
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Span extraction
// ---------------------------------------------------------------------------

/// Walk one page's content stream and produce its [`TextSpan`]s.
///
/// Handles the text operators `BT ET Tf Tm Td TD T* TL Tc Tw Tz Ts Tj TJ '
/// "`; everything else (paths, images, color) is ignored -- only where text
/// lands matters here.
pub fn extract_page_spans(
    backend: &dyn PdfBackend,
    page_id: PageId,
) -> Result<Vec<TextSpan>, PdfError> {
    let raw_content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw_content)?;

    let mut state = TextState::default();
    let mut spans: Vec<TextSpan> = Vec::new();

    for op in &ops {
        match op.operator.as_str() {
            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
            }
            "ET" => {
                // Font state intentionally survives: reports reuse the font
                // set in an earlier text object.
            }
            "Tf" => {
                if op.operands.len() >= 2 {
                    let key = match &op.operands[0] {
                        PdfValue::Name(n) => n.clone(),
                        PdfValue::Str(s) => s.clone(),
                        _ => continue,
                    };
                    state.font_key = key;
                    state.font_size = number_from_value(&op.operands[1]).unwrap_or(0.0);
                }
            }
            "Tm" => {
                let vals: Vec<f32> = op
                    .operands
                    .iter()
                    .take(6)
                    .filter_map(number_from_value)
                    .collect();
                if vals.len() == 6 {
                    state.text_matrix = [vals[0], vals[1], vals[2], vals[3], vals[4], vals[5]];
                    state.line_matrix = state.text_matrix;
                }
            }
            "Td" => {
                if op.operands.len() >= 2 {
                    let tx = number_from_value(&op.operands[0]).unwrap_or(0.0);
                    let ty = number_from_value(&op.operands[1]).unwrap_or(0.0);
                    state.translate_line(tx, ty);
                }
            }
            "TD" => {
                // Equivalent to: -ty TL ; tx ty Td
                if op.operands.len() >= 2 {
                    let tx = number_from_value(&op.operands[0]).unwrap_or(0.0);
                    let ty = number_from_value(&op.operands[1]).unwrap_or(0.0);
                    state.leading = -ty;
                    state.translate_line(tx, ty);
                }
            }
            "T*" => {
                state.translate_line(0.0, -state.leading);
            }
            "TL" => {
                if let Some(v) = op.operands.first().and_then(number_from_value) {
                    state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = op.operands.first().and_then(number_from_value) {
                    state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = op.operands.first().and_then(number_from_value) {
                    state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = op.operands.first().and_then(number_from_value) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = op.operands.first().and_then(number_from_value) {
                    state.text_rise = v;
                }
            }
            "Tj" => {
                if let Some(first) = op.operands.first() {
                    show_string(first, backend, page_id, &mut state, &mut spans);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(arr)) = op.operands.first() {
                    show_array(arr, backend, page_id, &mut state, &mut spans);
                }
            }
            "'" => {
                state.translate_line(0.0, -state.leading);
                if let Some(first) = op.operands.first() {
                    show_string(first, backend, page_id, &mut state, &mut spans);
                }
            }
            "\"" => {
                // " aw ac string  =>  Tw, Tc, T*, Tj
                if op.operands.len() >= 3 {
                    if let Some(aw) = number_from_value(&op.operands[0]) {
                        state.word_spacing = aw;
                    }
                    if let Some(ac) = number_from_value(&op.operands[1]) {
                        state.char_spacing = ac;
                    }
                    state.translate_line(0.0, -state.leading);
                    show_string(&op.operands[2], backend, page_id, &mut state, &mut spans);
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

/// Emit a span for a shown string (`Tj`, `'`, `"`) and advance.
fn show_string(
    operand: &PdfValue,
    backend: &dyn PdfBackend,
    page_id: PageId,
    state: &mut TextState,
    spans: &mut Vec<TextSpan>,
) {
    let text = decode_string(operand, backend, page_id, &state.font_key);
    if text.is_empty() {
        return;
    }

    spans.push(TextSpan {
        width: state.estimated_width(&text),
        x: state.x(),
        y: state.y() + state.text_rise,
        font_size: state.effective_font_size(),
        text: text.clone(),
    });
    state.advance_after_show(&text);
}

/// Process a `TJ` array: strings to show interleaved with kerning
/// adjustments in thousandths of text space. Large rightward adjustments
/// read as word gaps and break the accumulated run.
fn show_array(
    arr: &[PdfValue],
    backend: &dyn PdfBackend,
    page_id: PageId,
    state: &mut TextState,
    spans: &mut Vec<TextSpan>,
) {
    let mut buf = String::new();
    let mut run_x = state.x();
    let run_y = state.y() + state.text_rise;

    for elem in arr {
        match elem {
            PdfValue::Str(_) => {
                let fragment = decode_string(elem, backend, page_id, &state.font_key);
                if buf.is_empty() {
                    run_x = state.x();
                }
                buf.push_str(&fragment);
                state.advance_after_show(&fragment);
            }
            val => {
                if let Some(adj) = number_from_value(val) {
                    // Negative adjustment moves right.
                    let dx = -adj / 1000.0 * state.font_size * state.horiz_scale;
                    let gap_threshold =
                        state.font_size * APPROX_CHAR_WIDTH_RATIO * state.horiz_scale * 0.3;
                    if dx > gap_threshold && !buf.is_empty() {
                        buf.push(' ');
                    }
                    state.advance_x(dx);
                }
            }
        }
    }

    let trimmed = buf.trim_end();
    if !trimmed.is_empty() {
        spans.push(TextSpan {
            text: trimmed.to_string(),
            x: run_x,
            y: run_y,
            width: state.estimated_width(trimmed),
            font_size: state.effective_font_size(),
        });
    }
}

// ---------------------------------------------------------------------------
// Span -> line grouping
// ---------------------------------------------------------------------------

/// Group a page's spans into lines, top of the page first.
///
/// Spans within [`Y_TOLERANCE`] of each other share a line; within a line,
/// spans sort left-to-right and fragments closer than [`MIN_WORD_GAP`]
/// merge into one word run.
pub fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    if spans.is_empty() {
        return Vec::new();
    }

    // Y descending (top first), then X ascending.
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<TextSpan> = vec![spans.remove(0)];
    let mut current_y = current[0].y;

    for span in spans {
        if (span.y - current_y).abs() <= Y_TOLERANCE {
            current.push(span);
        } else {
            lines.push(assemble_line(std::mem::take(&mut current)));
            current_y = span.y;
            current.push(span);
        }
    }

    if !current.is_empty() {
        lines.push(assemble_line(current));
    }

    lines
}

/// Merge a line's spans left-to-right: fragments separated by less than
/// [`MIN_WORD_GAP`] concatenate into one run; anything wider stays a
/// separate word.
fn assemble_line(mut spans: Vec<TextSpan>) -> TextLine {
    spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

    let mut merged: Vec<TextSpan> = Vec::with_capacity(spans.len());

    for span in spans {
        if let Some(prev) = merged.last_mut() {
            let gap = span.x - (prev.x + prev.width);
            // Slightly overlapping fragments are kerning artifacts of the
            // width estimate, not separate words.
            if gap < MIN_WORD_GAP && gap > -prev.font_size {
                prev.text.push_str(&span.text);
                prev.width = (span.x + span.width) - prev.x;
                continue;
            }
        }
        merged.push(span);
    }

    let x = merged.first().map(|s| s.x).unwrap_or(0.0);
    let y = merged.first().map(|s| s.y).unwrap_or(0.0);

    TextLine { spans: merged, x, y }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
