//! Text extraction: content-stream walking and line reassembly.

pub mod backend;
pub mod layout;

use backend::PdfBackend;

use crate::PdfError;

/// Run span extraction and line grouping over every page of a document.
///
/// Pages come back in document order; each page is a list of line texts,
/// top of the page first.
pub fn page_lines(backend: &dyn PdfBackend) -> Result<Vec<Vec<String>>, PdfError> {
    let mut pages = Vec::new();

    for (_, page_id) in backend.pages() {
        let spans = layout::extract_page_spans(backend, page_id)?;
        let lines = layout::group_spans_into_lines(spans);
        pages.push(lines.iter().map(layout::TextLine::text).collect());
    }

    Ok(pages)
}
