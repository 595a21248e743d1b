//! PDF I/O for scorekit.
//!
//! Two concerns live here, both built on `lopdf`:
//!
//! - [`parser`]: walking a score report's content streams and reassembling
//!   the per-page text lines the extraction pipeline consumes.
//! - [`writer`]: constructing the paginated band-grid report PDF (colored
//!   cell grid, page header, optional bell-curve image).
//!
//! Everything positional or visual stays inside this crate; the rest of the
//! workspace only ever sees plain strings and grid descriptions.

use thiserror::Error;

pub mod parser;
pub mod writer;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("Report rendering error: {0}")]
    Render(String),
    #[error("Image error: {0}")]
    Image(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extract the text of every page as top-to-bottom lines.
///
/// This is the whole public surface the extraction pipeline needs: page
/// `n`'s lines are `result[n]`, each line already assembled left-to-right
/// with word gaps collapsed to single spaces. Deterministic for a given
/// input, which keeps the downstream pipeline idempotent.
pub fn extract_page_lines(bytes: &[u8]) -> Result<Vec<Vec<String>>, PdfError> {
    let backend = parser::backend::LopdfBackend::load_bytes(bytes)?;
    parser::page_lines(&backend)
}
