//! Mapping extracted scores onto the band-grid report and rendering it.

use std::path::Path;

use crate::prelude::*;

use pdf::writer::{render_band_report, Color, GridCell, GridColumn, GridRow, GridTable, RenderOptions};
use scorekit_core::bands::Band;
use scorekit_core::report::{BandTable, ROWS_PER_PAGE};

use crate::extract::ExtractedReport;

pub const ORAL_TITLE: &str = "Woodcock-Johnson IV Tests of Oral Language";
pub const ACHIEVEMENT_TITLE: &str = "Woodcock-Johnson IV Tests of Achievement";

const NAME_COLUMN_LABEL: &str = "Composite";

/// Header line printed on every page: student name, report kind, run date.
fn page_header(report: &ExtractedReport, today: &str) -> String {
    let left = match &report.admin.name {
        Some(name) => f!("{name}   Triennial Assessment"),
        None => "Assessment Report".to_string(),
    };
    f!("{left:<60}{today}")
}

/// Translate a core [`BandTable`] into the writer's grid: one name column
/// plus one column per band, the score printed (and colored) only in the
/// column of its band.
fn to_grid(table: &BandTable) -> GridTable {
    let mut columns = vec![GridColumn {
        label: NAME_COLUMN_LABEL.to_string(),
        fill: None,
    }];
    columns.extend(Band::ALL.iter().map(|band| GridColumn {
        label: band.label().to_string(),
        fill: Color::from_hex(band.color()),
    }));

    let rows = table
        .rows
        .iter()
        .map(|row| {
            let mut cells = vec![GridCell {
                text: row.name.clone(),
                fill: None,
            }];
            cells.extend(Band::ALL.iter().map(|band| {
                if *band == row.band {
                    GridCell {
                        text: row.standard_score.to_string(),
                        fill: Color::from_hex(band.color()),
                    }
                } else {
                    GridCell {
                        text: String::new(),
                        fill: None,
                    }
                }
            }));
            GridRow { cells }
        })
        .collect();

    GridTable {
        title: table.title.clone(),
        columns,
        rows,
    }
}

/// Render the paginated band report for both assessments.
pub fn render(report: &ExtractedReport, image: &Path, today: &str) -> Result<Vec<u8>> {
    let tables = [
        to_grid(&BandTable::from_scores(ORAL_TITLE, &report.oral)),
        to_grid(&BandTable::from_scores(ACHIEVEMENT_TITLE, &report.achievement)),
    ];

    let options = RenderOptions {
        header: page_header(report, today),
        image_path: Some(image.to_path_buf()),
        rows_per_page: ROWS_PER_PAGE,
    };

    render_band_report(&tables, &options)
        .map_err(|e| Error::Report(f!("Error rendering band report: {e}")).into())
}
