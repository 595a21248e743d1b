use std::path::PathBuf;

use crate::prelude::{println, *};
use colored::Colorize;
use prettytable::row;
use serde::Serialize;

use scorekit_core::admin::{parse_admin_section, AdministrativeRecord, TestAdministration};
use scorekit_core::bands::Band;
use scorekit_core::scores::{order_composites_first, parse_score_lines, ScoreRow};
use scorekit_core::sections::{collect_until, slice_assessments, STOP_PHRASE};

#[derive(Debug, clap::Args, Clone)]
pub struct Options {
    /// Path to the score-report PDF
    #[arg(value_name = "PDF")]
    pub pdf_path: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Everything the pipeline pulls out of one score-report PDF.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedReport {
    pub admin: AdministrativeRecord,
    pub administrations: Vec<TestAdministration>,
    pub oral: Vec<ScoreRow>,
    pub achievement: Vec<ScoreRow>,
}

pub fn run(options: Options, global: crate::Global) -> Result<()> {
    if global.verbose {
        println!("Extracting {}...", options.pdf_path.display());
    }

    let bytes = std::fs::read(&options.pdf_path)
        .wrap_err_with(|| f!("Failed to read {}", options.pdf_path.display()))?;
    let report = extract_data(&bytes)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output_formatted(&report);
    }

    Ok(())
}

/// Run the full extraction pipeline over raw PDF bytes.
///
/// Pure given its input, so re-running on the same upload yields the same
/// tables. Also the entry point for the `report` subcommand and the serve
/// mode.
pub fn extract_data(bytes: &[u8]) -> Result<ExtractedReport> {
    let pages = pdf::extract_page_lines(bytes)
        .map_err(|e| Error::Extraction(f!("Error processing PDF: {e}")))?;
    let lines = collect_until(&pages, STOP_PHRASE);

    let extraction = parse_admin_section(&lines);
    let score_lines = &lines[extraction.scores_start.min(lines.len())..];

    let slices = slice_assessments(score_lines).map_err(|e| {
        Error::Extraction(f!(
            "Could not find expected test sections in the PDF ({e}). Please check the format."
        ))
    })?;

    let oral = order_composites_first(parse_score_lines(slices.oral));
    let achievement = order_composites_first(parse_score_lines(slices.achievement));

    Ok(ExtractedReport {
        admin: extraction.record,
        administrations: extraction.administrations,
        oral,
        achievement,
    })
}

fn value_or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn admin_table(record: &AdministrativeRecord) -> prettytable::Table {
    let mut table = new_table();
    table.add_row(row!["Name", value_or_dash(&record.name)]);
    table.add_row(row!["School", value_or_dash(&record.school)]);
    table.add_row(row!["Date of Birth", value_or_dash(&record.date_of_birth)]);
    table.add_row(row!["Teacher", value_or_dash(&record.teacher)]);
    table.add_row(row!["Age", value_or_dash(&record.age)]);
    table.add_row(row!["Grade", value_or_dash(&record.grade)]);
    table.add_row(row!["Sex", value_or_dash(&record.sex)]);
    table
}

fn administrations_table(administrations: &[TestAdministration]) -> prettytable::Table {
    let mut table = new_table();
    table.add_row(row!["Date", "Abbrev", "Test"]);
    for admin in administrations {
        table.add_row(row![admin.date, admin.abbrev, admin.name]);
    }
    table
}

fn scores_table(rows: &[ScoreRow]) -> prettytable::Table {
    let mut table = new_table();
    table.add_row(row!["Test/Cluster", "SS", "PR", "Range"]);
    for score in rows {
        table.add_row(row![
            score.name,
            score.standard_score,
            score.percentile_rank,
            Band::classify(score.standard_score as f64).label(),
        ]);
    }
    table
}

fn output_formatted(report: &ExtractedReport) {
    println!("{}", "ADMINISTRATIVE INFORMATION".bright_cyan().bold());
    admin_table(&report.admin).printstd();

    println!();
    println!("{}", "TESTS ADMINISTERED".bright_cyan().bold());
    if report.administrations.is_empty() {
        println!("{}", "No test administrations found.".yellow());
    } else {
        administrations_table(&report.administrations).printstd();
    }

    for (title, rows) in [
        ("ORAL LANGUAGE", &report.oral),
        ("ACHIEVEMENT", &report.achievement),
    ] {
        println!();
        println!("{}", title.bright_cyan().bold());
        if rows.is_empty() {
            println!("{}", "No score rows recognized.".yellow());
        } else {
            scores_table(rows).printstd();
        }
    }
}
