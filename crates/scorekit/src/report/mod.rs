use std::path::{Path, PathBuf};

use crate::prelude::{println, *};
use colored::Colorize;

use scorekit_core::report::{build_narrative_context, ClinicianInput};

pub mod bands;
pub mod narrative;

/// Fixed-name narrative template looked up beside the application when no
/// `--template` is given; its absence falls back to the built-in template.
pub const DEFAULT_TEMPLATE_PATH: &str = "narrative.tera";

/// Fixed-name bell-curve image for the first page of the band report; its
/// absence just omits the image.
pub const DEFAULT_IMAGE_PATH: &str = "bell_curve.png";

#[derive(Debug, clap::Args, Clone)]
pub struct Options {
    /// Path to the score-report PDF
    #[arg(value_name = "PDF")]
    pub pdf_path: PathBuf,

    /// Testing observations for the narrative
    #[arg(long, default_value = "")]
    pub observations: String,

    /// Student's primary language
    #[arg(long, default_value = "")]
    pub primary_language: String,

    /// Vision/hearing screening comments
    #[arg(long, default_value = "")]
    pub vision_comment: String,

    /// Teacher input
    #[arg(long, default_value = "")]
    pub teacher_input: String,

    /// Narrative template (defaults to `narrative.tera` in the working
    /// directory; the built-in template is used when missing)
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Bell-curve image for the band report (defaults to `bell_curve.png`)
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Directory the generated reports are written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,
}

/// Both finished artifacts for one processed report.
pub struct GeneratedReports {
    pub narrative_docx: Vec<u8>,
    pub band_report_pdf: Vec<u8>,
    pub student_name: String,
}

pub fn run(options: Options, global: crate::Global) -> Result<()> {
    if global.verbose {
        println!("Generating reports for {}...", options.pdf_path.display());
    }

    let bytes = std::fs::read(&options.pdf_path)
        .wrap_err_with(|| f!("Failed to read {}", options.pdf_path.display()))?;

    let input = ClinicianInput {
        testing_observation: options.observations.clone(),
        spl: options.primary_language.clone(),
        vision_comment: options.vision_comment.clone(),
        teacher_input: options.teacher_input.clone(),
    };

    let template = options
        .template
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_PATH));
    let image = options
        .image
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_PATH));

    let generated = generate_reports(&bytes, &input, &template, &image)?;

    let stamp = chrono::Local::now().format("%Y%m%d");
    let docx_path = options.output_dir.join(f!("Student_Report_{stamp}.docx"));
    let pdf_path = options.output_dir.join(f!("Bell_Curve_Report_{stamp}.pdf"));

    std::fs::write(&docx_path, &generated.narrative_docx)
        .wrap_err_with(|| f!("Failed to write {}", docx_path.display()))?;
    std::fs::write(&pdf_path, &generated.band_report_pdf)
        .wrap_err_with(|| f!("Failed to write {}", pdf_path.display()))?;

    println!(
        "{} {}",
        "Narrative report:".green(),
        docx_path.display().to_string().cyan()
    );
    println!(
        "{} {}",
        "Band report:".green(),
        pdf_path.display().to_string().cyan()
    );

    Ok(())
}

/// Run the whole pipeline on raw PDF bytes and render both artifacts.
/// Shared by the CLI and the serve mode.
pub fn generate_reports(
    bytes: &[u8],
    input: &ClinicianInput,
    template: &Path,
    image: &Path,
) -> Result<GeneratedReports> {
    let report = crate::extract::extract_data(bytes)?;
    let today = chrono::Local::now().format("%m/%d/%Y").to_string();

    let context = build_narrative_context(
        &report.admin,
        &report.administrations,
        &report.oral,
        &report.achievement,
        input,
        &today,
    );

    let narrative_docx = narrative::render_docx(&context, template)?;
    let band_report_pdf = bands::render(&report, image, &today)?;

    Ok(GeneratedReports {
        narrative_docx,
        band_report_pdf,
        student_name: context.student_full_name,
    })
}
