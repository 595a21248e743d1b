//! Clinician-facing upload form.
//!
//! One process, one in-memory artifact store: a POST runs the same pipeline
//! as the `report` subcommand and parks both artifacts under a random id so
//! the response page can offer two download links. Nothing persists across
//! restarts.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::prelude::{eprintln, *};
use axum::{
    extract::{Multipart, Path as UrlPath, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use rand::{distributions::Alphanumeric, Rng};
use tower_http::cors::{Any, CorsLayer};

use scorekit_core::report::ClinicianInput;

use crate::report::{GeneratedReports, DEFAULT_IMAGE_PATH, DEFAULT_TEMPLATE_PATH};

#[derive(Debug, clap::Args, Clone)]
pub struct Options {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Narrative template used for generated reports
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Bell-curve image used for generated reports
    #[arg(long)]
    pub image: Option<PathBuf>,
}

struct AppState {
    reports: Mutex<HashMap<String, GeneratedReports>>,
    template: PathBuf,
    image: PathBuf,
}

const FORM_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Assessment Report Generator</title></head>
<body>
<h1>Assessment Report Generator</h1>
<p>Upload a scoring PDF and fill in the details below to generate student reports.</p>
<form action="/generate" method="post" enctype="multipart/form-data">
  <p><label>Score Report PDF<br><input type="file" name="report" accept="application/pdf" required></label></p>
  <p><label>Testing Observations<br><textarea name="observations" rows="4" cols="60"></textarea></label></p>
  <p><label>Student's Primary Language<br><input type="text" name="primary_language"></label></p>
  <p><label>Vision/Hearing Screening Comments<br><textarea name="vision_comment" rows="4" cols="60"></textarea></label></p>
  <p><label>Teacher Input<br><textarea name="teacher_input" rows="4" cols="60"></textarea></label></p>
  <p><button type="submit">Generate Reports</button></p>
</form>
</body>
</html>
"#;

pub async fn run(options: Options, global: crate::Global) -> Result<()> {
    let addr = f!("{}:{}", options.host, options.port);

    let state = Arc::new(AppState {
        reports: Mutex::new(HashMap::new()),
        template: options
            .template
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_PATH)),
        image: options
            .image
            .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_PATH)),
    });

    let app_router = router(state);

    if global.verbose {
        eprintln!("Upload form listening on http://{addr}");
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {addr}: {e}"))?;

    axum::serve(listener, app_router)
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/generate", post(generate))
        .route("/download/{id}/{kind}", get(download))
        .layer(cors)
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(FORM_HTML)
}

fn new_report_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}

async fn generate(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut pdf_bytes: Option<Vec<u8>> = None;
    let mut input = ClinicianInput::default();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "report" => {
                pdf_bytes = field.bytes().await.ok().map(|b| b.to_vec());
            }
            "observations" => {
                input.testing_observation = field.text().await.unwrap_or_default();
            }
            "primary_language" => {
                input.spl = field.text().await.unwrap_or_default();
            }
            "vision_comment" => {
                input.vision_comment = field.text().await.unwrap_or_default();
            }
            "teacher_input" => {
                input.teacher_input = field.text().await.unwrap_or_default();
            }
            _ => {}
        }
    }

    let Some(bytes) = pdf_bytes.filter(|b| !b.is_empty()) else {
        return error_page("No PDF was uploaded.");
    };

    match crate::report::generate_reports(&bytes, &input, &state.template, &state.image) {
        Ok(generated) => {
            let id = new_report_id();
            let student = generated.student_name.clone();
            state
                .reports
                .lock()
                .expect("report store poisoned")
                .insert(id.clone(), generated);
            success_page(&id, &student)
        }
        Err(e) => error_page(&f!("Error generating reports: {e}")),
    }
}

fn success_page(id: &str, student_name: &str) -> Response {
    let student = if student_name.is_empty() { "the student" } else { student_name };
    Html(f!(
        "<!DOCTYPE html><html><body>\
         <h1>Reports generated successfully</h1>\
         <p>Reports for {student} are ready:</p>\
         <ul>\
         <li><a href=\"/download/{id}/narrative\">Download Word Report</a></li>\
         <li><a href=\"/download/{id}/bands\">Download Bell Curve PDF</a></li>\
         </ul>\
         <p><a href=\"/\">Process another report</a></p>\
         </body></html>"
    ))
    .into_response()
}

fn error_page(message: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Html(f!(
            "<!DOCTYPE html><html><body><h1>Error</h1><p>{message}</p>\
             <p><a href=\"/\">Back to the form</a></p></body></html>"
        )),
    )
        .into_response()
}

/// Resolve a stored artifact by kind: the bytes, its MIME type, and the
/// download filename (date-stamped like the CLI output).
fn artifact(kind: &str, reports: &GeneratedReports, stamp: &str) -> Option<(Vec<u8>, &'static str, String)> {
    match kind {
        "narrative" => Some((
            reports.narrative_docx.clone(),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            f!("Student_Report_{stamp}.docx"),
        )),
        "bands" => Some((
            reports.band_report_pdf.clone(),
            "application/pdf",
            f!("Bell_Curve_Report_{stamp}.pdf"),
        )),
        _ => None,
    }
}

async fn download(
    State(state): State<Arc<AppState>>,
    UrlPath((id, kind)): UrlPath<(String, String)>,
) -> Response {
    let reports = state.reports.lock().expect("report store poisoned");

    let Some(generated) = reports.get(&id) else {
        return (StatusCode::NOT_FOUND, "Unknown report id").into_response();
    };

    let stamp = chrono::Local::now().format("%Y%m%d").to_string();
    let Some((bytes, content_type, filename)) = artifact(&kind, generated, &stamp) else {
        return (StatusCode::NOT_FOUND, "Unknown artifact kind").into_response();
    };

    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                f!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
