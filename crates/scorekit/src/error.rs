#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Report generation failed: {0}")]
    Report(String),
}
