//! Narrative document rendering: Tera template to text, text to DOCX.

use std::io::Cursor;
use std::path::Path;

use crate::prelude::*;
use docx_rs::{Docx, Paragraph, Run};
use log::warn;

use scorekit_core::report::NarrativeContext;

/// Compiled-in fallback used when the fixed-name template file is absent.
const DEFAULT_TEMPLATE: &str = include_str!("../../templates/narrative.tera");

/// Render the narrative for `context` using the template at `template_path`
/// (falling back to the built-in template) and pack it into a DOCX.
pub fn render_docx(context: &NarrativeContext, template_path: &Path) -> Result<Vec<u8>> {
    let template = match std::fs::read_to_string(template_path) {
        Ok(text) => text,
        Err(e) => {
            warn!(
                "narrative template {} not readable ({}); using the built-in template",
                template_path.display(),
                e
            );
            DEFAULT_TEMPLATE.to_string()
        }
    };

    let text = render_text(&template, context)?;
    build_docx(&text)
}

/// Render the template against the narrative context.
pub fn render_text(template: &str, context: &NarrativeContext) -> Result<String> {
    let ctx = tera::Context::from_serialize(context)
        .map_err(|e| eyre!("Failed to build template context: {e}"))?;
    tera::Tera::one_off(template, &ctx, false).map_err(|e| eyre!("Failed to render template: {e}"))
}

/// Pack rendered text into a DOCX, one paragraph per line. Blank lines
/// survive as empty paragraphs so the section spacing carries over.
fn build_docx(text: &str) -> Result<Vec<u8>> {
    let mut docx = Docx::new();
    for line in text.lines() {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)));
    }

    let mut cursor = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut cursor)
        .map_err(|e| eyre!("Failed to pack document: {e}"))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorekit_core::admin::AdministrativeRecord;
    use scorekit_core::report::{build_narrative_context, ClinicianInput};
    use scorekit_core::scores::ScoreRow;

    fn score(name: &str, ss: i32, pr: i32) -> ScoreRow {
        ScoreRow {
            name: name.to_string(),
            standard_score: ss,
            percentile_rank: pr,
        }
    }

    fn context() -> NarrativeContext {
        let record = AdministrativeRecord {
            name: Some("Doe, Jane".to_string()),
            teacher: Some("Ms. Rivera".to_string()),
            ..Default::default()
        };
        let input = ClinicianInput {
            testing_observation: "Attentive throughout testing.".to_string(),
            spl: "English".to_string(),
            vision_comment: "Passed both screenings.".to_string(),
            teacher_input: "Strong participation in class.".to_string(),
        };
        build_narrative_context(
            &record,
            &[],
            &[score("BROAD ORAL LANGUAGE", 92, 30)],
            &[score("SPELLING", 75, 5)],
            &input,
            "08/06/2026",
        )
    }

    #[test]
    fn default_template_renders_with_full_context() {
        let text = render_text(DEFAULT_TEMPLATE, &context()).unwrap();

        assert!(text.contains("Student: Doe, Jane"));
        assert!(text.contains("Examiner: Ms. Rivera"));
        assert!(text.contains("Jane's primary language is English."));
        assert!(text.contains("the Average range"));
        assert!(text.contains("Spelling: Low"));
        // Tests absent from the report render as the sentinel.
        assert!(text.contains("Word Attack: N/A"));
    }

    #[test]
    fn custom_template_sees_flattened_ranges() {
        let text = render_text("{{ broad_oral_range }}/{{ spel_range }}", &context()).unwrap();
        assert_eq!(text, "Average/Low");
    }

    #[test]
    fn unknown_variable_is_a_render_error() {
        assert!(render_text("{{ no_such_variable }}", &context()).is_err());
    }

    #[test]
    fn missing_template_file_falls_back_to_builtin() {
        let bytes = render_docx(&context(), Path::new("/nonexistent/narrative.tera")).unwrap();
        // DOCX is a zip container.
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn template_file_on_disk_wins_over_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrative.tera");
        std::fs::write(&path, "Custom for {{ student_name }}").unwrap();

        let bytes = render_docx(&context(), &path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn docx_packs_each_line_as_a_paragraph() {
        let bytes = build_docx("line one\nline two").unwrap();
        assert!(bytes.starts_with(b"PK"));
        assert!(bytes.len() > 500);
    }
}
