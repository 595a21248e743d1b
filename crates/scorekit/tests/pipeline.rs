//! End-to-end extraction: build a synthetic score-report PDF with lopdf and
//! drive it through the full pipeline.

use lopdf::{dictionary, Document, Object, Stream};

/// The line stream of a minimal but complete score report: banner, the
/// nine-line administrative window, both assessment tables, and the
/// discrepancy marker that ends the score region.
fn report_lines() -> Vec<&'static str> {
    vec![
        "Woodcock-Johnson IV Score Report",
        "Name: Doe, Jane School: Lincoln ES",
        "Date of Birth: 03/14/2010 Teacher: Ms. Rivera",
        "Age: 15 years, 4 months Grade: 9.8",
        "Sex: Female ID: 000123",
        "Dates of Testing:",
        "Date of Testing: 05/01/2025 (WJ IV OL)",
        "05/08/2025 (WJ IV ACH)",
        "TESTS ADMINISTERED",
        "Tests of Oral Language",
        "Woodcock-Johnson IV Tests of Oral Language (Norms based on age 15-4)",
        "BROAD ORAL LANGUAGE 489.5 7-9 481 498 92 30",
        "Picture Vocabulary 495 8-6 488 502 90 25",
        "Woodcock-Johnson IV Tests of Achievement Form A and Extended (Norms based on age 15-4)",
        "LETTER-WORD IDENTIFICATION 501 9-2 494 508 95 37",
        "Spelling 488 8-0 481 495 75 5",
        "STANDARD SCORES DISCREPANCY Interpretation at +/- 1.50 SD",
        "this line is past the stop phrase and must never be parsed 1 2 3 99 99",
    ]
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)")
}

/// Assemble a one-page PDF printing each line at a descending Y position.
fn make_report_pdf(lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut content = String::new();
    for (i, line) in lines.iter().enumerate() {
        let y = 750 - (i as i64) * 12;
        content.push_str(&format!("BT /F1 9 Tf 36 {y} Td ({}) Tj ET\n", escape(line)));
    }
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

    let resources = dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    };

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => resources,
    });

    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    });

    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
        dict.set("Parent", pages_id);
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

#[test]
fn pdf_text_extraction_recovers_the_line_stream() {
    let bytes = make_report_pdf(&report_lines());
    let pages = pdf::extract_page_lines(&bytes).unwrap();

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].len(), report_lines().len());
    assert_eq!(pages[0][1], "Name: Doe, Jane School: Lincoln ES");
    assert_eq!(pages[0][11], "BROAD ORAL LANGUAGE 489.5 7-9 481 498 92 30");
}

#[test]
fn extraction_is_idempotent_over_the_same_bytes() {
    let bytes = make_report_pdf(&report_lines());
    let first = pdf::extract_page_lines(&bytes).unwrap();
    let second = pdf::extract_page_lines(&bytes).unwrap();
    assert_eq!(first, second);
}

#[test]
fn full_pipeline_extracts_admin_and_scores() {
    use scorekit_core::admin::parse_admin_section;
    use scorekit_core::scores::{order_composites_first, parse_score_lines};
    use scorekit_core::sections::{collect_until, slice_assessments, STOP_PHRASE};

    let bytes = make_report_pdf(&report_lines());
    let pages = pdf::extract_page_lines(&bytes).unwrap();

    let lines = collect_until(&pages, STOP_PHRASE);
    // Everything from the stop phrase onward is gone.
    assert_eq!(lines.len(), 16);

    let extraction = parse_admin_section(&lines);
    assert_eq!(extraction.record.name.as_deref(), Some("Doe, Jane"));
    assert_eq!(extraction.record.school.as_deref(), Some("Lincoln ES"));
    assert_eq!(extraction.record.teacher.as_deref(), Some("Ms. Rivera"));
    assert_eq!(extraction.record.grade.as_deref(), Some("9.8"));
    assert_eq!(extraction.administrations.len(), 1);
    assert_eq!(extraction.administrations[0].date, "05/01/2025");

    let slices = slice_assessments(&lines[extraction.scores_start..]).unwrap();
    let oral = order_composites_first(parse_score_lines(slices.oral));
    let achievement = order_composites_first(parse_score_lines(slices.achievement));

    assert_eq!(oral.len(), 2);
    assert_eq!(oral[0].name, "BROAD ORAL LANGUAGE");
    assert_eq!(oral[0].standard_score, 92);
    assert_eq!(oral[1].name, "Picture Vocabulary");
    assert_eq!(oral[1].percentile_rank, 25);

    assert_eq!(achievement.len(), 2);
    assert_eq!(achievement[0].name, "LETTER-WORD IDENTIFICATION");
    assert_eq!(achievement[1].name, "Spelling");
    assert_eq!(achievement[1].standard_score, 75);
}

#[test]
fn pipeline_errors_when_sections_are_missing() {
    use scorekit_core::sections::slice_assessments;

    // A PDF whose score region has no assessment headers.
    let lines: Vec<&str> = vec!["Woodcock-Johnson IV Score Report", "nothing here"];
    let bytes = make_report_pdf(&lines);
    let pages = pdf::extract_page_lines(&bytes).unwrap();
    let flat: Vec<String> = pages.concat();

    assert!(slice_assessments(&flat).is_err());
}
