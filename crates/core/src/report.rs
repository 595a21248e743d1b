//! Report assembly: the band-grid tables behind the visual report and the
//! context handed to the narrative template.
//!
//! Both outputs are plain data. Rendering (PDF drawing, Tera, DOCX packing)
//! lives in the shell and the `pdf` crate; this module only decides *what*
//! goes where.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::admin::{AdministrativeRecord, TestAdministration};
use crate::bands::{classify_label, Band};
use crate::scores::ScoreRow;

/// Test names wrap at this many columns in the band grid.
pub const NAME_WRAP_WIDTH: usize = 15;

/// Maximum grid rows per rendered page.
pub const ROWS_PER_PAGE: usize = 10;

/// One band-grid row: the (wrapped) test name and the band its standard
/// score falls in. The renderer prints the score inside that band's column
/// and leaves the other five blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandRow {
    pub name: String,
    pub standard_score: i32,
    pub band: Band,
}

/// A titled band grid for one assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandTable {
    pub title: String,
    pub rows: Vec<BandRow>,
}

impl BandTable {
    /// Build the grid for one assessment's score rows.
    pub fn from_scores(title: impl Into<String>, rows: &[ScoreRow]) -> Self {
        let rows = rows
            .iter()
            .map(|row| BandRow {
                name: wrap_text(&row.name, NAME_WRAP_WIDTH),
                standard_score: row.standard_score,
                band: Band::classify(row.standard_score as f64),
            })
            .collect();

        BandTable {
            title: title.into(),
            rows,
        }
    }

    /// Chunk the rows into render pages of at most [`ROWS_PER_PAGE`] rows.
    pub fn pages(&self) -> impl Iterator<Item = &[BandRow]> {
        self.rows.chunks(ROWS_PER_PAGE)
    }
}

/// Greedy word wrap at `max_width` columns; single words longer than the
/// width get their own line.
pub fn wrap_text(text: &str, max_width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 <= max_width {
            current.push_str(word);
            current.push(' ');
        } else {
            if !current.is_empty() {
                lines.push(current.trim_end().to_string());
            }
            current = format!("{word} ");
        }
    }
    lines.push(current.trim_end().to_string());

    lines.join("\n")
}

/// Free-form commentary the clinician supplies alongside the upload.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ClinicianInput {
    pub testing_observation: String,
    /// Student's primary language.
    pub spl: String,
    pub vision_comment: String,
    pub teacher_input: String,
}

/// An (SS, PR) pair as it appears in the narrative's score listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScorePair {
    pub ss: i32,
    pub pr: i32,
}

/// Everything the narrative template can reference. Serializes flat: the
/// per-test range labels merge into the top level so templates address them
/// as `{{ broad_oral_range }}` etc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarrativeContext {
    pub examiner_name: String,
    pub student_full_name: String,
    /// First name, split from `"Last, First"`; falls back to the full name.
    pub student_name: String,
    pub date_today: String,
    /// `"MM/DD/YYYY (ABBREV)"` per administration.
    pub test_dates: Vec<String>,
    pub spl: String,
    pub testing_observation: String,
    pub vision_comment: String,
    pub teacher_input: String,
    pub oral_tests: Vec<ScorePair>,
    pub achievement_tests: Vec<ScorePair>,
    #[serde(flatten)]
    pub ranges: BTreeMap<String, String>,
}

/// Named oral-language tests resolved into `*_range` template variables.
pub const ORAL_RANGE_KEYS: [(&str, &str); 7] = [
    ("broad_oral_range", "BROAD ORAL LANGUAGE"),
    ("oral_expr_range", "ORAL EXPRESSION"),
    ("picture_vocab_range", "PICTURE VOCABULARY"),
    ("sentence_rep_range", "SENTENCE REPETITION"),
    ("listening_comp_range", "LISTENING COMP"),
    ("under_dir_range", "UNDERSTANDING DIRECTIONS"),
    ("oral_comp_range", "ORAL COMPREHENSION"),
];

/// Named achievement tests resolved into `*_range` template variables.
pub const ACHIEVEMENT_RANGE_KEYS: [(&str, &str); 19] = [
    ("bas_read_range", "BASIC READING SKILLS"),
    ("let_word_range", "LETTER-WORD IDENTIFICATION"),
    ("word_att_range", "WORD ATTACK"),
    ("read_comp_range", "READING COMPREHENSION"),
    ("pass_comp_range", "PASSAGE COMPREHENSION"),
    ("read_recall_range", "READING RECALL"),
    ("read_flu_range", "READING FLUENCY"),
    ("oral_read_range", "ORAL READING"),
    ("sent_read_flu_range", "SENTENCE READING FLUENCY"),
    ("math_calc_range", "MATH CALCULATION SKILLS"),
    ("calc_range", "CALCULATION"),
    ("fact_flu_range", "MATH FACTS FLUENCY"),
    ("mat_pro_solv_range", "MATH PROBLEM SOLVING"),
    ("app_pro_range", "APPLIED PROBLEMS"),
    ("mat_matr_range", "NUMBER MATRICES"),
    ("writ_exp_range", "WRITTEN EXPRESSION"),
    ("sent_writ_flu_range", "SENTENCE WRITING FLUENCY"),
    ("writ_samp_range", "WRITING SAMPLES"),
    ("spel_range", "SPELLING"),
];

/// Band label for a named test, or the `N/A` sentinel when the report has no
/// such row. Names compare case-insensitively.
fn range_label(rows: &[ScoreRow], test_name: &str) -> String {
    classify_label(
        rows.iter()
            .find(|row| row.name.eq_ignore_ascii_case(test_name))
            .map(|row| row.standard_score as f64),
    )
}

/// Assemble the narrative template context from the extracted data and the
/// clinician's commentary. `today` is injected by the caller so the core
/// stays clock-free.
pub fn build_narrative_context(
    record: &AdministrativeRecord,
    administrations: &[TestAdministration],
    oral: &[ScoreRow],
    achievement: &[ScoreRow],
    input: &ClinicianInput,
    today: &str,
) -> NarrativeContext {
    let student_full_name = record.name.clone().unwrap_or_default();
    let student_name = student_full_name
        .split_once(", ")
        .map(|(_, first)| first.to_string())
        .unwrap_or_else(|| student_full_name.clone());

    let mut ranges = BTreeMap::new();
    for (key, test) in ORAL_RANGE_KEYS {
        ranges.insert(key.to_string(), range_label(oral, test));
    }
    for (key, test) in ACHIEVEMENT_RANGE_KEYS {
        ranges.insert(key.to_string(), range_label(achievement, test));
    }

    let score_pairs = |rows: &[ScoreRow]| {
        rows.iter()
            .map(|row| ScorePair {
                ss: row.standard_score,
                pr: row.percentile_rank,
            })
            .collect::<Vec<_>>()
    };

    NarrativeContext {
        examiner_name: record.teacher.clone().unwrap_or_default(),
        student_full_name,
        student_name,
        date_today: today.to_string(),
        test_dates: administrations
            .iter()
            .map(|a| format!("{} ({})", a.date, a.abbrev))
            .collect(),
        spl: input.spl.clone(),
        testing_observation: input.testing_observation.clone(),
        vision_comment: input.vision_comment.clone(),
        teacher_input: input.teacher_input.clone(),
        oral_tests: score_pairs(oral),
        achievement_tests: score_pairs(achievement),
        ranges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(name: &str, ss: i32, pr: i32) -> ScoreRow {
        ScoreRow {
            name: name.to_string(),
            standard_score: ss,
            percentile_rank: pr,
        }
    }

    fn record() -> AdministrativeRecord {
        AdministrativeRecord {
            name: Some("Doe, Jane".to_string()),
            teacher: Some("Ms. Rivera".to_string()),
            ..Default::default()
        }
    }

    // -- wrap_text ----------------------------------------------------------

    #[test]
    fn wrap_splits_at_width() {
        assert_eq!(wrap_text("BROAD ORAL LANGUAGE", 15), "BROAD ORAL\nLANGUAGE");
    }

    #[test]
    fn wrap_short_text_untouched() {
        assert_eq!(wrap_text("SPELLING", 15), "SPELLING");
    }

    #[test]
    fn wrap_long_single_word_kept_whole() {
        assert_eq!(wrap_text("IDENTIFICATION", 10), "IDENTIFICATION");
    }

    #[test]
    fn wrap_empty_text() {
        assert_eq!(wrap_text("", 15), "");
    }

    // -- BandTable ----------------------------------------------------------

    #[test]
    fn band_table_places_each_row_in_one_band() {
        let table = BandTable::from_scores(
            "Oral Language",
            &[score("BROAD ORAL LANGUAGE", 92, 30), score("ORAL EXPRESSION", 65, 1)],
        );

        assert_eq!(table.rows[0].band, Band::Average);
        assert_eq!(table.rows[1].band, Band::VeryLow);
        assert_eq!(table.rows[0].standard_score, 92);
    }

    #[test]
    fn band_table_wraps_names() {
        let table = BandTable::from_scores("t", &[score("SENTENCE READING FLUENCY", 85, 16)]);
        assert!(table.rows[0].name.contains('\n'));
    }

    #[test]
    fn pagination_chunks_at_ten_rows() {
        let rows: Vec<ScoreRow> = (0..23).map(|i| score(&format!("TEST {i}"), 100, 50)).collect();
        let table = BandTable::from_scores("t", &rows);

        let sizes: Vec<usize> = table.pages().map(|p| p.len()).collect();
        assert_eq!(sizes, [10, 10, 3]);
    }

    #[test]
    fn pagination_empty_table_has_no_pages() {
        let table = BandTable::from_scores("t", &[]);
        assert_eq!(table.pages().count(), 0);
    }

    // -- narrative context --------------------------------------------------

    #[test]
    fn context_resolves_named_ranges() {
        let oral = vec![score("BROAD ORAL LANGUAGE", 92, 30)];
        let achievement = vec![score("SPELLING", 75, 5)];

        let context = build_narrative_context(
            &record(),
            &[],
            &oral,
            &achievement,
            &ClinicianInput::default(),
            "08/06/2026",
        );

        assert_eq!(context.ranges["broad_oral_range"], "Average");
        assert_eq!(context.ranges["spel_range"], "Low");
        // A test the report never printed resolves to the sentinel.
        assert_eq!(context.ranges["word_att_range"], "N/A");
    }

    #[test]
    fn context_range_lookup_is_case_insensitive() {
        let achievement = vec![score("Letter-Word Identification", 112, 79)];
        let context = build_narrative_context(
            &record(),
            &[],
            &[],
            &achievement,
            &ClinicianInput::default(),
            "08/06/2026",
        );

        assert_eq!(context.ranges["let_word_range"], "High Average");
    }

    #[test]
    fn context_splits_first_name() {
        let context = build_narrative_context(
            &record(),
            &[],
            &[],
            &[],
            &ClinicianInput::default(),
            "08/06/2026",
        );

        assert_eq!(context.student_full_name, "Doe, Jane");
        assert_eq!(context.student_name, "Jane");
    }

    #[test]
    fn context_first_name_fallback_without_comma() {
        let mut rec = record();
        rec.name = Some("Madonna".to_string());

        let context =
            build_narrative_context(&rec, &[], &[], &[], &ClinicianInput::default(), "08/06/2026");
        assert_eq!(context.student_name, "Madonna");
    }

    #[test]
    fn context_formats_test_dates() {
        let administrations = vec![TestAdministration {
            date: "05/01/2025".to_string(),
            abbrev: "WJ IV OL".to_string(),
            name: "Tests of Oral Language".to_string(),
        }];

        let context = build_narrative_context(
            &record(),
            &administrations,
            &[],
            &[],
            &ClinicianInput::default(),
            "08/06/2026",
        );

        assert_eq!(context.test_dates, ["05/01/2025 (WJ IV OL)"]);
    }

    #[test]
    fn context_serializes_ranges_flat() {
        let context = build_narrative_context(
            &record(),
            &[],
            &[score("BROAD ORAL LANGUAGE", 92, 30)],
            &[],
            &ClinicianInput::default(),
            "08/06/2026",
        );

        let value = serde_json::to_value(&context).unwrap();
        assert_eq!(value["broad_oral_range"], "Average");
        assert_eq!(value["student_name"], "Jane");
        assert!(value.get("ranges").is_none());
    }

    #[test]
    fn context_carries_score_pairs_in_order() {
        let oral = vec![score("A", 92, 30), score("B", 85, 16)];
        let context = build_narrative_context(
            &record(),
            &[],
            &oral,
            &[],
            &ClinicianInput::default(),
            "08/06/2026",
        );

        assert_eq!(context.oral_tests.len(), 2);
        assert_eq!(context.oral_tests[0].ss, 92);
        assert_eq!(context.oral_tests[1].pr, 16);
    }
}
