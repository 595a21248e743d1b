//! Administrative-field extraction.
//!
//! The first ten lines of the collected stream carry the report banner, the
//! student identity block, and the `TESTS ADMINISTERED` list. Fields are
//! pulled with per-line regexes keyed on literal label substrings; a label
//! that is absent from its anticipated line leaves that field unset rather
//! than failing the run.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Index of the first score line in the collected stream. Line 0 is the
/// report banner; lines 1..10 are the administrative window.
pub const SCORES_START_INDEX: usize = 10;

const TESTS_ADMINISTERED_HEADER: &str = "TESTS ADMINISTERED";

/// Identity fields extracted from the administrative block. Created once per
/// document and immutable afterwards; every field is optional because the
/// parser omits silently instead of erroring.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdministrativeRecord {
    pub name: Option<String>,
    pub school: Option<String>,
    pub date_of_birth: Option<String>,
    pub teacher: Option<String>,
    pub age: Option<String>,
    pub grade: Option<String>,
    pub sex: Option<String>,
}

/// One administered test: the testing date, the parenthesised abbreviation
/// printed next to it, and the full test name from the
/// `TESTS ADMINISTERED` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestAdministration {
    pub date: String,
    pub abbrev: String,
    pub name: String,
}

/// Result of parsing the administrative window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminExtraction {
    pub record: AdministrativeRecord,
    pub administrations: Vec<TestAdministration>,
    /// Index into the collected stream where score lines begin.
    pub scores_start: usize,
}

/// Capture the text following `label` up to `until`, e.g. the name between
/// `"Name:"` and `"School:"` on a two-field line.
fn capture_between(line: &str, label: &str, until: &str) -> Option<String> {
    let re = Regex::new(&format!(r"{}\s*(.*?)\s+{}", regex::escape(label), regex::escape(until)))
        .unwrap();
    re.captures(line)
        .map(|caps| caps[1].to_string())
}

/// Capture the text following `label` to the end of the line.
fn capture_after(line: &str, label: &str) -> Option<String> {
    let re = Regex::new(&format!(r"{}\s*(.*)", regex::escape(label))).unwrap();
    re.captures(line).map(|caps| caps[1].trim_end().to_string())
}

/// Parse the administrative window of the collected line stream.
///
/// The window is lines 1..10. Inside it, the `TESTS ADMINISTERED` line
/// separates identity lines from test-name lines. Test dates are collected
/// from `Date of Testing:` lines first, then from any bare
/// `MM/DD/YYYY (ABBREV)` lines not already seen, and are paired positionally
/// with the test names below the header.
pub fn parse_admin_section(lines: &[String]) -> AdminExtraction {
    let end = lines.len().min(SCORES_START_INDEX);
    let window: &[String] = if lines.len() > 1 { &lines[1..end] } else { &[] };

    let header_index = window
        .iter()
        .position(|line| line.trim() == TESTS_ADMINISTERED_HEADER);

    // Without the header the whole window is identity lines and no test
    // administrations can be paired.
    let (admin_lines, test_name_lines) = match header_index {
        Some(i) => (&window[..i], &window[i + 1..]),
        None => (window, &[] as &[String]),
    };

    let date_line = Regex::new(r"(\d{2}/\d{2}/\d{4})\s+\(([^)]+)\)").unwrap();

    let mut record = AdministrativeRecord::default();
    let mut test_dates: Vec<(String, String)> = Vec::new();

    for line in admin_lines {
        if line.contains("Name:") && line.contains("School:") {
            record.name = capture_between(line, "Name:", "School:");
            record.school = capture_after(line, "School:");
        } else if line.contains("Date of Birth:") && line.contains("Teacher:") {
            record.date_of_birth = capture_between(line, "Date of Birth:", "Teacher:");
            record.teacher = capture_after(line, "Teacher:");
        } else if line.contains("Age:") && line.contains("Grade:") {
            record.age = capture_between(line, "Age:", "Grade:");
            record.grade = capture_after(line, "Grade:");
        } else if line.contains("Sex:") {
            record.sex = capture_between(line, "Sex:", "ID:");
        } else if line.contains("Date of Testing:") {
            if let Some(caps) = date_line.captures(line) {
                test_dates.push((caps[1].to_string(), caps[2].to_string()));
            }
        }
    }

    // Continuation lines: a second testing date is printed bare, without the
    // "Date of Testing:" label.
    for line in admin_lines {
        if let Some(caps) = date_line.captures(line) {
            if caps.get(0).unwrap().start() == 0 {
                let pair = (caps[1].to_string(), caps[2].to_string());
                if !test_dates.contains(&pair) {
                    test_dates.push(pair);
                }
            }
        }
    }

    let administrations = test_name_lines
        .iter()
        .zip(test_dates)
        .map(|(name, (date, abbrev))| TestAdministration {
            date,
            abbrev,
            name: name.clone(),
        })
        .collect();

    AdminExtraction {
        record,
        administrations,
        scores_start: SCORES_START_INDEX,
    }
}
