//! Slicing the extracted line stream into its meaningful segments.
//!
//! A compuscore report is one flat stream of text lines: a banner, an
//! administrative block, then one score table per assessment, then
//! discrepancy-interpretation material we never read. The functions here
//! truncate the stream at the discrepancy marker and locate the assessment
//! tables by their section headers.

use thiserror::Error;

/// Everything from this phrase onward is discrepancy interpretation, not
/// score data.
pub const STOP_PHRASE: &str = "STANDARD SCORES DISCREPANCY Interpretation at";

/// Section header opening the oral-language score table.
///
/// Matched as a prefix: the printed header ends with a norms clause
/// ("(Norms based on age 15-4)") that varies per student.
pub const ORAL_LANGUAGE_HEADER: &str = "Woodcock-Johnson IV Tests of Oral Language";

/// Section header opening the achievement score table. Prefix-matched for
/// the same reason as [`ORAL_LANGUAGE_HEADER`].
pub const ACHIEVEMENT_HEADER: &str = "Woodcock-Johnson IV Tests of Achievement";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SectionError {
    #[error("Could not find the expected test section: {0}")]
    MissingSection(&'static str),
}

/// Flatten per-page lines into one stream, stopping (exclusive) at the first
/// line containing `stop_phrase`. If the phrase never appears, every line is
/// returned.
pub fn collect_until(pages: &[Vec<String>], stop_phrase: &str) -> Vec<String> {
    let mut collected = Vec::new();
    for page in pages {
        for line in page {
            if line.contains(stop_phrase) {
                return collected;
            }
            collected.push(line.clone());
        }
    }
    collected
}

/// The two assessment segments of the score region.
///
/// `oral` runs from the oral-language header up to the achievement header;
/// `achievement` runs from the achievement header to the end of the stream.
/// Both slices include their header line, which the score-line parser skips
/// naturally (headers never parse as score rows).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentSlices<'a> {
    pub oral: &'a [String],
    pub achievement: &'a [String],
}

/// Locate the two assessment tables inside the score region.
///
/// A report without both headers is the one structural failure the pipeline
/// reports instead of degrading: with no table boundaries there is nothing
/// to extract.
pub fn slice_assessments(lines: &[String]) -> Result<AssessmentSlices<'_>, SectionError> {
    let oral_index = lines
        .iter()
        .position(|line| line.starts_with(ORAL_LANGUAGE_HEADER))
        .ok_or(SectionError::MissingSection(ORAL_LANGUAGE_HEADER))?;

    let achievement_index = lines[oral_index..]
        .iter()
        .position(|line| line.starts_with(ACHIEVEMENT_HEADER))
        .map(|i| i + oral_index)
        .ok_or(SectionError::MissingSection(ACHIEVEMENT_HEADER))?;

    Ok(AssessmentSlices {
        oral: &lines[oral_index..achievement_index],
        achievement: &lines[achievement_index..],
    })
}
