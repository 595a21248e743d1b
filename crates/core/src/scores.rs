//! Score-line tokenization.
//!
//! A score row in the printed table looks like
//!
//! ```text
//! BROAD ORAL LANGUAGE 489.5 7-9 481 498 92 30
//! ```
//!
//! i.e. the test/cluster name, a W score, an age equivalent, a confidence
//! band, and finally the standard score and percentile rank. The layout is
//! known but not contractual, so parsing is best-effort: a line that does
//! not fit the shape is skipped, never an error.

use serde::{Deserialize, Serialize};

/// Lines with fewer tokens than this are never score rows.
pub const MIN_SCORE_TOKENS: usize = 5;

/// One recognized score line: test/cluster name, standard score, percentile
/// rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub name: String,
    pub standard_score: i32,
    pub percentile_rank: i32,
}

/// A token is numeric if it is all digits with at most one decimal point
/// (W scores print like `489.5`).
fn is_numeric_token(token: &str) -> bool {
    let digits = token.replacen('.', "", 1);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Parse every line that fits the score-row shape.
///
/// Per line: split on whitespace; reject under [`MIN_SCORE_TOKENS`] tokens;
/// the final two tokens must parse as integers (SS, PR); the name is
/// everything before the first numeric token. Rows repeated verbatim in the
/// source (the table prints some clusters twice) are kept once, first
/// occurrence wins.
pub fn parse_score_lines(lines: &[String]) -> Vec<ScoreRow> {
    let mut rows: Vec<ScoreRow> = Vec::new();

    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < MIN_SCORE_TOKENS {
            continue;
        }

        let (Ok(standard_score), Ok(percentile_rank)) = (
            tokens[tokens.len() - 2].parse::<i32>(),
            tokens[tokens.len() - 1].parse::<i32>(),
        ) else {
            continue;
        };

        let Some(first_numeric) = tokens.iter().position(|t| is_numeric_token(t)) else {
            continue;
        };

        let row = ScoreRow {
            name: tokens[..first_numeric].join(" "),
            standard_score,
            percentile_rank,
        };

        if !rows.contains(&row) {
            rows.push(row);
        }
    }

    rows
}

/// Composite/cluster rows print in ALL CAPS; individual subtests in mixed
/// case. True when the name has at least one letter and no lowercase ones.
fn is_composite_name(name: &str) -> bool {
    name.chars().any(|c| c.is_alphabetic()) && !name.chars().any(|c| c.is_lowercase())
}

/// Stable partition putting composite (all-uppercase) rows before subtest
/// rows, preserving source order within each group.
pub fn order_composites_first(rows: Vec<ScoreRow>) -> Vec<ScoreRow> {
    let (composites, subtests): (Vec<ScoreRow>, Vec<ScoreRow>) = rows
        .into_iter()
        .partition(|row| is_composite_name(&row.name));

    composites.into_iter().chain(subtests).collect()
}
