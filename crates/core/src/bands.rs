//! Performance-band classification of standard scores.
//!
//! Six fixed bands cover the whole real line with thresholds at
//! 70/80/90/110/120 -- contiguous, non-overlapping, exhaustive. Band
//! assignment is a pure function of the standard score.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel shown when a score is missing or a named test is absent from
/// the report.
pub const UNAVAILABLE: &str = "N/A";

/// Qualitative performance category for a standard score (mean 100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Band {
    VeryLow,
    Low,
    LowAverage,
    Average,
    HighAverage,
    Superior,
}

impl Band {
    /// All bands in ascending score order. This is also the column order of
    /// the band-grid report.
    pub const ALL: [Band; 6] = [
        Band::VeryLow,
        Band::Low,
        Band::LowAverage,
        Band::Average,
        Band::HighAverage,
        Band::Superior,
    ];

    /// Classify a standard score. Total over all finite inputs.
    pub fn classify(standard_score: f64) -> Band {
        if standard_score < 70.0 {
            Band::VeryLow
        } else if standard_score < 80.0 {
            Band::Low
        } else if standard_score < 90.0 {
            Band::LowAverage
        } else if standard_score < 110.0 {
            Band::Average
        } else if standard_score < 120.0 {
            Band::HighAverage
        } else {
            Band::Superior
        }
    }

    /// Human-readable band label as printed in reports.
    pub fn label(self) -> &'static str {
        match self {
            Band::VeryLow => "Very Low",
            Band::Low => "Low",
            Band::LowAverage => "Low Average",
            Band::Average => "Average",
            Band::HighAverage => "High Average",
            Band::Superior => "Superior",
        }
    }

    /// Display color (hex RGB) used for this band's cells in the visual
    /// report.
    pub fn color(self) -> &'static str {
        match self {
            Band::VeryLow => "#FF4C4C",
            Band::Low => "#FFA500",
            Band::LowAverage => "#FFFF66",
            Band::Average => "#66B2FF",
            Band::HighAverage => "#00CED1",
            Band::Superior => "#32CD32",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Band label for an optional score: the classified label, or the
/// [`UNAVAILABLE`] sentinel when the score is missing.
pub fn classify_label(standard_score: Option<f64>) -> String {
    match standard_score {
        Some(score) => Band::classify(score).label().to_string(),
        None => UNAVAILABLE.to_string(),
    }
}
