//! Core library for scorekit
//!
//! This crate implements the **Functional Core** of the scorekit application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! - **`scorekit_core`** (this crate): Pure transformation functions with zero I/O
//! - **`scorekit`**: I/O operations and orchestration (the Imperative Shell)
//!
//! Every function here is deterministic: the same line stream always produces
//! the same records, rows, and band assignments, which is what makes the
//! extraction pipeline idempotent and trivially testable with fixture data.
//!
//! # Module Organization
//!
//! - [`sections`]: Truncating the extracted line stream and slicing it into
//!   the per-assessment segments
//! - [`admin`]: Administrative-field extraction (identity fields and test
//!   administrations)
//! - [`scores`]: Score-line tokenization into (test, SS, PR) rows
//! - [`bands`]: Standard-score performance-band classification
//! - [`report`]: Band-grid assembly and narrative template context building
//!
//! The pipeline, in data-flow order:
//!
//! ```text
//! page lines -> collect_until -> parse_admin_section
//!                             -> slice_assessments -> parse_score_lines
//!                                                  -> BandTable / NarrativeContext
//! ```

pub mod admin;
pub mod bands;
pub mod report;
pub mod scores;
pub mod sections;
