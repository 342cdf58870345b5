//! Score tables.
//!
//! # Example
//!
//! ```rust
//! use anafora::eval::{format_scores, score_data, Scores, ScoringConfig};
//! use anafora::{Annotation, AnnotationSet};
//!
//! let reference = AnnotationSet::from_annotations([Annotation::entity("1", "X", [(0, 5)])])?;
//! let named = score_data::<Scores>(&reference, Some(&reference), &ScoringConfig::default());
//! let table = format_scores(&named);
//!
//! let lines: Vec<&str> = table.lines().collect();
//! assert_eq!(lines.len(), 3);
//! assert!(lines[1].starts_with("X "));
//! assert!(lines[2].starts_with("X:<span>"));
//! # Ok::<(), anafora::Error>(())
//! ```

use super::metrics::Accumulator;
use super::view::ViewName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Keys that can label a row of a score table.
pub trait ScoreName {
    /// Row label, components joined with `:`.
    fn score_name(&self) -> String;
}

impl ScoreName for ViewName {
    fn score_name(&self) -> String {
        self.to_string()
    }
}

impl ScoreName for (String, ViewName) {
    fn score_name(&self) -> String {
        format!("{}:{}", self.0, self.1)
    }
}

/// One row of a score table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    /// Row label.
    pub name: String,
    /// Reference count.
    pub reference: usize,
    /// Predicted count.
    pub predicted: usize,
    /// Correct count(s).
    pub correct: String,
    /// Precision (0.0-1.0)
    pub precision: f64,
    /// Recall (0.0-1.0)
    pub recall: f64,
    /// F1 (0.0-1.0)
    pub f1: f64,
}

/// Rows for every key, sorted by label.
pub fn score_rows<K: ScoreName, S: Accumulator>(named: &HashMap<K, S>) -> Vec<ScoreRow> {
    let mut rows: Vec<ScoreRow> = named
        .iter()
        .map(|(name, scores)| ScoreRow {
            name: name.score_name(),
            reference: scores.reference(),
            predicted: scores.predicted(),
            correct: scores.correct_summary(),
            precision: scores.precision(),
            recall: scores.recall(),
            f1: scores.f1(),
        })
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    rows
}

/// The `ref pred corr P R F1` table, rendered through [`fmt::Display`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    /// Rows in label order.
    pub rows: Vec<ScoreRow>,
}

impl ScoreTable {
    /// Build the table for a set of named scores.
    #[must_use]
    pub fn new<K: ScoreName, S: Accumulator>(named: &HashMap<K, S>) -> Self {
        Self {
            rows: score_rows(named),
        }
    }
}

impl fmt::Display for ScoreTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:40}\t{:^5}\t{:^5}\t{:^5}\t{:^5}\t{:^5}\t{:^5}",
            "", "ref", "pred", "corr", "P", "R", "F1"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:40}\t{:>5}\t{:>5}\t{:>5}\t{:5.3}\t{:5.3}\t{:5.3}",
                row.name, row.reference, row.predicted, row.correct, row.precision, row.recall, row.f1
            )?;
        }
        Ok(())
    }
}

/// Render a tab-separated table: label, `ref`, `pred`, `corr`, `P`, `R`, `F1`.
#[must_use]
pub fn format_scores<K: ScoreName, S: Accumulator>(named: &HashMap<K, S>) -> String {
    ScoreTable::new(named).to_string()
}
