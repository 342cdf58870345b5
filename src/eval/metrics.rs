//! Precision, recall and F1 over view sets.
//!
//! Every scoring entry point is generic over an [`Accumulator`]:
//!
//! | Accumulator | Counts | Keeps |
//! |-------------|--------|-------|
//! | [`Scores`] | reference, predicted, correct | nothing else |
//! | [`DebuggingScores`] | same as `Scores` | every missed and added view |
//! | [`TemporalClosureScores`](super::TemporalClosureScores) | reference, predicted, correct per direction | nothing else |
//!
//! Empty denominators score 1.0: predicting nothing is perfectly precise,
//! and a reference with nothing in it is perfectly recalled.

use super::modes::ViewSet;
use super::view::View;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Accumulates counts over successive `(reference, predicted)` view sets.
pub trait Accumulator: Default {
    /// Score one pair of view sets and add the counts.
    fn add(&mut self, reference: &ViewSet, predicted: &ViewSet) -> Discrepancies;

    /// Add the counts of another accumulator.
    fn update(&mut self, other: &Self);

    /// Number of reference items seen.
    fn reference(&self) -> usize;

    /// Number of predicted items seen.
    fn predicted(&self) -> usize;

    /// Fraction of predicted items that are correct.
    fn precision(&self) -> f64;

    /// Fraction of reference items that were found.
    fn recall(&self) -> f64;

    /// Harmonic mean of precision and recall.
    fn f1(&self) -> f64 {
        f1_score(self.precision(), self.recall())
    }

    /// The correct count(s), formatted for reports.
    fn correct_summary(&self) -> String;

    /// Missed and added views kept so far, if this accumulator keeps them.
    fn discrepancies(&self) -> &[(View, Discrepancy)] {
        &[]
    }
}

pub(crate) fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        1.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub(crate) fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

// =============================================================================
// Discrepancies
// =============================================================================

/// Why a view was not matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Discrepancy {
    /// In the reference, missing from the prediction.
    NotInPredicted,
    /// Predicted, missing from the reference.
    NotInReference,
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::NotInPredicted => write!(f, "not in predicted"),
            Discrepancy::NotInReference => write!(f, "not in reference"),
        }
    }
}

/// Views that failed to match in one call to [`Accumulator::add`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discrepancies {
    /// Reference views with no predicted match.
    pub missed: Vec<View>,
    /// Predicted views with no reference match.
    pub added: Vec<View>,
}

impl Discrepancies {
    /// Set differences in both directions.
    #[must_use]
    pub fn between(reference: &ViewSet, predicted: &ViewSet) -> Self {
        Self {
            missed: reference.difference(predicted).into_iter().cloned().collect(),
            added: predicted.difference(reference).into_iter().cloned().collect(),
        }
    }

    /// All views tagged with their discrepancy, sorted.
    #[must_use]
    pub fn sorted(&self) -> Vec<(View, Discrepancy)> {
        let mut tagged: Vec<(View, Discrepancy)> = self
            .missed
            .iter()
            .map(|view| (view.clone(), Discrepancy::NotInPredicted))
            .chain(
                self.added
                    .iter()
                    .map(|view| (view.clone(), Discrepancy::NotInReference)),
            )
            .collect();
        tagged.sort();
        tagged
    }

    /// True if everything matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missed.is_empty() && self.added.is_empty()
    }
}

// =============================================================================
// Scores
// =============================================================================

/// Reference, predicted and correct counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    reference: usize,
    predicted: usize,
    correct: usize,
}

impl Scores {
    /// Create scores from raw counts.
    #[must_use]
    pub fn new(reference: usize, predicted: usize, correct: usize) -> Self {
        Self {
            reference,
            predicted,
            correct,
        }
    }

    /// Number of correct items.
    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }
}

impl Accumulator for Scores {
    fn add(&mut self, reference: &ViewSet, predicted: &ViewSet) -> Discrepancies {
        self.reference += reference.len();
        self.predicted += predicted.len();
        self.correct += reference.intersection_count(predicted);
        Discrepancies::between(reference, predicted)
    }

    fn update(&mut self, other: &Self) {
        self.reference += other.reference;
        self.predicted += other.predicted;
        self.correct += other.correct;
    }

    fn reference(&self) -> usize {
        self.reference
    }

    fn predicted(&self) -> usize {
        self.predicted
    }

    fn precision(&self) -> f64 {
        ratio(self.correct, self.predicted)
    }

    fn recall(&self) -> f64 {
        ratio(self.correct, self.reference)
    }

    fn correct_summary(&self) -> String {
        self.correct.to_string()
    }
}

/// [`Scores`] that also keep every view that failed to match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebuggingScores {
    #[serde(flatten)]
    scores: Scores,
    #[serde(skip)]
    discrepancies: Vec<(View, Discrepancy)>,
}

impl DebuggingScores {
    /// The plain counts.
    #[must_use]
    pub fn scores(&self) -> &Scores {
        &self.scores
    }

    /// Number of correct items.
    #[must_use]
    pub fn correct(&self) -> usize {
        self.scores.correct
    }
}

impl Accumulator for DebuggingScores {
    fn add(&mut self, reference: &ViewSet, predicted: &ViewSet) -> Discrepancies {
        let discrepancies = self.scores.add(reference, predicted);
        self.discrepancies.extend(discrepancies.sorted());
        discrepancies
    }

    fn update(&mut self, other: &Self) {
        self.scores.update(&other.scores);
        self.discrepancies.extend(other.discrepancies.iter().cloned());
    }

    fn reference(&self) -> usize {
        self.scores.reference
    }

    fn predicted(&self) -> usize {
        self.scores.predicted
    }

    fn precision(&self) -> f64 {
        self.scores.precision()
    }

    fn recall(&self) -> f64 {
        self.scores.recall()
    }

    fn correct_summary(&self) -> String {
        self.scores.correct_summary()
    }

    fn discrepancies(&self) -> &[(View, Discrepancy)] {
        &self.discrepancies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::modes::Matching;
    use crate::eval::view::{ViewName, ViewValue};
    use anafora_core::Spans;

    fn view(start: usize, end: usize) -> View {
        View::new(
            Spans::Entity(vec![(start, end)]),
            ViewName::span("X"),
            ViewValue::None,
        )
    }

    fn set(views: impl IntoIterator<Item = View>) -> ViewSet {
        ViewSet::from_views(Matching::Exact, views)
    }

    #[test]
    fn test_add_counts() {
        let mut scores = Scores::default();
        scores.add(&set([view(0, 1), view(2, 3)]), &set([view(0, 1), view(4, 5), view(6, 7)]));
        assert_eq!(scores, Scores::new(2, 3, 1));
        assert!((scores.precision() - 1.0 / 3.0).abs() < 0.001);
        assert!((scores.recall() - 0.5).abs() < 0.001);
        assert!((scores.f1() - 0.4).abs() < 0.001);
    }

    #[test]
    fn test_empty_denominators() {
        let scores = Scores::default();
        assert!((scores.precision() - 1.0).abs() < 0.001);
        assert!((scores.recall() - 1.0).abs() < 0.001);
        assert!((scores.f1() - 1.0).abs() < 0.001);

        let scores = Scores::new(3, 2, 0);
        assert!((scores.f1() - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_discrepancies_sorted() {
        let mut scores = DebuggingScores::default();
        let found = scores.add(&set([view(5, 6), view(0, 1)]), &set([view(2, 3)]));
        assert_eq!(found.missed.len(), 2);
        assert_eq!(found.added, vec![view(2, 3)]);
        assert_eq!(
            scores.discrepancies(),
            &[
                (view(0, 1), Discrepancy::NotInPredicted),
                (view(2, 3), Discrepancy::NotInReference),
                (view(5, 6), Discrepancy::NotInPredicted),
            ]
        );
        assert_eq!(Discrepancy::NotInPredicted.to_string(), "not in predicted");
    }

    #[test]
    fn test_update_concatenates() {
        let mut a = DebuggingScores::default();
        a.add(&set([view(0, 1)]), &ViewSet::new(Matching::Exact));
        let mut b = DebuggingScores::default();
        b.add(&ViewSet::new(Matching::Exact), &set([view(2, 3)]));
        a.update(&b);
        assert_eq!(a.scores(), &Scores::new(1, 1, 0));
        assert_eq!(a.discrepancies().len(), 2);
    }

    #[test]
    fn test_serializes_counts() {
        let json = serde_json::to_value(Scores::new(3, 2, 1)).unwrap();
        assert_eq!(json, serde_json::json!({"reference": 3, "predicted": 2, "correct": 1}));

        let mut debugging = DebuggingScores::default();
        debugging.add(&set([view(0, 1)]), &ViewSet::new(Matching::Exact));
        let json = serde_json::to_value(&debugging).unwrap();
        assert_eq!(json, serde_json::json!({"reference": 1, "predicted": 0, "correct": 0}));
    }
}
