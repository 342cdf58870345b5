//! Scoring one document: reference annotations against predicted ones.
//!
//! ```text
//! annotations ──group by type──► X, Y, Z, ...
//!                                 │
//!                    ┌────────────┴────────────┐
//!                    ▼                         ▼
//!            whole annotations          views by name
//!            scored under "Z"           "Z:<span>", "Z:Prop1", "Z:Prop1:T", ...
//! ```
//!
//! The result maps every view name to an accumulator. Pick the
//! accumulator type to pick the scoring: [`Scores`](super::Scores) for
//! counts, [`DebuggingScores`](super::DebuggingScores) to keep the
//! mismatches, [`TemporalClosureScores`](super::TemporalClosureScores) to
//! score relations by entailment.

use super::metrics::Accumulator;
use super::modes::{Matching, ViewSet};
use super::view::{views, Pattern, View, ViewFilter, ViewName};
use anafora_core::{AnnotationRef, AnnotationSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Accumulators keyed by view name.
pub type NamedScores<S> = HashMap<ViewName, S>;

/// Scoring options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Which views are scored.
    pub filter: ViewFilter,
    /// How spans are compared.
    pub matching: Matching,
    /// Skip documents whose annotations reference themselves. On by default.
    pub skip_self_referential: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            filter: ViewFilter::default(),
            matching: Matching::default(),
            skip_self_referential: true,
        }
    }
}

impl ScoringConfig {
    /// Default configuration: everything scored, exact spans, and
    /// self-referential documents skipped.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict scoring to the given patterns.
    #[must_use]
    pub fn with_include(mut self, patterns: impl IntoIterator<Item = Pattern>) -> Self {
        self.filter = self.filter.with_include(patterns);
        self
    }

    /// Never score the given patterns.
    #[must_use]
    pub fn with_exclude(mut self, patterns: impl IntoIterator<Item = Pattern>) -> Self {
        self.filter = self.filter.with_exclude(patterns);
        self
    }

    /// Set the span matching mode.
    #[must_use]
    pub fn with_matching(mut self, matching: Matching) -> Self {
        self.matching = matching;
        self
    }

    /// Skip self-referential documents when scoring a corpus.
    ///
    /// Passing `false` scores them like any other document.
    #[must_use]
    pub fn skip_self_referential(mut self, skip: bool) -> Self {
        self.skip_self_referential = skip;
        self
    }
}

type Pair<'a> = (Vec<AnnotationRef<'a>>, Vec<AnnotationRef<'a>>);

/// Score predicted annotations against reference annotations.
///
/// Annotations are grouped by type. For each accepted type the whole
/// annotations are scored under [`ViewName::Type`]; then every accepted
/// view is scored under its own name. A missing prediction scores like an
/// empty one.
///
/// # Example
///
/// ```rust
/// use anafora::eval::{score_data, Accumulator, Scores, ScoringConfig, ViewName};
/// use anafora::{Annotation, AnnotationSet};
///
/// let reference = AnnotationSet::from_annotations([Annotation::entity("1", "X", [(0, 5)])])?;
/// let named = score_data::<Scores>(&reference, None, &ScoringConfig::default());
///
/// let x = &named[&ViewName::of_type("X")];
/// assert_eq!((x.reference(), x.predicted(), x.correct()), (1, 0, 0));
/// # Ok::<(), anafora::Error>(())
/// ```
pub fn score_data<S: Accumulator>(
    reference: &AnnotationSet,
    predicted: Option<&AnnotationSet>,
    config: &ScoringConfig,
) -> NamedScores<S> {
    let mut by_type: BTreeMap<&str, Pair<'_>> = BTreeMap::new();
    for annotation in reference.iter() {
        by_type.entry(annotation.type_name()).or_default().0.push(annotation);
    }
    for annotation in predicted.into_iter().flat_map(|set| set.iter()) {
        by_type.entry(annotation.type_name()).or_default().1.push(annotation);
    }

    let matching = config.matching;
    let mut result: NamedScores<S> = HashMap::new();
    for (type_name, (reference, predicted)) in by_type {
        if config.filter.accept(type_name, None, None) {
            result.entry(ViewName::of_type(type_name)).or_default().add(
                &whole_views(matching, &reference),
                &whole_views(matching, &predicted),
            );
        }

        let mut by_name: BTreeMap<ViewName, (ViewSet, ViewSet)> = BTreeMap::new();
        let empty = || (ViewSet::new(matching), ViewSet::new(matching));
        for view in views(reference.iter().copied(), &config.filter) {
            by_name.entry(view.name.clone()).or_insert_with(empty).0.insert(view);
        }
        for view in views(predicted.iter().copied(), &config.filter) {
            by_name.entry(view.name.clone()).or_insert_with(empty).1.insert(view);
        }
        for (name, (reference, predicted)) in by_name {
            result.entry(name).or_default().add(&reference, &predicted);
        }
    }
    result
}

fn whole_views(matching: Matching, annotations: &[AnnotationRef<'_>]) -> ViewSet {
    ViewSet::from_views(
        matching,
        annotations.iter().map(|annotation| View::of_annotation(*annotation)),
    )
}
