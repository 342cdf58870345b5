//! Scoring many documents, and comparing annotators with each other.
//!
//! Documents arrive already loaded; finding and parsing files is left to
//! the caller. Per-document scores are folded with
//! [`Accumulator::update`], so the totals do not depend on document order.

use super::metrics::Accumulator;
use super::score::{score_data, NamedScores, ScoringConfig};
use super::view::ViewName;
use anafora_core::{AnnotationSet, Spans};
use std::collections::HashMap;

/// One document: reference annotations, predictions, and optionally its text.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Name used in log messages.
    pub name: String,
    /// Reference annotations.
    pub reference: AnnotationSet,
    /// Predicted annotations; `None` if the system produced nothing.
    pub predicted: Option<AnnotationSet>,
    /// Source text, used to show mismatched spans.
    pub text: Option<String>,
}

impl Document {
    /// Create a document with no prediction and no text.
    pub fn new(name: impl Into<String>, reference: AnnotationSet) -> Self {
        Self {
            name: name.into(),
            reference,
            predicted: None,
            text: None,
        }
    }

    /// Set the predicted annotations.
    #[must_use]
    pub fn with_predicted(mut self, predicted: AnnotationSet) -> Self {
        self.predicted = Some(predicted);
        self
    }

    /// Set the source text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// The text covered by `spans`, pieces joined with `...`.
///
/// Offsets count characters. Out-of-range offsets are clamped.
#[must_use]
pub fn span_text(text: &str, spans: &Spans) -> String {
    spans
        .offsets()
        .into_iter()
        .map(|(start, end)| {
            text.chars()
                .skip(start)
                .take(end.saturating_sub(start))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("...")
}

fn self_referential_id(data: &AnnotationSet) -> Option<String> {
    data.find_self_referential().map(|a| a.id().to_string())
}

/// Score every document and fold the results.
///
/// A document without a prediction is scored against an empty one. Unless
/// [`ScoringConfig::skip_self_referential`] is turned off, a document whose
/// reference is self-referential is skipped and a self-referential
/// prediction is replaced by an empty one. Mismatches kept by the accumulator are logged
/// at debug level.
pub fn score_corpus<S: Accumulator>(
    documents: impl IntoIterator<Item = Document>,
    config: &ScoringConfig,
) -> NamedScores<S> {
    let mut result: NamedScores<S> = HashMap::new();
    for document in documents {
        if config.skip_self_referential {
            if let Some(id) = self_referential_id(&document.reference) {
                log::warn!(
                    "{}: skipping reference with self-referential annotation {}",
                    document.name,
                    id
                );
                continue;
            }
        }
        let has_prediction = document.predicted.is_some();
        let predicted = match document.predicted {
            Some(predicted) if config.skip_self_referential => {
                match self_referential_id(&predicted) {
                    Some(id) => {
                        log::warn!(
                            "{}: ignoring prediction with self-referential annotation {}",
                            document.name,
                            id
                        );
                        AnnotationSet::new()
                    }
                    None => predicted,
                }
            }
            Some(predicted) => predicted,
            None => {
                log::warn!("{}: no predicted annotations", document.name);
                AnnotationSet::new()
            }
        };

        let named = score_data::<S>(&document.reference, Some(&predicted), config);
        for (name, scores) in named {
            if has_prediction {
                for (view, discrepancy) in scores.discrepancies() {
                    let covered = document
                        .text
                        .as_deref()
                        .map(|text| span_text(text, &view.spans))
                        .unwrap_or_default();
                    log::debug!("{}: {}: {:?} {}", document.name, discrepancy, covered, view);
                }
            }
            result.entry(name).or_default().update(&scores);
        }
    }
    log::info!("scored {} view names", result.len());
    result
}

/// The annotations of several annotators for one document.
#[derive(Debug, Clone, Default)]
pub struct AnnotatorDocument {
    /// Name used in log messages.
    pub name: String,
    /// `(annotator, annotations)` pairs.
    pub annotations: Vec<(String, AnnotationSet)>,
}

impl AnnotatorDocument {
    /// Create a document with no annotators yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: Vec::new(),
        }
    }

    /// Add one annotator's annotations.
    #[must_use]
    pub fn with_annotator(mut self, annotator: impl Into<String>, data: AnnotationSet) -> Self {
        self.annotations.push((annotator.into(), data));
        self
    }
}

/// Accumulators keyed by annotator pair and view name.
pub type AgreementScores<S> = HashMap<(String, ViewName), S>;

/// The annotator name used in the pooled comparison.
pub const GENERIC_ANNOTATOR: &str = "annotator";

/// The annotator name kept in the pooled comparison.
pub const GOLD_ANNOTATOR: &str = "gold";

fn pair_prefix(first: &str, second: &str) -> String {
    let (a, b) = if first <= second {
        (first, second)
    } else {
        (second, first)
    };
    format!("{a}-vs-{b}")
}

fn generic_name(annotator: &str) -> &str {
    if annotator == GOLD_ANNOTATOR {
        annotator
    } else {
        GENERIC_ANNOTATOR
    }
}

/// Pairwise inter-annotator agreement.
///
/// Every pair of annotators of a document is scored, the first as
/// reference, under the prefix `a-vs-b` (names sorted). Each pair is also
/// pooled under a prefix where every annotator except `gold` is called
/// `annotator`, e.g. `annotator-vs-gold`. Documents with fewer than two
/// annotators are skipped with a warning.
pub fn score_annotators<S: Accumulator>(
    documents: impl IntoIterator<Item = AnnotatorDocument>,
    config: &ScoringConfig,
) -> AgreementScores<S> {
    let mut result: AgreementScores<S> = HashMap::new();
    for document in documents {
        let annotations: Vec<&(String, AnnotationSet)> = document
            .annotations
            .iter()
            .filter(|(annotator, data)| {
                if !config.skip_self_referential {
                    return true;
                }
                match self_referential_id(data) {
                    Some(id) => {
                        log::warn!(
                            "{}: ignoring {} with self-referential annotation {}",
                            document.name,
                            annotator,
                            id
                        );
                        false
                    }
                    None => true,
                }
            })
            .collect();
        if annotations.len() < 2 {
            let names: Vec<&str> = annotations.iter().map(|(a, _)| a.as_str()).collect();
            log::warn!(
                "{}: found fewer than 2 annotators: {:?}",
                document.name,
                names
            );
            continue;
        }

        for (i, (first, first_data)) in annotations.iter().map(|pair| (&pair.0, &pair.1)).enumerate() {
            for (second, second_data) in annotations[i + 1..].iter().map(|pair| (&pair.0, &pair.1)) {
                let prefix = pair_prefix(first, second);
                let pooled = pair_prefix(generic_name(first), generic_name(second));
                let named = score_data::<S>(first_data, Some(second_data), config);
                for (name, scores) in named {
                    result
                        .entry((prefix.clone(), name.clone()))
                        .or_default()
                        .update(&scores);
                    result.entry((pooled.clone(), name)).or_default().update(&scores);
                }
            }
        }
    }
    result
}
