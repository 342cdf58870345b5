//! Annotation scoring framework.
//!
//! # Overview
//!
//! Predicted annotations are scored against reference annotations per
//! *view name*: whole annotations of a type, their spans, each property,
//! and each string value of a property.
//!
//! ```text
//!   reference ─┐
//!              ├─► views ─► ViewSet per name ─► Accumulator ─► NamedScores
//!   predicted ─┘     ▲            ▲                  ▲
//!                ViewFilter    Matching      Scores / DebuggingScores /
//!                                            TemporalClosureScores
//! ```
//!
//! # Scoring a Document
//!
//! ```rust
//! use anafora::eval::{score_data, Accumulator, Matching, Scores, ScoringConfig, ViewName};
//! use anafora::{Annotation, AnnotationSet};
//!
//! let reference = AnnotationSet::from_annotations([Annotation::entity("1", "EVENT", [(0, 5)])])?;
//! let predicted = AnnotationSet::from_annotations([Annotation::entity("1", "EVENT", [(1, 6)])])?;
//!
//! let exact = score_data::<Scores>(&reference, Some(&predicted), &ScoringConfig::default());
//! assert_eq!(exact[&ViewName::span("EVENT")].correct(), 0);
//!
//! let config = ScoringConfig::default().with_matching(Matching::Overlap);
//! let overlap = score_data::<Scores>(&reference, Some(&predicted), &config);
//! assert_eq!(overlap[&ViewName::span("EVENT")].correct(), 1);
//! # Ok::<(), anafora::Error>(())
//! ```
//!
//! # Metrics
//!
//! | Accumulator | Correct means |
//! |-------------|---------------|
//! | [`Scores`] | in both sets |
//! | [`DebuggingScores`] | in both sets; mismatches kept |
//! | [`TemporalClosureScores`] | entailed by the other side's closure |
//!
//! # Corpora
//!
//! - [`score_corpus`]: fold per-document scores over reference/prediction pairs
//! - [`score_annotators`]: pairwise agreement between annotators
//! - [`format_scores`]: the usual `ref pred corr P R F1` table

pub mod closure;
pub mod corpus;
pub mod metrics;
pub mod modes;
pub mod report;
pub mod score;
pub mod view;

pub use closure::{
    closure, view_fact, Endpoint, PointRelation, RelationLabel, Requirement, TemporalClosureScores,
    TemporalFact, ViewFact,
};
pub use corpus::{
    score_annotators, score_corpus, span_text, AgreementScores, AnnotatorDocument, Document,
};
pub use metrics::{Accumulator, DebuggingScores, Discrepancies, Discrepancy, Scores};
pub use modes::{spans_match, spans_overlap, views_match, Matching, ViewSet};
pub use report::{format_scores, score_rows, ScoreName, ScoreRow, ScoreTable};
pub use score::{score_data, NamedScores, ScoringConfig};
pub use view::{views, Pattern, View, ViewFilter, ViewName, ViewValue, SPAN_PROPERTY};
