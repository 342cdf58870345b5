//! # anafora
//!
//! Scoring of Anafora annotations against a reference, for Rust.
//!
//! - **Views**: annotations decompose into type, span, property and property+value views
//! - **Scoring**: precision/recall/F1 per view name, exact or overlapping spans
//! - **Temporal closure**: relations scored by entailment under interval algebra
//! - **Corpora**: per-document folding, inter-annotator agreement
//!
//! ## Quick Start
//!
//! ```rust
//! use anafora::eval::{score_data, Accumulator, Scores, ScoringConfig, ViewName};
//! use anafora::{Annotation, AnnotationSet};
//!
//! let reference = AnnotationSet::from_annotations([
//!     Annotation::entity("1", "EVENT", [(0, 5)]).with_property("Polarity", "POS"),
//! ])?;
//! let predicted = AnnotationSet::from_annotations([
//!     Annotation::entity("7", "EVENT", [(0, 5)]).with_property("Polarity", "NEG"),
//! ])?;
//!
//! let named = score_data::<Scores>(&reference, Some(&predicted), &ScoringConfig::default());
//! assert_eq!(named[&ViewName::span("EVENT")].correct(), 1);
//! assert_eq!(named[&ViewName::property("EVENT", "Polarity")].correct(), 0);
//! # Ok::<(), anafora::Error>(())
//! ```
//!
//! ## Temporal Closure
//!
//! Choosing [`eval::TemporalClosureScores`] as the accumulator scores a
//! relation property by entailment: a predicted `A BEFORE C` is correct if
//! the reference says `A BEFORE B` and `B BEFORE C`.
//!
//! ## Design
//!
//! - **Arena ownership**: an [`AnnotationSet`] owns its annotations; references are ids
//! - **Structural equality**: annotations compare by content, never by id
//! - **Generic accumulators**: every scoring entry point is generic over [`eval::Accumulator`]

#![warn(missing_docs)]

mod error;
pub mod eval;

pub use anafora_core::{
    Annotation, AnnotationKind, AnnotationRef, AnnotationSet, PropertyValue, Resolved, Span,
    Spans, StructuralKey,
};
pub use error::{Error, Result};
