//! # anafora-core
//!
//! Core types for anafora: the annotation data model shared by the scoring crate.
//!
//! This crate provides:
//! - **Annotations**: `Annotation`, `AnnotationSet`, `AnnotationRef`, `Spans`, `PropertyValue`
//! - **Structural keys**: `StructuralKey`, `Structural`, order-independent and cycle-safe
//!
//! Annotations form a reference graph that may contain cycles. The
//! collection owns every annotation and properties refer to each other by
//! id, so equality and hashing can walk the graph without shared ownership.

pub mod annotation;
pub mod error;
pub mod key;

// Re-exports for convenience
pub use annotation::{
    Annotation, AnnotationKind, AnnotationRef, AnnotationSet, PropertyValue, Resolved, Span, Spans,
};
pub use error::{Error, Result};
pub use key::{KeyBuilder, Structural, StructuralKey};
