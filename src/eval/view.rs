//! Views: the comparable pieces an annotation decomposes into.
//!
//! Scoring never compares whole annotation graphs directly. Each annotation
//! is split into views, and views with the same name are scored together.
//!
//! ```text
//! Z  id=3  spans=((0,5),(5,10))  Source=→1  Target=→2  Prop1=T
//!
//! name                 value
//! ───────────────────  ──────────────
//! Z                    key(annotation 3)      whole annotation
//! Z:<span>             -                      spans only
//! Z:Source             key(annotation 1)
//! Z:Target             key(annotation 2)
//! Z:Prop1              "T"
//! Z:Prop1:T            "T"                    one name per string value
//! ```
//!
//! Every view also carries the annotation's spans, so `Z:Prop1` is only
//! correct when both the value and the location agree.
//!
//! # Filters
//!
//! A [`ViewFilter`] decides which views exist at all. Patterns are written
//! `type`, `type:property` or `type:property:value`.
//!
//! ```rust
//! use anafora::eval::{Pattern, ViewFilter};
//!
//! let filter = ViewFilter::default()
//!     .with_include(["TLINK:Type".parse::<Pattern>()?]);
//! assert!(filter.accept("TLINK", Some("Type"), None));
//! assert!(!filter.accept("TLINK", None, None));
//! assert!(!filter.accept("EVENT", Some("Type"), None));
//! # Ok::<(), anafora::Error>(())
//! ```

use crate::{Error, Result};
use anafora_core::{AnnotationRef, Resolved, Spans, StructuralKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Property name used for the spans-only view.
pub const SPAN_PROPERTY: &str = "<span>";

// =============================================================================
// View Names
// =============================================================================

/// The name a group of views is scored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViewName {
    /// Whole annotations of one type.
    Type(String),
    /// One property (or `<span>`) of one type.
    Property(String, String),
    /// One string value of one property.
    Value(String, String, String),
}

impl ViewName {
    /// Name for whole annotations of `type_name`.
    pub fn of_type(type_name: impl Into<String>) -> Self {
        ViewName::Type(type_name.into())
    }

    /// Name for the spans-only view of `type_name`.
    pub fn span(type_name: impl Into<String>) -> Self {
        ViewName::Property(type_name.into(), SPAN_PROPERTY.to_string())
    }

    /// Name for one property.
    pub fn property(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        ViewName::Property(type_name.into(), property.into())
    }

    /// Name for one property value.
    pub fn value(
        type_name: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        ViewName::Value(type_name.into(), property.into(), value.into())
    }

    /// The annotation type this name belongs to.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            ViewName::Type(t) | ViewName::Property(t, _) | ViewName::Value(t, _, _) => t,
        }
    }

    /// Components of the name, outermost first.
    #[must_use]
    pub fn parts(&self) -> Vec<&str> {
        match self {
            ViewName::Type(t) => vec![t.as_str()],
            ViewName::Property(t, p) => vec![t.as_str(), p.as_str()],
            ViewName::Value(t, p, v) => vec![t.as_str(), p.as_str(), v.as_str()],
        }
    }
}

impl fmt::Display for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts().join(":"))
    }
}

// =============================================================================
// Views
// =============================================================================

/// What a view compares besides its spans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViewValue {
    /// Spans only.
    None,
    /// A string property value.
    Text(String),
    /// An annotation, by content.
    Annotation(StructuralKey),
}

impl ViewValue {
    /// The string value, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ViewValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<Resolved<'_>> for ViewValue {
    fn from(value: Resolved<'_>) -> Self {
        match value {
            Resolved::Text(text) => ViewValue::Text(text.to_string()),
            Resolved::Annotation(target) => ViewValue::Annotation(target.key()),
        }
    }
}

/// One comparable piece of an annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct View {
    /// Spans of the annotation the view came from.
    pub spans: Spans,
    /// Group the view is scored under.
    pub name: ViewName,
    /// Compared content.
    pub value: ViewValue,
}

impl View {
    /// Create a view.
    #[must_use]
    pub fn new(spans: Spans, name: ViewName, value: ViewValue) -> Self {
        Self { spans, name, value }
    }

    /// The whole-annotation view, scored under [`ViewName::Type`].
    ///
    /// Spans are normalized, so the order in which a discontinuous mention
    /// lists its pieces does not matter.
    #[must_use]
    pub fn of_annotation(annotation: AnnotationRef<'_>) -> Self {
        Self {
            spans: annotation.spans().normalized(),
            name: ViewName::of_type(annotation.type_name()),
            value: ViewValue::Annotation(annotation.key()),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.name, self.spans)?;
        if let Some(text) = self.value.as_text() {
            write!(f, " = {text:?}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Filters
// =============================================================================

/// An include/exclude entry: a type, a property of a type, or a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pattern {
    /// `type`
    Type(String),
    /// `type:property`
    Property(String, String),
    /// `type:property:value`
    Value(String, String, String),
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(Error::parse(format!("empty segment in pattern {s:?}")));
        }
        match parts.as_slice() {
            [t] => Ok(Pattern::Type((*t).to_string())),
            [t, p] => Ok(Pattern::Property((*t).to_string(), (*p).to_string())),
            [t, p, v] => Ok(Pattern::Value(
                (*t).to_string(),
                (*p).to_string(),
                (*v).to_string(),
            )),
            _ => Err(Error::parse(format!(
                "expected type[:property[:value]], found {s:?}"
            ))),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Type(t) => write!(f, "{t}"),
            Pattern::Property(t, p) => write!(f, "{t}:{p}"),
            Pattern::Value(t, p, v) => write!(f, "{t}:{p}:{v}"),
        }
    }
}

/// Which views are scored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFilter {
    /// If set, only views matching one of these are scored.
    pub include: Option<HashSet<Pattern>>,
    /// Views matching one of these are never scored.
    pub exclude: Option<HashSet<Pattern>>,
}

impl ViewFilter {
    /// Restrict scoring to the given patterns.
    #[must_use]
    pub fn with_include(mut self, patterns: impl IntoIterator<Item = Pattern>) -> Self {
        self.include = Some(patterns.into_iter().collect());
        self
    }

    /// Never score the given patterns.
    #[must_use]
    pub fn with_exclude(mut self, patterns: impl IntoIterator<Item = Pattern>) -> Self {
        self.exclude = Some(patterns.into_iter().collect());
        self
    }

    /// Whether a type, a property of it, or a value of that property is scored.
    ///
    /// Included if the type, the `(type, property)` pair or the full triple
    /// is in `include`. Rejected if any of them is in `exclude`; exclusion
    /// wins over inclusion.
    #[must_use]
    pub fn accept(&self, type_name: &str, property: Option<&str>, value: Option<&str>) -> bool {
        let candidates = candidates(type_name, property, value);
        if let Some(include) = &self.include {
            if !candidates.iter().any(|pattern| include.contains(pattern)) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if candidates.iter().any(|pattern| exclude.contains(pattern)) {
                return false;
            }
        }
        true
    }
}

fn candidates(type_name: &str, property: Option<&str>, value: Option<&str>) -> Vec<Pattern> {
    let mut patterns = vec![Pattern::Type(type_name.to_string())];
    if let Some(property) = property {
        patterns.push(Pattern::Property(type_name.to_string(), property.to_string()));
        if let Some(value) = value {
            patterns.push(Pattern::Value(
                type_name.to_string(),
                property.to_string(),
                value.to_string(),
            ));
        }
    }
    patterns
}

// =============================================================================
// Extraction
// =============================================================================

/// Decompose annotations into span, property and value views.
///
/// Whole-annotation views are not included; see [`View::of_annotation`].
/// Value views are only produced for string properties.
pub fn views<'a>(
    annotations: impl IntoIterator<Item = AnnotationRef<'a>>,
    filter: &ViewFilter,
) -> Vec<View> {
    let mut result = Vec::new();
    for annotation in annotations {
        let type_name = annotation.type_name();
        let spans = annotation.spans();
        if filter.accept(type_name, Some(SPAN_PROPERTY), None) {
            result.push(View::new(spans.clone(), ViewName::span(type_name), ViewValue::None));
        }
        for (property, value) in annotation.properties() {
            if filter.accept(type_name, Some(property), None) {
                result.push(View::new(
                    spans.clone(),
                    ViewName::property(type_name, property),
                    ViewValue::from(value),
                ));
            }
            if let Some(text) = value.as_text() {
                if filter.accept(type_name, Some(property), Some(text)) {
                    result.push(View::new(
                        spans.clone(),
                        ViewName::value(type_name, property, text),
                        ViewValue::Text(text.to_string()),
                    ));
                }
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use anafora_core::{Annotation, AnnotationSet};

    fn pattern(s: &str) -> Pattern {
        s.parse().unwrap()
    }

    #[test]
    fn test_pattern_parse() {
        assert_eq!(pattern("X"), Pattern::Type("X".into()));
        assert_eq!(pattern("X:a"), Pattern::Property("X".into(), "a".into()));
        assert_eq!(
            pattern("X:a:b"),
            Pattern::Value("X".into(), "a".into(), "b".into())
        );
        assert_eq!(pattern("X:a:b").to_string(), "X:a:b");
    }

    #[test]
    fn test_pattern_parse_errors() {
        assert!(matches!("X:a:b:c".parse::<Pattern>(), Err(Error::Parse(_))));
        assert!(matches!("X::b".parse::<Pattern>(), Err(Error::Parse(_))));
        assert!(matches!("".parse::<Pattern>(), Err(Error::Parse(_))));
    }

    #[test]
    fn test_accept_without_filters() {
        let filter = ViewFilter::default();
        assert!(filter.accept("X", None, None));
        assert!(filter.accept("X", Some("a"), Some("b")));
    }

    #[test]
    fn test_accept_include_levels() {
        let filter = ViewFilter::default().with_include([pattern("Z:Prop1:T")]);
        assert!(!filter.accept("Z", None, None));
        assert!(!filter.accept("Z", Some("Prop1"), None));
        assert!(filter.accept("Z", Some("Prop1"), Some("T")));
        assert!(!filter.accept("Z", Some("Prop1"), Some("F")));

        let filter = ViewFilter::default().with_include([pattern("Z")]);
        assert!(filter.accept("Z", Some("anything"), Some("at all")));
    }

    #[test]
    fn test_exclude_wins() {
        let filter = ViewFilter::default()
            .with_include([pattern("Z")])
            .with_exclude([pattern("Z:<span>")]);
        assert!(filter.accept("Z", None, None));
        assert!(!filter.accept("Z", Some("<span>"), None));
        assert!(filter.accept("Z", Some("Prop1"), None));
    }

    #[test]
    fn test_views_of_relation() {
        let data = AnnotationSet::from_annotations([
            Annotation::entity("1", "X", [(0, 5)]),
            Annotation::entity("2", "Y", [(5, 10)]),
            Annotation::relation("3", "Z")
                .with_reference("Source", "1")
                .with_reference("Target", "2")
                .with_property("Prop1", "T"),
        ])
        .unwrap();
        let extracted = views(data.select_type("Z"), &ViewFilter::default());
        let names: Vec<String> = extracted.iter().map(|v| v.name.to_string()).collect();
        assert_eq!(
            names,
            vec!["Z:<span>", "Z:Source", "Z:Target", "Z:Prop1", "Z:Prop1:T"]
        );

        let spans = Spans::Relation(vec![vec![(0, 5)], vec![(5, 10)]]);
        assert!(extracted.iter().all(|v| v.spans == spans));
        let source = &extracted[1];
        assert_eq!(
            source.value,
            ViewValue::Annotation(data.get("1").unwrap().key())
        );
    }

    #[test]
    fn test_views_respect_filter() {
        let data = AnnotationSet::from_annotations([
            Annotation::entity("1", "X", [(0, 5)]).with_property("a", "b"),
        ])
        .unwrap();
        let filter = ViewFilter::default().with_exclude([pattern("X:a:b")]);
        let names: Vec<ViewName> = views(data.iter(), &filter)
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec![ViewName::span("X"), ViewName::property("X", "a")]);
    }

    #[test]
    fn test_view_name_display() {
        assert_eq!(ViewName::of_type("X").to_string(), "X");
        assert_eq!(ViewName::span("X").to_string(), "X:<span>");
        assert_eq!(ViewName::value("X", "a", "b").to_string(), "X:a:b");
        assert_eq!(ViewName::value("X", "a", "b").type_name(), "X");
    }
}
