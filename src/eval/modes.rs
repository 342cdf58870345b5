//! Span matching modes: exact offsets or any overlap.
//!
//! # Exact Mode (default)
//!
//! Two views match only if spans, name and value are all identical.
//!
//! # Overlap Mode
//!
//! "Did you find something that OVERLAPS the reference span?"
//!
//! ```text
//! Reference:  [====New York====]
//!              0              8
//! Predicted:  [=====New York City=====]
//!              0                     13
//!
//! Overlap?    ✓ chars 0-8 are shared
//! ```
//!
//! Entities with discontinuous spans match if any piece overlaps any piece.
//! Relations match if every argument overlaps the argument at the same
//! position. Spans nested inside annotation values (e.g. the target of a
//! `Source` property) are compared the same way.
//!
//! ```text
//! entity:    a=[(0,3),(10,12)]   b=[(11,20)]     → match (10..12 ∩ 11..20)
//! relation:  a=([0,5], [9,12])   b=([2,4], [20,25]) → no match (second argument)
//! empty:     a=[]                b=[]            → no match
//! ```
//!
//! Overlap is symmetric but not transitive: `[0,5)` matches `[4,9)` and
//! `[4,9)` matches `[8,12)`, yet `[0,5)` does not match `[8,12)`. No hash
//! function is compatible with such an equality, so a [`ViewSet`] in
//! overlap mode falls back to linear scans.

use super::view::{View, ViewValue};
use anafora_core::{Span, Spans};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// =============================================================================
// Matching Modes
// =============================================================================

/// How views are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Matching {
    /// Identical spans, name and value.
    #[default]
    Exact,
    /// Overlapping spans, identical name, value equal up to overlap.
    Overlap,
}

impl Matching {
    /// Human-readable name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Matching::Exact => "Exact",
            Matching::Overlap => "Overlap",
        }
    }
}

/// True if some piece of `a` overlaps some piece of `b`.
#[must_use]
pub fn spans_overlap(a: &[Span], b: &[Span]) -> bool {
    a.iter().any(|&(a_start, a_end)| {
        b.iter()
            .any(|&(b_start, b_end)| a_start < b_end && b_start < a_end)
    })
}

/// Compare two span values under a matching mode.
#[must_use]
pub fn spans_match(a: &Spans, b: &Spans, matching: Matching) -> bool {
    match matching {
        Matching::Exact => a == b,
        Matching::Overlap => match (a, b) {
            (Spans::Entity(a), Spans::Entity(b)) => spans_overlap(a, b),
            (Spans::Relation(a), Spans::Relation(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| spans_overlap(a, b))
            }
            _ => false,
        },
    }
}

/// Compare two views under a matching mode.
#[must_use]
pub fn views_match(a: &View, b: &View, matching: Matching) -> bool {
    match matching {
        Matching::Exact => a == b,
        Matching::Overlap => {
            a.name == b.name
                && spans_match(&a.spans, &b.spans, matching)
                && match (&a.value, &b.value) {
                    (ViewValue::Annotation(a), ViewValue::Annotation(b)) => {
                        a.eq_by(b, &|x: &Spans, y: &Spans| spans_match(x, y, matching))
                    }
                    (a, b) => a == b,
                }
        }
    }
}

// =============================================================================
// View Sets
// =============================================================================

/// A set of views under a matching mode.
///
/// Inserting a view that matches one already present is a no-op, so in
/// overlap mode the first of several overlapping views is kept.
#[derive(Debug, Clone, Default)]
pub struct ViewSet {
    matching: Matching,
    views: Vec<View>,
    exact: HashSet<View>,
}

impl ViewSet {
    /// Create an empty set.
    #[must_use]
    pub fn new(matching: Matching) -> Self {
        Self {
            matching,
            views: Vec::new(),
            exact: HashSet::new(),
        }
    }

    /// Build a set from views, in order.
    pub fn from_views(matching: Matching, views: impl IntoIterator<Item = View>) -> Self {
        let mut set = Self::new(matching);
        set.extend(views);
        set
    }

    /// Matching mode of this set.
    #[must_use]
    pub fn matching(&self) -> Matching {
        self.matching
    }

    /// Add a view. Returns false if a matching view was already present.
    pub fn insert(&mut self, view: View) -> bool {
        match self.matching {
            Matching::Exact => {
                if !self.exact.insert(view.clone()) {
                    return false;
                }
            }
            Matching::Overlap => {
                if self.contains(&view) {
                    return false;
                }
            }
        }
        self.views.push(view);
        true
    }

    /// True if some view in the set matches `view`.
    #[must_use]
    pub fn contains(&self, view: &View) -> bool {
        match self.matching {
            Matching::Exact => self.exact.contains(view),
            Matching::Overlap => self
                .views
                .iter()
                .any(|candidate| views_match(candidate, view, self.matching)),
        }
    }

    /// Number of views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// True if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Views in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &View> {
        self.views.iter()
    }

    /// Size of the intersection with `other`.
    ///
    /// Iterates the smaller set (on a tie, `other`) and counts its members
    /// that match something in the larger one. With overlap matching the
    /// result depends on which side is iterated.
    #[must_use]
    pub fn intersection_count(&self, other: &ViewSet) -> usize {
        let (small, large) = if self.len() < other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().filter(|view| large.contains(view)).count()
    }

    /// Views of this set with no match in `other`.
    #[must_use]
    pub fn difference<'a>(&'a self, other: &ViewSet) -> Vec<&'a View> {
        self.iter().filter(|view| !other.contains(view)).collect()
    }
}

impl Extend<View> for ViewSet {
    fn extend<T: IntoIterator<Item = View>>(&mut self, iter: T) {
        for view in iter {
            self.insert(view);
        }
    }
}

impl<'a> IntoIterator for &'a ViewSet {
    type Item = &'a View;
    type IntoIter = std::slice::Iter<'a, View>;

    fn into_iter(self) -> Self::IntoIter {
        self.views.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::view::ViewName;

    fn span_view(spans: Vec<Span>) -> View {
        View::new(Spans::Entity(spans), ViewName::span("X"), ViewValue::None)
    }

    #[test]
    fn test_spans_overlap() {
        assert!(spans_overlap(&[(0, 5)], &[(4, 9)]));
        assert!(!spans_overlap(&[(0, 5)], &[(5, 9)]));
        assert!(spans_overlap(&[(0, 3), (10, 12)], &[(11, 20)]));
        assert!(!spans_overlap(&[], &[]));
    }

    #[test]
    fn test_overlap_not_transitive() {
        let a = Spans::Entity(vec![(0, 5)]);
        let b = Spans::Entity(vec![(4, 9)]);
        let c = Spans::Entity(vec![(8, 12)]);
        assert!(spans_match(&a, &b, Matching::Overlap));
        assert!(spans_match(&b, &c, Matching::Overlap));
        assert!(!spans_match(&a, &c, Matching::Overlap));
    }

    #[test]
    fn test_relation_spans_match_positionally() {
        let a = Spans::Relation(vec![vec![(0, 5)], vec![(9, 12)]]);
        let b = Spans::Relation(vec![vec![(2, 4)], vec![(10, 11)]]);
        let c = Spans::Relation(vec![vec![(9, 12)], vec![(0, 5)]]);
        let d = Spans::Relation(vec![vec![(0, 5)]]);
        assert!(spans_match(&a, &b, Matching::Overlap));
        assert!(!spans_match(&a, &c, Matching::Overlap));
        assert!(!spans_match(&a, &d, Matching::Overlap));
        assert!(!spans_match(&a, &b, Matching::Exact));
    }

    #[test]
    fn test_exact_set_dedups() {
        let set = ViewSet::from_views(
            Matching::Exact,
            [span_view(vec![(0, 5)]), span_view(vec![(0, 5)]), span_view(vec![(1, 5)])],
        );
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_overlap_set_keeps_first() {
        let set = ViewSet::from_views(
            Matching::Overlap,
            [span_view(vec![(0, 5)]), span_view(vec![(3, 8)]), span_view(vec![(6, 9)])],
        );
        let kept: Vec<&Spans> = set.iter().map(|v| &v.spans).collect();
        assert_eq!(
            kept,
            vec![&Spans::Entity(vec![(0, 5)]), &Spans::Entity(vec![(6, 9)])]
        );
    }

    #[test]
    fn test_intersection_and_difference() {
        let reference = ViewSet::from_views(
            Matching::Overlap,
            [span_view(vec![(0, 5)]), span_view(vec![(10, 15)])],
        );
        let predicted = ViewSet::from_views(
            Matching::Overlap,
            [span_view(vec![(2, 3)]), span_view(vec![(20, 25)])],
        );
        assert_eq!(reference.intersection_count(&predicted), 1);
        assert_eq!(predicted.intersection_count(&reference), 1);
        assert_eq!(reference.difference(&predicted), vec![&span_view(vec![(10, 15)])]);
        assert_eq!(predicted.difference(&reference), vec![&span_view(vec![(20, 25)])]);
    }

    #[test]
    fn test_names_must_agree() {
        let a = span_view(vec![(0, 5)]);
        let b = View::new(a.spans.clone(), ViewName::span("Y"), ViewValue::None);
        assert!(!views_match(&a, &b, Matching::Overlap));
    }
}
