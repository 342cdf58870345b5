//! Temporal closure: scoring relations by entailment.
//!
//! # The Core Problem
//!
//! The same timeline can be annotated in many ways:
//!
//! ```text
//! Reference:  A BEFORE B    B BEFORE C
//! Predicted:  A BEFORE C
//!
//! Exact scoring:    A BEFORE C is not in the reference   → wrong
//! Closure scoring:  A BEFORE C follows from the reference → correct
//! ```
//!
//! Precision asks whether each predicted relation is entailed by the
//! reference; recall asks whether each reference relation is entailed by
//! the prediction:
//!
//! ```text
//! precision = |closure(reference) ∩ predicted| / |predicted|
//! recall    = |reference ∩ closure(predicted)| / |reference|
//! ```
//!
//! # Point Algebra
//!
//! Composing interval relations directly needs a 13×13 table. Instead each
//! interval relation is lowered to constraints between endpoints, closed
//! under two trivial rules, and lifted back:
//!
//! ```text
//! A INCLUDES B        start(A) < start(B)   end(B) < end(A)
//!
//!   A  [=================]
//!   B       [======]
//!
//! composition:  < ∘ < = <    < ∘ = = <    = ∘ < = <    = ∘ = = =
//! ```
//!
//! Every interval also gets `start < end`. A pair of intervals is lifted to
//! every label whose endpoint constraints all hold, for every relation name
//! the two intervals share in the input.
//!
//! # Canonical Facts
//!
//! `(A, B, BEFORE)` and `(B, A, AFTER)` state the same thing, so a
//! [`TemporalFact`] stores the forward label of each inverse pair (swapping
//! the intervals when needed), and orders the intervals of symmetric labels.
//! Aliases such as `CONTAINS` are normalized when parsed.
//!
//! # Example
//!
//! ```rust
//! use anafora::eval::{closure, RelationLabel, TemporalFact};
//! use std::collections::HashSet;
//!
//! let facts: HashSet<_> = [
//!     TemporalFact::new("A", "B", (), RelationLabel::Before),
//!     TemporalFact::new("B", "C", (), RelationLabel::Before),
//! ]
//! .into_iter()
//! .collect();
//!
//! let closed = closure(&facts);
//! assert!(closed.contains(&TemporalFact::new("A", "C", (), RelationLabel::Before)));
//! assert!(closed.contains(&TemporalFact::new("C", "A", (), RelationLabel::After)));
//! ```
//!
//! Contradictory input (`A BEFORE B`, `B BEFORE A`) is not detected; the
//! closure is computed all the same.

use super::metrics::{ratio, Accumulator, Discrepancies};
use super::modes::ViewSet;
use super::view::{View, ViewName};
use crate::{Error, Result};
use anafora_core::{Span, Spans};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use self::Endpoint::{End, Start};
use self::PointRelation::{Equal, Less};

// =============================================================================
// Relation Labels
// =============================================================================

/// An interval relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationLabel {
    /// Source ends before target starts.
    Before,
    /// Source starts after target ends.
    After,
    /// Source ends exactly where target starts.
    IBefore,
    /// Source starts exactly where target ends.
    IAfter,
    /// Source strictly contains target.
    Includes,
    /// Source is strictly contained in target.
    IsIncluded,
    /// Source and target share some time.
    Overlap,
    /// Same start, source ends first.
    Begins,
    /// Same start, target ends first.
    BegunBy,
    /// Same end, source starts last.
    Ends,
    /// Same end, target starts last.
    EndedBy,
    /// Same start and same end.
    Simultaneous,
    /// Same start.
    SimultaneousStart,
    /// Same end.
    SimultaneousEnd,
}

/// One endpoint of an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
    /// Start point.
    Start,
    /// End point.
    End,
}

/// Ordering between two endpoints. `>` is expressed by swapping operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PointRelation {
    /// Strictly earlier.
    Less,
    /// Same point.
    Equal,
}

impl PointRelation {
    /// Compose `a r1 b` and `b r2 c` into `a r c`.
    #[must_use]
    pub fn compose(self, other: PointRelation) -> PointRelation {
        match (self, other) {
            (PointRelation::Equal, PointRelation::Equal) => PointRelation::Equal,
            _ => PointRelation::Less,
        }
    }
}

/// An endpoint constraint; argument 0 is the source, 1 the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Requirement {
    /// Left endpoint.
    pub left: (usize, Endpoint),
    /// Ordering.
    pub relation: PointRelation,
    /// Right endpoint.
    pub right: (usize, Endpoint),
}

const fn req(
    left: usize,
    left_side: Endpoint,
    relation: PointRelation,
    right: usize,
    right_side: Endpoint,
) -> Requirement {
    Requirement {
        left: (left, left_side),
        relation,
        right: (right, right_side),
    }
}

impl RelationLabel {
    /// Every label, in declaration order.
    pub const ALL: [RelationLabel; 14] = [
        RelationLabel::Before,
        RelationLabel::After,
        RelationLabel::IBefore,
        RelationLabel::IAfter,
        RelationLabel::Includes,
        RelationLabel::IsIncluded,
        RelationLabel::Overlap,
        RelationLabel::Begins,
        RelationLabel::BegunBy,
        RelationLabel::Ends,
        RelationLabel::EndedBy,
        RelationLabel::Simultaneous,
        RelationLabel::SimultaneousStart,
        RelationLabel::SimultaneousEnd,
    ];

    /// Canonical name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            RelationLabel::Before => "BEFORE",
            RelationLabel::After => "AFTER",
            RelationLabel::IBefore => "IBEFORE",
            RelationLabel::IAfter => "IAFTER",
            RelationLabel::Includes => "INCLUDES",
            RelationLabel::IsIncluded => "IS_INCLUDED",
            RelationLabel::Overlap => "OVERLAP",
            RelationLabel::Begins => "BEGINS",
            RelationLabel::BegunBy => "BEGUN_BY",
            RelationLabel::Ends => "ENDS",
            RelationLabel::EndedBy => "ENDED_BY",
            RelationLabel::Simultaneous => "SIMULTANEOUS",
            RelationLabel::SimultaneousStart => "SIMULTANEOUS_START",
            RelationLabel::SimultaneousEnd => "SIMULTANEOUS_END",
        }
    }

    /// The label with source and target exchanged.
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            RelationLabel::Before => RelationLabel::After,
            RelationLabel::After => RelationLabel::Before,
            RelationLabel::IBefore => RelationLabel::IAfter,
            RelationLabel::IAfter => RelationLabel::IBefore,
            RelationLabel::Includes => RelationLabel::IsIncluded,
            RelationLabel::IsIncluded => RelationLabel::Includes,
            RelationLabel::Begins => RelationLabel::BegunBy,
            RelationLabel::BegunBy => RelationLabel::Begins,
            RelationLabel::Ends => RelationLabel::EndedBy,
            RelationLabel::EndedBy => RelationLabel::Ends,
            RelationLabel::Overlap
            | RelationLabel::Simultaneous
            | RelationLabel::SimultaneousStart
            | RelationLabel::SimultaneousEnd => self,
        }
    }

    /// True if the label is its own reverse.
    #[must_use]
    pub fn is_symmetric(self) -> bool {
        self.reverse() == self
    }

    /// True for the label kept when canonicalizing an inverse pair.
    #[must_use]
    pub fn is_forward(self) -> bool {
        matches!(
            self,
            RelationLabel::Before
                | RelationLabel::IBefore
                | RelationLabel::Includes
                | RelationLabel::Begins
                | RelationLabel::Ends
        )
    }

    /// Endpoint constraints that hold exactly when the label holds.
    #[must_use]
    pub fn requirements(self) -> &'static [Requirement] {
        const BEFORE: &[Requirement] = &[req(0, End, Less, 1, Start)];
        const AFTER: &[Requirement] = &[req(1, End, Less, 0, Start)];
        const IBEFORE: &[Requirement] = &[req(0, End, Equal, 1, Start)];
        const IAFTER: &[Requirement] = &[req(0, Start, Equal, 1, End)];
        const INCLUDES: &[Requirement] = &[req(0, Start, Less, 1, Start), req(1, End, Less, 0, End)];
        const IS_INCLUDED: &[Requirement] =
            &[req(1, Start, Less, 0, Start), req(0, End, Less, 1, End)];
        const SIMULTANEOUS_START: &[Requirement] = &[req(0, Start, Equal, 1, Start)];
        const SIMULTANEOUS_END: &[Requirement] = &[req(0, End, Equal, 1, End)];
        const BEGINS: &[Requirement] = &[req(0, Start, Equal, 1, Start), req(0, End, Less, 1, End)];
        const BEGUN_BY: &[Requirement] =
            &[req(0, Start, Equal, 1, Start), req(1, End, Less, 0, End)];
        const ENDS: &[Requirement] = &[req(1, Start, Less, 0, Start), req(0, End, Equal, 1, End)];
        const ENDED_BY: &[Requirement] =
            &[req(0, Start, Less, 1, Start), req(0, End, Equal, 1, End)];
        const SIMULTANEOUS: &[Requirement] =
            &[req(0, Start, Equal, 1, Start), req(0, End, Equal, 1, End)];
        const OVERLAP: &[Requirement] = &[req(0, Start, Less, 1, End), req(1, Start, Less, 0, End)];

        match self {
            RelationLabel::Before => BEFORE,
            RelationLabel::After => AFTER,
            RelationLabel::IBefore => IBEFORE,
            RelationLabel::IAfter => IAFTER,
            RelationLabel::Includes => INCLUDES,
            RelationLabel::IsIncluded => IS_INCLUDED,
            RelationLabel::SimultaneousStart => SIMULTANEOUS_START,
            RelationLabel::SimultaneousEnd => SIMULTANEOUS_END,
            RelationLabel::Begins => BEGINS,
            RelationLabel::BegunBy => BEGUN_BY,
            RelationLabel::Ends => ENDS,
            RelationLabel::EndedBy => ENDED_BY,
            RelationLabel::Simultaneous => SIMULTANEOUS,
            RelationLabel::Overlap => OVERLAP,
        }
    }
}

impl fmt::Display for RelationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for RelationLabel {
    type Err = Error;

    /// Parse a label, accepting the annotation-guideline aliases.
    fn from_str(s: &str) -> Result<Self> {
        let label = match s {
            "CONTAINS" => RelationLabel::Includes,
            "BEGINS-ON" => RelationLabel::SimultaneousStart,
            "ENDS-ON" => RelationLabel::SimultaneousEnd,
            "IDENTITY" | "DURING" | "DURING_INV" => RelationLabel::Simultaneous,
            _ => RelationLabel::ALL
                .into_iter()
                .find(|label| label.name() == s)
                .ok_or_else(|| Error::parse(format!("unknown temporal relation {s:?}")))?,
        };
        Ok(label)
    }
}

// =============================================================================
// Facts
// =============================================================================

/// A canonical `(source, target, name, label)` relation.
///
/// Intervals are opaque keys; names keep differently-named relations apart
/// (e.g. `TLINK:Type` vs `ALINK:Type`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemporalFact<I, N> {
    source: I,
    target: I,
    name: N,
    label: RelationLabel,
}

impl<I: Ord, N> TemporalFact<I, N> {
    /// Create a fact in canonical orientation.
    pub fn new(source: I, target: I, name: N, label: RelationLabel) -> Self {
        let swap = if label.is_symmetric() {
            target < source
        } else {
            !label.is_forward()
        };
        if swap {
            Self {
                source: target,
                target: source,
                name,
                label: label.reverse(),
            }
        } else {
            Self {
                source,
                target,
                name,
                label,
            }
        }
    }
}

impl<I, N> TemporalFact<I, N> {
    /// Source interval.
    pub fn source(&self) -> &I {
        &self.source
    }

    /// Target interval.
    pub fn target(&self) -> &I {
        &self.target
    }

    /// Relation name.
    pub fn name(&self) -> &N {
        &self.name
    }

    /// Label, relative to `source` and `target`.
    pub fn label(&self) -> RelationLabel {
        self.label
    }
}

// =============================================================================
// Closure
// =============================================================================

type Point = usize;

fn point(interval: usize, side: Endpoint) -> Point {
    match side {
        Endpoint::Start => interval * 2,
        Endpoint::End => interval * 2 + 1,
    }
}

/// Point facts closed under composition.
#[derive(Debug, Default)]
struct PointGraph {
    facts: HashSet<(Point, PointRelation, Point)>,
    outgoing: HashMap<Point, Vec<(PointRelation, Point)>>,
    incoming: HashMap<Point, Vec<(Point, PointRelation)>>,
    pending: VecDeque<(Point, PointRelation, Point)>,
}

impl PointGraph {
    fn insert(&mut self, from: Point, relation: PointRelation, to: Point) {
        if self.facts.insert((from, relation, to)) {
            self.outgoing.entry(from).or_default().push((relation, to));
            self.incoming.entry(to).or_default().push((from, relation));
            self.pending.push_back((from, relation, to));
        }
    }

    fn close(&mut self) {
        while let Some((a, r1, b)) = self.pending.pop_front() {
            let after: Vec<(PointRelation, Point)> =
                self.outgoing.get(&b).cloned().unwrap_or_default();
            for (r2, c) in after {
                self.insert(a, r1.compose(r2), c);
            }
            let before: Vec<(Point, PointRelation)> =
                self.incoming.get(&a).cloned().unwrap_or_default();
            for (z, r0) in before {
                self.insert(z, r0.compose(r1), b);
            }
        }
    }

    fn holds(&self, from: Point, relation: PointRelation, to: Point) -> bool {
        self.facts.contains(&(from, relation, to))
    }
}

/// All facts entailed by `facts`, the input included.
///
/// Only pairs of intervals that share a relation name in the input are
/// related, and only under the names they share. An interval is paired with
/// itself too, so every interval overlaps itself under each of its names.
pub fn closure<'a, I, N>(
    facts: impl IntoIterator<Item = &'a TemporalFact<I, N>>,
) -> HashSet<TemporalFact<I, N>>
where
    I: Clone + Eq + Hash + Ord + 'a,
    N: Clone + Eq + Hash + Ord + 'a,
{
    let mut intervals: Vec<I> = Vec::new();
    let mut index: HashMap<I, usize> = HashMap::new();
    let mut names: Vec<BTreeSet<N>> = Vec::new();
    let mut graph = PointGraph::default();

    for fact in facts {
        let mut args = [0usize; 2];
        for (slot, interval) in args.iter_mut().zip([&fact.source, &fact.target]) {
            *slot = *index.entry(interval.clone()).or_insert_with(|| {
                intervals.push(interval.clone());
                names.push(BTreeSet::new());
                intervals.len() - 1
            });
            names[*slot].insert(fact.name.clone());
            graph.insert(point(*slot, Start), Less, point(*slot, End));
        }
        for requirement in fact.label.requirements() {
            let left = point(args[requirement.left.0], requirement.left.1);
            let right = point(args[requirement.right.0], requirement.right.1);
            graph.insert(left, requirement.relation, right);
            if requirement.relation == Equal {
                graph.insert(right, Equal, left);
            }
        }
    }
    graph.close();

    let pairs: HashSet<(usize, usize)> = graph
        .facts
        .iter()
        .map(|&(from, _, to)| (from / 2, to / 2))
        .flat_map(|(i, j)| [(i, j), (j, i)])
        .collect();

    let mut result = HashSet::new();
    for (i, j) in pairs {
        let shared: Vec<&N> = names[i].intersection(&names[j]).collect();
        if shared.is_empty() {
            continue;
        }
        let args = [i, j];
        for label in RelationLabel::ALL {
            let entailed = label.requirements().iter().all(|requirement| {
                graph.holds(
                    point(args[requirement.left.0], requirement.left.1),
                    requirement.relation,
                    point(args[requirement.right.0], requirement.right.1),
                )
            });
            if entailed {
                for name in &shared {
                    result.insert(TemporalFact::new(
                        intervals[i].clone(),
                        intervals[j].clone(),
                        (*name).clone(),
                        label,
                    ));
                }
            }
        }
    }
    result
}

// =============================================================================
// Scores
// =============================================================================

/// A relation view as a fact: two argument spans, a name, a label.
pub type ViewFact = TemporalFact<Vec<Span>, ViewName>;

/// Convert a relation view, or explain why it cannot take part in closure.
pub fn view_fact(view: &View) -> Result<ViewFact> {
    let (source, target) = match &view.spans {
        Spans::Relation(args) if args.len() == 2 => (args[0].clone(), args[1].clone()),
        _ => {
            return Err(Error::invalid_input(format!(
                "invalid spans for temporal closure {view}"
            )))
        }
    };
    let label = view
        .value
        .as_text()
        .ok_or_else(|| Error::invalid_input(format!("invalid relation for temporal closure {view}")))?
        .parse::<RelationLabel>()
        .map_err(|_| Error::invalid_input(format!("invalid relation for temporal closure {view}")))?;
    Ok(TemporalFact::new(source, target, view.name.clone(), label))
}

fn valid_facts(views: &ViewSet) -> HashMap<ViewFact, &View> {
    let mut facts = HashMap::new();
    for view in views {
        match view_fact(view) {
            Ok(fact) => {
                facts.entry(fact).or_insert(view);
            }
            Err(e) => log::warn!("{e}"),
        }
    }
    facts
}

/// Scores relations by entailment under temporal closure.
///
/// Only meaningful for a single relation property whose values are
/// temporal labels (e.g. `TLINK:Type`). Views that are not binary
/// relations with a known label are skipped with a warning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalClosureScores {
    reference: usize,
    predicted: usize,
    precision_correct: usize,
    recall_correct: usize,
}

impl TemporalClosureScores {
    /// Predicted facts entailed by the reference.
    #[must_use]
    pub fn precision_correct(&self) -> usize {
        self.precision_correct
    }

    /// Reference facts entailed by the prediction.
    #[must_use]
    pub fn recall_correct(&self) -> usize {
        self.recall_correct
    }

    /// Score canonical facts directly.
    pub fn add_facts<I, N>(
        &mut self,
        reference: &HashSet<TemporalFact<I, N>>,
        predicted: &HashSet<TemporalFact<I, N>>,
    ) where
        I: Clone + Eq + Hash + Ord,
        N: Clone + Eq + Hash + Ord,
    {
        let reference_closure = closure(reference);
        let predicted_closure = closure(predicted);
        self.count(reference, predicted, &reference_closure, &predicted_closure);
    }

    fn count<I, N>(
        &mut self,
        reference: &HashSet<TemporalFact<I, N>>,
        predicted: &HashSet<TemporalFact<I, N>>,
        reference_closure: &HashSet<TemporalFact<I, N>>,
        predicted_closure: &HashSet<TemporalFact<I, N>>,
    ) where
        I: Eq + Hash,
        N: Eq + Hash,
    {
        self.reference += reference.len();
        self.predicted += predicted.len();
        self.precision_correct += predicted
            .iter()
            .filter(|fact| reference_closure.contains(*fact))
            .count();
        self.recall_correct += reference
            .iter()
            .filter(|fact| predicted_closure.contains(*fact))
            .count();
    }
}

impl Accumulator for TemporalClosureScores {
    fn add(&mut self, reference: &ViewSet, predicted: &ViewSet) -> Discrepancies {
        let reference = valid_facts(reference);
        let predicted = valid_facts(predicted);
        let reference_facts: HashSet<ViewFact> = reference.keys().cloned().collect();
        let predicted_facts: HashSet<ViewFact> = predicted.keys().cloned().collect();
        let reference_closure = closure(&reference_facts);
        let predicted_closure = closure(&predicted_facts);
        self.count(
            &reference_facts,
            &predicted_facts,
            &reference_closure,
            &predicted_closure,
        );

        let mut missed: Vec<View> = reference
            .iter()
            .filter(|(fact, _)| !predicted_closure.contains(*fact))
            .map(|(_, view)| (*view).clone())
            .collect();
        let mut added: Vec<View> = predicted
            .iter()
            .filter(|(fact, _)| !reference_closure.contains(*fact))
            .map(|(_, view)| (*view).clone())
            .collect();
        missed.sort();
        added.sort();
        Discrepancies { missed, added }
    }

    fn update(&mut self, other: &Self) {
        self.reference += other.reference;
        self.predicted += other.predicted;
        self.precision_correct += other.precision_correct;
        self.recall_correct += other.recall_correct;
    }

    fn reference(&self) -> usize {
        self.reference
    }

    fn predicted(&self) -> usize {
        self.predicted
    }

    fn precision(&self) -> f64 {
        ratio(self.precision_correct, self.predicted)
    }

    fn recall(&self) -> f64 {
        ratio(self.recall_correct, self.reference)
    }

    fn correct_summary(&self) -> String {
        format!("({}, {})", self.precision_correct, self.recall_correct)
    }
}
