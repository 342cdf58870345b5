//! Temporal closure scoring over hand-built timelines and annotated documents.

use anafora::eval::{
    closure, score_data, Accumulator, RelationLabel, ScoringConfig, TemporalClosureScores,
    TemporalFact, ViewName,
};
use anafora::{Annotation, AnnotationSet};
use std::collections::HashSet;

type Fact = TemporalFact<&'static str, ()>;

fn facts(triples: &[(&'static str, &'static str, &str)]) -> HashSet<Fact> {
    triples
        .iter()
        .map(|&(source, target, label)| {
            TemporalFact::new(source, target, (), label.parse().unwrap())
        })
        .collect()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_closure_precision_and_recall() {
    let reference = facts(&[
        ("A", "B", "BEFORE"),
        ("B", "C", "IS_INCLUDED"),
        ("D", "C", "INCLUDES"),
        ("E", "D", "CONTAINS"),
        ("F", "E", "AFTER"),
        ("G", "H", "BEGINS-ON"),
        ("I", "G", "BEFORE"),
        ("J", "K", "IBEFORE"),
        ("K", "L", "BEGUN_BY"),
        ("L", "K", "BEGINS"),
    ]);
    let predicted = facts(&[
        ("A", "B", "BEFORE"),
        ("A", "B", "BEFORE"),
        ("B", "A", "AFTER"),
        ("B", "E", "CONTAINS"),
        ("B", "E", "INCLUDES"),
        ("B", "F", "BEFORE"),
        ("F", "D", "AFTER"),
        ("H", "I", "AFTER"),
        ("J", "L", "IBEFORE"),
        ("K", "L", "BEGUN_BY"),
    ]);

    let mut scores = TemporalClosureScores::default();
    scores.add_facts(&reference, &predicted);

    assert_eq!(scores.reference(), 9);
    assert_eq!(scores.predicted(), 7);
    assert_eq!(scores.precision_correct(), 6);
    assert_eq!(scores.recall_correct(), 4);
    assert!(approx(scores.precision(), 6.0 / 7.0));
    assert!(approx(scores.recall(), 4.0 / 9.0));
    assert_eq!(scores.correct_summary(), "(6, 4)");
}

#[test]
fn test_inverse_is_entailed() {
    let closed = closure(&facts(&[("B", "C", "IS_INCLUDED")]));
    assert!(closed.contains(&TemporalFact::new("C", "B", (), RelationLabel::Includes)));
    assert!(closed.contains(&TemporalFact::new("B", "C", (), RelationLabel::IsIncluded)));
}

#[test]
fn test_before_then_includes() {
    let closed = closure(&facts(&[("A", "B", "BEFORE"), ("B", "C", "INCLUDES")]));
    assert!(closed.contains(&TemporalFact::new("A", "C", (), RelationLabel::Before)));
    assert!(closed.contains(&TemporalFact::new("C", "A", (), RelationLabel::After)));
}

#[test]
fn test_closure_is_idempotent() {
    let input = facts(&[
        ("A", "B", "BEFORE"),
        ("B", "C", "INCLUDES"),
        ("C", "D", "SIMULTANEOUS"),
        ("D", "E", "IBEFORE"),
    ]);
    let once = closure(&input);
    let twice = closure(&once);
    assert_eq!(once, twice);
    assert!(input.is_subset(&once));
}

#[test]
fn test_unrelated_intervals_stay_unrelated() {
    let closed = closure(&facts(&[("A", "B", "BEFORE"), ("C", "D", "BEFORE")]));
    assert!(!closed.iter().any(|fact| {
        let pair = [*fact.source(), *fact.target()];
        pair.contains(&"A") && pair.contains(&"C")
    }));
}

#[test]
fn test_same_interval_fact_is_kept() {
    let input = facts(&[("A", "A", "SIMULTANEOUS")]);
    let closed = closure(&input);
    assert!(input.is_subset(&closed));
    assert!(closed.contains(&TemporalFact::new("A", "A", (), RelationLabel::Overlap)));
}

fn timeline(id: &str, links: &[(&str, &str, &str)]) -> AnnotationSet {
    let mut annotations = vec![
        Annotation::entity(format!("{id}e1"), "EVENT", [(0, 5)]),
        Annotation::entity(format!("{id}e2"), "EVENT", [(10, 15)]),
        Annotation::entity(format!("{id}e3"), "EVENT", [(20, 25)]),
    ];
    for (i, (source, target, label)) in links.iter().enumerate() {
        annotations.push(
            Annotation::relation(format!("{id}t{i}"), "TLINK")
                .with_reference("Source", format!("{id}{source}"))
                .with_reference("Target", format!("{id}{target}"))
                .with_property("Type", *label),
        );
    }
    AnnotationSet::from_annotations(annotations).unwrap()
}

#[test]
fn test_documents_scored_by_entailment() {
    let reference = timeline("r", &[("e1", "e2", "BEFORE"), ("e2", "e3", "BEFORE")]);
    let predicted = timeline("p", &[("e3", "e1", "AFTER")]);
    let config = ScoringConfig::new().with_include(["TLINK:Type".parse().unwrap()]);

    let named = score_data::<TemporalClosureScores>(&reference, Some(&predicted), &config);
    let scores = &named[&ViewName::property("TLINK", "Type")];
    assert_eq!((scores.reference(), scores.predicted()), (2, 1));
    assert!(approx(scores.precision(), 1.0));
    assert!(approx(scores.recall(), 0.0));
    assert!(!named.contains_key(&ViewName::of_type("TLINK")));
    assert!(!named.contains_key(&ViewName::span("TLINK")));
}

#[test]
fn test_full_prediction_recovers_recall() {
    let reference = timeline("r", &[("e1", "e2", "BEFORE"), ("e2", "e3", "BEFORE")]);
    let predicted = timeline(
        "p",
        &[("e1", "e2", "BEFORE"), ("e2", "e3", "BEFORE"), ("e1", "e3", "BEFORE")],
    );
    let config = ScoringConfig::new().with_include(["TLINK:Type".parse().unwrap()]);

    let named = score_data::<TemporalClosureScores>(&reference, Some(&predicted), &config);
    let scores = &named[&ViewName::property("TLINK", "Type")];
    assert_eq!(scores.correct_summary(), "(3, 2)");
    assert!(approx(scores.f1(), 1.0));
}

#[test]
fn test_link_between_same_span_entities() {
    let data = AnnotationSet::from_annotations([
        Annotation::entity("e", "EVENT", [(0, 5)]),
        Annotation::entity("t", "TIMEX3", [(0, 5)]),
        Annotation::relation("l", "TLINK")
            .with_reference("Source", "e")
            .with_reference("Target", "t")
            .with_property("Type", "SIMULTANEOUS"),
    ])
    .unwrap();
    let config = ScoringConfig::new().with_include(["TLINK:Type".parse().unwrap()]);

    let named = score_data::<TemporalClosureScores>(&data, Some(&data), &config);
    let scores = &named[&ViewName::property("TLINK", "Type")];
    assert_eq!((scores.reference(), scores.predicted()), (1, 1));
    assert_eq!(scores.correct_summary(), "(1, 1)");
    assert!(approx(scores.f1(), 1.0));
}
