//! Property tests for score accumulation and temporal closure.

use anafora::eval::{
    closure, score_data, Accumulator, Matching, RelationLabel, Scores, ScoringConfig,
    TemporalFact,
};
use anafora::{Annotation, AnnotationSet};
use proptest::prelude::*;

fn scores() -> impl Strategy<Value = Scores> {
    (0usize..500, 0usize..500).prop_flat_map(|(reference, predicted)| {
        (0..=reference.min(predicted))
            .prop_map(move |correct| Scores::new(reference, predicted, correct))
    })
}

fn fact() -> impl Strategy<Value = TemporalFact<u8, u8>> {
    (0u8..6, 0u8..6, 0u8..2, prop::sample::select(RelationLabel::ALL.to_vec()))
        .prop_map(|(source, target, name, label)| TemporalFact::new(source, target, name, label))
}

fn merged(parts: &[Scores]) -> Scores {
    let mut total = Scores::default();
    for part in parts {
        total.update(part);
    }
    total
}

proptest! {
    #[test]
    fn test_update_commutes(a in scores(), b in scores()) {
        prop_assert_eq!(merged(&[a, b]), merged(&[b, a]));
    }

    #[test]
    fn test_update_associates(a in scores(), b in scores(), c in scores()) {
        let mut left = merged(&[a, b]);
        left.update(&c);
        let mut right = a;
        right.update(&merged(&[b, c]));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn test_chunked_accumulation_matches_whole(
        parts in prop::collection::vec(scores(), 0..20),
        split in 0usize..20,
    ) {
        let split = split.min(parts.len());
        let mut chunked = merged(&parts[..split]);
        chunked.update(&merged(&parts[split..]));
        prop_assert_eq!(chunked, merged(&parts));
    }

    #[test]
    fn test_metrics_bounded(s in scores()) {
        let (p, r, f1) = (s.precision(), s.recall(), s.f1());
        prop_assert!((0.0..=1.0).contains(&p));
        prop_assert!((0.0..=1.0).contains(&r));
        prop_assert!(f1 >= p.min(r) - 1e-9);
        prop_assert!(f1 <= p.max(r) + 1e-9);
    }

    #[test]
    fn test_closure_contains_input_and_is_idempotent(
        facts in prop::collection::hash_set(fact(), 0..8),
    ) {
        let once = closure(&facts);
        prop_assert!(facts.is_subset(&once));
        prop_assert_eq!(closure(&once), once);
    }

    #[test]
    fn test_document_scored_against_itself_is_perfect(
        spans in prop::collection::vec((0usize..50, 1usize..10), 1..8),
        overlap in any::<bool>(),
    ) {
        let data = AnnotationSet::from_annotations(
            spans.iter().enumerate().map(|(i, &(start, width))| {
                Annotation::entity(i.to_string(), if i % 2 == 0 { "X" } else { "Y" }, [(start, start + width)])
                    .with_property("Polarity", if start % 2 == 0 { "POS" } else { "NEG" })
            }),
        )
        .unwrap();
        let matching = if overlap { Matching::Overlap } else { Matching::Exact };
        let config = ScoringConfig::new().with_matching(matching);

        let named = score_data::<Scores>(&data, Some(&data), &config);
        prop_assert!(!named.is_empty());
        for scores in named.values() {
            prop_assert_eq!(scores.correct(), scores.reference());
            prop_assert_eq!(scores.reference(), scores.predicted());
        }
    }
}

#[test]
fn test_empty_scores_are_perfect() {
    let s = Scores::default();
    assert_eq!((s.precision(), s.recall(), s.f1()), (1.0, 1.0, 1.0));
}
