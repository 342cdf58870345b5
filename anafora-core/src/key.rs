//! Structural keys: order-independent, cycle-safe equality for annotations.
//!
//! Annotations are compared by content, never by id. Two annotations are
//! equal when their spans, type, parents type and properties are equal,
//! where a property that points at another annotation compares that
//! annotation's content in turn.
//!
//! # Normal Form
//!
//! | Input | Key |
//! |-------|-----|
//! | string, integer | `Text`, `Int` (unchanged) |
//! | sequence, set | `Bag` (sorted, so order is ignored) |
//! | mapping | `Bag` of `Entry(key, value)` |
//! | span list | `Spans` (offsets sorted, relation arguments positional) |
//! | annotation | `Bag` of spans, type, parents type, properties |
//!
//! # Cycles
//!
//! While a key is being built, the annotations on the current path are
//! remembered. Meeting one of them again yields [`StructuralKey::Null`]
//! instead of recursing, so every key is finite.
//!
//! ```text
//! e1 ──self──► e1        key(e1) = {spans, type, null, {("self", Null)}}
//! e2 ──self──► e2        key(e2) = {spans, type, null, {("self", Null)}}
//! ```
//!
//! Two cyclic graphs of different shape may collapse to the same key once
//! their cycles are cut. Equality stays an equivalence relation, but it is
//! not guaranteed to tell such graphs apart.

use crate::annotation::{AnnotationRef, PropertyValue, Resolved, Spans};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Hashable, order-independent form of a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructuralKey {
    /// Missing value, or an annotation already on the traversal path.
    Null,
    /// Integer scalar.
    Int(i64),
    /// String scalar.
    Text(String),
    /// Offsets, compared positionally.
    Spans(Spans),
    /// One `(key, value)` item of a mapping.
    Entry(Box<StructuralKey>, Box<StructuralKey>),
    /// Unordered multiset, stored sorted.
    Bag(Vec<StructuralKey>),
}

impl StructuralKey {
    /// Key of any [`Structural`] value.
    #[must_use]
    pub fn of<T: Structural + ?Sized>(value: &T) -> Self {
        value.structural_key(&mut KeyBuilder::new())
    }

    /// Build a bag from unordered items.
    pub fn bag(items: impl IntoIterator<Item = StructuralKey>) -> Self {
        let mut items: Vec<StructuralKey> = items.into_iter().collect();
        items.sort();
        StructuralKey::Bag(items)
    }

    /// Build a mapping entry.
    #[must_use]
    pub fn entry(key: StructuralKey, value: StructuralKey) -> Self {
        StructuralKey::Entry(Box::new(key), Box::new(value))
    }

    /// Compare with a custom equality for span leaves.
    ///
    /// Bags are equal when they have the same size and each item can be
    /// paired with a distinct item of the other bag. Pairing is greedy, which
    /// is exact whenever `span_eq` is an equivalence.
    pub fn eq_by<F>(&self, other: &Self, span_eq: &F) -> bool
    where
        F: Fn(&Spans, &Spans) -> bool,
    {
        match (self, other) {
            (StructuralKey::Spans(a), StructuralKey::Spans(b)) => span_eq(a, b),
            (StructuralKey::Entry(k1, v1), StructuralKey::Entry(k2, v2)) => {
                k1.eq_by(k2, span_eq) && v1.eq_by(v2, span_eq)
            }
            (StructuralKey::Bag(a), StructuralKey::Bag(b)) => {
                if a.len() != b.len() {
                    return false;
                }
                let mut used = vec![false; b.len()];
                a.iter().all(|item| {
                    for (i, candidate) in b.iter().enumerate() {
                        if !used[i] && item.eq_by(candidate, span_eq) {
                            used[i] = true;
                            return true;
                        }
                    }
                    false
                })
            }
            _ => self == other,
        }
    }
}

/// Tracks the annotations on the current traversal path.
#[derive(Debug, Default)]
pub struct KeyBuilder {
    visiting: HashSet<(usize, usize)>,
}

impl KeyBuilder {
    /// Create a builder with an empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `build` unless `identity` is already on the path.
    fn guarded<F>(&mut self, identity: (usize, usize), build: F) -> StructuralKey
    where
        F: FnOnce(&mut Self) -> StructuralKey,
    {
        if !self.visiting.insert(identity) {
            return StructuralKey::Null;
        }
        let key = build(self);
        self.visiting.remove(&identity);
        key
    }
}

/// Values that have a structural key.
pub trait Structural {
    /// Compute the key, consulting `builder` for cycle detection.
    fn structural_key(&self, builder: &mut KeyBuilder) -> StructuralKey;
}

impl<T: Structural + ?Sized> Structural for &T {
    fn structural_key(&self, builder: &mut KeyBuilder) -> StructuralKey {
        (**self).structural_key(builder)
    }
}

impl Structural for str {
    fn structural_key(&self, _: &mut KeyBuilder) -> StructuralKey {
        StructuralKey::Text(self.to_string())
    }
}

impl Structural for String {
    fn structural_key(&self, _: &mut KeyBuilder) -> StructuralKey {
        StructuralKey::Text(self.clone())
    }
}

impl Structural for i64 {
    fn structural_key(&self, _: &mut KeyBuilder) -> StructuralKey {
        StructuralKey::Int(*self)
    }
}

impl Structural for usize {
    fn structural_key(&self, _: &mut KeyBuilder) -> StructuralKey {
        i64::try_from(*self).map_or_else(|_| StructuralKey::Text(self.to_string()), StructuralKey::Int)
    }
}

impl<T: Structural> Structural for Option<T> {
    fn structural_key(&self, builder: &mut KeyBuilder) -> StructuralKey {
        match self {
            Some(value) => value.structural_key(builder),
            None => StructuralKey::Null,
        }
    }
}

impl<A: Structural, B: Structural> Structural for (A, B) {
    fn structural_key(&self, builder: &mut KeyBuilder) -> StructuralKey {
        StructuralKey::bag([self.0.structural_key(builder), self.1.structural_key(builder)])
    }
}

impl<T: Structural> Structural for [T] {
    fn structural_key(&self, builder: &mut KeyBuilder) -> StructuralKey {
        StructuralKey::bag(self.iter().map(|item| item.structural_key(builder)).collect::<Vec<_>>())
    }
}

impl<T: Structural> Structural for Vec<T> {
    fn structural_key(&self, builder: &mut KeyBuilder) -> StructuralKey {
        self.as_slice().structural_key(builder)
    }
}

impl<T: Structural, S> Structural for HashSet<T, S> {
    fn structural_key(&self, builder: &mut KeyBuilder) -> StructuralKey {
        StructuralKey::bag(self.iter().map(|item| item.structural_key(builder)).collect::<Vec<_>>())
    }
}

impl<T: Structural> Structural for BTreeSet<T> {
    fn structural_key(&self, builder: &mut KeyBuilder) -> StructuralKey {
        StructuralKey::bag(self.iter().map(|item| item.structural_key(builder)).collect::<Vec<_>>())
    }
}

impl<K: Structural, V: Structural, S> Structural for HashMap<K, V, S> {
    fn structural_key(&self, builder: &mut KeyBuilder) -> StructuralKey {
        let entries: Vec<StructuralKey> = self
            .iter()
            .map(|(k, v)| StructuralKey::entry(k.structural_key(builder), v.structural_key(builder)))
            .collect();
        StructuralKey::bag(entries)
    }
}

impl<K: Structural, V: Structural> Structural for BTreeMap<K, V> {
    fn structural_key(&self, builder: &mut KeyBuilder) -> StructuralKey {
        let entries: Vec<StructuralKey> = self
            .iter()
            .map(|(k, v)| StructuralKey::entry(k.structural_key(builder), v.structural_key(builder)))
            .collect();
        StructuralKey::bag(entries)
    }
}

/// Offsets within a mention are unordered; relation arguments stay positional.
impl Structural for Spans {
    fn structural_key(&self, _: &mut KeyBuilder) -> StructuralKey {
        StructuralKey::Spans(self.normalized())
    }
}

/// A stored value on its own: references key as their raw id.
impl Structural for PropertyValue {
    fn structural_key(&self, _: &mut KeyBuilder) -> StructuralKey {
        match self {
            PropertyValue::Text(text) | PropertyValue::Ref(text) => StructuralKey::Text(text.clone()),
        }
    }
}

impl Structural for Resolved<'_> {
    fn structural_key(&self, builder: &mut KeyBuilder) -> StructuralKey {
        match self {
            Resolved::Text(text) => StructuralKey::Text((*text).to_string()),
            Resolved::Annotation(target) => Structural::structural_key(target, builder),
        }
    }
}

impl Structural for AnnotationRef<'_> {
    fn structural_key(&self, builder: &mut KeyBuilder) -> StructuralKey {
        builder.guarded(self.identity(), |builder| {
            let mut properties = Vec::new();
            for (name, value) in self.properties() {
                let value = value.structural_key(builder);
                properties.push(StructuralKey::entry(StructuralKey::Text(name.to_string()), value));
            }
            StructuralKey::bag([
                self.spans().structural_key(builder),
                StructuralKey::Text(self.type_name().to_string()),
                self.parents_type().structural_key(builder),
                StructuralKey::bag(properties),
            ])
        })
    }
}
