//! Annotations and the collection that owns them.
//!
//! # Ownership Model
//!
//! Annotations reference each other through their properties, and those
//! references may form cycles (an annotation may even point at itself).
//! The collection owns every annotation by value; a property only stores the
//! id of the annotation it points at, and the id is resolved through the
//! collection when the property is read.
//!
//! ```text
//! AnnotationSet
//! ├── [0] Entity   id=1  type=EVENT  span=0,5
//! ├── [1] Entity   id=2  type=TIMEX3 span=9,17
//! └── [2] Relation id=3  type=TLINK
//!         ├── Source = Ref("1")  ──► [0]
//!         ├── Target = Ref("2")  ──► [1]
//!         └── Type   = Text("CONTAINS")
//! ```
//!
//! A relation has no spans of its own. Its spans are the spans of its
//! entity-valued properties, ordered by property name, so the relation above
//! covers `((0, 5), (9, 17))`.
//!
//! # Example
//!
//! ```rust
//! use anafora_core::{Annotation, AnnotationSet, PropertyValue, Spans};
//!
//! let mut data = AnnotationSet::new();
//! data.push(Annotation::entity("1", "EVENT", [(0, 5)]))?;
//! data.push(Annotation::entity("2", "TIMEX3", [(9, 17)]))?;
//! data.push(
//!     Annotation::relation("3", "TLINK")
//!         .with_reference("Source", "1")
//!         .with_reference("Target", "2")
//!         .with_property("Type", "CONTAINS"),
//! )?;
//!
//! let tlink = data.get("3").unwrap();
//! assert_eq!(tlink.spans(), Spans::Relation(vec![vec![(0, 5)], vec![(9, 17)]]));
//! # Ok::<(), anafora_core::Error>(())
//! ```

use crate::key::StructuralKey;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A `(start, end)` character offset pair.
pub type Span = (usize, usize);

/// The text covered by an annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Spans {
    /// Offsets of an entity; more than one pair for a discontinuous mention.
    Entity(Vec<Span>),
    /// One offset list per entity argument of a relation, ordered by property name.
    Relation(Vec<Vec<Span>>),
}

impl Spans {
    /// Number of offset pairs (entity) or arguments (relation).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Spans::Entity(spans) => spans.len(),
            Spans::Relation(args) => args.len(),
        }
    }

    /// True if there are no offsets or no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The argument offset lists of a relation, `None` for an entity.
    #[must_use]
    pub fn arguments(&self) -> Option<&[Vec<Span>]> {
        match self {
            Spans::Entity(_) => None,
            Spans::Relation(args) => Some(args),
        }
    }

    /// All offset pairs, flattened across relation arguments.
    #[must_use]
    pub fn offsets(&self) -> Vec<Span> {
        match self {
            Spans::Entity(spans) => spans.clone(),
            Spans::Relation(args) => args.iter().flatten().copied().collect(),
        }
    }

    /// The same spans with the offsets of each mention sorted.
    ///
    /// Relation arguments keep their positions, which follow property names.
    #[must_use]
    pub fn normalized(&self) -> Spans {
        fn sorted(spans: &[Span]) -> Vec<Span> {
            let mut spans = spans.to_vec();
            spans.sort_unstable();
            spans
        }
        match self {
            Spans::Entity(spans) => Spans::Entity(sorted(spans)),
            Spans::Relation(args) => Spans::Relation(args.iter().map(|arg| sorted(arg)).collect()),
        }
    }
}

impl Default for Spans {
    fn default() -> Self {
        Spans::Entity(Vec::new())
    }
}

/// The stored value of a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyValue {
    /// A plain string value.
    Text(String),
    /// The id of another annotation in the same collection.
    Ref(String),
}

impl PropertyValue {
    /// Create a plain string value.
    pub fn text(value: impl Into<String>) -> Self {
        PropertyValue::Text(value.into())
    }

    /// Create a reference to the annotation with the given id.
    pub fn reference(id: impl Into<String>) -> Self {
        PropertyValue::Ref(id.into())
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

/// Entity or relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationKind {
    /// Anchored directly to text.
    Entity {
        /// Offsets of the mention.
        spans: Vec<Span>,
    },
    /// Anchored through the entities it references.
    Relation,
}

/// A single annotation, as stored in an [`AnnotationSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    id: String,
    type_name: String,
    parents_type: Option<String>,
    kind: AnnotationKind,
    properties: Vec<(String, PropertyValue)>,
}

impl Annotation {
    /// Create an entity.
    pub fn entity(
        id: impl Into<String>,
        type_name: impl Into<String>,
        spans: impl IntoIterator<Item = Span>,
    ) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            parents_type: None,
            kind: AnnotationKind::Entity {
                spans: spans.into_iter().collect(),
            },
            properties: Vec::new(),
        }
    }

    /// Create a relation.
    pub fn relation(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            parents_type: None,
            kind: AnnotationKind::Relation,
            properties: Vec::new(),
        }
    }

    /// Set the schema group of this annotation.
    #[must_use]
    pub fn with_parents_type(mut self, parents_type: impl Into<String>) -> Self {
        self.parents_type = Some(parents_type.into());
        self
    }

    /// Set a property. Replacing a property keeps its original position.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert_property(name.into(), value.into());
        self
    }

    /// Set a property that points at another annotation.
    #[must_use]
    pub fn with_reference(self, name: impl Into<String>, id: impl Into<String>) -> Self {
        self.with_property(name, PropertyValue::reference(id))
    }

    /// Unique id within the owning collection.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Type name, e.g. `EVENT` or `TLINK`.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Schema group, if any.
    #[must_use]
    pub fn parents_type(&self) -> Option<&str> {
        self.parents_type.as_deref()
    }

    /// Entity or relation.
    #[must_use]
    pub fn kind(&self) -> &AnnotationKind {
        &self.kind
    }

    /// True for entities.
    #[must_use]
    pub fn is_entity(&self) -> bool {
        matches!(self.kind, AnnotationKind::Entity { .. })
    }

    /// Properties in insertion order, with references unresolved.
    #[must_use]
    pub fn properties(&self) -> &[(String, PropertyValue)] {
        &self.properties
    }

    /// Raw value of a property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    fn insert_property(&mut self, name: String, value: PropertyValue) {
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((name, value)),
        }
    }

    fn references(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().filter_map(|(name, value)| match value {
            PropertyValue::Ref(id) => Some((name.as_str(), id.as_str())),
            PropertyValue::Text(_) => None,
        })
    }
}

/// The annotations of one document.
///
/// Owns every annotation; properties refer to other annotations by id.
/// An annotation can only be referenced once it is in the collection, so
/// a reference never dangles.
#[derive(Debug, Clone, Default)]
pub struct AnnotationSet {
    annotations: Vec<Annotation>,
    index: HashMap<String, usize>,
}

impl AnnotationSet {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection, adding annotations in order.
    pub fn from_annotations(annotations: impl IntoIterator<Item = Annotation>) -> Result<Self> {
        let mut set = Self::new();
        for annotation in annotations {
            set.push(annotation)?;
        }
        Ok(set)
    }

    /// Add an annotation.
    ///
    /// # Errors
    ///
    /// Fails if the id is empty or already used, or if a property refers to
    /// an annotation that is not yet in the collection.
    pub fn push(&mut self, annotation: Annotation) -> Result<()> {
        if annotation.id.is_empty() {
            return Err(Error::invalid_input(format!(
                "no id defined for {} annotation",
                annotation.type_name
            )));
        }
        if self.index.contains_key(&annotation.id) {
            return Err(Error::duplicate_id(annotation.id));
        }
        for (property, id) in annotation.references() {
            if !self.index.contains_key(id) {
                return Err(Error::unknown_reference(property, id));
            }
        }
        self.index.insert(annotation.id.clone(), self.annotations.len());
        self.annotations.push(annotation);
        Ok(())
    }

    /// Set a property on an annotation already in the collection.
    ///
    /// This is the only way to create a self-reference: add the annotation
    /// first, then point one of its properties at it.
    ///
    /// # Errors
    ///
    /// Fails if `id` is unknown, or if `value` refers to an annotation that
    /// is not in the collection.
    pub fn set_property(
        &mut self,
        id: &str,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        let name = name.into();
        let value = value.into();
        if let PropertyValue::Ref(target) = &value {
            if !self.index.contains_key(target) {
                return Err(Error::unknown_reference(name, target.clone()));
            }
        }
        let index = *self.index.get(id).ok_or_else(|| Error::not_found(id))?;
        self.annotations[index].insert_property(name, value);
        Ok(())
    }

    /// Look up an annotation by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<AnnotationRef<'_>> {
        self.index
            .get(id)
            .map(|&index| AnnotationRef { set: self, index })
    }

    /// Annotations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = AnnotationRef<'_>> + '_ {
        (0..self.annotations.len()).map(move |index| AnnotationRef { set: self, index })
    }

    /// Annotations of one type, in insertion order.
    pub fn select_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = AnnotationRef<'a>> + 'a {
        self.iter().filter(move |a| a.type_name() == type_name)
    }

    /// Number of annotations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// True if there are no annotations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Resolve a stored property value against this collection.
    ///
    /// A reference whose target is missing reads as its raw id.
    #[must_use]
    pub fn resolve<'a>(&'a self, value: &'a PropertyValue) -> Resolved<'a> {
        match value {
            PropertyValue::Text(text) => Resolved::Text(text),
            PropertyValue::Ref(id) => self
                .get(id)
                .map_or(Resolved::Text(id), Resolved::Annotation),
        }
    }

    /// First annotation whose references lead back to itself.
    #[must_use]
    pub fn find_self_referential(&self) -> Option<AnnotationRef<'_>> {
        (0..self.annotations.len())
            .find(|&index| self.reaches(index, index))
            .map(|index| AnnotationRef { set: self, index })
    }

    fn reaches(&self, from: usize, target: usize) -> bool {
        let mut stack: Vec<usize> = self.referenced(from).collect();
        let mut seen = HashSet::new();
        while let Some(index) = stack.pop() {
            if index == target {
                return true;
            }
            if seen.insert(index) {
                stack.extend(self.referenced(index));
            }
        }
        false
    }

    fn referenced(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.annotations[index]
            .references()
            .filter_map(|(_, id)| self.index.get(id).copied())
    }
}

/// A property value with references resolved.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    /// Plain string.
    Text(&'a str),
    /// Another annotation of the same collection.
    Annotation(AnnotationRef<'a>),
}

impl<'a> Resolved<'a> {
    /// The string value, if this is not an annotation.
    #[must_use]
    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            Resolved::Text(text) => Some(text),
            Resolved::Annotation(_) => None,
        }
    }

    /// The referenced annotation, if any.
    #[must_use]
    pub fn as_annotation(&self) -> Option<AnnotationRef<'a>> {
        match self {
            Resolved::Text(_) => None,
            Resolved::Annotation(annotation) => Some(*annotation),
        }
    }
}

/// A borrowed view of one annotation inside its collection.
///
/// Equality and hashing are structural: two annotations are equal when
/// their [`StructuralKey`]s are equal, regardless of their ids.
#[derive(Clone, Copy)]
pub struct AnnotationRef<'a> {
    set: &'a AnnotationSet,
    index: usize,
}

impl<'a> AnnotationRef<'a> {
    /// The stored annotation.
    #[must_use]
    pub fn annotation(&self) -> &'a Annotation {
        &self.set.annotations[self.index]
    }

    /// The owning collection.
    #[must_use]
    pub fn set(&self) -> &'a AnnotationSet {
        self.set
    }

    /// Identity of this annotation: owning collection plus position.
    pub(crate) fn identity(&self) -> (usize, usize) {
        (std::ptr::from_ref(self.set) as usize, self.index)
    }

    /// Unique id within the collection.
    #[must_use]
    pub fn id(&self) -> &'a str {
        &self.annotation().id
    }

    /// Type name.
    #[must_use]
    pub fn type_name(&self) -> &'a str {
        &self.annotation().type_name
    }

    /// Schema group, if any.
    #[must_use]
    pub fn parents_type(&self) -> Option<&'a str> {
        self.annotation().parents_type.as_deref()
    }

    /// True for entities.
    #[must_use]
    pub fn is_entity(&self) -> bool {
        self.annotation().is_entity()
    }

    /// Covered offsets.
    ///
    /// Entities return their stored offsets; relations collect the offsets
    /// of their entity-valued properties, sorted by property name.
    #[must_use]
    pub fn spans(&self) -> Spans {
        match &self.annotation().kind {
            AnnotationKind::Entity { spans } => Spans::Entity(spans.clone()),
            AnnotationKind::Relation => {
                let mut properties: Vec<&(String, PropertyValue)> =
                    self.annotation().properties.iter().collect();
                properties.sort_by(|a, b| a.0.cmp(&b.0));
                Spans::Relation(
                    properties
                        .into_iter()
                        .filter_map(|(_, value)| match self.set.resolve(value) {
                            Resolved::Annotation(target) => match target.annotation().kind() {
                                AnnotationKind::Entity { spans } => Some(spans.clone()),
                                AnnotationKind::Relation => None,
                            },
                            Resolved::Text(_) => None,
                        })
                        .collect(),
                )
            }
        }
    }

    /// Properties in insertion order, with references resolved.
    pub fn properties(&self) -> impl Iterator<Item = (&'a str, Resolved<'a>)> + 'a {
        let set = self.set;
        self.annotation()
            .properties
            .iter()
            .map(move |(name, value)| (name.as_str(), set.resolve(value)))
    }

    /// A single resolved property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<Resolved<'a>> {
        self.annotation()
            .property(name)
            .map(|value| self.set.resolve(value))
    }

    /// The structural key of this annotation.
    #[must_use]
    pub fn key(&self) -> StructuralKey {
        StructuralKey::of(self)
    }
}

impl fmt::Debug for AnnotationRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationRef")
            .field("id", &self.id())
            .field("type", &self.type_name())
            .field("spans", &self.spans())
            .finish()
    }
}

impl PartialEq for AnnotationRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for AnnotationRef<'_> {}

impl Hash for AnnotationRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linked() -> AnnotationSet {
        AnnotationSet::from_annotations([
            Annotation::entity("1", "X", [(0, 5)]),
            Annotation::entity("2", "Y", [(5, 10)]),
            Annotation::relation("3", "Z")
                .with_reference("Target", "2")
                .with_reference("Source", "1")
                .with_property("Prop1", "T"),
        ])
        .unwrap()
    }

    #[test]
    fn test_relation_spans_sorted_by_property_name() {
        let data = linked();
        let relation = data.get("3").unwrap();
        assert_eq!(
            relation.spans(),
            Spans::Relation(vec![vec![(0, 5)], vec![(5, 10)]])
        );
    }

    #[test]
    fn test_relation_spans_skip_relation_arguments() {
        let mut data = linked();
        data.push(Annotation::relation("4", "Ref").with_reference("Ref", "3"))
            .unwrap();
        assert_eq!(data.get("4").unwrap().spans(), Spans::Relation(vec![]));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut data = linked();
        let err = data.push(Annotation::entity("1", "X", [(0, 1)])).unwrap_err();
        assert_eq!(err, Error::duplicate_id("1"));
    }

    #[test]
    fn test_empty_id_rejected() {
        let mut data = AnnotationSet::new();
        let err = data.push(Annotation::entity("", "X", Vec::new())).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(data.is_empty());
    }

    #[test]
    fn test_forward_reference_rejected() {
        let mut data = AnnotationSet::new();
        let err = data
            .push(Annotation::relation("1", "Z").with_reference("Source", "2"))
            .unwrap_err();
        assert_eq!(err, Error::unknown_reference("Source", "2"));

        data.push(Annotation::entity("3", "X", [(0, 1)])).unwrap();
        let err = data
            .set_property("3", "link", PropertyValue::reference("4"))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownReference { .. }));
    }

    #[test]
    fn test_set_property_on_missing_annotation() {
        let mut data = AnnotationSet::new();
        let err = data.set_property("9", "name", "value").unwrap_err();
        assert_eq!(err, Error::not_found("9"));
    }

    #[test]
    fn test_replacing_property_keeps_position() {
        let annotation = Annotation::relation("1", "Z")
            .with_property("a", "1")
            .with_property("b", "2")
            .with_property("a", "3");
        let names: Vec<&str> = annotation.properties().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(annotation.property("a"), Some(&PropertyValue::text("3")));
    }

    #[test]
    fn test_find_self_referential() {
        let mut data = linked();
        assert!(data.find_self_referential().is_none());

        data.push(Annotation::relation("4", "Ref").with_reference("Ref", "3"))
            .unwrap();
        data.set_property("3", "Back", PropertyValue::reference("4"))
            .unwrap();
        let found = data.find_self_referential().unwrap();
        assert_eq!(found.id(), "3");
    }

    #[test]
    fn test_select_type() {
        let data = linked();
        let ids: Vec<&str> = data.select_type("Y").map(|a| a.id()).collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn test_resolved_properties() {
        let data = linked();
        let relation = data.get("3").unwrap();
        assert_eq!(relation.property("Prop1").unwrap().as_text(), Some("T"));
        let source = relation.property("Source").unwrap().as_annotation().unwrap();
        assert_eq!(source.id(), "1");
        assert!(relation.property("missing").is_none());
    }

    #[test]
    fn test_serde_keeps_references_as_ids() {
        let annotation = Annotation::relation("3", "Z")
            .with_reference("Source", "1")
            .with_property("Prop1", "T");
        let json = serde_json::to_value(&annotation).unwrap();
        assert_eq!(json["properties"][0], serde_json::json!(["Source", {"Ref": "1"}]));
        let restored: Annotation = serde_json::from_value(json).unwrap();
        assert_eq!(restored, annotation);
    }
}
