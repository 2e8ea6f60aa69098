//! Person registry and parent/child adjacency.
//!
//! The registry is the first build stage. It turns raw person and relation
//! records into an insertion-ordered person store plus two symmetric
//! adjacency maps. Insertion order is the iteration order of every later
//! stage, so the same input always yields the same graph.

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use crate::types::{Diagnostic, Gender, Person, PersonId, PersonRecord, RelationRecord};

/// Person store with bidirectional parent/child adjacency.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    /// People in first-reference order.
    people: IndexMap<PersonId, Person>,
    /// Child -> parents.
    parents_of: IndexMap<PersonId, IndexSet<PersonId>>,
    /// Parent -> children.
    children_of: IndexMap<PersonId, IndexSet<PersonId>>,
    /// Accepted relation rows, duplicates included.
    relation_count: usize,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from person and relation records.
    pub fn from_records(
        people: &[PersonRecord],
        relations: &[RelationRecord],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        let mut registry = Self::new();
        for record in people {
            registry.add_person(record, diagnostics);
        }
        for record in relations {
            registry.add_relation(&record.parent, &record.child, diagnostics);
        }
        debug!(
            people = registry.len(),
            relations = registry.relation_count,
            "registry built"
        );
        registry
    }

    /// Register a person row.
    ///
    /// The first row for an id fixes the person's position. A later row
    /// with the same id replaces its attributes in place. Returns `None`
    /// when the name normalizes to nothing.
    pub fn add_person(&mut self, record: &PersonRecord, diagnostics: &mut Vec<Diagnostic>) -> Option<PersonId> {
        let display_name = record.name.trim();
        let id = PersonId::normalize(display_name)?;
        let person = Person::new(
            id.clone(),
            display_name,
            record.birth_year.as_ref().and_then(|y| y.year()),
            Gender::from_optional(record.gender.as_deref()),
        );

        if let Some(existing) = self.people.get_mut(&id) {
            debug!(person = %id, "person redefined by a later row");
            *existing = person;
            diagnostics.push(Diagnostic::DuplicatePerson { person: id.clone() });
        } else {
            trace!(raw = display_name, person = %id, "person registered");
            self.people.insert(id.clone(), person);
        }
        Some(id)
    }

    /// Make sure a referenced name exists, creating a placeholder if needed.
    pub fn ensure_person(&mut self, raw_name: &str) -> Option<PersonId> {
        let display_name = raw_name.trim();
        let id = PersonId::normalize(display_name)?;
        self.people
            .entry(id.clone())
            .or_insert_with(|| Person::placeholder(id.clone(), display_name));
        Some(id)
    }

    /// Register one parent-child link.
    ///
    /// Returns `false` (and counts nothing) when either side is empty or
    /// both sides are the same person. Duplicate links are idempotent in
    /// the adjacency but still counted.
    pub fn add_relation(&mut self, parent_raw: &str, child_raw: &str, diagnostics: &mut Vec<Diagnostic>) -> bool {
        let (Some(parent), Some(child)) = (PersonId::normalize(parent_raw), PersonId::normalize(child_raw)) else {
            return false;
        };
        if parent == child {
            debug!(person = %parent, "relation names the same person as parent and child");
            diagnostics.push(Diagnostic::SelfParent { person: parent });
            return false;
        }

        self.ensure_person(parent_raw);
        self.ensure_person(child_raw);

        self.parents_of
            .entry(child.clone())
            .or_default()
            .insert(parent.clone());
        self.children_of
            .entry(parent)
            .or_default()
            .insert(child);

        self.relation_count += 1;
        true
    }

    /// Number of people.
    pub fn len(&self) -> usize {
        self.people.len()
    }

    /// Whether the registry holds no people.
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Accepted relation rows.
    pub fn relation_count(&self) -> usize {
        self.relation_count
    }

    /// Look up a person.
    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.people.get(id)
    }

    /// Whether a person exists.
    pub fn contains(&self, id: &PersonId) -> bool {
        self.people.contains_key(id)
    }

    /// People in registry order.
    pub fn people(&self) -> impl Iterator<Item = &Person> {
        self.people.values()
    }

    /// Person ids in registry order.
    pub fn ids(&self) -> impl Iterator<Item = &PersonId> {
        self.people.keys()
    }

    /// Mutable access for stages that annotate people.
    pub(crate) fn people_mut(&mut self) -> impl Iterator<Item = &mut Person> {
        self.people.values_mut()
    }

    /// Parents of `id`, in insertion order.
    pub fn parents(&self, id: &PersonId) -> impl Iterator<Item = &PersonId> {
        self.parents_of.get(id).into_iter().flatten()
    }

    /// Children of `id`, in insertion order.
    pub fn children(&self, id: &PersonId) -> impl Iterator<Item = &PersonId> {
        self.children_of.get(id).into_iter().flatten()
    }

    /// Number of registered parents of `id`.
    pub fn parent_count(&self, id: &PersonId) -> usize {
        self.parents_of.get(id).map_or(0, IndexSet::len)
    }

    /// Number of registered children of `id`.
    pub fn child_count(&self, id: &PersonId) -> usize {
        self.children_of.get(id).map_or(0, IndexSet::len)
    }

    /// Every child with its parent set, in the order children first
    /// appeared in a relation.
    pub fn parent_sets(&self) -> impl Iterator<Item = (&PersonId, &IndexSet<PersonId>)> {
        self.parents_of.iter()
    }
}
