//! Couple resolution.
//!
//! Couples come from two sources: explicit couple rows, registered first in
//! input order, and inference from children that have exactly two parents.
//! Every registration goes through [`CoupleIndex::register`], which keys the
//! pair canonically and never reassigns a person who already has a spouse.
//!
//! Lookups key on the sorted id pair, not on the joined [`CoupleId`] string:
//! names may contain the separator, so two different pairs can share a key
//! string.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::registry::Registry;
use crate::types::{Couple, CoupleId, CoupleRecord, Diagnostic, PersonId};

/// Result of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// A new couple was created.
    Registered(CoupleId),
    /// The same canonical pair was already registered.
    Existing(CoupleId),
    /// One spouse already belongs to a different couple; nothing changed.
    Conflict {
        /// Couple that keeps the spouse.
        existing: CoupleId,
    },
}

/// Sorted spouse pair.
type PairKey = (PersonId, PersonId);

fn pair_key(a: &PersonId, b: &PersonId) -> PairKey {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Canonical couples plus a person → couple index.
#[derive(Debug, Clone, Default)]
pub struct CoupleIndex {
    couples: IndexMap<PairKey, Couple>,
    /// Position in `couples`; entries are never removed.
    by_person: IndexMap<PersonId, usize>,
}

impl CoupleIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve explicit and inferred couples.
    ///
    /// Explicit participants missing from the registry are created as
    /// placeholders.
    pub fn resolve(
        registry: &mut Registry,
        explicit: Option<&[CoupleRecord]>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        let mut index = Self::new();

        for record in explicit.unwrap_or_default() {
            let (Some(a), Some(b)) = (PersonId::normalize(&record.name), PersonId::normalize(&record.spouse_name)) else {
                continue;
            };
            if a == b {
                continue;
            }
            registry.ensure_person(&record.name);
            registry.ensure_person(&record.spouse_name);
            index.register_reporting(a, b, diagnostics);
        }

        for (child, parents) in registry.parent_sets() {
            match parents.len() {
                2 => {
                    let a = parents[0].clone();
                    let b = parents[1].clone();
                    debug!(child = %child, a = %a, b = %b, "couple inferred from shared child");
                    index.register_reporting(a, b, diagnostics);
                }
                n if n > 2 => {
                    warn!(child = %child, parents = n, "child has more than two parents, left unpaired");
                    diagnostics.push(Diagnostic::UnpairedParents {
                        child: child.clone(),
                        parents: parents.iter().cloned().collect(),
                    });
                }
                _ => {}
            }
        }

        debug!(couples = index.len(), "couples resolved");
        index
    }

    /// Register a pair.
    ///
    /// Idempotent for the same canonical pair. A person already indexed to
    /// another couple keeps that couple and the new pair is rejected.
    pub fn register(&mut self, a: PersonId, b: PersonId) -> RegisterOutcome {
        let key = pair_key(&a, &b);
        if let Some(couple) = self.couples.get(&key) {
            return RegisterOutcome::Existing(couple.id.clone());
        }
        for spouse in [&a, &b] {
            if let Some(existing) = self.by_person.get(spouse).and_then(|&i| self.couples.get_index(i)) {
                return RegisterOutcome::Conflict {
                    existing: existing.1.id.clone(),
                };
            }
        }

        let couple = Couple::new(a.clone(), b.clone());
        let id = couple.id.clone();
        let (slot, _) = self.couples.insert_full(key, couple);
        self.by_person.insert(a, slot);
        self.by_person.insert(b, slot);
        RegisterOutcome::Registered(id)
    }

    fn register_reporting(&mut self, a: PersonId, b: PersonId, diagnostics: &mut Vec<Diagnostic>) {
        if let RegisterOutcome::Conflict { existing } = self.register(a.clone(), b.clone()) {
            warn!(a = %a, b = %b, existing = %existing, "marriage dropped, spouse already paired");
            diagnostics.push(Diagnostic::DroppedMarriage { a, b, existing });
        }
    }

    /// Number of couples.
    pub fn len(&self) -> usize {
        self.couples.len()
    }

    /// Whether there are no couples.
    pub fn is_empty(&self) -> bool {
        self.couples.is_empty()
    }

    /// Couples in registration order.
    pub fn couples(&self) -> impl Iterator<Item = &Couple> {
        self.couples.values()
    }

    /// The couple for a pair, in either order.
    pub fn couple_of_pair(&self, a: &PersonId, b: &PersonId) -> Option<&Couple> {
        self.couples.get(&pair_key(a, b))
    }

    /// The couple a person belongs to.
    pub fn couple_of(&self, person: &PersonId) -> Option<&Couple> {
        self.by_person
            .get(person)
            .and_then(|&i| self.couples.get_index(i))
            .map(|(_, couple)| couple)
    }

    /// The spouse of a person.
    pub fn spouse_of(&self, person: &PersonId) -> Option<&PersonId> {
        self.couple_of(person).and_then(|c| c.spouse_of(person))
    }

    /// Whether a person is married.
    pub fn is_married(&self, person: &PersonId) -> bool {
        self.by_person.contains_key(person)
    }
}
