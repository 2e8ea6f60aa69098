//! Couple types for the family graph.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::person::PersonId;

/// Separator between the two spouse ids of a canonical couple key.
pub const COUPLE_KEY_SEPARATOR: char = '&';

/// Canonical couple key.
///
/// The two spouse ids sorted lexicographically and joined with `&`, so the
/// same pair always yields the same key regardless of argument order. Ids
/// may themselves contain `&`, so the key is for output only; lookups use
/// the id pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoupleId(String);

impl CoupleId {
    /// Compute the canonical key for a pair.
    pub fn canonical(a: &PersonId, b: &PersonId) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{}{}{}", first, COUPLE_KEY_SEPARATOR, second))
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CoupleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A married (or otherwise paired) couple.
///
/// Immutable once registered. `spouse_a` is the first argument of the
/// registering call and is the source of the merged hierarchy edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Couple {
    /// Canonical key.
    pub id: CoupleId,
    /// First-listed spouse.
    pub spouse_a: PersonId,
    /// Second-listed spouse.
    pub spouse_b: PersonId,
}

impl Couple {
    /// Create a couple; the id is derived canonically.
    pub fn new(spouse_a: PersonId, spouse_b: PersonId) -> Self {
        Self {
            id: CoupleId::canonical(&spouse_a, &spouse_b),
            spouse_a,
            spouse_b,
        }
    }

    /// The partner of `person`, if `person` belongs to this couple.
    pub fn spouse_of(&self, person: &PersonId) -> Option<&PersonId> {
        if &self.spouse_a == person {
            Some(&self.spouse_b)
        } else if &self.spouse_b == person {
            Some(&self.spouse_a)
        } else {
            None
        }
    }
}
