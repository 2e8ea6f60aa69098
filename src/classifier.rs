//! Blood / in-law classification.
//!
//! Whether a person belongs to the lineage or married into it is a
//! convention, not a fact derivable from parent-child data. The convention
//! is expressed as a [`LineageStrategy`]; [`LineageRule::Paternal`] is the
//! default.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::registry::Registry;
use crate::types::{Gender, Person};

/// Decides whether a person counts as a blood relative.
pub trait LineageStrategy: Send + Sync {
    /// Strategy name, for logs.
    fn name(&self) -> &str;

    /// Classify one person given how many registered parents they have.
    fn is_blood(&self, person: &Person, parent_count: usize) -> bool;
}

/// Built-in lineage conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LineageRule {
    /// People with parents are blood; root-generation men are blood,
    /// root-generation women and unknowns married in.
    #[default]
    Paternal,
    /// People with parents are blood; root-generation women are blood.
    Maternal,
    /// Only people with at least one registered parent are blood.
    ParentedOnly,
}

impl LineageStrategy for LineageRule {
    fn name(&self) -> &str {
        match self {
            Self::Paternal => "paternal",
            Self::Maternal => "maternal",
            Self::ParentedOnly => "parented_only",
        }
    }

    fn is_blood(&self, person: &Person, parent_count: usize) -> bool {
        if parent_count > 0 {
            return true;
        }
        match self {
            Self::Paternal => person.gender == Gender::Male,
            Self::Maternal => person.gender == Gender::Female,
            Self::ParentedOnly => false,
        }
    }
}

impl fmt::Display for LineageRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set `is_blood` on every person in the registry.
pub fn classify(registry: &mut Registry, strategy: &dyn LineageStrategy) {
    let parent_counts: Vec<usize> = registry.ids().map(|id| registry.parent_count(id)).collect();
    for (person, parent_count) in registry.people_mut().zip(parent_counts) {
        person.is_blood = strategy.is_blood(person, parent_count);
    }
    tracing::debug!(strategy = strategy.name(), "lineage classified");
}
