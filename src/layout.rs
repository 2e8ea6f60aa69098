//! Generation-by-generation layout.
//!
//! Generations are laid out from the most ancestral depth down so that each
//! generation can align under positions already given to its parents.
//! Inside a generation people are clustered into sibling groups (same
//! parent set) and singleton groups (no parents), groups are ordered by the
//! mean position of their parents, and a cursor that only moves forward
//! hands out coordinates. Spouses at the same depth are placed side by side.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use tracing::trace;

use crate::couples::CoupleIndex;
use crate::depth::DepthMap;
use crate::policy::LayoutPolicy;
use crate::registry::Registry;
use crate::types::{PersonId, Position};

/// A cluster of people placed contiguously.
#[derive(Debug, Clone, PartialEq)]
struct FamilyGroup<'a> {
    /// Members in placement order.
    members: Vec<&'a PersonId>,
    /// Mean sibling-axis position of the members' placed parents.
    ideal: Option<f64>,
}

/// Computed positions of one build.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    position_of: HashMap<PersonId, Position>,
}

impl Layout {
    /// Lay out everyone with a depth.
    pub fn compute(registry: &Registry, couples: &CoupleIndex, depths: &DepthMap, policy: &LayoutPolicy) -> Self {
        let mut buckets: BTreeMap<i32, Vec<&PersonId>> = BTreeMap::new();
        for (id, depth) in depths.iter() {
            buckets.entry(depth).or_default().push(id);
        }

        let mut layout = Self::default();
        for (&depth, people) in buckets.iter().rev() {
            let mut groups = family_groups(registry, couples, people);
            for group in &mut groups {
                group.ideal = layout.ideal_position(registry, &group.members);
            }
            trace!(depth, people = people.len(), groups = groups.len(), "laying out generation");
            layout.place_generation(couples, depths, policy, depth, groups);
        }
        layout
    }

    /// Position of a person, if placed.
    pub fn position(&self, id: &PersonId) -> Option<Position> {
        self.position_of.get(id).copied()
    }

    /// Number of placed people.
    pub fn len(&self) -> usize {
        self.position_of.len()
    }

    /// Whether nobody was placed.
    pub fn is_empty(&self) -> bool {
        self.position_of.is_empty()
    }

    fn ideal_position(&self, registry: &Registry, members: &[&PersonId]) -> Option<f64> {
        let placed: Vec<f64> = members
            .iter()
            .flat_map(|id| registry.parents(id))
            .filter_map(|parent| self.position_of.get(parent).map(|p| p.y))
            .collect();
        if placed.is_empty() {
            None
        } else {
            Some(placed.iter().sum::<f64>() / placed.len() as f64)
        }
    }

    fn place_generation(
        &mut self,
        couples: &CoupleIndex,
        depths: &DepthMap,
        policy: &LayoutPolicy,
        depth: i32,
        mut groups: Vec<FamilyGroup<'_>>,
    ) {
        // Stable: groups without an ideal keep their original order.
        groups.sort_by(|a, b| match (a.ideal, b.ideal) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        let gap = policy.sibling_gap;
        let x = f64::from(depth) * policy.generation_gap;
        let mut cursor = 0.0_f64;

        for group in groups {
            if let Some(ideal) = group.ideal {
                if cursor < ideal {
                    cursor = cursor.max(ideal - group.members.len() as f64 * gap / 2.0);
                }
            }

            for id in group.members {
                if self.position_of.contains_key(id) {
                    continue;
                }
                self.position_of.insert(id.clone(), Position::new(x, cursor));

                let spouse = couples
                    .spouse_of(id)
                    .filter(|s| depths.depth(s) == Some(depth) && !self.position_of.contains_key(*s));
                match spouse {
                    Some(spouse) => {
                        self.position_of
                            .insert(spouse.clone(), Position::new(x, cursor + policy.couple_offset * gap));
                        cursor += policy.couple_span * gap;
                    }
                    None => cursor += gap,
                }
            }
        }
    }
}

/// Cluster one generation into sibling groups followed by singletons.
///
/// Siblings share an identical parent set. Inside a sibling group unmarried
/// people with more children go left and married people go right, which
/// keeps wide branches compact and pushes lineage merge points to the edge.
fn family_groups<'a>(registry: &Registry, couples: &CoupleIndex, people: &[&'a PersonId]) -> Vec<FamilyGroup<'a>> {
    let mut siblings: IndexMap<Vec<&PersonId>, Vec<&'a PersonId>> = IndexMap::new();
    let mut singles: Vec<&'a PersonId> = Vec::new();

    for &id in people {
        let mut parents: Vec<&PersonId> = registry.parents(id).collect();
        if parents.is_empty() {
            singles.push(id);
            continue;
        }
        parents.sort_unstable();
        siblings.entry(parents).or_default().push(id);
    }

    let mut groups: Vec<FamilyGroup<'a>> = siblings
        .into_values()
        .map(|mut members| {
            members.sort_by_key(|id| (couples.is_married(id), Reverse(registry.child_count(id))));
            FamilyGroup { members, ideal: None }
        })
        .collect();
    groups.extend(singles.into_iter().map(|id| FamilyGroup {
        members: vec![id],
        ideal: None,
    }));
    groups
}
