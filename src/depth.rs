//! Pivot selection and generational depth assignment.
//!
//! Depths are relative to a pivot at depth 0. The family graph is not a
//! tree: a married couple with a shared child forms a cycle through the
//! spouse edge and the two parent edges. Depths are therefore assigned by a
//! breadth-first traversal over three edge kinds with a visited set, never
//! by recursive descent.
//!
//! ## Algorithm
//!
//! 1. Score every person: parents + children + (1 if married)
//! 2. Pick the strictly highest score, first in registry order on ties
//! 3. BFS from the pivot: parent = depth + 1, child = depth - 1,
//!    spouse = same depth; the first visit fixes a depth
//! 4. Remaining components are discovered in registry order and, when
//!    anchored, get their own pivot and traversal

use std::collections::{HashMap, VecDeque};

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

use crate::couples::CoupleIndex;
use crate::policy::DisconnectedPlacement;
use crate::registry::Registry;
use crate::types::{Diagnostic, PersonId};

/// Connection score used to pick a pivot.
pub fn pivot_score(registry: &Registry, couples: &CoupleIndex, id: &PersonId) -> usize {
    registry.parent_count(id) + registry.child_count(id) + usize::from(couples.is_married(id))
}

/// Pick the best-connected candidate.
///
/// The strictly highest positive score wins and ties keep the earliest
/// candidate. If nobody scores above zero the first candidate is returned.
pub fn select_pivot<'a>(
    registry: &Registry,
    couples: &CoupleIndex,
    candidates: impl IntoIterator<Item = &'a PersonId>,
) -> Option<PersonId> {
    let mut first: Option<&PersonId> = None;
    let mut best: Option<(&PersonId, usize)> = None;

    for id in candidates {
        first.get_or_insert(id);
        let score = pivot_score(registry, couples, id);
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((id, score));
        }
    }

    best.map(|(id, _)| id).or(first).cloned()
}

/// Resolve the pivot for a build, honouring a pinned name when it exists.
pub fn choose_pivot(
    registry: &Registry,
    couples: &CoupleIndex,
    pinned: Option<&str>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<PersonId> {
    if let Some(requested) = pinned {
        match PersonId::normalize(requested) {
            Some(id) if registry.contains(&id) => return Some(id),
            _ => {
                warn!(requested, "pinned pivot not found, falling back to scoring");
                diagnostics.push(Diagnostic::PivotNotFound {
                    requested: requested.to_string(),
                });
            }
        }
    }
    select_pivot(registry, couples, registry.ids())
}

/// Depths and components of one build.
#[derive(Debug, Clone, Default)]
pub struct DepthMap {
    /// Depth per person, in BFS visit order.
    depth_of: IndexMap<PersonId, i32>,
    /// Component per person.
    component_of: HashMap<PersonId, u32>,
    /// Pivot of each anchored component; index = component.
    pivots: Vec<PersonId>,
    /// Number of components discovered.
    component_count: usize,
}

impl DepthMap {
    /// Assign depths from `pivot` and handle the remaining components
    /// according to `placement`.
    pub fn compute(
        registry: &Registry,
        couples: &CoupleIndex,
        pivot: &PersonId,
        placement: DisconnectedPlacement,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        let mut map = Self::default();
        map.traverse(registry, couples, pivot, 0);
        map.pivots.push(pivot.clone());
        map.component_count = 1;

        let unreached: Vec<PersonId> = registry
            .ids()
            .filter(|id| !map.depth_of.contains_key(*id))
            .cloned()
            .collect();
        for id in &unreached {
            diagnostics.push(Diagnostic::Disconnected { person: id.clone() });
        }

        for seed in &unreached {
            if map.component_of.contains_key(seed) {
                continue;
            }
            let component = map.component_count as u32;
            map.component_count += 1;
            let members = reachable(registry, couples, seed);
            for member in &members {
                map.component_of.insert(member.clone(), component);
            }

            if placement == DisconnectedPlacement::Anchored {
                let candidates = registry.ids().filter(|id| members.contains(*id));
                if let Some(local_pivot) = select_pivot(registry, couples, candidates) {
                    map.traverse(registry, couples, &local_pivot, component);
                    map.pivots.push(local_pivot);
                }
            }
        }

        if !unreached.is_empty() {
            warn!(
                unreachable = unreached.len(),
                components = map.component_count,
                ?placement,
                "people unreachable from the pivot"
            );
        }
        debug!(
            pivot = %pivot,
            assigned = map.depth_of.len(),
            components = map.component_count,
            "depths assigned"
        );
        map
    }

    fn traverse(&mut self, registry: &Registry, couples: &CoupleIndex, start: &PersonId, component: u32) {
        self.visit(start, 0, component);
        let mut queue = VecDeque::from([start.clone()]);

        while let Some(current) = queue.pop_front() {
            let depth = self.depth_of[&current];
            let neighbours = registry
                .parents(&current)
                .map(|p| (p, depth + 1))
                .chain(registry.children(&current).map(|c| (c, depth - 1)))
                .chain(couples.spouse_of(&current).map(|s| (s, depth)));

            for (next, next_depth) in neighbours {
                if self.visit(next, next_depth, component) {
                    queue.push_back(next.clone());
                }
            }
        }
    }

    /// Fix a depth on first visit. Returns whether the person was new.
    fn visit(&mut self, id: &PersonId, depth: i32, component: u32) -> bool {
        if self.depth_of.contains_key(id) {
            return false;
        }
        self.depth_of.insert(id.clone(), depth);
        self.component_of.insert(id.clone(), component);
        true
    }

    /// Depth of a person, if assigned.
    pub fn depth(&self, id: &PersonId) -> Option<i32> {
        self.depth_of.get(id).copied()
    }

    /// Component of a person.
    pub fn component(&self, id: &PersonId) -> Option<u32> {
        self.component_of.get(id).copied()
    }

    /// People with a depth, in BFS visit order.
    pub fn iter(&self) -> impl Iterator<Item = (&PersonId, i32)> {
        self.depth_of.iter().map(|(id, d)| (id, *d))
    }

    /// Number of people with a depth.
    pub fn len(&self) -> usize {
        self.depth_of.len()
    }

    /// Whether no depth was assigned.
    pub fn is_empty(&self) -> bool {
        self.depth_of.is_empty()
    }

    /// Pivots of the anchored components, main pivot first.
    pub fn pivots(&self) -> &[PersonId] {
        &self.pivots
    }

    /// Number of connected components.
    pub fn component_count(&self) -> usize {
        self.component_count
    }

    /// Highest and lowest assigned depth.
    pub fn depth_range(&self) -> Option<(i32, i32)> {
        let max = self.depth_of.values().copied().max()?;
        let min = self.depth_of.values().copied().min()?;
        Some((max, min))
    }
}

/// Everyone connected to `seed` through parent, child or spouse edges.
fn reachable(registry: &Registry, couples: &CoupleIndex, seed: &PersonId) -> IndexSet<PersonId> {
    let mut seen = IndexSet::from([seed.clone()]);
    let mut queue = VecDeque::from([seed.clone()]);
    while let Some(current) = queue.pop_front() {
        let neighbours = registry
            .parents(&current)
            .chain(registry.children(&current))
            .chain(couples.spouse_of(&current));
        for next in neighbours {
            if seen.insert(next.clone()) {
                queue.push_back(next.clone());
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PersonRecord, RelationRecord};

    fn pid(s: &str) -> PersonId {
        PersonId::from_normalized(s)
    }

    fn setup(people: &[&str], relations: &[(&str, &str)]) -> (Registry, CoupleIndex) {
        let mut diags = Vec::new();
        let people: Vec<_> = people.iter().map(|n| PersonRecord::new(*n)).collect();
        let relations: Vec<_> = relations.iter().map(|(p, c)| RelationRecord::new(*p, *c)).collect();
        let mut registry = Registry::from_records(&people, &relations, &mut diags);
        let couples = CoupleIndex::resolve(&mut registry, None, &mut diags);
        (registry, couples)
    }

    #[test]
    fn test_pivot_is_most_connected() {
        let (registry, couples) = setup(
            &["GP", "P1", "P2", "C1", "C2"],
            &[("GP", "P1"), ("P1", "C1"), ("P2", "C1"), ("P1", "C2"), ("P2", "C2")],
        );
        // P1: 1 parent + 2 children + married = 4
        assert_eq!(select_pivot(&registry, &couples, registry.ids()), Some(pid("P1")));
    }

    #[test]
    fn test_pivot_tie_keeps_first() {
        let (registry, couples) = setup(&["A", "B"], &[("A", "X"), ("B", "Y")]);
        assert_eq!(select_pivot(&registry, &couples, registry.ids()), Some(pid("A")));
    }

    #[test]
    fn test_pivot_defaults_to_first_person() {
        let (registry, couples) = setup(&["Lonely", "Other"], &[]);
        assert_eq!(select_pivot(&registry, &couples, registry.ids()), Some(pid("Lonely")));
    }

    #[test]
    fn test_pinned_pivot() {
        let (registry, couples) = setup(&["A", "B"], &[("A", "B")]);
        let mut diags = Vec::new();
        assert_eq!(choose_pivot(&registry, &couples, Some(" B "), &mut diags), Some(pid("B")));
        assert!(diags.is_empty());
        assert_eq!(choose_pivot(&registry, &couples, Some("Nobody"), &mut diags), Some(pid("A")));
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_depths_follow_edge_kinds() {
        let (registry, couples) = setup(
            &["GP", "P1", "P2", "C1"],
            &[("GP", "P1"), ("P1", "C1"), ("P2", "C1")],
        );
        let mut diags = Vec::new();
        let depths = DepthMap::compute(&registry, &couples, &pid("P1"), DisconnectedPlacement::Anchored, &mut diags);

        assert_eq!(depths.depth(&pid("P1")), Some(0));
        assert_eq!(depths.depth(&pid("GP")), Some(1));
        assert_eq!(depths.depth(&pid("C1")), Some(-1));
        assert_eq!(depths.depth(&pid("P2")), Some(0));
        assert_eq!(depths.component_count(), 1);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_shared_child_cycle_is_consistent() {
        let (registry, couples) = setup(
            &["C1", "P1", "P2"],
            &[("P1", "C1"), ("P2", "C1")],
        );
        let mut diags = Vec::new();
        let depths = DepthMap::compute(&registry, &couples, &pid("C1"), DisconnectedPlacement::Anchored, &mut diags);
        assert_eq!(depths.depth(&pid("P1")), Some(1));
        assert_eq!(depths.depth(&pid("P2")), Some(1));
        assert_eq!(depths.len(), 3);
    }

    #[test]
    fn test_disconnected_origin_gets_no_depth() {
        let (registry, couples) = setup(&["A", "B", "Island"], &[("A", "B")]);
        let mut diags = Vec::new();
        let depths = DepthMap::compute(&registry, &couples, &pid("A"), DisconnectedPlacement::Origin, &mut diags);

        assert_eq!(depths.depth(&pid("Island")), None);
        assert_eq!(depths.component(&pid("Island")), Some(1));
        assert_eq!(depths.component_count(), 2);
        assert_eq!(diags, vec![Diagnostic::Disconnected { person: pid("Island") }]);
    }

    #[test]
    fn test_disconnected_anchored_gets_own_pivot() {
        let (registry, couples) = setup(
            &["A", "B", "X", "Y"],
            &[("A", "B"), ("X", "Y")],
        );
        let mut diags = Vec::new();
        let depths = DepthMap::compute(&registry, &couples, &pid("A"), DisconnectedPlacement::Anchored, &mut diags);

        assert_eq!(depths.pivots(), &[pid("A"), pid("X")]);
        assert_eq!(depths.depth(&pid("X")), Some(0));
        assert_eq!(depths.depth(&pid("Y")), Some(-1));
        assert_eq!(depths.component(&pid("Y")), Some(1));
        assert_eq!(diags.len(), 2);
    }
}
