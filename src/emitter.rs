//! Element emission.
//!
//! Turns the built maps into the node and edge lists consumed by the
//! rendering collaborator. No graph logic happens here beyond the rule that
//! a child of a registered couple gets one hierarchy edge, not two.

use crate::couples::CoupleIndex;
use crate::depth::DepthMap;
use crate::layout::Layout;
use crate::registry::Registry;
use crate::types::{Edge, Node};

/// One node per person, in registry order.
///
/// People without a depth or position are emitted at depth 0 and the origin.
pub fn emit_nodes(registry: &Registry, depths: &DepthMap, layout: &Layout) -> Vec<Node> {
    registry
        .people()
        .map(|person| {
            let position = layout.position(&person.id).unwrap_or_default();
            Node {
                id: person.id.clone(),
                name: person.display_name.clone(),
                birth_year: person.birth_year,
                gender: person.gender,
                is_blood: person.is_blood,
                depth: depths.depth(&person.id).unwrap_or(0),
                x: position.x,
                y: position.y,
                component: depths.component(&person.id).unwrap_or(0),
            }
        })
        .collect()
}

/// Couple edges in registration order, then hierarchy edges in the order
/// children first appeared in a relation.
pub fn emit_edges(registry: &Registry, couples: &CoupleIndex) -> Vec<Edge> {
    let mut edges: Vec<Edge> = couples
        .couples()
        .map(|c| Edge::couple(&c.id, c.spouse_a.clone(), c.spouse_b.clone()))
        .collect();

    for (child, parents) in registry.parent_sets() {
        let merged = if parents.len() == 2 {
            couples.couple_of_pair(&parents[0], &parents[1])
        } else {
            None
        };
        match merged {
            Some(couple) => edges.push(Edge::hierarchy(couple.spouse_a.clone(), child.clone())),
            None => edges.extend(
                parents
                    .iter()
                    .map(|parent| Edge::hierarchy(parent.clone(), child.clone())),
            ),
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{DisconnectedPlacement, LayoutPolicy};
    use crate::types::{CoupleRecord, PersonId, PersonRecord, Position, RelationRecord};

    fn pid(s: &str) -> PersonId {
        PersonId::from_normalized(s)
    }

    fn hierarchy(edges: &[Edge]) -> Vec<(String, String)> {
        edges
            .iter()
            .filter_map(|e| match e {
                Edge::Hierarchy { from, to, .. } => Some((from.to_string(), to.to_string())),
                Edge::Couple { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_couple_child_gets_single_edge() {
        let mut diags = Vec::new();
        let mut registry = Registry::from_records(
            &[],
            &[RelationRecord::new("P1", "C1"), RelationRecord::new("P2", "C1")],
            &mut diags,
        );
        let couples = CoupleIndex::resolve(&mut registry, None, &mut diags);
        let edges = emit_edges(&registry, &couples);

        assert_eq!(edges.len(), 2);
        assert!(matches!(&edges[0], Edge::Couple { a, b, .. } if a == &pid("P1") && b == &pid("P2")));
        assert_eq!(hierarchy(&edges), vec![("P1".to_string(), "C1".to_string())]);
    }

    #[test]
    fn test_merged_edge_starts_at_first_listed_spouse() {
        let mut diags = Vec::new();
        let mut registry = Registry::from_records(
            &[],
            &[RelationRecord::new("P1", "C1"), RelationRecord::new("P2", "C1")],
            &mut diags,
        );
        let explicit = vec![CoupleRecord::new("P2", "P1")];
        let couples = CoupleIndex::resolve(&mut registry, Some(&explicit), &mut diags);
        let edges = emit_edges(&registry, &couples);
        assert_eq!(hierarchy(&edges), vec![("P2".to_string(), "C1".to_string())]);
    }

    #[test]
    fn test_unpaired_parents_get_one_edge_each() {
        let mut diags = Vec::new();
        let mut registry = Registry::from_records(
            &[],
            &[
                RelationRecord::new("Dad", "K1"),
                RelationRecord::new("Mom1", "K1"),
                RelationRecord::new("Dad", "K2"),
                RelationRecord::new("Mom2", "K2"),
            ],
            &mut diags,
        );
        let couples = CoupleIndex::resolve(&mut registry, None, &mut diags);
        let edges = emit_edges(&registry, &couples);

        // Dad & Mom2 were never registered, so K2 keeps both edges.
        assert_eq!(
            hierarchy(&edges),
            vec![
                ("Dad".to_string(), "K1".to_string()),
                ("Dad".to_string(), "K2".to_string()),
                ("Mom2".to_string(), "K2".to_string()),
            ]
        );
    }

    #[test]
    fn test_separator_in_names_does_not_merge_couples() {
        let mut diags = Vec::new();
        let mut registry = Registry::from_records(
            &[],
            &[
                RelationRecord::new("A&B", "K1"),
                RelationRecord::new("C", "K1"),
                RelationRecord::new("A", "K2"),
                RelationRecord::new("B&C", "K2"),
            ],
            &mut diags,
        );
        let couples = CoupleIndex::resolve(&mut registry, None, &mut diags);
        let edges = emit_edges(&registry, &couples);

        assert_eq!(couples.len(), 2);
        assert!(diags.is_empty());
        assert_eq!(
            hierarchy(&edges),
            vec![("A&B".to_string(), "K1".to_string()), ("A".to_string(), "K2".to_string())]
        );
    }

    #[test]
    fn test_nodes_default_unplaced_people_to_origin() {
        let mut diags = Vec::new();
        let mut registry = Registry::from_records(
            &[PersonRecord::new("A"), PersonRecord::new("B"), PersonRecord::new("Island").born(1990)],
            &[RelationRecord::new("A", "B")],
            &mut diags,
        );
        let couples = CoupleIndex::resolve(&mut registry, None, &mut diags);
        let depths = DepthMap::compute(&registry, &couples, &pid("A"), DisconnectedPlacement::Origin, &mut diags);
        let layout = Layout::compute(&registry, &couples, &depths, &LayoutPolicy::default());
        let nodes = emit_nodes(&registry, &depths, &layout);

        assert_eq!(nodes.len(), 3);
        let island = &nodes[2];
        assert_eq!(island.id, pid("Island"));
        assert_eq!(island.depth, 0);
        assert_eq!(island.position(), Position::default());
        assert_eq!(island.birth_year, Some(1990));
        assert_eq!(island.component, 1);
    }
}
