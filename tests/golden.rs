//! Golden tests for the family graph kernel.
//!
//! These tests verify determinism and correctness of full builds.

use family_graph_kernel::{
    build_family_graph, classify_sheets, BuildError, CoupleRecord, Diagnostic, DisconnectedPlacement, Edge,
    FamilyDataset, FamilyGraph, FamilyGraphBuilder, LayoutPolicy, PersonRecord, Position, RelationRecord, Row,
    Workbook,
};
use serde_json::{json, Value};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn parents_and_child() -> FamilyDataset {
    FamilyDataset::new(
        vec![
            PersonRecord::new("P1").gender("male").born(1961),
            PersonRecord::new("P2").gender("female").born(1962),
            PersonRecord::new("C1").gender("male").born(1989),
        ],
        vec![RelationRecord::new("P1", "C1"), RelationRecord::new("P2", "C1")],
    )
}

/// Three generations with one married-in spouse and one unconnected person.
fn korean_sample() -> FamilyDataset {
    let people = [
        ("이상현", 1989, "남"),
        ("이윤정", 1991, "여"),
        ("이민우", 1961, "남"),
        ("신동화", 1962, "여"),
        ("이종수", 1905, "남"),
        ("전일분", 1907, "여"),
        ("이봉우", 1951, "남"),
        ("이상진", 1978, "남"),
    ];
    let relations = [
        ("이민우", "이상현"),
        ("이민우", "이윤정"),
        ("신동화", "이상현"),
        ("신동화", "이윤정"),
        ("이종수", "이민우"),
        ("이종수", "이봉우"),
        ("이봉우", "이상진"),
    ];
    FamilyDataset::new(
        people
            .iter()
            .map(|(n, y, g)| PersonRecord::new(*n).born(*y).gender(*g))
            .collect(),
        relations.iter().map(|(p, c)| RelationRecord::new(*p, *c)).collect(),
    )
}

fn depth(graph: &FamilyGraph, id: &str) -> i32 {
    graph.node(id).map(|n| n.depth).unwrap_or_else(|| panic!("missing node {id}"))
}

fn position(graph: &FamilyGraph, id: &str) -> Position {
    graph.node(id).map(|n| n.position()).unwrap_or_else(|| panic!("missing node {id}"))
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_parents_and_child() {
    let graph = build_family_graph(&parents_and_child()).unwrap();

    assert_eq!(graph.stats.couple_count, 1);
    assert_eq!(depth(&graph, "P1"), depth(&graph, "C1") + 1);
    assert_eq!(depth(&graph, "P1"), depth(&graph, "P2"));

    let into_c1: Vec<_> = graph.hierarchy_edges().filter(|(_, to)| to.as_str() == "C1").collect();
    assert_eq!(into_c1.len(), 1);
    assert_eq!(graph.couple_edges().count(), 1);
}

#[test]
fn test_disconnected_person_origin() {
    let mut dataset = parents_and_child();
    dataset.people.push(PersonRecord::new("P3").gender("male"));

    let policy = LayoutPolicy::default().with_disconnected(DisconnectedPlacement::Origin);
    let graph = FamilyGraphBuilder::new(policy).build(&dataset).unwrap();

    let p3 = graph.node("P3").unwrap();
    assert_eq!(p3.depth, 0);
    assert_eq!(p3.position(), Position::default());
    assert_eq!(p3.component, 1);
    assert!(graph.edges.iter().all(|e| match e {
        Edge::Couple { a, b, .. } => a.as_str() != "P3" && b.as_str() != "P3",
        Edge::Hierarchy { from, to, .. } => from.as_str() != "P3" && to.as_str() != "P3",
    }));
    assert!(graph
        .diagnostics
        .contains(&Diagnostic::Disconnected { person: p3.id.clone() }));
}

#[test]
fn test_disconnected_person_anchored_does_not_overlap() {
    let mut dataset = parents_and_child();
    dataset.people.push(PersonRecord::new("P3"));

    let graph = build_family_graph(&dataset).unwrap();
    let p3 = position(&graph, "P3");

    assert_eq!(graph.stats.component_count, 2);
    for other in ["P1", "P2", "C1"] {
        assert_ne!(position(&graph, other), p3, "P3 overlaps {other}");
    }
}

#[test]
fn test_empty_relations_rejected() {
    let mut dataset = parents_and_child();
    dataset.relations.clear();
    assert_eq!(
        build_family_graph(&dataset),
        Err(BuildError::MissingRequiredData { what: "relations" })
    );
}

#[test]
fn test_empty_people_rejected() {
    let mut dataset = parents_and_child();
    dataset.people.clear();
    assert_eq!(
        build_family_graph(&dataset),
        Err(BuildError::MissingRequiredData { what: "people" })
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Golden Layout
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_korean_sample_golden() {
    let graph = build_family_graph(&korean_sample()).unwrap();

    assert_eq!(graph.pivot.as_str(), "이민우");
    assert_eq!(graph.stats.people_count, 8);
    assert_eq!(graph.stats.relation_count, 7);
    assert_eq!(graph.stats.couple_count, 1);
    assert_eq!(graph.stats.component_count, 2);
    assert_eq!((graph.stats.max_depth, graph.stats.min_depth), (1, -1));
    assert_eq!(graph.edges.len(), 6);

    let expected = [
        ("이종수", 150.0, 0.0),
        ("이봉우", 0.0, 0.0),
        ("이민우", 0.0, 200.0),
        ("신동화", 0.0, 340.0),
        ("전일분", 0.0, 520.0),
        ("이상진", -150.0, 0.0),
        ("이상현", -150.0, 200.0),
        ("이윤정", -150.0, 400.0),
    ];
    for (id, x, y) in expected {
        assert_eq!(position(&graph, id), Position::new(x, y), "position of {id}");
    }

    let blood: Vec<&str> = graph.nodes.iter().filter(|n| !n.is_blood).map(|n| n.id.as_str()).collect();
    assert_eq!(blood, vec!["신동화", "전일분"]);
    assert_eq!(
        graph.diagnostics,
        vec![Diagnostic::Disconnected {
            person: graph.node("전일분").unwrap().id.clone()
        }]
    );
}

#[test]
fn test_korean_sample_from_sheets() {
    let mut workbook = Workbook::new();
    workbook.insert(
        "People".to_string(),
        korean_sample()
            .people
            .iter()
            .map(|p| {
                row(json!({
                    "이름": p.name,
                    "생년월일": p.birth_year.as_ref().and_then(|y| y.year()),
                    "성별": p.gender,
                }))
            })
            .collect(),
    );
    workbook.insert(
        "Relationships".to_string(),
        korean_sample()
            .relations
            .iter()
            .map(|r| row(json!({"부모": r.parent, "자식": r.child})))
            .collect(),
    );

    let dataset = classify_sheets(&workbook).unwrap();
    let from_sheets = build_family_graph(&dataset).unwrap();
    let direct = build_family_graph(&korean_sample()).unwrap();
    assert_eq!(from_sheets.fingerprint, direct.fingerprint);
}

// ─────────────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_byte_identical_output() {
    let a = build_family_graph(&korean_sample()).unwrap();
    let b = build_family_graph(&korean_sample()).unwrap();

    assert_eq!(serde_json::to_vec(&a).unwrap(), serde_json::to_vec(&b).unwrap());
    assert_eq!(a.fingerprint, b.fingerprint);
}

#[test]
fn test_fingerprint_tracks_policy() {
    let default = build_family_graph(&korean_sample()).unwrap();
    let mut policy = LayoutPolicy::default();
    policy.sibling_gap = 120.0;
    let wide = FamilyGraphBuilder::new(policy).build(&korean_sample()).unwrap();

    assert_ne!(default.fingerprint, wide.fingerprint);
    assert_ne!(default.policy_params_hash, wide.policy_params_hash);
}

#[test]
fn test_name_variants_resolve_to_one_person() {
    let dataset = FamilyDataset::new(
        vec![PersonRecord::new("Mary Ann"), PersonRecord::new("Mary-Ann")],
        vec![RelationRecord::new(" MaryAnn ", "Kid")],
    );
    let graph = build_family_graph(&dataset).unwrap();
    assert_eq!(graph.stats.people_count, 2);
    assert!(graph.node("MaryAnn").is_some());
}

#[test]
fn test_ampersand_names_keep_distinct_couples() {
    let dataset = FamilyDataset::new(
        ["A&B", "C", "A", "B&C"].into_iter().map(PersonRecord::new).collect(),
        vec![
            RelationRecord::new("A&B", "K1"),
            RelationRecord::new("C", "K1"),
            RelationRecord::new("A", "K2"),
            RelationRecord::new("B&C", "K2"),
        ],
    );
    let graph = build_family_graph(&dataset).unwrap();

    assert_eq!(graph.stats.couple_count, 2);
    let hierarchy: Vec<(&str, &str)> = graph.hierarchy_edges().map(|(f, t)| (f.as_str(), t.as_str())).collect();
    assert_eq!(hierarchy, vec![("A&B", "K1"), ("A", "K2")]);
}

#[test]
fn test_remarriage_keeps_first_couple() {
    let dataset = parents_and_child().with_couples(vec![
        CoupleRecord::new("P1", "P2"),
        CoupleRecord::new("P1", "Other"),
    ]);
    let graph = build_family_graph(&dataset).unwrap();

    assert_eq!(graph.stats.couple_count, 1);
    assert!(graph
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::DroppedMarriage { .. })));
}

#[test]
fn test_output_json_shape() {
    let graph = build_family_graph(&parents_and_child()).unwrap();
    let value = serde_json::to_value(&graph).unwrap();

    assert!(value["nodes"][0]["birthYear"].is_number());
    assert!(value["stats"]["peopleCount"].is_number());
    assert_eq!(value["edges"][0]["kind"], "couple");
    assert_eq!(value["edges"][1]["kind"], "hierarchy");
    assert_eq!(value["edges"][1]["id"], "P1->C1");
}
