//! Canonical serialization for deterministic hashing.
//!
//! This module provides functions to serialize data in a canonical, deterministic format
//! suitable for hashing build outputs and policies.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: Struct fields serialize in declaration order
//! - Stable Vec order: Vectors serialize in index order
//! - No HashMap allowed: Use ordered maps for maps in hashed data
//! - Stable float format: coordinates are quantized to integers before hashing

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

use crate::policy::layout::quantize_float;
use crate::types::{Edge, Gender, Node, PersonId};

/// Serialize a value to canonical JSON bytes for hashing.
///
/// This function produces deterministic output for the same input.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

/// Node with quantized coordinates.
#[derive(Serialize)]
struct CanonicalNode<'a> {
    id: &'a PersonId,
    name: &'a str,
    birth_year: Option<i32>,
    gender: Gender,
    is_blood: bool,
    depth: i32,
    x: i64,
    y: i64,
    component: u32,
}

impl<'a> From<&'a Node> for CanonicalNode<'a> {
    fn from(node: &'a Node) -> Self {
        Self {
            id: &node.id,
            name: &node.name,
            birth_year: node.birth_year,
            gender: node.gender,
            is_blood: node.is_blood,
            depth: node.depth,
            x: quantize_float(node.x),
            y: quantize_float(node.y),
            component: node.component,
        }
    }
}

#[derive(Serialize)]
struct CanonicalElements<'a> {
    nodes: Vec<CanonicalNode<'a>>,
    edges: &'a [Edge],
}

/// Fingerprint of an emitted graph.
///
/// Same nodes and edges in the same order always give the same
/// fingerprint, independently of float formatting.
pub fn elements_fingerprint(nodes: &[Node], edges: &[Edge]) -> String {
    let elements = CanonicalElements {
        nodes: nodes.iter().map(CanonicalNode::from).collect(),
        edges,
    };
    canonical_hash_hex(&elements)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct TestStruct {
        name: String,
        value: i32,
    }

    #[test]
    fn test_determinism() {
        let s = TestStruct {
            name: "test".to_string(),
            value: 42,
        };

        let h1 = canonical_hash(&s);
        let h2 = canonical_hash(&s);
        assert_eq!(h1, h2);
        assert_eq!(canonical_hash_hex(&s).len(), 16);
    }

    fn node(y: f64) -> Node {
        Node {
            id: PersonId::from_normalized("A"),
            name: "A".to_string(),
            birth_year: None,
            gender: Gender::Male,
            is_blood: true,
            depth: 0,
            x: 0.0,
            y,
            component: 0,
        }
    }

    #[test]
    fn test_fingerprint_ignores_float_noise() {
        let a = elements_fingerprint(&[node(140.0)], &[]);
        let b = elements_fingerprint(&[node(0.7 * 200.0)], &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_tracks_order() {
        let edges = vec![
            Edge::hierarchy(PersonId::from_normalized("A"), PersonId::from_normalized("B")),
            Edge::hierarchy(PersonId::from_normalized("A"), PersonId::from_normalized("C")),
        ];
        let reversed: Vec<_> = edges.iter().rev().cloned().collect();
        assert_ne!(
            elements_fingerprint(&[node(0.0)], &edges),
            elements_fingerprint(&[node(0.0)], &reversed)
        );
    }
}
