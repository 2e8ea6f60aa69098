//! Output elements handed to the rendering collaborator.

use serde::{Deserialize, Serialize};

use super::couple::CoupleId;
use super::person::{Gender, PersonId};

/// Layout coordinates of a person.
///
/// `x` runs along the generation axis (`depth * generation_gap`), `y` along
/// the sibling axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Generation axis.
    pub x: f64,
    /// Sibling axis.
    pub y: f64,
}

impl Position {
    /// Create a position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One person as emitted for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Normalized person key.
    pub id: PersonId,
    /// Display name.
    pub name: String,
    /// Year of birth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
    /// Declared gender.
    pub gender: Gender,
    /// Blood relative or in-law.
    pub is_blood: bool,
    /// Generational depth relative to the pivot of its component.
    pub depth: i32,
    /// Generation-axis coordinate.
    pub x: f64,
    /// Sibling-axis coordinate.
    pub y: f64,
    /// Connected component (0 = the pivot's component).
    pub component: u32,
}

impl Node {
    /// Layout coordinates as a [`Position`].
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    /// Coordinates on a screen-style canvas where ancestors are drawn on
    /// top and siblings spread horizontally.
    pub fn canvas_position(&self) -> Position {
        Position::new(self.y, -self.x)
    }
}

/// An edge between two people.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Edge {
    /// Undirected marriage link.
    Couple {
        /// `couple-<couple id>`.
        id: String,
        /// First-listed spouse.
        a: PersonId,
        /// Second-listed spouse.
        b: PersonId,
    },
    /// Directed parent → child link.
    Hierarchy {
        /// `<from>-><to>`.
        id: String,
        /// Parent.
        from: PersonId,
        /// Child.
        to: PersonId,
    },
}

impl Edge {
    /// Build a couple edge.
    pub fn couple(couple: &CoupleId, a: PersonId, b: PersonId) -> Self {
        Self::Couple {
            id: format!("couple-{}", couple),
            a,
            b,
        }
    }

    /// Build a hierarchy edge.
    pub fn hierarchy(from: PersonId, to: PersonId) -> Self {
        Self::Hierarchy {
            id: format!("{}->{}", from, to),
            from,
            to,
        }
    }

    /// Element id.
    pub fn id(&self) -> &str {
        match self {
            Self::Couple { id, .. } | Self::Hierarchy { id, .. } => id,
        }
    }

    /// Whether this is a hierarchy edge.
    pub fn is_hierarchy(&self) -> bool {
        matches!(self, Self::Hierarchy { .. })
    }
}

/// Counters reported with every build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    /// People in the registry.
    pub people_count: usize,
    /// Accepted relation rows.
    pub relation_count: usize,
    /// Registered couples.
    pub couple_count: usize,
    /// Connected components that received depths.
    pub component_count: usize,
    /// Most ancestral depth.
    pub max_depth: i32,
    /// Most descendant depth.
    pub min_depth: i32,
}

/// Non-fatal anomaly observed during a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    /// A later person row redefined an existing person.
    DuplicatePerson {
        /// Redefined person.
        person: PersonId,
    },
    /// A relation row named the same person as parent and child.
    SelfParent {
        /// Offending person.
        person: PersonId,
    },
    /// A marriage was not registered because a spouse already belongs to
    /// another couple.
    DroppedMarriage {
        /// First-listed spouse of the dropped pair.
        a: PersonId,
        /// Second-listed spouse of the dropped pair.
        b: PersonId,
        /// Couple that keeps the conflicting spouse.
        existing: CoupleId,
    },
    /// A child with three or more parents; none of them were paired.
    UnpairedParents {
        /// Child.
        child: PersonId,
        /// Its parents, in insertion order.
        parents: Vec<PersonId>,
    },
    /// A person unreachable from the pivot.
    Disconnected {
        /// Unreachable person.
        person: PersonId,
    },
    /// The pinned pivot name does not match any person.
    PivotNotFound {
        /// Name as requested.
        requested: String,
    },
}

/// Complete output of one build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyGraph {
    /// One node per person, in registry order.
    pub nodes: Vec<Node>,
    /// Couple edges first, then hierarchy edges.
    pub edges: Vec<Edge>,
    /// Counters.
    pub stats: GraphStats,
    /// Depth-zero anchor of component 0.
    pub pivot: PersonId,
    /// Non-fatal anomalies.
    pub diagnostics: Vec<Diagnostic>,
    /// Canonical hash of nodes and edges.
    pub fingerprint: String,
    /// Hash of the layout policy used.
    pub policy_params_hash: String,
    /// Schema version of this output.
    pub schema_version: String,
}

impl FamilyGraph {
    /// Find a node by person id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id.as_str() == id)
    }

    /// Iterate hierarchy edges as `(from, to)` pairs.
    pub fn hierarchy_edges(&self) -> impl Iterator<Item = (&PersonId, &PersonId)> {
        self.edges.iter().filter_map(|e| match e {
            Edge::Hierarchy { from, to, .. } => Some((from, to)),
            Edge::Couple { .. } => None,
        })
    }

    /// Iterate couple edges as `(a, b)` pairs.
    pub fn couple_edges(&self) -> impl Iterator<Item = (&PersonId, &PersonId)> {
        self.edges.iter().filter_map(|e| match e {
            Edge::Couple { a, b, .. } => Some((a, b)),
            Edge::Hierarchy { .. } => None,
        })
    }
}
