//! # family-graph-kernel
//!
//! Deterministic construction and layout of family trees.
//!
//! The kernel answers one question:
//!
//! > Given flat people, parent-child and marriage records, where does every
//! > person sit in a generational drawing?
//!
//! ## Core Contract
//!
//! 1. Normalize names into person ids and build parent/child adjacency
//! 2. Pair spouses, classify blood relatives, pick a pivot and compute
//!    generational depth for everyone connected to it
//! 3. Lay out each generation without overlap and emit nodes and edges with
//!    a fingerprint for downstream caching
//!
//! ## Architecture
//!
//! ```text
//! FamilyDataset → Registry → Couples → Classifier → Depth → Layout → Emitter → FamilyGraph
//!                                           ↑
//!                                     LayoutPolicy
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same records + same policy → byte-identical output and fingerprint
//! - Every map iterates in insertion order (indexmap)
//! - Coordinates are quantized before hashing

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod policy;
pub mod registry;
pub mod couples;
pub mod classifier;
pub mod depth;
pub mod layout;
pub mod emitter;
pub mod builder;
pub mod canonical;
pub mod ingest;
pub mod cache;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{
    BirthYearValue, Couple, CoupleId, CoupleRecord, Diagnostic, Edge, FamilyDataset, FamilyGraph,
    Gender, GraphStats, Node, Person, PersonId, PersonRecord, Position, RelationRecord,
};
pub use policy::{DisconnectedPlacement, LayoutPolicy};
pub use classifier::{LineageRule, LineageStrategy};
pub use builder::{build_family_graph, BuildContext, BuildError, FamilyGraphBuilder};
pub use ingest::{classify_sheets, IngestError, Row, SheetKind, Workbook};
pub use cache::{BuildCache, CacheConfig, CacheStats, CachedBuild};
pub use canonical::{canonical_hash, canonical_hash_hex, elements_fingerprint, to_canonical_bytes};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, PolicyRef, PolicyRegistry, ServiceState};

/// Schema version of [`FamilyGraph`].
/// Increment on breaking changes to any output type.
pub const FAMILY_GRAPH_SCHEMA_VERSION: &str = "1.0.0";

/// Default policy version identifier.
pub const DEFAULT_POLICY_VERSION: &str = "layout_policy_v1";
