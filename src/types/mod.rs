//! Core types for the family graph kernel.

pub mod person;
pub mod couple;
pub mod record;
pub mod element;

pub use person::{PersonId, Person, Gender, normalize_name};
pub use couple::{CoupleId, Couple, COUPLE_KEY_SEPARATOR};
pub use record::{PersonRecord, RelationRecord, CoupleRecord, FamilyDataset, BirthYearValue};
pub use element::{Position, Node, Edge, GraphStats, Diagnostic, FamilyGraph};
