//! Build policy definitions.

pub mod layout;

pub use layout::{LayoutPolicy, DisconnectedPlacement};
