//! LayoutPolicy: every tunable of a build.
//!
//! ## Float Normalization for Deterministic Hashing
//!
//! Floats are quantized to integers before hashing to avoid cross-platform
//! serialization differences. The quantization factor is 1e6 (multiply by
//! 1,000,000 and round to i64).

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::classifier::LineageRule;
use crate::DEFAULT_POLICY_VERSION;

/// Quantization factor for float normalization.
pub(crate) const FLOAT_QUANTIZATION_FACTOR: f64 = 1_000_000.0;

/// Quantize a float to an i64 for deterministic hashing.
pub(crate) fn quantize_float(value: f64) -> i64 {
    (value * FLOAT_QUANTIZATION_FACTOR).round() as i64
}

/// How people unreachable from the pivot are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectedPlacement {
    /// Depth 0 at the origin. May overlap the pivot.
    Origin,
    /// Every further component gets its own depth-0 pivot and shares the
    /// layout pass, so it is placed beside the main component.
    #[default]
    Anchored,
}

/// Spacing and rule configuration for a build.
///
/// ## Parameters
///
/// - `generation_gap`: distance between generations (x axis)
/// - `sibling_gap`: distance between neighbours in a generation (y axis)
/// - `couple_offset`: spouse offset, as a fraction of `sibling_gap`
/// - `couple_span`: cursor advance for a placed couple, as a fraction of `sibling_gap`
/// - `lineage`: blood/in-law convention
/// - `disconnected`: placement of unreachable components
/// - `pivot`: optional pinned pivot name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutPolicy {
    /// Policy version identifier.
    pub version: String,
    /// Distance between generations.
    pub generation_gap: f64,
    /// Distance between people in one generation.
    pub sibling_gap: f64,
    /// Spouse offset from its partner, relative to `sibling_gap`.
    pub couple_offset: f64,
    /// Width taken by a couple, relative to `sibling_gap`.
    pub couple_span: f64,
    /// Blood/in-law convention.
    pub lineage: LineageRule,
    /// Placement of disconnected components.
    pub disconnected: DisconnectedPlacement,
    /// Pinned pivot (display name, normalized on use).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pivot: Option<String>,
}

/// Quantized policy parameters for deterministic hashing.
#[derive(Debug, Clone, Serialize)]
struct QuantizedPolicyParams {
    version: String,
    generation_gap: i64,
    sibling_gap: i64,
    couple_offset: i64,
    couple_span: i64,
    lineage: LineageRule,
    disconnected: DisconnectedPlacement,
    pivot: Option<String>,
}

impl LayoutPolicy {
    /// Get the policy ID.
    pub fn policy_id(&self) -> &str {
        &self.version
    }

    /// Pin the pivot to a named person.
    pub fn with_pivot(mut self, name: impl Into<String>) -> Self {
        self.pivot = Some(name.into());
        self
    }

    /// Set the lineage rule.
    pub fn with_lineage(mut self, lineage: LineageRule) -> Self {
        self.lineage = lineage;
        self
    }

    /// Set the disconnected placement.
    pub fn with_disconnected(mut self, disconnected: DisconnectedPlacement) -> Self {
        self.disconnected = disconnected;
        self
    }

    /// Check that every spacing is finite and positive.
    ///
    /// Returns the name of the first offending field.
    pub fn validate(&self) -> Result<(), &'static str> {
        let fields = [
            ("generation_gap", self.generation_gap),
            ("sibling_gap", self.sibling_gap),
            ("couple_offset", self.couple_offset),
            ("couple_span", self.couple_span),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(name);
            }
        }
        Ok(())
    }

    /// Compute a hash of the policy parameters.
    ///
    /// Uses quantized float representation so the hash does not depend on
    /// float formatting.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(&self.to_quantized())
    }

    fn to_quantized(&self) -> QuantizedPolicyParams {
        QuantizedPolicyParams {
            version: self.version.clone(),
            generation_gap: quantize_float(self.generation_gap),
            sibling_gap: quantize_float(self.sibling_gap),
            couple_offset: quantize_float(self.couple_offset),
            couple_span: quantize_float(self.couple_span),
            lineage: self.lineage,
            disconnected: self.disconnected,
            pivot: self.pivot.clone(),
        }
    }

    /// Compact spacing for tests.
    #[cfg(test)]
    pub fn unit() -> Self {
        Self {
            generation_gap: 1.0,
            sibling_gap: 10.0,
            couple_offset: 0.5,
            couple_span: 1.5,
            ..Self::default()
        }
    }
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION.to_string(),
            generation_gap: 150.0,
            sibling_gap: 200.0,
            couple_offset: 0.7,
            couple_span: 1.6,
            lineage: LineageRule::Paternal,
            disconnected: DisconnectedPlacement::Anchored,
            pivot: None,
        }
    }
}
