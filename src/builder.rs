//! Family graph builder.
//!
//! The builder runs the stages of a build in order over a fresh
//! [`BuildContext`]:
//!
//! ```text
//! Registry → Couples → Classifier → Pivot & Depth → Layout → Emitter
//! ```
//!
//! A builder holds only configuration. Every call to
//! [`FamilyGraphBuilder::build`] starts from empty maps, so one builder can
//! serve any number of builds, concurrently or not.

use tracing::{debug, info, info_span};

use crate::canonical::elements_fingerprint;
use crate::classifier::{classify, LineageStrategy};
use crate::couples::CoupleIndex;
use crate::depth::{choose_pivot, DepthMap};
use crate::emitter::{emit_edges, emit_nodes};
use crate::layout::Layout;
use crate::policy::LayoutPolicy;
use crate::registry::Registry;
use crate::types::{
    Diagnostic, FamilyDataset, FamilyGraph, GraphStats, PersonId, PersonRecord, RelationRecord,
};
use crate::FAMILY_GRAPH_SCHEMA_VERSION;

/// Error type for builds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// A required record list is absent or empty after filtering.
    #[error("Missing required data: {what}")]
    MissingRequiredData {
        /// Which list is missing.
        what: &'static str,
    },
    /// A spacing parameter is unusable.
    #[error("Invalid layout policy: {field} must be finite and positive")]
    InvalidPolicy {
        /// Offending field.
        field: &'static str,
    },
}

/// All maps of one build.
///
/// Created per build and consumed by it; nothing here survives a build.
#[derive(Debug, Default)]
pub struct BuildContext {
    /// People and adjacency.
    pub registry: Registry,
    /// Couples.
    pub couples: CoupleIndex,
    /// Depths and components.
    pub depths: DepthMap,
    /// Positions.
    pub layout: Layout,
    /// Non-fatal anomalies.
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds a [`FamilyGraph`] from a [`FamilyDataset`].
pub struct FamilyGraphBuilder {
    policy: LayoutPolicy,
    strategy: Box<dyn LineageStrategy>,
}

impl FamilyGraphBuilder {
    /// Create a builder; the lineage strategy comes from the policy.
    pub fn new(policy: LayoutPolicy) -> Self {
        let strategy = Box::new(policy.lineage);
        Self { policy, strategy }
    }

    /// Replace the lineage strategy with a custom one.
    pub fn with_strategy(mut self, strategy: Box<dyn LineageStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Get the policy.
    pub fn policy(&self) -> &LayoutPolicy {
        &self.policy
    }

    /// Build the graph.
    ///
    /// Fails with [`BuildError::MissingRequiredData`] before touching any
    /// state when the people or relation list has no usable row.
    pub fn build(&self, dataset: &FamilyDataset) -> Result<FamilyGraph, BuildError> {
        let _span = info_span!("family_graph_build").entered();

        self.policy
            .validate()
            .map_err(|field| BuildError::InvalidPolicy { field })?;
        validate_dataset(&dataset.people, &dataset.relations)?;

        let ctx = self.run(dataset)?;
        let graph = self.finish(ctx);

        info!(
            people = graph.stats.people_count,
            relations = graph.stats.relation_count,
            couples = graph.stats.couple_count,
            components = graph.stats.component_count,
            pivot = %graph.pivot,
            diagnostics = graph.diagnostics.len(),
            fingerprint = %graph.fingerprint,
            "family graph built"
        );
        Ok(graph)
    }

    /// Run every stage and return the filled context.
    pub fn run(&self, dataset: &FamilyDataset) -> Result<BuildContext, BuildError> {
        let mut ctx = BuildContext::default();

        ctx.registry = Registry::from_records(&dataset.people, &dataset.relations, &mut ctx.diagnostics);
        ctx.couples = CoupleIndex::resolve(&mut ctx.registry, dataset.couples.as_deref(), &mut ctx.diagnostics);
        classify(&mut ctx.registry, self.strategy.as_ref());

        let pivot = choose_pivot(
            &ctx.registry,
            &ctx.couples,
            self.policy.pivot.as_deref(),
            &mut ctx.diagnostics,
        )
        .ok_or(BuildError::MissingRequiredData { what: "people" })?;
        debug!(pivot = %pivot, "pivot selected");

        ctx.depths = DepthMap::compute(
            &ctx.registry,
            &ctx.couples,
            &pivot,
            self.policy.disconnected,
            &mut ctx.diagnostics,
        );
        ctx.layout = Layout::compute(&ctx.registry, &ctx.couples, &ctx.depths, &self.policy);
        Ok(ctx)
    }

    fn finish(&self, ctx: BuildContext) -> FamilyGraph {
        let nodes = emit_nodes(&ctx.registry, &ctx.depths, &ctx.layout);
        let edges = emit_edges(&ctx.registry, &ctx.couples);
        let fingerprint = elements_fingerprint(&nodes, &edges);
        let (max_depth, min_depth) = ctx.depths.depth_range().unwrap_or((0, 0));

        let stats = GraphStats {
            people_count: ctx.registry.len(),
            relation_count: ctx.registry.relation_count(),
            couple_count: ctx.couples.len(),
            component_count: ctx.depths.component_count(),
            max_depth,
            min_depth,
        };
        let pivot = ctx
            .depths
            .pivots()
            .first()
            .cloned()
            .unwrap_or_else(|| PersonId::from_normalized(""));

        FamilyGraph {
            nodes,
            edges,
            stats,
            pivot,
            diagnostics: ctx.diagnostics,
            fingerprint,
            policy_params_hash: self.policy.params_hash(),
            schema_version: FAMILY_GRAPH_SCHEMA_VERSION.to_string(),
        }
    }
}

impl Default for FamilyGraphBuilder {
    fn default() -> Self {
        Self::new(LayoutPolicy::default())
    }
}

impl std::fmt::Debug for FamilyGraphBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FamilyGraphBuilder")
            .field("policy", &self.policy)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

/// Check that both required lists have at least one usable row.
fn validate_dataset(people: &[PersonRecord], relations: &[RelationRecord]) -> Result<(), BuildError> {
    if !people.iter().any(|p| PersonId::normalize(&p.name).is_some()) {
        return Err(BuildError::MissingRequiredData { what: "people" });
    }
    let usable_relation = relations.iter().any(|r| {
        matches!(
            (PersonId::normalize(&r.parent), PersonId::normalize(&r.child)),
            (Some(parent), Some(child)) if parent != child
        )
    });
    if !usable_relation {
        return Err(BuildError::MissingRequiredData { what: "relations" });
    }
    Ok(())
}

/// Build with the default policy.
pub fn build_family_graph(dataset: &FamilyDataset) -> Result<FamilyGraph, BuildError> {
    FamilyGraphBuilder::default().build(dataset)
}
