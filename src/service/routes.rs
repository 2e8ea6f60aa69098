//! Axum routes for the family graph service.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::builder::BuildError;
use crate::cache::CacheStats;
use crate::ingest::{classify_sheets, Workbook};
use crate::policy::LayoutPolicy;
use crate::types::{FamilyDataset, FamilyGraph};
use crate::FAMILY_GRAPH_SCHEMA_VERSION;

use super::middleware::{record_build_metrics, CorrelationId};
use super::state::{PolicyRef, ServiceState};

/// Shared state as seen by handlers.
pub type AppState = Arc<ServiceState>;

type ApiError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to build a family graph from records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    /// The records.
    pub dataset: FamilyDataset,
    /// Optional policy reference. If not provided, uses the default policy.
    #[serde(default)]
    pub policy_ref: Option<PolicyRef>,
}

/// Request to build a family graph from named sheets of rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetsBuildRequest {
    /// Sheets in workbook order.
    pub sheets: Workbook,
    /// Optional policy reference.
    #[serde(default)]
    pub policy_ref: Option<PolicyRef>,
}

/// Response containing a built graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResponse {
    /// The graph.
    pub graph: FamilyGraph,
    /// Policy used.
    pub policy_ref: PolicyRef,
    /// Whether the graph came from the cache.
    pub cache_hit: bool,
    /// When the response was produced.
    pub computed_at: DateTime<Utc>,
}

/// Request to register a new policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPolicyRequest {
    /// The policy.
    pub policy: LayoutPolicy,
}

/// Response containing a policy reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRefResponse {
    /// Reference of the registered policy.
    pub policy_ref: PolicyRef,
}

/// List of registered policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyListResponse {
    /// Registered references.
    pub policies: Vec<PolicyRef>,
    /// Fingerprint of the registry.
    pub registry_fingerprint: String,
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Output schema version.
    pub schema_version: String,
    /// Number of registered policies.
    pub policy_count: usize,
    /// Fingerprint of the registry.
    pub registry_fingerprint: String,
    /// Build cache occupancy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// Always "alive".
    pub status: String,
}

/// Readiness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Whether traffic can be accepted.
    pub ready: bool,
    /// Why not, if not.
    pub details: Option<String>,
}

/// Structured error response with correlation ID for tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Correlation ID for request tracing (matches X-Cloud-Trace-Context or generated UUID).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            correlation_id: None,
            details: None,
        }
    }

    /// Add a correlation ID to the error.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

fn api_error(
    status: StatusCode,
    mut body: ErrorResponse,
    correlation: &Option<Extension<CorrelationId>>,
) -> ApiError {
    if let Some(Extension(CorrelationId(id))) = correlation {
        body = body.with_correlation_id(id.clone());
    }
    tracing::warn!(
        status = status.as_u16(),
        code = %body.code,
        error = %body.error,
        correlation_id = ?body.correlation_id,
        "Request error"
    );
    (status, Json(body))
}

fn build_error(err: &BuildError, correlation: &Option<Extension<CorrelationId>>) -> ApiError {
    let code = match err {
        BuildError::MissingRequiredData { .. } => "MISSING_REQUIRED_DATA",
        BuildError::InvalidPolicy { .. } => "INVALID_POLICY",
    };
    api_error(StatusCode::UNPROCESSABLE_ENTITY, ErrorResponse::new(code, err.to_string()), correlation)
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Resolve a policy reference, or fall back to the default policy.
fn resolve_policy(
    state: &ServiceState,
    policy_ref: Option<&PolicyRef>,
    correlation: &Option<Extension<CorrelationId>>,
) -> Result<(LayoutPolicy, PolicyRef), ApiError> {
    match policy_ref {
        Some(pref) => {
            let registry = state.policy_registry.read();
            let policy = registry.resolve(pref).cloned().ok_or_else(|| {
                api_error(
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new("POLICY_NOT_FOUND", "Policy not found")
                        .with_details(format!("{}:{}", pref.policy_id, pref.params_hash)),
                    correlation,
                )
            })?;
            Ok((policy, pref.clone()))
        }
        None => {
            let policy = LayoutPolicy::default();
            let pref = PolicyRef::from_policy(&policy);
            Ok((policy, pref))
        }
    }
}

fn run_build(
    state: &ServiceState,
    dataset: &FamilyDataset,
    policy_ref: Option<&PolicyRef>,
    correlation: &Option<Extension<CorrelationId>>,
) -> Result<BuildResponse, ApiError> {
    let (policy, policy_ref) = resolve_policy(state, policy_ref, correlation)?;

    let start = Instant::now();
    let cached = state
        .cache
        .build(dataset, &policy)
        .map_err(|e| build_error(&e, correlation))?;
    record_build_metrics(
        cached.graph.nodes.len(),
        cached.graph.edges.len(),
        cached.cache_hit,
        start.elapsed().as_millis() as u64,
    );

    Ok(BuildResponse {
        graph: FamilyGraph::clone(&cached.graph),
        policy_ref,
        cache_hit: cached.cache_hit,
        computed_at: Utc::now(),
    })
}

/// Build a family graph from records.
async fn build_handler(
    State(state): State<AppState>,
    correlation: Option<Extension<CorrelationId>>,
    Json(request): Json<BuildRequest>,
) -> Result<Json<BuildResponse>, ApiError> {
    run_build(&state, &request.dataset, request.policy_ref.as_ref(), &correlation).map(Json)
}

/// Ingest named sheets, then build.
async fn build_sheets_handler(
    State(state): State<AppState>,
    correlation: Option<Extension<CorrelationId>>,
    Json(request): Json<SheetsBuildRequest>,
) -> Result<Json<BuildResponse>, ApiError> {
    let dataset = classify_sheets(&request.sheets).map_err(|e| {
        api_error(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("INVALID_WORKBOOK", e.to_string()),
            &correlation,
        )
    })?;
    run_build(&state, &dataset, request.policy_ref.as_ref(), &correlation).map(Json)
}

/// List registered policies.
async fn list_policies_handler(State(state): State<AppState>) -> Json<PolicyListResponse> {
    let registry = state.policy_registry.read();
    Json(PolicyListResponse {
        policies: registry.list(),
        registry_fingerprint: registry.fingerprint().to_string(),
    })
}

/// Register a new policy.
async fn register_policy_handler(
    State(state): State<AppState>,
    correlation: Option<Extension<CorrelationId>>,
    Json(request): Json<RegisterPolicyRequest>,
) -> Result<Json<PolicyRefResponse>, ApiError> {
    request
        .policy
        .validate()
        .map_err(|field| build_error(&BuildError::InvalidPolicy { field }, &correlation))?;

    let policy_ref = state.policy_registry.write().register(request.policy);
    tracing::info!(policy_id = %policy_ref.policy_id, params_hash = %policy_ref.params_hash, "policy registered");
    Ok(Json(PolicyRefResponse { policy_ref }))
}

/// Health check endpoint (detailed).
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let (policy_count, registry_fingerprint) = {
        let registry = state.policy_registry.read();
        (registry.len(), registry.fingerprint().to_string())
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: FAMILY_GRAPH_SCHEMA_VERSION.to_string(),
        policy_count,
        registry_fingerprint,
        cache: state.cache.stats(),
    })
}

/// Liveness probe endpoint.
///
/// Does NOT check dependencies.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Ready once at least one policy is registered.
async fn readiness_handler(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    if state.policy_registry.read().is_empty() {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                details: Some("No layout policy registered".to_string()),
            }),
        ));
    }
    Ok(Json(ReadinessResponse {
        ready: true,
        details: None,
    }))
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the family graph service.
pub fn create_router(state: ServiceState) -> Router {
    let state: AppState = Arc::new(state);

    Router::new()
        // Builds
        .route("/api/build", post(build_handler))
        .route("/api/build/sheets", post(build_sheets_handler))
        // Policy management
        .route("/api/policies", get(list_policies_handler).post(register_policy_handler))
        // Health checks
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .with_state(state)
}
