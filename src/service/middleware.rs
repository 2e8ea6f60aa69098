//! Service middleware for metrics and request tracking.
//!
//! ## Metrics Exposed (as structured log events)
//!
//! - `request` - path pattern, method, status and latency of every request
//! - `build` - people, edges, cache hit and latency of every build

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use tracing::{info, info_span, Instrument};

/// Header carrying an upstream trace id.
pub const TRACE_HEADER: &str = "X-Cloud-Trace-Context";

/// Correlation id of the current request.
///
/// Inserted into request extensions by [`request_context_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    /// Take the trace id from the upstream header, or generate one.
    pub fn from_header(value: Option<&str>) -> Self {
        let id = value
            .and_then(|s| s.split('/').next())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Self(id)
    }
}

/// Attach a correlation id and a request span, then log completion.
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
    let start = Instant::now();
    let correlation_id = CorrelationId::from_header(
        request.headers().get(TRACE_HEADER).and_then(|v| v.to_str().ok()),
    );
    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    let span = info_span!(
        "request",
        trace_id = %correlation_id.0,
        method = %method,
        path = %uri,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );
    request.extensions_mut().insert(correlation_id.clone());

    let response = next.run(request).instrument(span.clone()).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    span.record("status", status);
    span.record("latency_ms", latency_ms);

    info!(
        target: "family_graph_service::access",
        trace_id = %correlation_id.0,
        method = %method,
        path = %uri,
        status,
        latency_ms,
        "request completed"
    );
    response
}

/// Label for requests that matched no route.
const UNMATCHED_PATH: &str = "unmatched";

/// Metrics middleware that records request counts and latency.
///
/// Requests are labelled with their route template, so the label set stays
/// bounded by the router.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = route_label(request.extensions().get::<MatchedPath>());

    let response = next.run(request).await;

    info!(
        target: "family_graph_kernel::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "request_metric"
    );
    response
}

fn route_label(matched: Option<&MatchedPath>) -> String {
    matched.map_or(UNMATCHED_PATH, MatchedPath::as_str).to_string()
}

/// Record build metrics.
pub fn record_build_metrics(people: usize, edges: usize, cache_hit: bool, latency_ms: u64) {
    info!(
        target: "family_graph_kernel::metrics",
        metric_type = "build",
        people,
        edges,
        cache_hit,
        latency_ms,
        "build_metric"
    );
}
