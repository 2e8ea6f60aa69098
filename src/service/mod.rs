//! Family Graph REST Service
//!
//! Exposes the builder as a REST API.
//!
//! ## Endpoints
//!
//! - `POST /api/build` - Build a family graph from records
//! - `POST /api/build/sheets` - Classify named sheets of rows, then build
//! - `GET /api/policies` - List registered layout policies
//! - `POST /api/policies` - Register a new layout policy
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{metrics_middleware, record_build_metrics, request_context_middleware, CorrelationId};
pub use routes::{create_router, AppState, ErrorResponse};
pub use state::{PolicyRef, PolicyRegistry, ServiceState};
