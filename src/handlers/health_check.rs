//! # Health Check Handler
//!
//! Liveness endpoint for load balancers and deployment tooling.

use axum::http::StatusCode;
use tracing::{debug, instrument};

/// Returns `200 OK` with an empty body.
///
/// GET /health-check
///
/// Touches neither the record store nor the upload root.
#[instrument]
pub async fn health_check() -> StatusCode {
    debug!("Health check endpoint accessed");
    StatusCode::OK
}
