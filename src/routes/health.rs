// src/routes/health.rs
//! Liveness endpoint for the crop-advisor service.
//!
//! `GET /health` answers without touching the prediction backend or the
//! session state, so orchestrators and CI can check the process cheaply.

use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
    })
}

/// Subrouter with the `/health` route, generic over the gateway state so it
/// merges into any router.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
