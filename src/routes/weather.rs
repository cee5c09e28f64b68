// src/routes/weather.rs
//! `GET /weather?city=` – pass-through to the backend weather endpoint.
//!
//! The payload is returned as the backend sent it. This route shares the
//! HTTP client with the workflow but never reads or writes session state.

use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use serde::Deserialize;
use tracing::{info, warn};

use super::AppState;

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/weather", get(handler))
}

/// `city` falls back to `ADVISOR_DEFAULT_CITY` when absent or blank.
#[derive(Debug, Deserialize)]
struct WeatherQuery {
    city: Option<String>,
}

/// Proxy the backend weather payload; `502` with the error kind on failure.
async fn handler(
    Query(params): Query<WeatherQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    let city = params
        .city
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| state.config.default_city.clone());
    info!("GET /weather - city: {}", city);

    match state.client.fetch_weather(&city).await {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(e) => {
            warn!("Weather lookup for {} failed: {}", city, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": e.to_string(), "kind": e.kind() })),
            )
                .into_response()
        }
    }
}
