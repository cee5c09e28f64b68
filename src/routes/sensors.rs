// src/routes/sensors.rs
//! Sensor and alert views over the shared session state.
//!
//! - `GET /sensors/latest` – last stored snapshot with its moisture/pH levels
//! - `GET /alerts?filter=` – alerts derived from that snapshot
//! - `POST /alerts/{kind}/read`, `POST /alerts/read-all` – read marks
//!
//! Nothing here calls the backend; the snapshot is whatever the last
//! workflow run committed.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::AppState;
use crate::alerts::{self, Alert, AlertKind, FeedFilter, MoistureLevel, PhLevel, SeverityCounts};
use crate::SensorSnapshot;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/sensors/latest", get(latest))
        .route("/alerts", get(alert_feed))
        .route("/alerts/read-all", post(mark_all_read))
        .route("/alerts/{kind}/read", post(mark_read))
}

/// Snapshot plus its classified levels.
#[derive(Debug, Serialize)]
struct SensorView {
    #[serde(flatten)]
    snapshot: SensorSnapshot,
    moisture_level: MoistureLevel,
    ph_level: PhLevel,
    updated_at: Option<DateTime<Utc>>,
}

/// Last stored snapshot; `404` until a workflow run has fetched one.
async fn latest(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let slots = state.workflow.state().slots();
    let Some(snapshot) = slots.sensor_snapshot else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "no sensor snapshot yet" })),
        )
            .into_response();
    };

    let body = SensorView {
        snapshot,
        moisture_level: alerts::moisture_level(snapshot.moisture),
        ph_level: alerts::ph_level(snapshot.ph),
        updated_at: slots.sensor_updated_at,
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Query parameters for the alert feed
#[derive(Debug, Deserialize)]
struct AlertQuery {
    #[serde(default)]
    filter: FeedFilter,
}

#[derive(Debug, Serialize)]
struct AlertFeed {
    alerts: Vec<Alert>,
    counts: SeverityCounts,
}

/// Alerts for the current snapshot with read marks applied. Empty when no
/// snapshot is stored.
fn active_alerts(state: &AppState) -> Vec<Alert> {
    // ---
    let mut active = state
        .workflow
        .state()
        .sensor_snapshot()
        .map(|snapshot| alerts::alerts_for(&snapshot))
        .unwrap_or_default();
    state.alerts.annotate(&mut active);
    active
}

/// `counts` always covers the unfiltered feed.
async fn alert_feed(
    Query(params): Query<AlertQuery>,
    State(state): State<AppState>,
) -> Json<AlertFeed> {
    // ---
    debug!("GET /alerts: {:?}", params);
    let all = active_alerts(&state);
    let counts = alerts::count_by_severity(&all);
    Json(AlertFeed {
        alerts: alerts::apply_filter(all, params.filter),
        counts,
    })
}

/// `404` when the alert is not currently active.
async fn mark_read(
    Path(kind): Path<AlertKind>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    let active = active_alerts(&state);
    if !state.alerts.mark_read(kind, &active) {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "alert is not active" })),
        )
            .into_response();
    }
    debug!("Alert {:?} marked read", kind);
    (StatusCode::OK, Json(feed_after_marking(&state))).into_response()
}

async fn mark_all_read(State(state): State<AppState>) -> Json<AlertFeed> {
    // ---
    let active = active_alerts(&state);
    let marked = state.alerts.mark_all_read(&active);
    info!("Marked {} alerts read", marked);
    Json(feed_after_marking(&state))
}

fn feed_after_marking(state: &AppState) -> AlertFeed {
    let alerts = active_alerts(state);
    AlertFeed {
        counts: alerts::count_by_severity(&alerts),
        alerts,
    }
}
