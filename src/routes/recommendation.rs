//! Recommendation workflow endpoints.
//!
//! - `GET  /recommendation`         – current workflow status and shared slots
//! - `POST /recommendation/refresh` – run the workflow and wait for it
//! - `POST /recommendation/reset`   – "change crop"
//! - `POST /recommendation/cancel`  – retire an in-flight run

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, routing::post, Json,
    Router,
};
use serde::Serialize;
use tracing::{error, info};

use super::AppState;
use crate::{CropSlots, RunOutcome, WorkflowStatus};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/recommendation", get(current))
        .route("/recommendation/refresh", post(refresh))
        .route("/recommendation/reset", post(reset))
        .route("/recommendation/cancel", post(cancel))
}

#[derive(Debug, Serialize)]
struct RecommendationView {
    status: WorkflowStatus,
    #[serde(flatten)]
    slots: CropSlots,
}

fn view(state: &AppState) -> RecommendationView {
    RecommendationView {
        status: state.workflow.status(),
        slots: state.workflow.state().slots(),
    }
}

async fn current(State(state): State<AppState>) -> Json<RecommendationView> {
    Json(view(&state))
}

async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    info!("POST /recommendation/refresh - Starting run");

    // Runs on its own task so a dropped request cannot strand the workflow in Loading.
    let workflow = state.workflow.clone();
    let outcome = match tokio::spawn(async move { workflow.refresh().await }).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Recommendation run task failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "recommendation run aborted" })),
            )
                .into_response();
        }
    };

    match &outcome {
        RunOutcome::Ready(crop) => info!("Run complete, recommending {}", crop.name),
        RunOutcome::Failed(failure) => info!("Run failed: {}", failure.message),
        RunOutcome::Superseded => info!("Run superseded by a newer request"),
    }

    (StatusCode::OK, Json(view(&state))).into_response()
}

async fn reset(State(state): State<AppState>) -> Json<RecommendationView> {
    // ---
    let changed = state.workflow.reset();
    info!("POST /recommendation/reset - changed: {}", changed);
    Json(view(&state))
}

async fn cancel(State(state): State<AppState>) -> Json<RecommendationView> {
    // ---
    let cancelled = state.workflow.cancel();
    info!("POST /recommendation/cancel - cancelled: {}", cancelled);
    Json(view(&state))
}
