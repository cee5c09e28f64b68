// src/routes/mod.rs
//! HTTP API of the crop-advisor service.
//!
//! Each submodule contributes a `router()`; [`router`] merges them and binds
//! the shared [`AppState`]. One process serves one session.

use std::sync::Arc;

use axum::Router;

use crate::alerts::ReadMarks;
use crate::{Config, HttpSensorClient, RecommendationWorkflow};

mod chat;
mod health;
mod recommendation;
mod sensors;
mod weather;

// ---

/// State shared by every route of one session.
#[derive(Clone)]
pub struct AppState {
    // ---
    /// Owns the session's [`crate::SharedCropState`].
    pub workflow: Arc<RecommendationWorkflow<HttpSensorClient>>,
    /// Used directly only by the weather proxy.
    pub client: HttpSensorClient,
    pub config: Config,
    pub alerts: Arc<ReadMarks>,
}

impl AppState {
    // ---
    pub fn new(client: HttpSensorClient, config: Config) -> Self {
        // ---
        let workflow = RecommendationWorkflow::new(client.clone(), Default::default());
        AppState {
            workflow: Arc::new(workflow),
            client,
            config,
            alerts: Arc::new(ReadMarks::new()),
        }
    }
}

/// Full application router with state applied.
pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(recommendation::router())
        .merge(sensors::router())
        .merge(weather::router())
        .merge(chat::router())
        .merge(health::router())
        .with_state(state)
}
