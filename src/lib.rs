//! Crop advisory backend-for-frontend.
//!
//! Fetches the latest soil/environment sensor snapshot from the prediction
//! backend, asks it for a crop prediction, and publishes the resulting
//! recommendation into a session-scoped store that dashboard views read
//! through the HTTP API in [`routes`].
//!
//! Module gateway: sibling modules import shared types through the
//! re-exports below rather than from each other's paths.

pub mod alerts;
pub mod chat;
pub mod client;
pub mod config;
pub mod models;
pub mod routes;
pub mod state;
pub mod workflow;

pub use client::{ClientError, ErrorKind, HttpSensorClient, SensorSource};
pub use config::Config;
pub use models::{CropRecommendation, PredictionResult, SensorSnapshot, WaterNeeds};
pub use routes::AppState;
pub use state::{CropSlots, SharedCropState, StateError};
pub use workflow::{RecommendationWorkflow, RunFailure, RunOutcome, RunStage, WorkflowStatus};
