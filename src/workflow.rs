//! Sensor-driven recommendation workflow.
//!
//! A run fetches the latest snapshot, stores it, requests a prediction for
//! that same snapshot and publishes the resulting [`CropRecommendation`]
//! into [`SharedCropState`]:
//!
//! ```text
//! Idle ──refresh──▶ Loading ──ok──▶ Ready
//!                      │
//!                      └──error──▶ Failed
//!
//! reset: any state holding a selected crop ──▶ Idle
//! ```
//!
//! Every run is tagged with a generation. Only the run holding the current
//! generation may write into the shared state; starting a new run,
//! cancelling, or resetting retires older runs, and their late results are
//! discarded.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{error, info, info_span, warn, Instrument};

use crate::client::{ClientError, ErrorKind, SensorSource};
use crate::{CropRecommendation, SensorSnapshot, SharedCropState};

// ---

/// Step of a run that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Snapshot,
    Prediction,
    /// Writing the recommendation into the shared state.
    Publish,
}

/// Failure recorded for display; the workflow does not retry on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunFailure {
    pub stage: RunStage,
    pub kind: ErrorKind,
    pub message: String,
}

impl RunFailure {
    fn new(stage: RunStage, err: &ClientError) -> Self {
        RunFailure {
            stage,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(RunFailure),
}

/// Result of one call to [`RecommendationWorkflow::refresh`].
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Ready(CropRecommendation),
    Failed(RunFailure),
    /// A newer run, a cancel, or a reset retired this run before it finished.
    Superseded,
}

#[derive(Debug, Default)]
struct RunControl {
    status: WorkflowStatus,
    generation: u64,
}

pub struct RecommendationWorkflow<C> {
    // ---
    source: C,
    state: SharedCropState,
    control: Mutex<RunControl>,
}

impl<C: SensorSource> RecommendationWorkflow<C> {
    // ---
    pub fn new(source: C, state: SharedCropState) -> Self {
        // ---
        RecommendationWorkflow {
            source,
            state,
            control: Mutex::new(RunControl::default()),
        }
    }

    pub fn state(&self) -> &SharedCropState {
        &self.state
    }

    pub fn status(&self) -> WorkflowStatus {
        self.control().status.clone()
    }

    /// Run the workflow once: `Idle|Ready|Failed → Loading → Ready|Failed`.
    ///
    /// Always fetches a fresh snapshot, even when one is already stored.
    pub async fn refresh(&self) -> RunOutcome {
        // ---
        let generation = self.begin_run();
        let span = info_span!("recommendation_run", generation);

        self.run(generation).instrument(span).await
    }

    /// "Change crop": clear the selected crop while keeping the last
    /// snapshot, whatever the current status. Any in-flight run is retired
    /// and the workflow returns to `Idle`. A no-op when no crop is
    /// selected. Returns whether anything changed.
    pub fn reset(&self) -> bool {
        // ---
        let mut control = self.control();
        if self.state.selected_crop().is_none() {
            return false;
        }

        if control.status == WorkflowStatus::Loading {
            info!("Reset retires in-flight run {}", control.generation);
        }
        control.generation += 1;
        control.status = WorkflowStatus::Idle;
        if let Err(e) = self.state.set_selected_crop(None) {
            // Clearing never fails
            warn!("Reset could not clear the selected crop: {}", e);
        }
        info!("Recommendation reset, snapshot kept");
        true
    }

    /// Retire any in-flight run (e.g. the requesting view went away):
    /// `Loading → Idle`. Returns whether a run was in flight.
    pub fn cancel(&self) -> bool {
        // ---
        let mut control = self.control();
        if control.status != WorkflowStatus::Loading {
            return false;
        }

        control.generation += 1;
        control.status = WorkflowStatus::Idle;
        info!("In-flight recommendation run cancelled");
        true
    }

    async fn run(&self, generation: u64) -> RunOutcome {
        // ---
        info!("Fetching latest sensor snapshot");
        let snapshot = match self.source.fetch_latest_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => return self.fail(generation, RunFailure::new(RunStage::Snapshot, &e)),
        };

        if !self.commit_snapshot(generation, snapshot) {
            return RunOutcome::Superseded;
        }

        info!("Requesting crop prediction");
        let prediction = match self.source.request_prediction(&snapshot).await {
            Ok(prediction) => prediction,
            Err(e) => return self.fail(generation, RunFailure::new(RunStage::Prediction, &e)),
        };

        let crop = CropRecommendation::from_prediction(&prediction);
        self.commit_recommendation(generation, crop)
    }

    fn begin_run(&self) -> u64 {
        // ---
        let mut control = self.control();
        control.generation += 1;
        control.status = WorkflowStatus::Loading;
        control.generation
    }

    fn commit_snapshot(&self, generation: u64, snapshot: SensorSnapshot) -> bool {
        // ---
        let control = self.control();
        if control.generation != generation {
            warn!("Discarding snapshot from superseded run {}", generation);
            return false;
        }
        self.state.set_sensor_snapshot(snapshot);
        true
    }

    fn commit_recommendation(&self, generation: u64, crop: CropRecommendation) -> RunOutcome {
        // ---
        let mut control = self.control();
        if control.generation != generation {
            warn!("Discarding prediction from superseded run {}", generation);
            return RunOutcome::Superseded;
        }

        // Snapshots are never cleared once stored, so this run's snapshot is present.
        if let Err(e) = self.state.set_selected_crop(Some(crop.clone())) {
            error!("Invariant breached publishing run {}: {}", generation, e);
            let failure = RunFailure {
                stage: RunStage::Publish,
                kind: ErrorKind::Internal,
                message: e.to_string(),
            };
            control.status = WorkflowStatus::Failed(failure.clone());
            return RunOutcome::Failed(failure);
        }

        control.status = WorkflowStatus::Ready;
        info!("Recommended crop: {} ({})", crop.name, crop.yield_range);
        RunOutcome::Ready(crop)
    }

    fn fail(&self, generation: u64, failure: RunFailure) -> RunOutcome {
        // ---
        let mut control = self.control();
        if control.generation != generation {
            warn!("Ignoring failure of superseded run {}", generation);
            return RunOutcome::Superseded;
        }

        warn!("Recommendation run failed at {:?}: {}", failure.stage, failure.message);
        control.status = WorkflowStatus::Failed(failure.clone());
        RunOutcome::Failed(failure)
    }

    fn control(&self) -> MutexGuard<'_, RunControl> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
