//! Session-scoped store for the selected crop and the last sensor snapshot.
//!
//! One [`SharedCropState`] exists per session and is handed to every view
//! (route) that needs it. Clones are handles onto the same store. Every
//! change is published to subscribers obtained through
//! [`SharedCropState::subscribe`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::{CropRecommendation, SensorSnapshot};

// ---

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StateError {
    /// A recommendation is always derived from a snapshot.
    #[error("cannot select a crop before a sensor snapshot is stored")]
    NoSnapshot,
}

/// Contents of the store at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CropSlots {
    // ---
    pub selected_crop: Option<CropRecommendation>,
    pub sensor_snapshot: Option<SensorSnapshot>,
    pub sensor_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct SharedCropState {
    slots: Arc<watch::Sender<CropSlots>>,
}

impl Default for SharedCropState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedCropState {
    // ---
    pub fn new() -> Self {
        // ---
        let (tx, _rx) = watch::channel(CropSlots::default());
        SharedCropState { slots: Arc::new(tx) }
    }

    /// Replace the snapshot slot. The selected crop is left untouched.
    pub fn set_sensor_snapshot(&self, snapshot: SensorSnapshot) {
        // ---
        self.slots.send_modify(|slots| {
            slots.sensor_snapshot = Some(snapshot);
            slots.sensor_updated_at = Some(Utc::now());
        });
    }

    /// Replace the crop slot; `None` is the "change crop" reset.
    pub fn set_selected_crop(&self, crop: Option<CropRecommendation>) -> Result<(), StateError> {
        // ---
        let mut result = Ok(());
        self.slots.send_if_modified(|slots| {
            if crop.is_some() && slots.sensor_snapshot.is_none() {
                result = Err(StateError::NoSnapshot);
                return false;
            }
            if slots.selected_crop == crop {
                return false;
            }
            slots.selected_crop = crop;
            true
        });
        result
    }

    pub fn sensor_snapshot(&self) -> Option<SensorSnapshot> {
        self.slots.borrow().sensor_snapshot
    }

    pub fn selected_crop(&self) -> Option<CropRecommendation> {
        self.slots.borrow().selected_crop.clone()
    }

    /// Copy of both slots, read consistently.
    pub fn slots(&self) -> CropSlots {
        self.slots.borrow().clone()
    }

    /// Receiver notified after every change to either slot.
    pub fn subscribe(&self) -> watch::Receiver<CropSlots> {
        self.slots.subscribe()
    }
}
