//! Sensor status classification and the derived alert feed.
//!
//! Alerts are recomputed from the latest snapshot on every read. Read marks
//! are kept per [`AlertKind`] in [`ReadMarks`] and last only while that
//! alert stays active: a condition that clears and later returns is unread
//! again.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::SensorSnapshot;

// ---

const MOISTURE_LOW: f64 = 30.0;
const MOISTURE_HIGH: f64 = 70.0;
const PH_ACIDIC: f64 = 5.5;
const PH_ALKALINE: f64 = 7.5;
/// °C; above this young plants suffer heat stress.
const HEAT_STRESS: f64 = 38.0;
/// mg/kg; below this nitrogen is short for most crop stages.
const NITROGEN_LOW: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MoistureLevel {
    Low,
    Optimal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhLevel {
    Acidic,
    Neutral,
    Alkaline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
    Info,
}

/// Identity of an alert rule; at most one alert per kind is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    IrrigationRequired,
    WaterloggingRisk,
    SoilPhImbalance,
    HeatStress,
    LowNitrogen,
    OptimalConditions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub read: bool,
}

impl Alert {
    fn new(
        kind: AlertKind,
        severity: Severity,
        title: &str,
        message: String,
        action: Option<&str>,
    ) -> Self {
        Alert {
            kind,
            title: title.to_string(),
            message,
            severity,
            action: action.map(str::to_string),
            read: false,
        }
    }
}

/// Alert feed filter, `all` by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedFilter {
    #[default]
    All,
    Unread,
    High,
    Medium,
    Low,
}

/// Number of alerts per severity, plus the unread total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub unread: usize,
}

pub fn moisture_level(moisture: f64) -> MoistureLevel {
    // ---
    if moisture < MOISTURE_LOW {
        MoistureLevel::Low
    } else if moisture > MOISTURE_HIGH {
        MoistureLevel::High
    } else {
        MoistureLevel::Optimal
    }
}

pub fn ph_level(ph: f64) -> PhLevel {
    // ---
    if ph < PH_ACIDIC {
        PhLevel::Acidic
    } else if ph > PH_ALKALINE {
        PhLevel::Alkaline
    } else {
        PhLevel::Neutral
    }
}

/// Alerts raised by one snapshot. Falls back to a single informational
/// "all good" entry when no threshold is crossed.
pub fn alerts_for(snapshot: &SensorSnapshot) -> Vec<Alert> {
    // ---
    let mut alerts = Vec::new();

    match moisture_level(snapshot.moisture) {
        MoistureLevel::Low => alerts.push(Alert::new(
            AlertKind::IrrigationRequired,
            Severity::Medium,
            "Irrigation Required",
            format!(
                "Soil moisture is {}%, below the {}% minimum.",
                snapshot.moisture, MOISTURE_LOW
            ),
            Some("Irrigate the field within the next 24 hours."),
        )),
        MoistureLevel::High => alerts.push(Alert::new(
            AlertKind::WaterloggingRisk,
            Severity::Low,
            "Waterlogging Risk",
            format!(
                "Soil moisture is {}%, above the {}% maximum.",
                snapshot.moisture, MOISTURE_HIGH
            ),
            Some("Pause irrigation and check field drainage."),
        )),
        MoistureLevel::Optimal => {}
    }

    let ph = ph_level(snapshot.ph);
    if ph != PhLevel::Neutral {
        let action = match ph {
            PhLevel::Acidic => "Consider liming to raise soil pH.",
            _ => "Consider gypsum or organic matter to lower soil pH.",
        };
        alerts.push(Alert::new(
            AlertKind::SoilPhImbalance,
            Severity::Medium,
            "Soil pH Imbalance",
            format!(
                "Soil pH is {} ({:?}); most crops prefer {}-{}.",
                snapshot.ph, ph, PH_ACIDIC, PH_ALKALINE
            ),
            Some(action),
        ));
    }

    if snapshot.temperature > HEAT_STRESS {
        alerts.push(Alert::new(
            AlertKind::HeatStress,
            Severity::Medium,
            "Temperature Alert",
            format!(
                "Temperature is {}°C, above {}°C. This may stress young plants.",
                snapshot.temperature, HEAT_STRESS
            ),
            Some("Provide shade for seedlings and increase watering frequency."),
        ));
    }

    if snapshot.nitrogen < NITROGEN_LOW {
        alerts.push(Alert::new(
            AlertKind::LowNitrogen,
            Severity::Low,
            "Low Nitrogen Levels",
            format!(
                "Soil nitrogen is {} mg/kg, below the {} mg/kg optimum.",
                snapshot.nitrogen, NITROGEN_LOW
            ),
            Some("Apply nitrogen-rich fertilizer within the next week."),
        ));
    }

    if alerts.is_empty() {
        alerts.push(Alert::new(
            AlertKind::OptimalConditions,
            Severity::Info,
            "Optimal Conditions",
            "Soil conditions are suitable for crop growth. All parameters within healthy range."
                .to_string(),
            None,
        ));
    }

    alerts
}

pub fn apply_filter(alerts: Vec<Alert>, filter: FeedFilter) -> Vec<Alert> {
    // ---
    alerts
        .into_iter()
        .filter(|a| match filter {
            FeedFilter::All => true,
            FeedFilter::Unread => !a.read,
            FeedFilter::High => a.severity == Severity::High,
            FeedFilter::Medium => a.severity == Severity::Medium,
            FeedFilter::Low => a.severity == Severity::Low,
        })
        .collect()
}

pub fn count_by_severity(alerts: &[Alert]) -> SeverityCounts {
    // ---
    alerts
        .iter()
        .fold(SeverityCounts::default(), |mut counts, alert| {
            match alert.severity {
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
                Severity::Info => counts.info += 1,
            }
            if !alert.read {
                counts.unread += 1;
            }
            counts
        })
}

/// Session-scoped read marks for the alert feed.
#[derive(Debug, Default)]
pub struct ReadMarks {
    read: Mutex<HashSet<AlertKind>>,
}

impl ReadMarks {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `read` on each active alert, forgetting marks for alerts that
    /// are no longer active.
    pub fn annotate(&self, alerts: &mut [Alert]) {
        // ---
        let mut read = self.read();
        read.retain(|kind| alerts.iter().any(|a| a.kind == *kind));
        for alert in alerts.iter_mut() {
            alert.read = read.contains(&alert.kind);
        }
    }

    /// Mark one active alert as read. Returns `false` when `kind` is not
    /// among `active`.
    pub fn mark_read(&self, kind: AlertKind, active: &[Alert]) -> bool {
        // ---
        if !active.iter().any(|a| a.kind == kind) {
            return false;
        }
        self.read().insert(kind);
        true
    }

    /// Mark every active alert as read; returns how many were unread.
    pub fn mark_all_read(&self, active: &[Alert]) -> usize {
        // ---
        let mut read = self.read();
        active.iter().filter(|a| read.insert(a.kind)).count()
    }

    fn read(&self) -> MutexGuard<'_, HashSet<AlertKind>> {
        self.read.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
