//! Data models exchanged with the prediction backend and held in session state.

use serde::{Deserialize, Serialize};

// ---

/// Match score shown for a backend prediction; the backend does not supply one.
pub const DEFAULT_MATCH_SCORE: u8 = 95;
pub const DEFAULT_SOWING_TIME: &str = "As per local season";
pub const DEFAULT_HARVEST_TIME: &str = "As per crop cycle";
pub const DEFAULT_CROP_GLYPH: &str = "🌱";

/// Point-in-time reading of all monitored soil/environment sensors.
///
/// Wire format uses upper-case `N`/`P`/`K` keys; lower-case keys are
/// accepted when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    // ---
    /// Soil moisture, percent.
    pub moisture: f64,
    pub ph: f64,
    /// Air temperature, °C.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Nitrogen, mg/kg.
    #[serde(rename = "N", alias = "n")]
    pub nitrogen: f64,
    /// Phosphorus, mg/kg.
    #[serde(rename = "P", alias = "p")]
    pub phosphorus: f64,
    /// Potassium, mg/kg.
    #[serde(rename = "K", alias = "k")]
    pub potassium: f64,
}

impl SensorSnapshot {
    // ---
    /// Check that every reading is finite and inside its physical range.
    pub fn validate(&self) -> Result<(), String> {
        // ---
        check_range("moisture", self.moisture, 0.0, 100.0)?;
        check_range("ph", self.ph, 0.0, 14.0)?;
        check_range("humidity", self.humidity, 0.0, 100.0)?;
        check_finite("temperature", self.temperature)?;
        check_range("N", self.nitrogen, 0.0, f64::MAX)?;
        check_range("P", self.phosphorus, 0.0, f64::MAX)?;
        check_range("K", self.potassium, 0.0, f64::MAX)?;
        Ok(())
    }
}

/// Body returned by `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    // ---
    pub recommended_crop: String,
    pub recommended_fertilizer: String,
    pub predicted_yield_ton_per_hectare: f64,
}

impl PredictionResult {
    // ---
    pub fn validate(&self) -> Result<(), String> {
        // ---
        if self.recommended_crop.trim().is_empty() {
            return Err("recommended_crop is empty".to_string());
        }
        check_range(
            "predicted_yield_ton_per_hectare",
            self.predicted_yield_ton_per_hectare,
            0.0,
            f64::MAX,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaterNeeds {
    Low,
    Medium,
    High,
}

/// Crop advice shown to the user and shared across views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRecommendation {
    // ---
    pub id: u32,
    pub name: String,
    /// 0–100.
    pub match_score: u8,
    pub yield_range: String,
    pub sowing_time: String,
    pub harvest_time: String,
    pub water_needs: WaterNeeds,
    pub fertilizer_tips: String,
    pub image_emoji: String,
}

impl CropRecommendation {
    // ---
    /// Build the displayed recommendation from a backend prediction,
    /// filling the fields the backend does not provide with defaults.
    pub fn from_prediction(prediction: &PredictionResult) -> Self {
        // ---
        CropRecommendation {
            id: 1,
            name: prediction.recommended_crop.trim().to_string(),
            match_score: DEFAULT_MATCH_SCORE,
            yield_range: format!("{} t/ha", prediction.predicted_yield_ton_per_hectare),
            sowing_time: DEFAULT_SOWING_TIME.to_string(),
            harvest_time: DEFAULT_HARVEST_TIME.to_string(),
            water_needs: WaterNeeds::Medium,
            fertilizer_tips: prediction.recommended_fertilizer.clone(),
            image_emoji: DEFAULT_CROP_GLYPH.to_string(),
        }
    }
}

fn check_finite(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(format!("{field} is not a finite number"))
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), String> {
    // ---
    check_finite(field, value)?;
    if value < min || value > max {
        return Err(format!("{field} = {value} is outside {min}..={max}"));
    }
    Ok(())
}
