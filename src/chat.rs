//! Keyword intent matching for the farming assistant.
//!
//! [`classify`] maps a free-text question onto an [`Intent`] by lower-case
//! substring checks, first match wins. [`reply`] answers from the current
//! session slots instead of canned readings.

use serde::Serialize;

use crate::alerts::{self, MoistureLevel};
use crate::CropSlots;

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CropRecommendation,
    Irrigation,
    Weather,
    Fertilizer,
    PestDisease,
    Fallback,
}

pub fn classify(message: &str) -> Intent {
    // ---
    let text = message.to_lowercase();
    let has = |needle: &str| text.contains(needle);

    if has("crop") && (has("best") || has("recommend")) {
        Intent::CropRecommendation
    } else if has("irrigat") || has("water") {
        Intent::Irrigation
    } else if has("weather") || has("forecast") {
        Intent::Weather
    } else if has("fertilizer") || has("nutrient") {
        Intent::Fertilizer
    } else if has("pest") || has("disease") {
        Intent::PestDisease
    } else {
        Intent::Fallback
    }
}

const NO_READINGS: &str =
    "No sensor readings yet. Refresh the recommendation to fetch the latest snapshot.";

pub fn reply(intent: Intent, slots: &CropSlots) -> String {
    // ---
    let snapshot = slots.sensor_snapshot.as_ref();

    match intent {
        Intent::CropRecommendation => match (&slots.selected_crop, snapshot) {
            (Some(crop), Some(s)) => format!(
                "Based on your current soil conditions (N: {}, P: {}, K: {} mg/kg), \
                 I recommend {} {} with a {}% match. Expected yield: {}.",
                s.nitrogen,
                s.phosphorus,
                s.potassium,
                crop.image_emoji,
                crop.name,
                crop.match_score,
                crop.yield_range
            ),
            _ => "No crop is selected yet. Refresh the recommendation to get one.".to_string(),
        },
        Intent::Irrigation => match snapshot {
            Some(s) => {
                let advice = match alerts::moisture_level(s.moisture) {
                    MoistureLevel::Low => "Irrigate within the next 24 hours.",
                    MoistureLevel::Optimal => "No immediate irrigation needed.",
                    MoistureLevel::High => "Pause irrigation and check drainage.",
                };
                format!(
                    "Soil moisture is {}% at {}°C. {} Water early morning or late evening \
                     to reduce evaporation.",
                    s.moisture, s.temperature, advice
                )
            }
            None => NO_READINGS.to_string(),
        },
        Intent::Weather => match snapshot {
            Some(s) => format!(
                "Field sensors read {}°C and {}% humidity. See /weather for the city forecast.",
                s.temperature, s.humidity
            ),
            None => "See /weather for the city forecast.".to_string(),
        },
        Intent::Fertilizer => match (snapshot, &slots.selected_crop) {
            (Some(s), crop) => {
                let mut text = format!(
                    "Soil NPK: N {} mg/kg, P {} mg/kg, K {} mg/kg.",
                    s.nitrogen, s.phosphorus, s.potassium
                );
                if let Some(crop) = crop {
                    text.push_str(&format!(" For {}: {}.", crop.name, crop.fertilizer_tips));
                }
                text
            }
            (None, _) => NO_READINGS.to_string(),
        },
        Intent::PestDisease => "Check leaf undersides for aphids and look for orange-brown \
             rust spots. Avoid overwatering to prevent root rot, keep proper plant spacing \
             and remove infected plants immediately."
            .to_string(),
        Intent::Fallback => "Could you be more specific? I can help with crop \
             recommendations, irrigation, weather, fertilizer and pest management."
            .to_string(),
    }
}
