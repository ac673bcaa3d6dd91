// src/core/nutrition.rs — Volume to calorie conversion
//
// mass_g        = volume_ml * density_g_per_ml
// calories_kcal = mass_g * kcal_per_gram
//
// One density and one energy density for the whole plate. The note on the
// estimate spells these assumptions out.

use super::types::CalorieEstimate;
use crate::capability::VolumeEstimate;
use crate::infra::config::NutritionConfig;

#[derive(Debug, Clone)]
pub struct CalorieConverter {
    density_g_per_ml: f64,
    kcal_per_gram: f64,
}

impl CalorieConverter {
    pub fn new(config: &NutritionConfig) -> Self {
        Self {
            density_g_per_ml: config.density_g_per_ml,
            kcal_per_gram: config.kcal_per_gram,
        }
    }

    pub fn convert(&self, estimate: &VolumeEstimate) -> CalorieEstimate {
        let volume_ml = estimate.volume_ml.max(0.0);
        let mass_g = volume_ml * self.density_g_per_ml;
        let calories_kcal = mass_g * self.kcal_per_gram;

        let confidence = match estimate.confidence {
            Some(c) => format!("service confidence {:.0}%", c.clamp(0.0, 1.0) * 100.0),
            None => "service reported no confidence".to_string(),
        };
        let note = format!(
            "Assumes {:.2} g/ml and {:.2} kcal/g across {} segment(s); {}. Treat as a rough estimate.",
            self.density_g_per_ml,
            self.kcal_per_gram,
            estimate.segments,
            confidence
        );

        CalorieEstimate {
            volume_ml: round1(volume_ml),
            mass_g: round1(mass_g),
            calories_kcal: calories_kcal.round(),
            confidence: estimate.confidence,
            note,
        }
    }
}

impl Default for CalorieConverter {
    fn default() -> Self {
        Self::new(&NutritionConfig::default())
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
