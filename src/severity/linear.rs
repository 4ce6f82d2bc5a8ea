//! Linear-factor severity model.
//!
//! The light field is read as a raw intensity (higher = darker pipe),
//! scaled by how much the camera status inflates readings and by a water
//! factor that shrinks as submersion grows. There are no overrides.

use super::{base_action, SeverityLevel};
use crate::camera::{CameraReading, CameraStatus};

use serde::Serialize;

/// Breakdown of a linear-model assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearSeverity {
    pub level: SeverityLevel,
    pub raw_light: f64,
    pub adjusted_light: f64,
    pub final_light: f64,
    pub water_factor: f64,
    pub sensitivity_factor: f64,
    pub action: &'static str,
    pub interpretation: &'static str,
}

pub fn sensitivity_factor(status: CameraStatus) -> f64 {
    match status {
        CameraStatus::Ok => 1.0,
        CameraStatus::Lowlight => 1.25,
        CameraStatus::Warning => 1.5,
        CameraStatus::Unknown => 1.0,
    }
}

/// Water factor; deeper water lowers it.
pub fn water_factor(water: f64) -> f64 {
    if water >= 0.8 {
        0.7
    } else if water >= 0.5 {
        0.8
    } else if water >= 0.2 {
        0.9
    } else {
        1.0
    }
}

pub fn level_for(final_light: f64) -> SeverityLevel {
    if final_light > 1.20 {
        SeverityLevel::Critical
    } else if final_light > 0.90 {
        SeverityLevel::Severe
    } else if final_light > 0.60 {
        SeverityLevel::Moderate
    } else if final_light > 0.30 {
        SeverityLevel::Minor
    } else {
        SeverityLevel::Safe
    }
}

/// Recommended action. Levels 2 and 3 ask for confirmation when the
/// sensor itself is not reporting OK.
pub fn recommended_action(level: SeverityLevel, status: CameraStatus) -> &'static str {
    match level {
        SeverityLevel::Moderate if !status.is_ok() => {
            "Maintenance queue; schedule cleaning; confirm reading due to camera status"
        }
        SeverityLevel::Severe if !status.is_ok() => {
            "High-priority cleaning; confirm reading if sensor unreliable"
        }
        _ => base_action(level),
    }
}

/// Assess a raw light intensity, water fraction and status.
pub fn assess(light: f64, water: f64, status: CameraStatus) -> LinearSeverity {
    let sensitivity_factor = sensitivity_factor(status);
    let adjusted_light = light * sensitivity_factor;
    let water_factor = water_factor(water);
    let final_light = adjusted_light * water_factor;
    let level = level_for(final_light);

    LinearSeverity {
        level,
        raw_light: light,
        adjusted_light,
        final_light,
        water_factor,
        sensitivity_factor,
        action: recommended_action(level, status),
        interpretation: level.label(),
    }
}

pub fn assess_reading(reading: &CameraReading) -> LinearSeverity {
    assess(reading.light.raw(), reading.water, reading.status)
}
