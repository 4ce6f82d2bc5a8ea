//! Exponent/override severity model.
//!
//! The light field is read as an ordinal code and mapped to a base
//! severity, then amplified by status and water multipliers. Three hard
//! overrides force the critical level no matter what the product is.

use super::{base_action, SeverityLevel};
use crate::camera::{CameraReading, CameraStatus, LightCode};

use serde::Serialize;

/// Base severity used when the light value is not an ordinal code.
pub const DEFAULT_RAW_LIGHT: f64 = 0.75;

/// Breakdown of an exponent-model assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExponentSeverity {
    pub level: SeverityLevel,
    pub final_light_severity: f64,
    pub raw_light: f64,
    pub status_factor: f64,
    pub adjusted_light: f64,
    pub water_impact_factor: f64,
    pub override_triggered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_reason: Option<HardOverride>,
    pub interpretation: &'static str,
    pub action: &'static str,
}

/// Rules that force the critical level, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "&'static str")]
pub enum HardOverride {
    SubmergedLens,
    WarningWithWater,
    DarkestLight,
}

impl HardOverride {
    pub fn reason(self) -> &'static str {
        match self {
            HardOverride::SubmergedLens => "Water ≥ 0.85",
            HardOverride::WarningWithWater => "WARNING status with Water > 0.40",
            HardOverride::DarkestLight => "Light = 1 (darkest)",
        }
    }
}

impl From<HardOverride> for &'static str {
    fn from(rule: HardOverride) -> Self {
        rule.reason()
    }
}

/// Base severity for a light code.
pub fn raw_light(code: Option<LightCode>) -> f64 {
    match code {
        Some(LightCode::Darkest) => 1.30,
        Some(LightCode::Dark) => 1.05,
        Some(LightCode::Dim) => 0.75,
        Some(LightCode::Bright) => 0.45,
        Some(LightCode::Brightest) => 0.15,
        None => DEFAULT_RAW_LIGHT,
    }
}

pub fn status_factor(status: CameraStatus) -> f64 {
    match status {
        CameraStatus::Ok => 1.00,
        CameraStatus::Lowlight => 1.25,
        CameraStatus::Warning => 1.50,
        CameraStatus::Unknown => 1.00,
    }
}

/// Water multiplier. Values outside 0..=1 get the neutral factor.
pub fn water_impact_factor(water: f64) -> f64 {
    if (0.0..0.2).contains(&water) {
        1.00
    } else if (0.2..0.5).contains(&water) {
        1.10
    } else if (0.5..0.8).contains(&water) {
        1.25
    } else if (0.8..=1.0).contains(&water) {
        1.50
    } else {
        1.00
    }
}

/// First matching hard override, if any.
pub fn check_overrides(
    code: Option<LightCode>,
    water: f64,
    status: CameraStatus,
) -> Option<HardOverride> {
    if water >= 0.85 {
        Some(HardOverride::SubmergedLens)
    } else if status == CameraStatus::Warning && water > 0.40 {
        Some(HardOverride::WarningWithWater)
    } else if code == Some(LightCode::Darkest) {
        Some(HardOverride::DarkestLight)
    } else {
        None
    }
}

/// Bucket a final severity value. Anything not in a lower band is critical.
pub fn level_for(final_light_severity: f64) -> SeverityLevel {
    let v = final_light_severity;
    if (0.0..0.30).contains(&v) {
        SeverityLevel::Safe
    } else if (0.30..0.60).contains(&v) {
        SeverityLevel::Minor
    } else if (0.60..0.90).contains(&v) {
        SeverityLevel::Moderate
    } else if (0.90..1.20).contains(&v) {
        SeverityLevel::Severe
    } else {
        SeverityLevel::Critical
    }
}

/// Assess a light code, water fraction and status.
pub fn assess(light: Option<LightCode>, water: f64, status: CameraStatus) -> ExponentSeverity {
    let raw_light = raw_light(light);
    let status_factor = status_factor(status);
    let adjusted_light = raw_light * status_factor;
    let water_impact_factor = water_impact_factor(water);
    let final_light_severity = adjusted_light * water_impact_factor;

    let override_reason = check_overrides(light, water, status);
    let level = match override_reason {
        Some(_) => SeverityLevel::Critical,
        None => level_for(final_light_severity),
    };

    ExponentSeverity {
        level,
        final_light_severity,
        raw_light,
        status_factor,
        adjusted_light,
        water_impact_factor,
        override_triggered: override_reason.is_some(),
        override_reason,
        interpretation: level.label(),
        action: base_action(level),
    }
}

pub fn assess_reading(reading: &CameraReading) -> ExponentSeverity {
    assess(reading.light.code(), reading.water, reading.status)
}
