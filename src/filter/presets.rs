//! Named filter presets.

use super::{filter_cameras, FilterOptions, StatusFilter};
use crate::camera::{CameraReading, CameraStatus};
use crate::severity::SeverityLevel;

use serde::Serialize;
use std::sync::OnceLock;

/// A reusable partial filter configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterPreset {
    pub key: &'static str,
    pub name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    pub filters: FilterOptions,
}

fn catalog() -> Vec<FilterPreset> {
    vec![
        FilterPreset {
            key: "criticalOnly",
            name: "Critical Areas Only (Level 1-3)",
            description: None,
            filters: FilterOptions {
                max_severity: Some(SeverityLevel::Moderate),
                ..Default::default()
            },
        },
        FilterPreset {
            key: "immediateAction",
            name: "Immediate Action Required (Level 1-2)",
            description: None,
            filters: FilterOptions {
                max_severity: Some(SeverityLevel::Severe),
                ..Default::default()
            },
        },
        FilterPreset {
            key: "safeCameras",
            name: "Safe Cameras (Level 4-5)",
            description: None,
            filters: FilterOptions {
                min_severity: Some(SeverityLevel::Minor),
                ..Default::default()
            },
        },
        FilterPreset {
            key: "highWater",
            name: "High Water (>80%)",
            description: None,
            filters: FilterOptions {
                water_min: Some(0.8),
                ..Default::default()
            },
        },
        FilterPreset {
            key: "moderateWater",
            name: "Moderate Water (50-80%)",
            description: None,
            filters: FilterOptions {
                water_min: Some(0.5),
                water_max: Some(0.8),
                ..Default::default()
            },
        },
        FilterPreset {
            key: "highLight",
            name: "High Light / Dark Pipes (>0.6)",
            description: Some("Higher light readings mean darker pipes"),
            filters: FilterOptions {
                light_min: Some(0.6),
                ..Default::default()
            },
        },
        FilterPreset {
            key: "warningStatus",
            name: "Warning Status",
            description: None,
            filters: FilterOptions {
                status: Some(StatusFilter::Only(CameraStatus::Warning)),
                ..Default::default()
            },
        },
        FilterPreset {
            key: "lowlightStatus",
            name: "Low Light Status",
            description: None,
            filters: FilterOptions {
                status: Some(StatusFilter::Only(CameraStatus::Lowlight)),
                ..Default::default()
            },
        },
        FilterPreset {
            key: "unreliableCameras",
            name: "Unreliable Cameras (LOWLIGHT/WARNING)",
            description: None,
            filters: FilterOptions {
                unreliable_sensors: Some(true),
                ..Default::default()
            },
        },
        FilterPreset {
            key: "urgentObstructions",
            name: "Urgent Obstructions",
            description: Some("Level 1-3 segments whose notes flag an urgent blockage"),
            filters: FilterOptions {
                max_severity: Some(SeverityLevel::Moderate),
                has_urgency_keywords: Some(true),
                has_obstruction_keywords: Some(true),
                ..Default::default()
            },
        },
        FilterPreset {
            key: "floodRisk",
            name: "Flood Risk",
            description: Some("Abnormal water on segments that are already degraded"),
            filters: FilterOptions {
                abnormal_water: Some(true),
                multi_factor: Some(true),
                ..Default::default()
            },
        },
        FilterPreset {
            key: "structuralDamage",
            name: "Structural Damage",
            description: Some("Notes mention cracks, collapse or root intrusion"),
            filters: FilterOptions {
                max_severity: Some(SeverityLevel::Minor),
                has_structural_keywords: Some(true),
                ..Default::default()
            },
        },
        FilterPreset {
            key: "highRiskUnreliable",
            name: "High Risk, Unreliable Sensor",
            description: Some("Risk score above 70 on a camera not reporting OK"),
            filters: FilterOptions {
                high_risk: Some(true),
                unreliable_sensors: Some(true),
                ..Default::default()
            },
        },
    ]
}

/// The preset catalog, in display order.
pub fn presets() -> &'static [FilterPreset] {
    static PRESETS: OnceLock<Vec<FilterPreset>> = OnceLock::new();
    PRESETS.get_or_init(catalog)
}

pub fn find_preset(key: &str) -> Option<&'static FilterPreset> {
    presets().iter().find(|p| p.key == key)
}

pub fn preset_keys() -> Vec<&'static str> {
    presets().iter().map(|p| p.key).collect()
}

/// Merge a preset over the current options.
///
/// Returns `None` for an unknown key.
pub fn options_with_preset(current: &FilterOptions, key: &str) -> Option<FilterOptions> {
    find_preset(key).map(|preset| current.merged_with(&preset.filters))
}

/// Filter readings with a preset alone. Unknown keys return the readings
/// unfiltered.
pub fn apply_preset(readings: &[CameraReading], key: &str) -> Vec<CameraReading> {
    match find_preset(key) {
        Some(preset) => filter_cameras(readings, &preset.filters),
        None => readings.to_vec(),
    }
}
