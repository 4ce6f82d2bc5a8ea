//! Fleet-wide aggregation over linear-model severities.
//!
//! Nothing here is cached: every call reassesses the readings it is given.

use crate::camera::{CameraReading, CameraStatus};
use crate::severity::{linear, LinearSeverity};

use serde::Serialize;

/// A reading paired with its linear-model severity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraWithSeverity {
    #[serde(flatten)]
    pub reading: CameraReading,
    pub severity: LinearSeverity,
}

/// Assess every reading, keeping input order.
pub fn assess_fleet(readings: &[CameraReading]) -> Vec<CameraWithSeverity> {
    readings
        .iter()
        .map(|reading| CameraWithSeverity {
            reading: reading.clone(),
            severity: linear::assess_reading(reading),
        })
        .collect()
}

/// Weighted health percentage, 0 (all critical) to 100 (all safe).
///
/// An empty fleet scores 0.
pub fn system_health(readings: &[CameraReading]) -> f64 {
    if readings.is_empty() {
        return 0.0;
    }

    let total: f64 = readings
        .iter()
        .map(|r| linear::assess_reading(r).level.health_weight())
        .sum();
    let max_score = readings.len() as f64 * 100.0;

    total / max_score * 100.0
}

/// Readings at levels 1-3.
pub fn critical_areas(readings: &[CameraReading]) -> Vec<CameraWithSeverity> {
    assess_fleet(readings)
        .into_iter()
        .filter(|c| c.severity.level.is_critical_area())
        .collect()
}

/// Readings at levels 1-2.
pub fn immediate_action_required(readings: &[CameraReading]) -> Vec<CameraWithSeverity> {
    assess_fleet(readings)
        .into_iter()
        .filter(|c| c.severity.level.needs_immediate_action())
        .collect()
}

/// Readings at levels 4-5.
pub fn safe_cameras(readings: &[CameraReading]) -> Vec<CameraWithSeverity> {
    assess_fleet(readings)
        .into_iter()
        .filter(|c| c.severity.level.is_safe())
        .collect()
}

/// Camera counts per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    #[serde(rename = "OK")]
    pub ok: usize,
    #[serde(rename = "LOWLIGHT")]
    pub lowlight: usize,
    #[serde(rename = "WARNING")]
    pub warning: usize,
    #[serde(rename = "UNKNOWN", skip_serializing_if = "is_zero")]
    pub unknown: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl StatusBreakdown {
    pub fn from_readings(readings: &[CameraReading]) -> Self {
        let mut breakdown = Self::default();
        for reading in readings {
            match reading.status {
                CameraStatus::Ok => breakdown.ok += 1,
                CameraStatus::Lowlight => breakdown.lowlight += 1,
                CameraStatus::Warning => breakdown.warning += 1,
                CameraStatus::Unknown => breakdown.unknown += 1,
            }
        }
        breakdown
    }

    /// Cameras whose status is anything but OK.
    pub fn unreliable(&self) -> usize {
        self.lowlight + self.warning + self.unknown
    }
}

/// Summary statistics for one snapshot of the fleet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSummary {
    pub total: usize,
    /// Levels 1-3.
    pub critical: usize,
    /// Levels 1-2.
    pub severe: usize,
    pub status_breakdown: StatusBreakdown,
    pub average_water: f64,
    pub average_light: f64,
    pub system_health: f64,
}

impl FleetSummary {
    pub fn from_readings(readings: &[CameraReading]) -> Self {
        let assessed = assess_fleet(readings);
        let critical = assessed
            .iter()
            .filter(|c| c.severity.level.is_critical_area())
            .count();
        let severe = assessed
            .iter()
            .filter(|c| c.severity.level.needs_immediate_action())
            .count();

        Self {
            total: readings.len(),
            critical,
            severe,
            status_breakdown: StatusBreakdown::from_readings(readings),
            average_water: mean(readings.iter().map(|r| r.water)),
            average_light: mean(readings.iter().map(|r| r.light.raw())),
            system_health: system_health(readings),
        }
    }

    pub fn display_average_water(&self) -> String {
        format!("{:.2}", self.average_water)
    }

    pub fn display_average_light(&self) -> String {
        format!("{:.2}", self.average_light)
    }
}

/// Arithmetic mean; 0 for an empty sequence.
pub(crate) fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::SeverityLevel;

    const EPS: f64 = 1e-9;

    fn cam(id: u32, water: f64, light: f64, status: CameraStatus) -> CameraReading {
        CameraReading::new(id, water, light, status)
    }

    fn mixed_fleet() -> Vec<CameraReading> {
        vec![
            cam(1, 0.1, 0.2, CameraStatus::Ok),       // 0.20 -> 5
            cam(2, 0.1, 0.5, CameraStatus::Ok),       // 0.50 -> 4
            cam(3, 0.1, 0.7, CameraStatus::Ok),       // 0.70 -> 3
            cam(4, 0.1, 0.7, CameraStatus::Warning),  // 1.05 -> 2
            cam(5, 0.9, 1.5, CameraStatus::Warning),  // 1.575 -> 1
            cam(6, 0.3, 0.4, CameraStatus::Lowlight), // 0.45 -> 4
        ]
    }

    #[test]
    fn test_system_health_bounds() {
        assert_eq!(system_health(&[]), 0.0);

        let all_safe = vec![cam(1, 0.0, 0.1, CameraStatus::Ok), cam(2, 0.0, 0.2, CameraStatus::Ok)];
        assert!((system_health(&all_safe) - 100.0).abs() < EPS);

        let all_critical = vec![
            cam(1, 0.0, 2.0, CameraStatus::Ok),
            cam(2, 0.0, 1.3, CameraStatus::Warning),
        ];
        assert!(system_health(&all_critical).abs() < EPS);
    }

    #[test]
    fn test_system_health_weighting() {
        // (100 + 75 + 50 + 25 + 0 + 75) / 600 * 100
        let expected = 325.0 / 600.0 * 100.0;
        assert!((system_health(&mixed_fleet()) - expected).abs() < EPS);
    }

    #[test]
    fn test_level_groups() {
        let fleet = mixed_fleet();

        let ids = |v: Vec<CameraWithSeverity>| -> Vec<u32> {
            v.iter().map(|c| c.reading.segment_id).collect()
        };

        assert_eq!(ids(critical_areas(&fleet)), vec![3, 4, 5]);
        assert_eq!(ids(immediate_action_required(&fleet)), vec![4, 5]);
        assert_eq!(ids(safe_cameras(&fleet)), vec![1, 2, 6]);
    }

    #[test]
    fn test_summary() {
        let summary = FleetSummary::from_readings(&mixed_fleet());
        assert_eq!(summary.total, 6);
        assert_eq!(summary.critical, 3);
        assert_eq!(summary.severe, 2);
        assert_eq!(
            summary.status_breakdown,
            StatusBreakdown { ok: 3, lowlight: 1, warning: 2, unknown: 0 }
        );
        assert_eq!(summary.status_breakdown.unreliable(), 3);
        assert!((summary.average_water - 1.6 / 6.0).abs() < EPS);
        assert!((summary.average_light - 4.0 / 6.0).abs() < EPS);
        assert_eq!(summary.display_average_water(), "0.27");
        assert_eq!(summary.display_average_light(), "0.67");
    }

    #[test]
    fn test_empty_summary() {
        let summary = FleetSummary::from_readings(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_water, 0.0);
        assert_eq!(summary.system_health, 0.0);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["statusBreakdown"]["OK"], 0);
        assert!(json["statusBreakdown"].get("UNKNOWN").is_none());
    }

    #[test]
    fn test_assessment_keeps_order_and_flattens() {
        let assessed = assess_fleet(&mixed_fleet());
        assert_eq!(assessed.len(), 6);
        assert_eq!(assessed[4].severity.level, SeverityLevel::Critical);

        let json = serde_json::to_value(&assessed[0]).unwrap();
        assert_eq!(json["segmentId"], 1);
        assert_eq!(json["severity"]["level"], 5);
    }
}
