//! Rolling summary over the retained snapshot window.
//!
//! The critical predicate here is looser than the exponent model's hard
//! overrides (LOWLIGHT alone is enough) and is deliberately separate.

use crate::camera::{CameraReading, CameraStatus, Snapshot};
use crate::fleet::mean;

use serde::Serialize;
use std::borrow::Borrow;

pub const DEFAULT_WINDOW_SECS: u64 = 60;

/// Whether a single reading counts as a critical event in the window.
pub fn is_critical_reading(reading: &CameraReading) -> bool {
    reading.water >= 0.85
        || (reading.status == CameraStatus::Warning && reading.water > 0.40)
        || reading.light.raw() == 1.0
        || reading.status == CameraStatus::Warning
        || reading.status == CameraStatus::Lowlight
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalArea {
    pub timestamp: i64,
    pub count: usize,
    pub segments: Vec<CameraReading>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotAverage {
    pub timestamp: i64,
    pub avg_water: f64,
    pub avg_light: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowTotals {
    pub total_data_points: usize,
    pub total_critical_events: usize,
    pub avg_water_overall: f64,
    pub avg_light_overall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSummary {
    /// Narrative, one sentence per line.
    pub insights: String,
    pub critical_areas: Vec<CriticalArea>,
    pub averages: Vec<SnapshotAverage>,
    pub summary: WindowTotals,
}

pub fn summarize_window<S: Borrow<Snapshot>>(snapshots: &[S]) -> WindowSummary {
    summarize_window_over(snapshots, DEFAULT_WINDOW_SECS)
}

/// Summarize snapshots already restricted to a window of `window_secs`.
///
/// Accepts owned or shared snapshots, so retained history is read in place.
pub fn summarize_window_over<S: Borrow<Snapshot>>(
    snapshots: &[S],
    window_secs: u64,
) -> WindowSummary {
    let mut critical_areas = Vec::new();
    let mut averages = Vec::with_capacity(snapshots.len());

    for snapshot in snapshots.iter().map(Borrow::borrow) {
        averages.push(SnapshotAverage {
            timestamp: snapshot.timestamp,
            avg_water: mean(snapshot.readings.iter().map(|r| r.water)),
            avg_light: mean(snapshot.readings.iter().map(|r| r.light.raw())),
        });

        let segments: Vec<CameraReading> = snapshot
            .readings
            .iter()
            .filter(|r| is_critical_reading(r))
            .cloned()
            .collect();
        if !segments.is_empty() {
            critical_areas.push(CriticalArea {
                timestamp: snapshot.timestamp,
                count: segments.len(),
                segments,
            });
        }
    }

    let summary = WindowTotals {
        total_data_points: snapshots.len(),
        total_critical_events: critical_areas.iter().map(|a| a.count).sum(),
        avg_water_overall: mean(averages.iter().map(|a| a.avg_water)),
        avg_light_overall: mean(averages.iter().map(|a| a.avg_light)),
    };

    let insights = narrative(&summary, critical_areas.len(), window_secs);

    WindowSummary {
        insights,
        critical_areas,
        averages,
        summary,
    }
}

const NORMAL_STATUS: &str = "STATUS: System operating within normal parameters.";

fn narrative(totals: &WindowTotals, critical_snapshots: usize, window_secs: u64) -> String {
    if totals.total_data_points == 0 {
        return format!(
            "No telemetry recorded in the last {} seconds.\n{}",
            window_secs, NORMAL_STATUS
        );
    }

    let mut lines = vec![format!(
        "Analyzed {} data point(s) from the last {} seconds.",
        totals.total_data_points, window_secs
    )];

    let water_pct = totals.avg_water_overall * 100.0;
    if totals.avg_water_overall > 0.8 {
        lines.push(format!(
            "Water levels are elevated across monitored segments (avg {:.1}%).",
            water_pct
        ));
    } else if totals.avg_water_overall > 0.7 {
        lines.push(format!("Water level trend: high (avg {:.1}%).", water_pct));
    }

    if totals.avg_light_overall < 2.0 {
        lines.push(format!(
            "Visibility concern: insufficient lighting detected (avg light {:.1}/5).",
            totals.avg_light_overall
        ));
    }

    let critical_fraction = critical_snapshots as f64 / totals.total_data_points as f64;
    if critical_fraction > 0.5 {
        lines.push(format!(
            "ALERT: {:.0}% of data points contain critical readings ({} event(s)). Immediate inspection recommended.",
            critical_fraction * 100.0,
            totals.total_critical_events
        ));
    } else if critical_fraction > 0.0 {
        lines.push(format!(
            "CAUTION: {} critical event(s) detected in the window. Monitor affected segments.",
            totals.total_critical_events
        ));
    } else {
        lines.push(NORMAL_STATUS.to_string());
    }

    lines.join("\n")
}
