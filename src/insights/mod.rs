//! Fleet analysis, fallback insights and per-segment cards.

pub mod segment;
pub mod window;

pub use segment::{segment_insights, CardKind, CardTone, SegmentCard};
pub use window::{summarize_window, WindowSummary};

use crate::camera::CameraReading;
use crate::fleet::{self, FleetSummary, StatusBreakdown};
use crate::severity::SeverityLevel;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("no analysis backend configured")]
    NoBackend,
    #[error("analysis backend failed: {0}")]
    Backend(String),
    #[error("analysis backend returned no text")]
    EmptyResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsightKind {
    CriticalAlert,
    SystemDegradation,
    ReliabilityConcern,
    SystemHealth,
}

/// A rule-based finding about the whole fleet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    /// 1 is the most pressing.
    pub priority: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cameras: Option<Vec<u32>>,
    pub action: &'static str,
}

/// Display-ready view of a level 1-3 camera.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraDetail {
    pub id: u32,
    pub position: (f64, f64),
    pub water: String,
    pub light: String,
    pub status: String,
    pub severity_level: SeverityLevel,
    pub interpretation: &'static str,
    pub action: &'static str,
    pub adjusted_light: String,
    pub final_light: String,
    pub notes: String,
}

/// Details for every camera at level 3 or worse, in input order.
pub fn critical_details(readings: &[CameraReading]) -> Vec<CameraDetail> {
    fleet::critical_areas(readings)
        .into_iter()
        .map(|c| CameraDetail {
            id: c.reading.segment_id,
            position: c.reading.position,
            water: format!("{:.1}%", c.reading.water * 100.0),
            light: format!("{:.3}", c.reading.light.raw()),
            status: c.reading.status.to_string(),
            severity_level: c.severity.level,
            interpretation: c.severity.interpretation,
            action: c.severity.action,
            adjusted_light: format!("{:.3}", c.severity.adjusted_light),
            final_light: format!("{:.3}", c.severity.final_light),
            notes: c
                .reading
                .view_description
                .clone()
                .unwrap_or_else(|| "None".to_string()),
        })
        .collect()
}

/// What an analysis backend is asked about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub summary: FleetSummary,
    pub critical_cameras: Vec<CameraDetail>,
}

impl AnalysisRequest {
    pub fn from_readings(readings: &[CameraReading]) -> Self {
        Self {
            summary: FleetSummary::from_readings(readings),
            critical_cameras: critical_details(readings),
        }
    }

    /// Plain-text briefing handed to text-generating backends.
    pub fn prompt(&self) -> String {
        let s = &self.summary;
        let StatusBreakdown { ok, lowlight, warning, .. } = s.status_breakdown;
        let mut prompt = String::new();
        prompt.push_str("Analyze this sewer camera monitoring data and provide actionable insights.\n");
        prompt.push_str("Severity levels run from 1 (critical) to 5 (safe).\n\n");
        prompt.push_str(&format!("Total cameras: {}\n", s.total));
        prompt.push_str(&format!("System health: {:.1}%\n", s.system_health));
        prompt.push_str(&format!("Critical areas (Level 1-3): {}\n", s.critical));
        prompt.push_str(&format!("Immediate action required (Level 1-2): {}\n", s.severe));
        prompt.push_str(&format!(
            "Camera status: {} OK, {} LOWLIGHT, {} WARNING\n",
            ok, lowlight, warning
        ));
        prompt.push_str(&format!("Average water level: {}\n", s.display_average_water()));
        prompt.push_str(&format!("Average light intensity: {}\n\n", s.display_average_light()));
        prompt.push_str("Critical cameras:\n");
        for c in &self.critical_cameras {
            prompt.push_str(&format!(
                "- Camera {}: level {} ({}), water {}, light {}, status {}, notes: {}\n",
                c.id, c.severity_level.value(), c.interpretation, c.water, c.light, c.status, c.notes
            ));
        }
        prompt
    }
}

/// Produces free-text analysis for a fleet.
pub trait AnalysisBackend: Send + Sync {
    fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalysisError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum AnalysisResult {
    #[serde(rename_all = "camelCase")]
    Success {
        text: String,
        summary: FleetSummary,
        critical_cameras: Vec<CameraDetail>,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    Failure {
        error: String,
        fallback_insights: Vec<Insight>,
    },
}

impl AnalysisResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisResult::Success { .. })
    }
}

/// Run the backend over the fleet, degrading to rule-based insights when
/// there is no backend or it fails.
pub fn analyze_fleet(
    readings: &[CameraReading],
    backend: Option<&dyn AnalysisBackend>,
) -> AnalysisResult {
    let request = AnalysisRequest::from_readings(readings);

    let outcome = match backend {
        Some(backend) => backend.analyze(&request).and_then(|text| {
            if text.trim().is_empty() {
                Err(AnalysisError::EmptyResponse)
            } else {
                Ok(text)
            }
        }),
        None => Err(AnalysisError::NoBackend),
    };

    match outcome {
        Ok(text) => AnalysisResult::Success {
            text,
            summary: request.summary,
            critical_cameras: request.critical_cameras,
            timestamp: Utc::now(),
        },
        Err(e) => AnalysisResult::Failure {
            error: e.to_string(),
            fallback_insights: fallback_insights(readings),
        },
    }
}

/// Rule-based insights, ordered by the rule that produced them.
pub fn fallback_insights(readings: &[CameraReading]) -> Vec<Insight> {
    let assessed = fleet::assess_fleet(readings);
    let immediate: Vec<u32> = assessed
        .iter()
        .filter(|c| c.severity.level.needs_immediate_action())
        .map(|c| c.reading.segment_id)
        .collect();
    let critical = assessed
        .iter()
        .filter(|c| c.severity.level.is_critical_area())
        .count();

    let mut insights = Vec::new();

    if !immediate.is_empty() {
        insights.push(Insight {
            kind: InsightKind::CriticalAlert,
            priority: 1,
            message: format!(
                "{} camera(s) require immediate action (Level 1-2)",
                immediate.len()
            ),
            cameras: Some(immediate),
            action: "Dispatch maintenance crew immediately",
        });
    }

    if critical > 3 {
        insights.push(Insight {
            kind: InsightKind::SystemDegradation,
            priority: 2,
            message: format!(
                "{} cameras showing moderate to critical issues (Level 1-3)",
                critical
            ),
            cameras: None,
            action: "System-wide inspection recommended",
        });
    }

    let unreliable = readings.iter().filter(|r| !r.status.is_ok()).count();
    if unreliable as f64 > readings.len() as f64 * 0.3 {
        insights.push(Insight {
            kind: InsightKind::ReliabilityConcern,
            priority: 2,
            message: format!(
                "{} cameras have reliability issues (LOWLIGHT/WARNING)",
                unreliable
            ),
            cameras: None,
            action: "Schedule camera maintenance and recalibration",
        });
    }

    // Ties round up, so 12.5 reads as 13%.
    let health = fleet::system_health(readings);
    let shown = health.round();
    if health < 60.0 {
        insights.push(Insight {
            kind: InsightKind::SystemHealth,
            priority: 2,
            message: format!("System health at {}% - below target", shown),
            cameras: None,
            action: "Review maintenance schedule and address critical cameras",
        });
    } else if health >= 80.0 {
        insights.push(Insight {
            kind: InsightKind::SystemHealth,
            priority: 4,
            message: format!("System health excellent at {}%", shown),
            cameras: None,
            action: "Continue routine monitoring",
        });
    }

    insights
}

/// One-camera briefing used when no backend answers.
pub fn camera_brief(reading: &CameraReading) -> String {
    let severity = crate::severity::linear::assess_reading(reading);
    format!(
        "Camera {}: {}\nAction: {}",
        reading.segment_id, severity.interpretation, severity.action
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraStatus;

    struct FixedBackend(Result<&'static str, &'static str>);

    impl AnalysisBackend for FixedBackend {
        fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
            assert!(request.prompt().contains("Total cameras"));
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(e) => Err(AnalysisError::Backend(e.to_string())),
            }
        }
    }

    fn cam(id: u32, water: f64, light: f64, status: CameraStatus) -> CameraReading {
        CameraReading::new(id, water, light, status)
    }

    fn degraded_fleet() -> Vec<CameraReading> {
        vec![
            cam(1, 0.1, 0.7, CameraStatus::Ok),      // 3
            cam(2, 0.1, 0.7, CameraStatus::Warning), // 2
            cam(3, 0.9, 1.5, CameraStatus::Warning), // 1
            cam(4, 0.1, 0.8, CameraStatus::Ok),      // 3
            cam(5, 0.3, 0.4, CameraStatus::Lowlight), // 4
        ]
    }

    #[test]
    fn test_fallback_rules() {
        let insights = fallback_insights(&degraded_fleet());
        let kinds: Vec<_> = insights.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                InsightKind::CriticalAlert,
                InsightKind::SystemDegradation,
                InsightKind::ReliabilityConcern,
                InsightKind::SystemHealth,
            ]
        );

        assert_eq!(insights[0].message, "2 camera(s) require immediate action (Level 1-2)");
        assert_eq!(insights[0].cameras, Some(vec![2, 3]));
        assert_eq!(insights[1].message, "4 cameras showing moderate to critical issues (Level 1-3)");
        assert_eq!(insights[2].message, "3 cameras have reliability issues (LOWLIGHT/WARNING)");
        // (50 + 25 + 0 + 50 + 75) / 500
        assert_eq!(insights[3].message, "System health at 40% - below target");
        assert_eq!(insights[3].priority, 2);
    }

    #[test]
    fn test_fallback_for_healthy_fleet() {
        let fleet = vec![
            cam(1, 0.0, 0.1, CameraStatus::Ok),
            cam(2, 0.0, 0.2, CameraStatus::Ok),
            cam(3, 0.0, 0.5, CameraStatus::Ok),
        ];
        let insights = fallback_insights(&fleet);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::SystemHealth);
        assert_eq!(insights[0].priority, 4);
        assert_eq!(insights[0].message, "System health excellent at 92%");
    }

    #[test]
    fn test_health_percent_rounds_half_up() {
        // Levels 2 and 1: (25 + 0) / 200 = 12.5%.
        let fleet = vec![
            cam(1, 0.0, 1.0, CameraStatus::Ok),
            cam(2, 0.0, 2.0, CameraStatus::Ok),
        ];
        let insights = fallback_insights(&fleet);
        let health = insights
            .iter()
            .find(|i| i.kind == InsightKind::SystemHealth)
            .unwrap();
        assert_eq!(health.message, "System health at 13% - below target");
    }

    #[test]
    fn test_fallback_between_health_bands_is_silent() {
        // Health 75: neither below 60 nor at least 80.
        let fleet = vec![cam(1, 0.0, 0.5, CameraStatus::Ok)];
        assert!(fallback_insights(&fleet).is_empty());
    }

    #[test]
    fn test_critical_details_format() {
        let fleet = vec![
            cam(7, 0.456, 0.7, CameraStatus::Ok).with_position(1.5, 2.0),
            cam(8, 0.1, 0.2, CameraStatus::Ok),
        ];
        let details = critical_details(&fleet);
        assert_eq!(details.len(), 1);

        let d = &details[0];
        assert_eq!(d.id, 7);
        assert_eq!(d.water, "45.6%");
        assert_eq!(d.light, "0.700");
        assert_eq!(d.status, "OK");
        assert_eq!(d.severity_level, SeverityLevel::Moderate);
        assert_eq!(d.notes, "None");
    }

    #[test]
    fn test_analysis_without_backend_degrades() {
        let result = analyze_fleet(&degraded_fleet(), None);
        match result {
            AnalysisResult::Failure { error, fallback_insights } => {
                assert_eq!(error, "no analysis backend configured");
                assert_eq!(fallback_insights.len(), 4);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_analysis_with_backend() {
        let ok = FixedBackend(Ok("Clean segment 3 first."));
        let result = analyze_fleet(&degraded_fleet(), Some(&ok));
        assert!(result.is_success());
        if let AnalysisResult::Success { text, summary, critical_cameras, .. } = result {
            assert_eq!(text, "Clean segment 3 first.");
            assert_eq!(summary.total, 5);
            assert_eq!(critical_cameras.len(), 4);
        }

        let failing = FixedBackend(Err("quota exceeded"));
        let result = analyze_fleet(&degraded_fleet(), Some(&failing));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"], "failure");
        assert_eq!(json["error"], "analysis backend failed: quota exceeded");
        assert_eq!(json["fallbackInsights"][0]["type"], "CRITICAL_ALERT");

        let blank = FixedBackend(Ok("   "));
        assert!(!analyze_fleet(&degraded_fleet(), Some(&blank)).is_success());
    }

    #[test]
    fn test_camera_brief() {
        let brief = camera_brief(&cam(3, 0.9, 1.5, CameraStatus::Warning));
        assert!(brief.starts_with("Camera 3: "));
        assert!(brief.contains("\nAction: "));
    }
}
