//! Severity scoring.
//!
//! Two scoring models classify a camera reading on the same inverted
//! 1..5 scale (1 = critical, 5 = safe). They use different math and are
//! selected explicitly by callers:
//!
//! - [`exponent`]: ordinal light lookup with status and water multipliers
//!   and hard overrides. Used by the map, table and insight cards.
//! - [`linear`]: raw light scaled by status sensitivity and an inverse
//!   water factor. Used by filtering, fleet health and analysis.

pub mod exponent;
pub mod linear;

pub use exponent::ExponentSeverity;
pub use linear::LinearSeverity;

use crate::camera::CameraReading;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Severity classification. Lower numbers are worse.
///
/// `Ord` follows the numeric value, so `Critical < Safe`. Prefer the named
/// predicates over raw comparisons at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SeverityLevel {
    Critical = 1,
    Severe = 2,
    Moderate = 3,
    Minor = 4,
    Safe = 5,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("severity level must be between 1 and 5, got {0}")]
pub struct InvalidLevel(pub u8);

impl SeverityLevel {
    pub const ALL: [SeverityLevel; 5] = [
        SeverityLevel::Critical,
        SeverityLevel::Severe,
        SeverityLevel::Moderate,
        SeverityLevel::Minor,
        SeverityLevel::Safe,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    /// True when `self` is the same as or worse than `other`.
    pub fn is_at_least_as_severe_as(self, other: SeverityLevel) -> bool {
        self <= other
    }

    /// True when `self` is the same as or better than `other`.
    pub fn is_at_least_as_safe_as(self, other: SeverityLevel) -> bool {
        self >= other
    }

    /// Levels 1-3.
    pub fn is_critical_area(self) -> bool {
        self.is_at_least_as_severe_as(SeverityLevel::Moderate)
    }

    /// Levels 1-2.
    pub fn needs_immediate_action(self) -> bool {
        self.is_at_least_as_severe_as(SeverityLevel::Severe)
    }

    /// Levels 4-5.
    pub fn is_safe(self) -> bool {
        self.is_at_least_as_safe_as(SeverityLevel::Minor)
    }

    /// Interpretation shown next to a result.
    pub fn label(self) -> &'static str {
        match self {
            SeverityLevel::Critical => "Critical/Dark",
            SeverityLevel::Severe => "Severe",
            SeverityLevel::Moderate => "Moderate",
            SeverityLevel::Minor => "Minor Obstruction",
            SeverityLevel::Safe => "Safe/Clear",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SeverityLevel::Critical => "Critical",
            SeverityLevel::Severe => "Severe",
            SeverityLevel::Moderate => "Moderate",
            SeverityLevel::Minor => "Minor",
            SeverityLevel::Safe => "Safe",
        }
    }

    /// What the level means for the pipe.
    pub fn description(self) -> &'static str {
        match self {
            SeverityLevel::Critical => "Critical / Dark - Major obstruction; immediate action",
            SeverityLevel::Severe => "Severe - Heavy buildup / partial restriction",
            SeverityLevel::Moderate => "Moderate - Noticeable accumulation",
            SeverityLevel::Minor => "Minor Obstruction - Early buildup",
            SeverityLevel::Safe => "Safe / Clear - Clean, reflective pipe",
        }
    }

    /// Contribution to fleet health, in percent.
    pub fn health_weight(self) -> f64 {
        match self {
            SeverityLevel::Critical => 0.0,
            SeverityLevel::Severe => 25.0,
            SeverityLevel::Moderate => 50.0,
            SeverityLevel::Minor => 75.0,
            SeverityLevel::Safe => 100.0,
        }
    }
}

impl From<SeverityLevel> for u8 {
    fn from(level: SeverityLevel) -> Self {
        level.value()
    }
}

impl TryFrom<u8> for SeverityLevel {
    type Error = InvalidLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SeverityLevel::Critical),
            2 => Ok(SeverityLevel::Severe),
            3 => Ok(SeverityLevel::Moderate),
            4 => Ok(SeverityLevel::Minor),
            5 => Ok(SeverityLevel::Safe),
            other => Err(InvalidLevel(other)),
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level {} - {}", self.value(), self.name())
    }
}

/// Which scoring model a consumer depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityModel {
    /// Ordinal light code, multipliers and hard overrides.
    Exponent,
    /// Raw light, sensitivity factor and inverse water factor.
    #[default]
    Linear,
}

impl SeverityModel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exponent" | "a" => Some(SeverityModel::Exponent),
            "linear" | "b" => Some(SeverityModel::Linear),
            _ => None,
        }
    }
}

/// A result from either model, tagged with the model that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum Severity {
    Exponent(ExponentSeverity),
    Linear(LinearSeverity),
}

impl Severity {
    pub fn level(&self) -> SeverityLevel {
        match self {
            Severity::Exponent(s) => s.level,
            Severity::Linear(s) => s.level,
        }
    }

    pub fn model(&self) -> SeverityModel {
        match self {
            Severity::Exponent(_) => SeverityModel::Exponent,
            Severity::Linear(_) => SeverityModel::Linear,
        }
    }

    pub fn action(&self) -> &str {
        match self {
            Severity::Exponent(s) => &s.action,
            Severity::Linear(s) => &s.action,
        }
    }
}

/// Score a reading with the chosen model.
pub fn assess(model: SeverityModel, reading: &CameraReading) -> Severity {
    match model {
        SeverityModel::Exponent => Severity::Exponent(exponent::assess_reading(reading)),
        SeverityModel::Linear => Severity::Linear(linear::assess_reading(reading)),
    }
}

/// Status-independent recommended action for a level.
pub(crate) fn base_action(level: SeverityLevel) -> &'static str {
    match level {
        SeverityLevel::Safe => "Log; routine monitoring",
        SeverityLevel::Minor => "Watch segment; re-inspect sooner",
        SeverityLevel::Moderate => "Maintenance queue; schedule cleaning",
        SeverityLevel::Severe => "High-priority cleaning within days",
        SeverityLevel::Critical => {
            "Immediate dispatch; escalate operations; act even if status LOWLIGHT/WARNING"
        }
    }
}
