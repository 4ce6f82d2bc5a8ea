//! Camera filtering.
//!
//! [`filter_cameras`] applies every present option in a fixed order, each
//! one narrowing the set left by the previous. Severity-based options use
//! the linear model and are evaluated against the already narrowed set.

pub mod keywords;
mod lenient;
pub mod presets;

pub use keywords::{KeywordCategory, KeywordMatcher};
pub use presets::{apply_preset, find_preset, presets, FilterPreset};

use crate::camera::{CameraReading, CameraStatus};
use crate::severity::{linear, SeverityLevel};

use serde::{Deserialize, Serialize, Serializer};

/// Status option: every status, or one in particular.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(CameraStatus),
}

impl Serialize for StatusFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StatusFilter::All => serializer.serialize_str("ALL"),
            StatusFilter::Only(status) => status.serialize(serializer),
        }
    }
}

/// Filter options. `None` means the option is not applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    #[serde(default, deserialize_with = "lenient::status", skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusFilter>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub water_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub water_max: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub light_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub light_max: Option<f64>,

    /// Exact level match.
    #[serde(default, deserialize_with = "lenient::level", skip_serializing_if = "Option::is_none")]
    pub severity_level: Option<SeverityLevel>,
    /// Keep readings at this level or worse.
    #[serde(default, deserialize_with = "lenient::level", skip_serializing_if = "Option::is_none")]
    pub max_severity: Option<SeverityLevel>,
    /// Keep readings at this level or better.
    #[serde(default, deserialize_with = "lenient::level", skip_serializing_if = "Option::is_none")]
    pub min_severity: Option<SeverityLevel>,

    /// Substring of the decimal segment id.
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub search_id: Option<String>,

    #[serde(default, deserialize_with = "lenient::keywords", skip_serializing_if = "Option::is_none")]
    pub description_keywords: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::flag", skip_serializing_if = "Option::is_none")]
    pub has_urgency_keywords: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag", skip_serializing_if = "Option::is_none")]
    pub has_obstruction_keywords: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag", skip_serializing_if = "Option::is_none")]
    pub has_structural_keywords: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag", skip_serializing_if = "Option::is_none")]
    pub has_buildup_keywords: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag", skip_serializing_if = "Option::is_none")]
    pub has_flow_keywords: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag", skip_serializing_if = "Option::is_none")]
    pub has_bio_keywords: Option<bool>,

    /// Water above 0.7.
    #[serde(default, deserialize_with = "lenient::flag", skip_serializing_if = "Option::is_none")]
    pub abnormal_water: Option<bool>,
    /// Level 1-3 together with a WARNING status or water above 0.6.
    #[serde(default, deserialize_with = "lenient::flag", skip_serializing_if = "Option::is_none")]
    pub multi_factor: Option<bool>,
    /// Any status other than OK.
    #[serde(default, deserialize_with = "lenient::flag", skip_serializing_if = "Option::is_none")]
    pub unreliable_sensors: Option<bool>,
    /// Risk score above [`HIGH_RISK_THRESHOLD`].
    #[serde(default, deserialize_with = "lenient::flag", skip_serializing_if = "Option::is_none")]
    pub high_risk: Option<bool>,
}

/// Options with nothing set. Usable in constants.
pub const NO_FILTERS: FilterOptions = FilterOptions {
    status: None,
    water_min: None,
    water_max: None,
    light_min: None,
    light_max: None,
    severity_level: None,
    max_severity: None,
    min_severity: None,
    search_id: None,
    description_keywords: None,
    has_urgency_keywords: None,
    has_obstruction_keywords: None,
    has_structural_keywords: None,
    has_buildup_keywords: None,
    has_flow_keywords: None,
    has_bio_keywords: None,
    abnormal_water: None,
    multi_factor: None,
    unreliable_sensors: None,
    high_risk: None,
};

pub const HIGH_RISK_THRESHOLD: f64 = 70.0;

impl FilterOptions {
    /// Options from `overrides` win; anything they leave unset is kept.
    pub fn merged_with(&self, overrides: &FilterOptions) -> FilterOptions {
        FilterOptions {
            status: overrides.status.or(self.status),
            water_min: overrides.water_min.or(self.water_min),
            water_max: overrides.water_max.or(self.water_max),
            light_min: overrides.light_min.or(self.light_min),
            light_max: overrides.light_max.or(self.light_max),
            severity_level: overrides.severity_level.or(self.severity_level),
            max_severity: overrides.max_severity.or(self.max_severity),
            min_severity: overrides.min_severity.or(self.min_severity),
            search_id: overrides.search_id.clone().or_else(|| self.search_id.clone()),
            description_keywords: overrides
                .description_keywords
                .clone()
                .or_else(|| self.description_keywords.clone()),
            has_urgency_keywords: overrides.has_urgency_keywords.or(self.has_urgency_keywords),
            has_obstruction_keywords: overrides
                .has_obstruction_keywords
                .or(self.has_obstruction_keywords),
            has_structural_keywords: overrides
                .has_structural_keywords
                .or(self.has_structural_keywords),
            has_buildup_keywords: overrides.has_buildup_keywords.or(self.has_buildup_keywords),
            has_flow_keywords: overrides.has_flow_keywords.or(self.has_flow_keywords),
            has_bio_keywords: overrides.has_bio_keywords.or(self.has_bio_keywords),
            abnormal_water: overrides.abnormal_water.or(self.abnormal_water),
            multi_factor: overrides.multi_factor.or(self.multi_factor),
            unreliable_sensors: overrides.unreliable_sensors.or(self.unreliable_sensors),
            high_risk: overrides.high_risk.or(self.high_risk),
        }
    }

    /// Whether no option is set.
    pub fn is_empty(&self) -> bool {
        *self == NO_FILTERS
    }

    /// Keyword categories whose flag is set to true.
    pub fn keyword_categories(&self) -> Vec<KeywordCategory> {
        [
            (self.has_urgency_keywords, KeywordCategory::Urgency),
            (self.has_obstruction_keywords, KeywordCategory::Obstruction),
            (self.has_structural_keywords, KeywordCategory::Structural),
            (self.has_buildup_keywords, KeywordCategory::Buildup),
            (self.has_flow_keywords, KeywordCategory::Flow),
            (self.has_bio_keywords, KeywordCategory::Biological),
        ]
        .into_iter()
        .filter(|(flag, _)| *flag == Some(true))
        .map(|(_, category)| category)
        .collect()
    }
}

fn is_set(flag: Option<bool>) -> bool {
    flag == Some(true)
}

fn level_of(reading: &CameraReading) -> SeverityLevel {
    linear::assess_reading(reading).level
}

fn description_matches(reading: &CameraReading, pred: impl Fn(&str) -> bool) -> bool {
    reading.view_description.as_deref().is_some_and(pred)
}

/// Composite risk score, 0 to 100.
///
/// `(6 - level) * 20 + water * 30`, plus 20 for WARNING or 10 for LOWLIGHT,
/// plus 10 when the notes contain an urgency word.
pub fn risk_score(reading: &CameraReading) -> f64 {
    let level = level_of(reading);
    let status_bonus = match reading.status {
        CameraStatus::Warning => 20.0,
        CameraStatus::Lowlight => 10.0,
        _ => 0.0,
    };
    let keyword_bonus = if description_matches(reading, |d| KeywordCategory::Urgency.matches(d)) {
        10.0
    } else {
        0.0
    };

    let score = (6.0 - level.value() as f64) * 20.0 + reading.water * 30.0 + status_bonus + keyword_bonus;
    score.min(100.0)
}

/// Filter readings by every present option, keeping input order.
pub fn filter_cameras(readings: &[CameraReading], options: &FilterOptions) -> Vec<CameraReading> {
    let mut filtered: Vec<CameraReading> = readings.to_vec();

    if let Some(StatusFilter::Only(status)) = options.status {
        filtered.retain(|c| c.status == status);
    }

    if let Some(min) = options.water_min {
        filtered.retain(|c| c.water >= min);
    }
    if let Some(max) = options.water_max {
        filtered.retain(|c| c.water <= max);
    }

    if let Some(min) = options.light_min {
        filtered.retain(|c| c.light.raw() >= min);
    }
    if let Some(max) = options.light_max {
        filtered.retain(|c| c.light.raw() <= max);
    }

    if let Some(level) = options.severity_level {
        filtered.retain(|c| level_of(c) == level);
    }
    if let Some(max) = options.max_severity {
        filtered.retain(|c| level_of(c).is_at_least_as_severe_as(max));
    }
    if let Some(min) = options.min_severity {
        filtered.retain(|c| level_of(c).is_at_least_as_safe_as(min));
    }

    if let Some(search) = options.search_id.as_deref() {
        filtered.retain(|c| c.segment_id.to_string().contains(search));
    }

    if let Some(words) = options.description_keywords.as_deref() {
        let matcher = KeywordMatcher::new(words);
        if !matcher.is_empty() {
            filtered.retain(|c| description_matches(c, |d| matcher.matches(d)));
        }
    }

    for category in options.keyword_categories() {
        filtered.retain(|c| description_matches(c, |d| category.matches(d)));
    }

    if is_set(options.abnormal_water) {
        filtered.retain(|c| c.water > 0.7);
    }

    if is_set(options.multi_factor) {
        filtered.retain(|c| {
            level_of(c).is_critical_area() && (c.status == CameraStatus::Warning || c.water > 0.6)
        });
    }

    if is_set(options.unreliable_sensors) {
        filtered.retain(|c| !c.status.is_ok());
    }

    if is_set(options.high_risk) {
        filtered.retain(|c| risk_score(c) > HIGH_RISK_THRESHOLD);
    }

    filtered
}
