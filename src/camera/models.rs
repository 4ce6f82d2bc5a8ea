//! Camera reading model types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hardware health signal reported by a camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CameraStatus {
    Ok,
    Lowlight,
    Warning,
    /// Any status string the feed sends that we do not recognise.
    #[serde(other)]
    Unknown,
}

impl CameraStatus {
    /// Whether the camera reports a healthy sensor.
    pub fn is_ok(self) -> bool {
        self == CameraStatus::Ok
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CameraStatus::Ok => "OK",
            CameraStatus::Lowlight => "LOWLIGHT",
            CameraStatus::Warning => "WARNING",
            CameraStatus::Unknown => "UNKNOWN",
        }
    }

    /// Parse a status string as it appears on the wire.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OK" => Some(CameraStatus::Ok),
            "LOWLIGHT" => Some(CameraStatus::Lowlight),
            "WARNING" => Some(CameraStatus::Warning),
            _ => None,
        }
    }
}

impl fmt::Display for CameraStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordinal light code, 1 = darkest pipe, 5 = brightest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LightCode {
    Darkest = 1,
    Dark = 2,
    Dim = 3,
    Bright = 4,
    Brightest = 5,
}

impl LightCode {
    /// Interpret a light value as an ordinal code.
    ///
    /// Only the exact integers 1 through 5 are codes.
    pub fn from_value(value: f64) -> Option<Self> {
        if value.fract() != 0.0 {
            return None;
        }
        match value as i64 {
            1 => Some(LightCode::Darkest),
            2 => Some(LightCode::Dark),
            3 => Some(LightCode::Dim),
            4 => Some(LightCode::Bright),
            5 => Some(LightCode::Brightest),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }
}

/// A light reading.
///
/// The same number is read two ways: as an ordinal [`LightCode`] by the
/// exponent model and as a continuous intensity by the linear model.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Light(pub f64);

impl Light {
    /// Continuous intensity; higher means a darker pipe.
    pub fn raw(self) -> f64 {
        self.0
    }

    /// Ordinal code, if the value is one.
    pub fn code(self) -> Option<LightCode> {
        LightCode::from_value(self.0)
    }
}

impl From<f64> for Light {
    fn from(value: f64) -> Self {
        Light(value)
    }
}

/// One camera's reading within a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraReading {
    #[serde(alias = "SegmentID")]
    pub segment_id: u32,
    #[serde(alias = "Position", default)]
    pub position: (f64, f64),
    /// Fraction of the frame submerged, 0.0 to 1.0.
    #[serde(alias = "Water")]
    pub water: f64,
    #[serde(alias = "Light")]
    pub light: Light,
    #[serde(alias = "Status")]
    pub status: CameraStatus,
    #[serde(
        alias = "ViewDescription",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub view_description: Option<String>,
}

impl CameraReading {
    pub fn new(segment_id: u32, water: f64, light: f64, status: CameraStatus) -> Self {
        Self {
            segment_id,
            position: (0.0, 0.0),
            water,
            light: Light(light),
            status,
            view_description: None,
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = (x, y);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.view_description = Some(description.into());
        self
    }
}

/// All segment readings taken at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub readings: Vec<CameraReading>,
}

impl Snapshot {
    pub fn new(timestamp: i64, readings: Vec<CameraReading>) -> Self {
        Self {
            timestamp,
            readings,
        }
    }
}
