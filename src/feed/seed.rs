//! Initial fleet: a JSON seed file or a generated layout.

use super::FeedError;
use crate::camera::{CameraReading, CameraStatus};

use rand::Rng;
use std::path::Path;

const DESCRIPTIONS: &[&str] = &[
    "Light grease on walls",
    "Debris near outlet",
    "Hairline crack at crown",
    "Slow drain after rainfall",
    "Biofilm along invert",
    "Root intrusion at joint",
];

/// Parse a seed document: a JSON array of readings.
pub fn parse_seed(json: &str) -> Result<Vec<CameraReading>, FeedError> {
    let readings: Vec<CameraReading> = serde_json::from_str(json)?;
    if readings.is_empty() {
        return Err(FeedError::EmptySeed);
    }
    Ok(readings)
}

pub fn load_seed(path: impl AsRef<Path>) -> Result<Vec<CameraReading>, FeedError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let readings = parse_seed(&json)?;
    tracing::info!("Loaded {} segments from {}", readings.len(), path.display());
    Ok(readings)
}

/// Status the feed reports for a continuous light value and water level.
pub fn derive_status(light: f64, water: f64) -> CameraStatus {
    if light < 0.3 {
        CameraStatus::Lowlight
    } else if water > 0.8 {
        CameraStatus::Warning
    } else {
        CameraStatus::Ok
    }
}

/// A fleet of `segments` cameras laid out along a serpentine line.
///
/// Every third segment carries an operator note.
pub fn generate_fleet<R: Rng>(segments: u32, rng: &mut R) -> Vec<CameraReading> {
    (1..=segments)
        .map(|id| {
            let row = (id - 1) / 4;
            let col = (id - 1) % 4;
            let col = if row % 2 == 0 { col } else { 3 - col };

            let water: f64 = rng.gen_range(0.05..0.75);
            let light: f64 = rng.gen_range(0.2..0.95);
            let reading = CameraReading::new(id, water, light, derive_status(light, water))
                .with_position(col as f64 * 100.0, row as f64 * 100.0);

            if id % 3 == 0 {
                let note = DESCRIPTIONS[(id as usize / 3 - 1) % DESCRIPTIONS.len()];
                reading.with_description(note)
            } else {
                reading
            }
        })
        .collect()
}
