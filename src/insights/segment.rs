//! Per-segment insight cards.

use crate::camera::{CameraReading, CameraStatus};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Critical,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardTone {
    Error,
    Warning,
    Info,
    Ok,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentCard {
    #[serde(rename = "type")]
    pub kind: CardKind,
    pub segment_id: u32,
    pub title: String,
    pub message: String,
    pub severity: CardTone,
}

const HIGH_WATER: f64 = 0.8;
const LOW_LIGHT: f64 = 0.3;

/// Cards for every segment, or for one selected segment.
///
/// Without a selection only critical cards are produced. With one, the
/// selected segment also gets a "normal" card for each check it passes,
/// listed after its critical cards.
pub fn segment_insights(readings: &[CameraReading], selected: Option<u32>) -> Vec<SegmentCard> {
    let mut cards = Vec::new();

    for camera in readings
        .iter()
        .filter(|c| selected.map_or(true, |id| c.segment_id == id))
    {
        let id = camera.segment_id;
        let mut critical = Vec::new();
        let mut general = Vec::new();

        let water_pct = camera.water * 100.0;
        if camera.water > HIGH_WATER {
            critical.push(card(
                CardKind::Critical,
                id,
                "High Water Level".into(),
                format!("Water level is {:.2}% - Above threshold", water_pct),
                CardTone::Error,
            ));
        } else {
            general.push(card(
                CardKind::General,
                id,
                "Water Level Normal".into(),
                format!("Water level: {:.2}%", water_pct),
                CardTone::Ok,
            ));
        }

        let light = camera.light.raw();
        if light < LOW_LIGHT {
            critical.push(card(
                CardKind::Critical,
                id,
                "Low Light Level".into(),
                format!("Light level is {:.2} - Below threshold", light),
                CardTone::Warning,
            ));
        } else {
            general.push(card(
                CardKind::General,
                id,
                "Light Level Normal".into(),
                format!("Light level: {:.2}", light),
                CardTone::Ok,
            ));
        }

        match camera.status {
            CameraStatus::Warning => critical.push(card(
                CardKind::Critical,
                id,
                "Status: WARNING".into(),
                "Warning condition detected".into(),
                CardTone::Error,
            )),
            CameraStatus::Lowlight => critical.push(card(
                CardKind::Critical,
                id,
                "Status: LOWLIGHT".into(),
                "Low light condition detected".into(),
                CardTone::Warning,
            )),
            CameraStatus::Ok => general.push(card(
                CardKind::General,
                id,
                "Status: OK".into(),
                "Segment operating normally".into(),
                CardTone::Ok,
            )),
            // No card either way for a status we cannot read.
            CameraStatus::Unknown => {}
        }

        if let Some(description) = camera.view_description.as_deref() {
            if !description.is_empty() {
                critical.push(card(
                    CardKind::Critical,
                    id,
                    "View Description".into(),
                    description.to_string(),
                    CardTone::Info,
                ));
            }
        }

        cards.extend(critical);
        if selected.is_some() {
            cards.extend(general);
        }
    }

    cards
}

fn card(kind: CardKind, segment_id: u32, title: String, message: String, severity: CardTone) -> SegmentCard {
    SegmentCard {
        kind,
        segment_id,
        title,
        message,
        severity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(cards: &[SegmentCard]) -> Vec<&str> {
        cards.iter().map(|c| c.title.as_str()).collect()
    }

    fn fleet() -> Vec<CameraReading> {
        vec![
            CameraReading::new(1, 0.2, 0.5, CameraStatus::Ok),
            CameraReading::new(2, 0.85, 0.1, CameraStatus::Warning).with_description("Debris"),
            CameraReading::new(3, 0.4, 0.6, CameraStatus::Lowlight),
        ]
    }

    #[test]
    fn test_overview_has_only_critical_cards() {
        let cards = segment_insights(&fleet(), None);
        assert!(cards.iter().all(|c| c.kind == CardKind::Critical));
        assert_eq!(
            titles(&cards),
            vec![
                "High Water Level",
                "Low Light Level",
                "Status: WARNING",
                "View Description",
                "Status: LOWLIGHT",
            ]
        );
        assert_eq!(cards[0].message, "Water level is 85.00% - Above threshold");
        assert_eq!(cards[1].message, "Light level is 0.10 - Below threshold");
        assert_eq!(cards[3].message, "Debris");
    }

    #[test]
    fn test_selected_segment_adds_general_cards() {
        let cards = segment_insights(&fleet(), Some(1));
        assert_eq!(
            titles(&cards),
            vec!["Water Level Normal", "Light Level Normal", "Status: OK"]
        );
        assert_eq!(cards[0].message, "Water level: 20.00%");
        assert_eq!(cards[2].message, "Segment operating normally");

        // Critical cards come first.
        let cards = segment_insights(&fleet(), Some(3));
        assert_eq!(
            titles(&cards),
            vec!["Status: LOWLIGHT", "Water Level Normal", "Light Level Normal"]
        );
    }

    #[test]
    fn test_unknown_segment_has_no_cards() {
        assert!(segment_insights(&fleet(), Some(99)).is_empty());
        assert!(segment_insights(&[], None).is_empty());
    }

    #[test]
    fn test_card_serialization() {
        let cards = segment_insights(&fleet(), Some(2));
        let json = serde_json::to_value(&cards[0]).unwrap();
        assert_eq!(json["type"], "critical");
        assert_eq!(json["segmentId"], 2);
        assert_eq!(json["severity"], "error");
    }
}
