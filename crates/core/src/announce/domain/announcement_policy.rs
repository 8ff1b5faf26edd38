use crate::detection::domain::detection::DetectionBatch;
use crate::shared::constants::{
    BMTA_BUS, BUS_LINE_NUMBER, BUS_SIDE_NUMBER, DESTINATION_SIGN, TSB_BUS,
};

/// Spoken phrase for a detection outside the recognized set.
/// `announcements` filters unrecognized classes before phrase lookup,
/// so normal operation never reaches this.
pub const FALLBACK_PHRASE: &str = "No Bus detected";

/// Class-name -> phrase table. New announceable classes are added here
/// and nowhere else.
const PHRASES: &[(&str, &str)] = &[
    (BMTA_BUS, "BMTA bus detected"),
    (BUS_LINE_NUMBER, "Bus line number detected"),
    (BUS_SIDE_NUMBER, "Bus side number detected"),
    (DESTINATION_SIGN, "Destination sign detected"),
    (TSB_BUS, "TSB bus detected"),
];

/// A class name mapped to its spoken phrase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Announcement {
    pub class_name: String,
    pub phrase: String,
}

/// Maps detection batches to announcements.
///
/// Every qualifying detection in a batch speaks independently, in batch
/// order, with no deduplication: repeated sightings re-announce, and the
/// flush-queue synthesizer lets the newest announcement win.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnnouncementPolicy;

impl AnnouncementPolicy {
    pub fn new() -> Self {
        Self
    }

    /// True when `class_name` belongs to the recognized set.
    pub fn is_recognized(&self, class_name: &str) -> bool {
        PHRASES.iter().any(|(class, _)| *class == class_name)
    }

    /// Total phrase lookup: unrecognized names get [`FALLBACK_PHRASE`].
    pub fn phrase_for(&self, class_name: &str) -> &'static str {
        PHRASES
            .iter()
            .find(|(class, _)| *class == class_name)
            .map(|(_, phrase)| *phrase)
            .unwrap_or(FALLBACK_PHRASE)
    }

    /// One announcement per recognized detection, in batch order.
    pub fn announcements(&self, batch: &DetectionBatch) -> Vec<Announcement> {
        batch
            .detections
            .iter()
            .filter(|d| self.is_recognized(&d.class_name))
            .map(|d| Announcement {
                class_name: d.class_name.clone(),
                phrase: self.phrase_for(&d.class_name).to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection::{BoundingBox, Detection};
    use rstest::rstest;
    use std::time::Duration;

    fn detection(class_name: &str) -> Detection {
        Detection {
            class_name: class_name.to_string(),
            confidence: 0.9,
            bbox: BoundingBox::new(0.1, 0.1, 0.5, 0.5),
        }
    }

    fn batch(classes: &[&str]) -> DetectionBatch {
        DetectionBatch {
            detections: classes.iter().map(|c| detection(c)).collect(),
            inference_time: Duration::from_millis(20),
            frame_index: 0,
        }
    }

    #[rstest]
    #[case("BMTA-bus", "BMTA bus detected")]
    #[case("Bus Line Number", "Bus line number detected")]
    #[case("Bus Side Number", "Bus side number detected")]
    #[case("Destination Sign", "Destination sign detected")]
    #[case("TSB-Bus", "TSB bus detected")]
    fn test_recognized_phrases(#[case] class: &str, #[case] phrase: &str) {
        let policy = AnnouncementPolicy::new();
        assert!(policy.is_recognized(class));
        assert_eq!(policy.phrase_for(class), phrase);
    }

    #[test]
    fn test_unrecognized_class_not_announced() {
        let policy = AnnouncementPolicy::new();
        let announcements = policy.announcements(&batch(&["Taxi", "Pedestrian"]));
        assert!(announcements.is_empty());
    }

    #[test]
    fn test_unrecognized_phrase_falls_back() {
        let policy = AnnouncementPolicy::new();
        assert!(!policy.is_recognized("Taxi"));
        assert_eq!(policy.phrase_for("Taxi"), FALLBACK_PHRASE);
    }

    #[test]
    fn test_announcements_in_batch_order() {
        let policy = AnnouncementPolicy::new();
        let announcements =
            policy.announcements(&batch(&["TSB-Bus", "Taxi", "BMTA-bus", "Destination Sign"]));
        let classes: Vec<_> = announcements
            .iter()
            .map(|a| a.class_name.as_str())
            .collect();
        assert_eq!(classes, vec!["TSB-Bus", "BMTA-bus", "Destination Sign"]);
    }

    #[test]
    fn test_duplicates_are_not_deduplicated() {
        // Two buses in one frame both announce
        let policy = AnnouncementPolicy::new();
        let announcements = policy.announcements(&batch(&["BMTA-bus", "BMTA-bus"]));
        assert_eq!(announcements.len(), 2);
        assert_eq!(announcements[0], announcements[1]);
    }

    #[test]
    fn test_empty_batch_yields_no_announcements() {
        let policy = AnnouncementPolicy::new();
        assert!(policy.announcements(&batch(&[])).is_empty());
    }

    #[test]
    fn test_case_sensitive_matching() {
        let policy = AnnouncementPolicy::new();
        assert!(!policy.is_recognized("bmta-bus"));
        assert!(!policy.is_recognized("BMTA-BUS"));
    }
}
