use image::Rgba;
use serde::Serialize;

/// Confidence tier used to tint a face's overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl DetectionQuality {
    /// Thresholds are fixed. Anything outside `[0.5, 1.0]`, NaN included, is poor.
    pub fn from_confidence(confidence: f32) -> Self {
        match confidence {
            c if (0.9..=1.0).contains(&c) => DetectionQuality::Excellent,
            c if (0.7..0.9).contains(&c) => DetectionQuality::Good,
            c if (0.5..0.7).contains(&c) => DetectionQuality::Fair,
            _ => DetectionQuality::Poor,
        }
    }

    pub fn color(&self) -> Rgba<u8> {
        match self {
            DetectionQuality::Excellent => Rgba([52, 199, 89, 255]),
            DetectionQuality::Good => Rgba([0, 122, 255, 255]),
            DetectionQuality::Fair => Rgba([255, 149, 0, 255]),
            DetectionQuality::Poor => Rgba([255, 59, 48, 255]),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DetectionQuality::Excellent => "excellent",
            DetectionQuality::Good => "good",
            DetectionQuality::Fair => "fair",
            DetectionQuality::Poor => "poor",
        }
    }
}

impl std::fmt::Display for DetectionQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whole-percent label shown next to a face, e.g. `"87%"`. Truncates.
pub fn confidence_label(confidence: f32) -> String {
    format!("{}%", (confidence * 100.0) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_from_confidence() {
        assert_eq!(DetectionQuality::from_confidence(0.95), DetectionQuality::Excellent);
        assert_eq!(DetectionQuality::from_confidence(0.75), DetectionQuality::Good);
        assert_eq!(DetectionQuality::from_confidence(0.55), DetectionQuality::Fair);
        assert_eq!(DetectionQuality::from_confidence(0.3), DetectionQuality::Poor);
    }

    #[test]
    fn boundaries_belong_to_upper_tier() {
        assert_eq!(DetectionQuality::from_confidence(0.9), DetectionQuality::Excellent);
        assert_eq!(DetectionQuality::from_confidence(0.7), DetectionQuality::Good);
        assert_eq!(DetectionQuality::from_confidence(0.5), DetectionQuality::Fair);
        assert_eq!(DetectionQuality::from_confidence(1.0), DetectionQuality::Excellent);
    }

    #[test]
    fn out_of_range_is_poor() {
        assert_eq!(DetectionQuality::from_confidence(1.2), DetectionQuality::Poor);
        assert_eq!(DetectionQuality::from_confidence(-0.1), DetectionQuality::Poor);
        assert_eq!(DetectionQuality::from_confidence(f32::NAN), DetectionQuality::Poor);
    }

    #[test]
    fn tiers_are_ordered() {
        assert!(DetectionQuality::Excellent > DetectionQuality::Good);
        assert!(DetectionQuality::Good > DetectionQuality::Fair);
        assert!(DetectionQuality::Fair > DetectionQuality::Poor);
    }

    #[test]
    fn each_tier_has_a_distinct_color() {
        let colors = [
            DetectionQuality::Excellent.color(),
            DetectionQuality::Good.color(),
            DetectionQuality::Fair.color(),
            DetectionQuality::Poor.color(),
        ];
        for i in 0..colors.len() {
            for j in (i + 1)..colors.len() {
                assert_ne!(colors[i], colors[j]);
            }
        }
    }

    #[test]
    fn label_truncates() {
        assert_eq!(confidence_label(0.876), "87%");
        assert_eq!(confidence_label(1.0), "100%");
        assert_eq!(confidence_label(0.0), "0%");
    }
}
