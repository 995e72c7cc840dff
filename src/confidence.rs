//! Confidence tags and their display badges

use crate::types::{Confidence, ConfidenceBadge};

impl Confidence {
    /// Derive the confidence tag from signal quality
    pub fn from_quality(quality: f64) -> Self {
        if quality > 0.8 {
            Confidence::High
        } else if quality > 0.6 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// Display metadata for a confidence tag; absent tags resolve to medium
pub fn resolve_confidence_badge(confidence: Option<Confidence>) -> ConfidenceBadge {
    let (label, text_color, background_color) = match confidence.unwrap_or(Confidence::Medium) {
        Confidence::High => ("High Confidence", "#34C759", "#E8F5E8"),
        Confidence::Medium => ("Medium Confidence", "#FF9500", "#FFF4E6"),
        Confidence::Low => ("Low Confidence", "#FF3B30", "#FFE6E6"),
    };

    ConfidenceBadge {
        label: label.to_string(),
        text_color: text_color.to_string(),
        background_color: background_color.to_string(),
    }
}

/// Resolve a raw tag string; unrecognized tags resolve to medium
pub fn resolve_confidence_tag(tag: &str) -> ConfidenceBadge {
    resolve_confidence_badge(Confidence::parse(tag))
}
