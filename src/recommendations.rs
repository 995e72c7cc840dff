//! Recommendation derivation
//!
//! Each predicate independently appends its fixed pair of tips. Results are
//! neither deduplicated nor capped; order follows predicate order.

use crate::types::{RawMeasurement, Recommendation, RecommendationCategory, ScanMode};

pub const BREATHING_TIP: &str = "Practice deep breathing exercises";
pub const HYDRATION_TIP: &str = "Stay hydrated and avoid caffeine";
pub const MEDITATION_TIP: &str = "Consider meditation or yoga";
pub const SLEEP_TIP: &str = "Ensure adequate sleep (7-9 hours)";
pub const FINGER_PLACEMENT_TIP: &str = "Ensure finger fully covers camera and flash";
pub const DEVICE_STEADY_TIP: &str = "Keep device steady during measurement";
pub const BREAKS_TIP: &str = "Take regular breaks throughout the day";
pub const RELAXATION_TIP: &str = "Try progressive muscle relaxation";
pub const SLEEP_SCHEDULE_TIP: &str = "Prioritize consistent sleep schedule";
pub const EXERCISE_TIP: &str = "Consider light exercise or stretching";
pub const LIGHTING_TIP: &str = "Ensure good lighting on your face";
pub const HEAD_STEADY_TIP: &str = "Keep head steady and look directly at camera";

/// Recommendation engine
pub struct RecommendationEngine;

impl RecommendationEngine {
    /// Derive recommendations for a sample captured in `mode`
    pub fn derive(sample: &RawMeasurement, mode: ScanMode) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();
        let mut push_pair = |category, tips: [&str; 2]| {
            for tip in tips {
                recommendations.push(Recommendation::new(category, tip));
            }
        };

        let low_quality = sample.quality.is_some_and(|q| q < 0.7);

        match mode {
            ScanMode::Ppg => {
                if sample.bpm.is_some_and(|bpm| bpm > 100.0) {
                    push_pair(
                        RecommendationCategory::HeartRate,
                        [BREATHING_TIP, HYDRATION_TIP],
                    );
                }
                if sample.hrv.is_some_and(|hrv| hrv < 30.0) {
                    push_pair(
                        RecommendationCategory::HeartRateVariability,
                        [MEDITATION_TIP, SLEEP_TIP],
                    );
                }
                if low_quality {
                    push_pair(
                        RecommendationCategory::SignalQuality,
                        [FINGER_PLACEMENT_TIP, DEVICE_STEADY_TIP],
                    );
                }
            }
            ScanMode::Face => {
                if sample.stress_score.is_some_and(|stress| stress > 0.6) {
                    push_pair(RecommendationCategory::Stress, [BREAKS_TIP, RELAXATION_TIP]);
                }
                if sample.fatigue_score.is_some_and(|fatigue| fatigue > 0.6) {
                    push_pair(
                        RecommendationCategory::Fatigue,
                        [SLEEP_SCHEDULE_TIP, EXERCISE_TIP],
                    );
                }
                if low_quality {
                    push_pair(
                        RecommendationCategory::SignalQuality,
                        [LIGHTING_TIP, HEAD_STEADY_TIP],
                    );
                }
            }
        }

        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(recommendations: &[Recommendation]) -> Vec<&str> {
        recommendations.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn test_healthy_ppg_has_no_recommendations() {
        let sample = RawMeasurement {
            bpm: Some(72.0),
            hrv: Some(45.0),
            quality: Some(0.87),
            ..Default::default()
        };
        assert!(RecommendationEngine::derive(&sample, ScanMode::Ppg).is_empty());
    }

    #[test]
    fn test_ppg_thresholds_are_strict() {
        let sample = RawMeasurement {
            bpm: Some(100.0),
            hrv: Some(30.0),
            quality: Some(0.7),
            ..Default::default()
        };
        assert!(RecommendationEngine::derive(&sample, ScanMode::Ppg).is_empty());
    }

    #[test]
    fn test_ppg_all_predicates() {
        let sample = RawMeasurement {
            bpm: Some(110.0),
            hrv: Some(25.0),
            quality: Some(0.5),
            ..Default::default()
        };
        let recommendations = RecommendationEngine::derive(&sample, ScanMode::Ppg);

        assert_eq!(
            texts(&recommendations),
            vec![
                BREATHING_TIP,
                HYDRATION_TIP,
                MEDITATION_TIP,
                SLEEP_TIP,
                FINGER_PLACEMENT_TIP,
                DEVICE_STEADY_TIP,
            ]
        );
        assert_eq!(recommendations[0].category, RecommendationCategory::HeartRate);
        assert_eq!(
            recommendations[5].category,
            RecommendationCategory::SignalQuality
        );
    }

    #[test]
    fn test_face_predicates() {
        let sample = RawMeasurement {
            stress_score: Some(0.61),
            fatigue_score: Some(0.9),
            quality: Some(0.65),
            ..Default::default()
        };
        assert_eq!(
            texts(&RecommendationEngine::derive(&sample, ScanMode::Face)),
            vec![
                BREAKS_TIP,
                RELAXATION_TIP,
                SLEEP_SCHEDULE_TIP,
                EXERCISE_TIP,
                LIGHTING_TIP,
                HEAD_STEADY_TIP,
            ]
        );
    }

    #[test]
    fn test_face_ignores_ppg_rules() {
        let sample = RawMeasurement {
            bpm: Some(140.0),
            hrv: Some(10.0),
            stress_score: Some(0.6),
            fatigue_score: Some(0.2),
            quality: Some(0.9),
            ..Default::default()
        };
        assert!(RecommendationEngine::derive(&sample, ScanMode::Face).is_empty());
    }
}
