//! Insight derivation
//!
//! Selects observation templates by evaluating fixed predicates over the raw
//! sample, in a fixed order. Predicates read the raw values directly; they do
//! not consult the classifier's bands, and their thresholds are maintained
//! separately.

use crate::types::{Insight, InsightKind, RawMeasurement, ScanMode};

pub const LOW_HEART_RATE: &str = "Low Heart Rate";
pub const ELEVATED_HEART_RATE: &str = "Elevated Heart Rate";
pub const NORMAL_HEART_RATE: &str = "Normal Heart Rate";
pub const GOOD_HRV: &str = "Good Heart Rate Variability";
pub const HIGH_STRESS: &str = "High Stress Detected";
pub const LOW_STRESS: &str = "Low Stress Levels";
pub const FATIGUE_INDICATORS: &str = "Fatigue Indicators";
pub const EXCELLENT_WELLNESS: &str = "Excellent Wellness Score";

/// Insight engine
pub struct InsightEngine;

impl InsightEngine {
    /// Derive insights for a sample captured in `mode`
    pub fn derive(sample: &RawMeasurement, mode: ScanMode) -> Vec<Insight> {
        match mode {
            ScanMode::Ppg => derive_ppg(sample),
            ScanMode::Face => derive_face(sample),
        }
    }
}

fn derive_ppg(sample: &RawMeasurement) -> Vec<Insight> {
    let mut insights = Vec::new();

    // Exactly one heart rate insight; a missing reading counts as normal
    let heart_rate = match sample.bpm {
        Some(bpm) if bpm < 60.0 => Insight::new(
            InsightKind::Info,
            LOW_HEART_RATE,
            "Your resting heart rate is below average. This could indicate good fitness or may warrant consultation.",
        ),
        Some(bpm) if bpm > 100.0 => Insight::new(
            InsightKind::Warning,
            ELEVATED_HEART_RATE,
            "Your heart rate is elevated. Consider relaxation techniques or consult a healthcare provider.",
        ),
        _ => Insight::new(
            InsightKind::Success,
            NORMAL_HEART_RATE,
            "Your heart rate is within the normal resting range.",
        ),
    };
    insights.push(heart_rate);

    if sample.hrv.is_some_and(|hrv| hrv > 50.0) {
        insights.push(Insight::new(
            InsightKind::Success,
            GOOD_HRV,
            "Higher HRV generally indicates better cardiovascular fitness and stress resilience.",
        ));
    }

    insights
}

fn derive_face(sample: &RawMeasurement) -> Vec<Insight> {
    let mut insights = Vec::new();

    // Mid-range stress (0.3 to 0.7 inclusive) produces no stress insight
    if let Some(stress) = sample.stress_score {
        if stress > 0.7 {
            insights.push(Insight::new(
                InsightKind::Warning,
                HIGH_STRESS,
                "Consider stress management techniques like deep breathing or meditation.",
            ));
        } else if stress < 0.3 {
            insights.push(Insight::new(
                InsightKind::Success,
                LOW_STRESS,
                "You appear to be in a relaxed state. Great job managing stress!",
            ));
        }
    }

    if sample.fatigue_score.is_some_and(|fatigue| fatigue > 0.6) {
        insights.push(Insight::new(
            InsightKind::Info,
            FATIGUE_INDICATORS,
            "Signs of fatigue detected. Ensure adequate rest and hydration.",
        ));
    }

    if sample.face_wellness.is_some_and(|wellness| wellness > 80.0) {
        insights.push(Insight::new(
            InsightKind::Success,
            EXCELLENT_WELLNESS,
            "Your overall face wellness indicators look great!",
        ));
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn titles(insights: &[Insight]) -> Vec<&str> {
        insights.iter().map(|i| i.title.as_str()).collect()
    }

    fn ppg(bpm: f64, hrv: f64) -> RawMeasurement {
        RawMeasurement {
            bpm: Some(bpm),
            hrv: Some(hrv),
            quality: Some(0.9),
            ..Default::default()
        }
    }

    fn face(stress: f64, fatigue: f64, wellness: f64) -> RawMeasurement {
        RawMeasurement {
            bpm: Some(75.0),
            quality: Some(0.9),
            stress_score: Some(stress),
            fatigue_score: Some(fatigue),
            face_wellness: Some(wellness),
            ..Default::default()
        }
    }

    #[test]
    fn test_ppg_heart_rate_insights_are_exclusive() {
        let low = InsightEngine::derive(&ppg(55.0, 40.0), ScanMode::Ppg);
        assert_eq!(titles(&low), vec![LOW_HEART_RATE]);
        assert_eq!(low[0].kind, InsightKind::Info);

        let high = InsightEngine::derive(&ppg(101.0, 40.0), ScanMode::Ppg);
        assert_eq!(titles(&high), vec![ELEVATED_HEART_RATE]);
        assert_eq!(high[0].kind, InsightKind::Warning);

        for bpm in [60.0, 80.0, 100.0] {
            let normal = InsightEngine::derive(&ppg(bpm, 40.0), ScanMode::Ppg);
            assert_eq!(titles(&normal), vec![NORMAL_HEART_RATE]);
            assert_eq!(normal[0].kind, InsightKind::Success);
        }
    }

    #[test]
    fn test_ppg_hrv_insight_co_occurs() {
        let insights = InsightEngine::derive(&ppg(110.0, 51.0), ScanMode::Ppg);
        assert_eq!(titles(&insights), vec![ELEVATED_HEART_RATE, GOOD_HRV]);

        // 50 ms is not enough
        let insights = InsightEngine::derive(&ppg(70.0, 50.0), ScanMode::Ppg);
        assert_eq!(titles(&insights), vec![NORMAL_HEART_RATE]);
    }

    #[test]
    fn test_ppg_without_heart_rate() {
        let sample = RawMeasurement {
            hrv: Some(70.0),
            ..Default::default()
        };
        assert_eq!(
            titles(&InsightEngine::derive(&sample, ScanMode::Ppg)),
            vec![NORMAL_HEART_RATE, GOOD_HRV]
        );

        let sample = RawMeasurement {
            hrv: Some(40.0),
            quality: Some(0.9),
            ..Default::default()
        };
        assert_eq!(
            titles(&InsightEngine::derive(&sample, ScanMode::Ppg)),
            vec![NORMAL_HEART_RATE]
        );
    }

    #[test]
    fn test_face_stress_bands() {
        assert_eq!(
            titles(&InsightEngine::derive(&face(0.71, 0.2, 60.0), ScanMode::Face)),
            vec![HIGH_STRESS]
        );
        assert_eq!(
            titles(&InsightEngine::derive(&face(0.29, 0.2, 60.0), ScanMode::Face)),
            vec![LOW_STRESS]
        );
        for stress in [0.3, 0.5, 0.7] {
            assert!(InsightEngine::derive(&face(stress, 0.2, 60.0), ScanMode::Face).is_empty());
        }
    }

    #[test]
    fn test_face_all_independent_rules() {
        let insights = InsightEngine::derive(&face(0.1, 0.65, 81.0), ScanMode::Face);
        assert_eq!(
            titles(&insights),
            vec![LOW_STRESS, FATIGUE_INDICATORS, EXCELLENT_WELLNESS]
        );
        assert_eq!(insights[1].kind, InsightKind::Info);
    }

    #[test]
    fn test_mode_selects_rule_set() {
        // A face sample evaluated as PPG only sees heart rate rules
        let insights = InsightEngine::derive(&face(0.9, 0.9, 90.0), ScanMode::Ppg);
        assert_eq!(titles(&insights), vec![NORMAL_HEART_RATE]);
    }

    #[test]
    fn test_derivation_is_repeatable() {
        let sample = face(0.8, 0.7, 85.0);
        let first = InsightEngine::derive(&sample, ScanMode::Face);
        let second = InsightEngine::derive(&sample, ScanMode::Face);
        assert_eq!(first, second);
    }
}
