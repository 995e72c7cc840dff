//! Sample validation
//!
//! Checks a raw measurement for physiological plausibility and sufficient
//! signal quality. Every rule is evaluated; failures are collected, not
//! short-circuited. A failed validation is advisory: callers still display
//! the sample, alongside a warning.

use crate::types::{RawMeasurement, ScanMode, ValidationResult};

/// Lowest plausible heart rate (bpm)
pub const MIN_PLAUSIBLE_BPM: f64 = 30.0;
/// Highest plausible heart rate (bpm)
pub const MAX_PLAUSIBLE_BPM: f64 = 220.0;
/// Minimum signal quality for a trustworthy reading
pub const MIN_SIGNAL_QUALITY: f64 = 0.3;

pub const INVALID_HEART_RATE: &str = "Invalid heart rate detected";
pub const INVALID_HRV: &str = "Invalid HRV measurement";
pub const LOW_SIGNAL_QUALITY: &str = "Signal quality too low for reliable results";

/// Validator for raw measurements
pub struct Validator;

impl Validator {
    /// Validate a sample captured in `mode`
    pub fn validate(sample: &RawMeasurement, mode: ScanMode) -> ValidationResult {
        let mut errors = Vec::new();

        // NaN fails the range check as well
        let bpm_plausible = sample
            .bpm
            .is_some_and(|bpm| (MIN_PLAUSIBLE_BPM..=MAX_PLAUSIBLE_BPM).contains(&bpm));
        if !bpm_plausible {
            errors.push(INVALID_HEART_RATE.to_string());
        }

        // HRV is only measured by finger scans
        if mode == ScanMode::Ppg && !sample.hrv.is_some_and(|hrv| hrv >= 0.0) {
            errors.push(INVALID_HRV.to_string());
        }

        if !sample.quality.is_some_and(|q| q >= MIN_SIGNAL_QUALITY) {
            errors.push(LOW_SIGNAL_QUALITY.to_string());
        }

        ValidationResult::from_errors(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ppg_sample(bpm: f64, hrv: f64, quality: f64) -> RawMeasurement {
        RawMeasurement {
            bpm: Some(bpm),
            hrv: Some(hrv),
            quality: Some(quality),
            ..Default::default()
        }
    }

    #[test]
    fn test_plausible_ppg_sample_is_valid() {
        for bpm in [30.0, 31.5, 72.0, 150.0, 219.9, 220.0] {
            for hrv in [0.0, 12.0, 250.0] {
                for quality in [0.3, 0.5, 1.0] {
                    let result = Validator::validate(&ppg_sample(bpm, hrv, quality), ScanMode::Ppg);
                    assert!(result.is_valid, "bpm={bpm} hrv={hrv} quality={quality}");
                    assert!(result.errors.is_empty());
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_heart_rate_always_reported() {
        for bpm in [0.0, 15.0, 29.9, 220.1, 400.0, f64::NAN] {
            for (hrv, quality) in [(40.0, 0.9), (-1.0, 0.1)] {
                let result = Validator::validate(&ppg_sample(bpm, hrv, quality), ScanMode::Ppg);
                assert!(!result.is_valid);
                assert!(result.errors.contains(&INVALID_HEART_RATE.to_string()));
            }
        }
    }

    #[test]
    fn test_all_failures_collected_in_order() {
        let result = Validator::validate(&RawMeasurement::default(), ScanMode::Ppg);

        assert!(!result.is_valid);
        assert_eq!(
            result.errors,
            vec![
                INVALID_HEART_RATE.to_string(),
                INVALID_HRV.to_string(),
                LOW_SIGNAL_QUALITY.to_string(),
            ]
        );
    }

    #[test]
    fn test_negative_hrv_rejected_for_ppg_only() {
        let sample = ppg_sample(72.0, -5.0, 0.9);

        let ppg = Validator::validate(&sample, ScanMode::Ppg);
        assert_eq!(ppg.errors, vec![INVALID_HRV.to_string()]);

        let face = Validator::validate(&sample, ScanMode::Face);
        assert!(face.is_valid);
    }

    #[test]
    fn test_face_scan_without_hrv_is_valid() {
        let sample = RawMeasurement {
            bpm: Some(80.0),
            quality: Some(0.75),
            stress_score: Some(0.4),
            ..Default::default()
        };
        assert!(Validator::validate(&sample, ScanMode::Face).is_valid);
    }

    #[test]
    fn test_low_quality() {
        let result = Validator::validate(&ppg_sample(72.0, 40.0, 0.29), ScanMode::Ppg);
        assert_eq!(result.errors, vec![LOW_SIGNAL_QUALITY.to_string()]);
    }
}
