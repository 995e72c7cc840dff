//! Metric classification
//!
//! Maps raw metric values to display bands. Each band function is a priority
//! cascade where the first matching band wins. The band functions are pure
//! and total; the [`Classifier`] adds display rounding and resolves the
//! band's severity to a color through the configured [`Palette`].

use chrono::{DateTime, FixedOffset, Utc};

use crate::config::Palette;
use crate::types::{Band, ClassifiedMetric, MetricKind, QualityTier, Severity};

/// Heart rate band: below 60 is low, above 100 is high, 60 and 100 are normal
pub fn bpm_band(bpm: f64) -> Band {
    if bpm < 60.0 {
        Band::Low
    } else if bpm > 100.0 {
        Band::High
    } else {
        Band::Normal
    }
}

/// HRV band: above 50 ms is excellent, above 30 ms is good
pub fn hrv_band(hrv: f64) -> Band {
    if hrv > 50.0 {
        Band::Excellent
    } else if hrv > 30.0 {
        Band::Good
    } else {
        Band::Low
    }
}

/// Scale a 0-1 fraction to a rounded percentage
pub fn to_percentage(fraction: f64) -> i64 {
    (fraction * 100.0).round() as i64
}

/// Band for a percentage metric.
///
/// Thresholds apply to the rounded percentage. Higher is better unless
/// `inverse` is set (stress, fatigue).
pub fn percentage_band(fraction: f64, inverse: bool) -> Band {
    let percentage = to_percentage(fraction);

    if inverse {
        if percentage > 70 {
            Band::Bad
        } else if percentage > 40 {
            Band::Caution
        } else {
            Band::Good
        }
    } else if percentage < 50 {
        Band::Bad
    } else if percentage < 70 {
        Band::Caution
    } else {
        Band::Good
    }
}

/// Face wellness band (0-100 scale): above 70 good, above 50 caution
pub fn wellness_band(score: f64) -> Band {
    if score > 70.0 {
        Band::Good
    } else if score > 50.0 {
        Band::Caution
    } else {
        Band::Bad
    }
}

/// Four-tier quality description, finer than the percentage bands
pub fn quality_tier(quality: f64) -> QualityTier {
    if quality > 0.85 {
        QualityTier::Excellent
    } else if quality > 0.7 {
        QualityTier::Good
    } else if quality > 0.5 {
        QualityTier::Fair
    } else {
        QualityTier::Poor
    }
}

/// Human-readable signal quality text
pub fn quality_description(quality: f64) -> &'static str {
    quality_tier(quality).description()
}

/// Format a completion time as a 12-hour clock reading, e.g. `02:05 PM`,
/// shifted from UTC by `offset`
pub fn format_clock_time(timestamp: &DateTime<Utc>, offset: &FixedOffset) -> String {
    timestamp.with_timezone(offset).format("%I:%M %p").to_string()
}

fn severity_for(metric: MetricKind, band: Band) -> Severity {
    match (metric, band) {
        (MetricKind::HeartRate, Band::Low) => Severity::Info,
        (MetricKind::HeartRate, Band::High) => Severity::Bad,
        (MetricKind::HeartRateVariability, Band::Good) => Severity::Info,
        (MetricKind::HeartRateVariability, Band::Low) => Severity::Caution,
        (_, Band::Caution) => Severity::Caution,
        (_, Band::Bad) => Severity::Bad,
        _ => Severity::Good,
    }
}

/// Classifier producing display-ready metrics
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    palette: Palette,
}

impl Classifier {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn bpm(&self, bpm: f64) -> ClassifiedMetric {
        self.build(MetricKind::HeartRate, bpm.round() as i64, "bpm", bpm_band(bpm))
    }

    pub fn hrv(&self, hrv: f64) -> ClassifiedMetric {
        self.build(
            MetricKind::HeartRateVariability,
            hrv.round() as i64,
            "ms",
            hrv_band(hrv),
        )
    }

    /// Classify a 0-1 fraction as a percentage
    pub fn percentage(&self, metric: MetricKind, fraction: f64, inverse: bool) -> ClassifiedMetric {
        self.build(
            metric,
            to_percentage(fraction),
            "%",
            percentage_band(fraction, inverse),
        )
    }

    pub fn quality(&self, quality: f64) -> ClassifiedMetric {
        self.percentage(MetricKind::SignalQuality, quality, false)
    }

    pub fn stress(&self, stress: f64) -> ClassifiedMetric {
        self.percentage(MetricKind::Stress, stress, true)
    }

    pub fn fatigue(&self, fatigue: f64) -> ClassifiedMetric {
        self.percentage(MetricKind::Fatigue, fatigue, true)
    }

    pub fn face_wellness(&self, score: f64) -> ClassifiedMetric {
        self.build(
            MetricKind::FaceWellness,
            score.round() as i64,
            "/100",
            wellness_band(score),
        )
    }

    fn build(&self, metric: MetricKind, display_value: i64, unit: &str, band: Band) -> ClassifiedMetric {
        let severity = severity_for(metric, band);
        ClassifiedMetric {
            metric,
            display_value,
            unit: unit.to_string(),
            band,
            severity,
            color: self.palette.color(severity).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bpm_boundaries() {
        assert_eq!(bpm_band(59.0), Band::Low);
        assert_eq!(bpm_band(60.0), Band::Normal);
        assert_eq!(bpm_band(100.0), Band::Normal);
        assert_eq!(bpm_band(101.0), Band::High);
    }

    #[test]
    fn test_hrv_boundaries() {
        assert_eq!(hrv_band(50.0), Band::Good);
        assert_eq!(hrv_band(51.0), Band::Excellent);
        assert_eq!(hrv_band(30.0), Band::Low);
        assert_eq!(hrv_band(31.0), Band::Good);
    }

    #[test]
    fn test_percentage_higher_is_better() {
        assert_eq!(percentage_band(0.7, false), Band::Good);
        assert_eq!(percentage_band(0.69, false), Band::Caution);
        assert_eq!(percentage_band(0.5, false), Band::Caution);
        assert_eq!(percentage_band(0.49, false), Band::Bad);
    }

    #[test]
    fn test_percentage_inverse() {
        assert_eq!(percentage_band(0.7, true), Band::Caution);
        assert_eq!(percentage_band(0.71, true), Band::Bad);
        assert_eq!(percentage_band(0.41, true), Band::Caution);
        assert_eq!(percentage_band(0.4, true), Band::Good);
    }

    #[test]
    fn test_percentage_rounds_before_thresholds() {
        // 0.696 rounds to 70%
        assert_eq!(to_percentage(0.696), 70);
        assert_eq!(percentage_band(0.696, false), Band::Good);
        assert_eq!(to_percentage(0.87), 87);
    }

    #[test]
    fn test_quality_tiers() {
        assert_eq!(quality_tier(0.9), QualityTier::Excellent);
        assert_eq!(quality_tier(0.85), QualityTier::Good);
        assert_eq!(quality_tier(0.7), QualityTier::Fair);
        assert_eq!(quality_tier(0.5), QualityTier::Poor);
        assert_eq!(
            quality_description(0.2),
            "Poor signal quality - consider retaking"
        );
    }

    #[test]
    fn test_wellness_band() {
        assert_eq!(wellness_band(85.0), Band::Good);
        assert_eq!(wellness_band(70.0), Band::Caution);
        assert_eq!(wellness_band(50.0), Band::Bad);
    }

    #[test]
    fn test_classified_metric_colors() {
        let classifier = Classifier::default();

        let low = classifier.bpm(52.4);
        assert_eq!(low.display_value, 52);
        assert_eq!(low.band, Band::Low);
        assert_eq!(low.severity, Severity::Info);
        assert_eq!(low.color, "#007AFF");

        let high = classifier.bpm(120.0);
        assert_eq!(high.color, "#FF3B30");

        let normal = classifier.bpm(72.0);
        assert_eq!(normal.color, "#34C759");

        let hrv = classifier.hrv(25.0);
        assert_eq!(hrv.band, Band::Low);
        assert_eq!(hrv.color, "#FF9500");
        assert_eq!(classifier.hrv(45.0).color, "#007AFF");
        assert_eq!(classifier.hrv(65.0).color, "#34C759");

        let stress = classifier.stress(0.8);
        assert_eq!(stress.display_value, 80);
        assert_eq!(stress.unit, "%");
        assert_eq!(stress.band, Band::Bad);
        assert_eq!(stress.color, "#FF3B30");
    }

    #[test]
    fn test_custom_palette() {
        let palette = Palette {
            good: "green".to_string(),
            ..Palette::default()
        };
        let classifier = Classifier::new(palette);
        assert_eq!(classifier.quality(0.9).color, "green");
        assert_eq!(classifier.quality(0.6).color, "#FF9500");
    }

    #[test]
    fn test_format_clock_time() {
        let morning = Utc.with_ymd_and_hms(2024, 1, 15, 9, 5, 0).unwrap();
        let afternoon = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(format_clock_time(&morning, &utc), "09:05 AM");
        assert_eq!(format_clock_time(&afternoon, &utc), "02:30 PM");

        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(format_clock_time(&afternoon, &new_york), "09:30 AM");
        let kolkata = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        assert_eq!(format_clock_time(&afternoon, &kolkata), "08:00 PM");
    }
}
