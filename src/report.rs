//! Report encoding
//!
//! Encodes an [`Evaluation`] into the flat [`ScanReport`] display payload:
//! every numeric value pre-rounded, every color token pre-resolved.

use chrono::{FixedOffset, Offset, Utc};
use uuid::Uuid;

use crate::classifier::{format_clock_time, quality_description, Classifier};
use crate::confidence::resolve_confidence_badge;
use crate::config::Palette;
use crate::error::ScanError;
use crate::types::{Confidence, Evaluation, ReportProducer, ScanMode, ScanReport};
use crate::{PRODUCER_NAME, VITALSCAN_VERSION};

/// Encoder producing display payloads
pub struct ReportEncoder {
    instance_id: String,
    classifier: Classifier,
    display_offset: FixedOffset,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create an encoder with a unique instance ID and the default palette
    pub fn new() -> Self {
        Self::with_palette(Palette::default())
    }

    pub fn with_palette(palette: Palette) -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
            classifier: Classifier::new(palette),
            display_offset: Utc.fix(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self {
            instance_id,
            classifier: Classifier::default(),
            display_offset: Utc.fix(),
        }
    }

    /// Show completion times shifted from UTC by `offset`
    pub fn with_display_offset(mut self, offset: FixedOffset) -> Self {
        self.display_offset = offset;
        self
    }

    /// Encode an evaluation into a display payload
    pub fn encode(&self, evaluation: &Evaluation) -> ScanReport {
        let sample = &evaluation.measurement;
        // Completion time is the sample's own timestamp
        let completed_at = sample.timestamp;
        let classifier = &self.classifier;
        let is_face = evaluation.mode == ScanMode::Face;

        // HRV is only displayed for finger scans
        let heart_rate_variability = match evaluation.mode {
            ScanMode::Ppg => sample.hrv.map(|hrv| classifier.hrv(hrv)),
            ScanMode::Face => None,
        };

        // Explicit tag wins, then quality, then medium
        let confidence = sample
            .confidence
            .or_else(|| sample.quality.map(Confidence::from_quality));

        ScanReport {
            report_id: Uuid::new_v4().to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: VITALSCAN_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            mode: evaluation.mode,
            completed_at: completed_at.to_rfc3339(),
            completed_at_display: format_clock_time(&completed_at, &self.display_offset),
            status_message: evaluation.status_message.clone(),
            validation: evaluation.validation.clone(),
            heart_rate: sample.bpm.map(|bpm| classifier.bpm(bpm)),
            heart_rate_variability,
            signal_quality: sample.quality.map(|q| classifier.quality(q)),
            quality_description: sample
                .quality
                .map(|q| quality_description(q).to_string()),
            stress: sample
                .stress_score
                .filter(|_| is_face)
                .map(|s| classifier.stress(s)),
            fatigue: sample
                .fatigue_score
                .filter(|_| is_face)
                .map(|f| classifier.fatigue(f)),
            face_wellness: sample
                .face_wellness
                .filter(|_| is_face)
                .map(|w| classifier.face_wellness(w)),
            insights: evaluation.insights.clone(),
            recommendations: evaluation.recommendations.clone(),
            confidence: resolve_confidence_badge(confidence),
            measurement: sample.clone(),
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(&self, evaluation: &Evaluation) -> Result<String, ScanError> {
        let report = self.encode(evaluation);
        serde_json::to_string_pretty(&report).map_err(|e| ScanError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Band, RawMeasurement, ValidationResult};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn evaluation(mode: ScanMode, measurement: RawMeasurement) -> Evaluation {
        Evaluation {
            mode,
            measurement,
            validation: ValidationResult::from_errors(Vec::new()),
            insights: Vec::new(),
            recommendations: Vec::new(),
            status_message: None,
        }
    }

    #[test]
    fn test_ppg_report_fields() {
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode(&evaluation(
            ScanMode::Ppg,
            RawMeasurement {
                bpm: Some(72.4),
                hrv: Some(45.0),
                quality: Some(0.87),
                ..Default::default()
            },
        ));

        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.instance_id, "test-instance");
        assert_eq!(report.heart_rate.as_ref().unwrap().display_value, 72);
        assert_eq!(report.heart_rate_variability.as_ref().unwrap().band, Band::Good);
        assert_eq!(report.signal_quality.as_ref().unwrap().display_value, 87);
        assert_eq!(
            report.quality_description.as_deref(),
            Some("Excellent signal quality")
        );
        assert!(report.stress.is_none());
        assert!(report.face_wellness.is_none());
        assert_eq!(report.confidence.label, "High Confidence");
        assert!(Uuid::parse_str(&report.report_id).is_ok());
    }

    #[test]
    fn test_face_report_hides_hrv() {
        let report = ReportEncoder::new().encode(&evaluation(
            ScanMode::Face,
            RawMeasurement {
                bpm: Some(80.0),
                hrv: Some(40.0),
                quality: Some(0.75),
                stress_score: Some(0.5),
                fatigue_score: Some(0.2),
                face_wellness: Some(72.0),
                ..Default::default()
            },
        ));

        assert!(report.heart_rate_variability.is_none());
        assert_eq!(report.stress.as_ref().unwrap().band, Band::Caution);
        assert_eq!(report.fatigue.as_ref().unwrap().band, Band::Good);
        assert_eq!(report.face_wellness.as_ref().unwrap().unit, "/100");
        assert_eq!(report.face_wellness.as_ref().unwrap().band, Band::Good);
    }

    #[test]
    fn test_confidence_tag_precedence() {
        let encoder = ReportEncoder::new();

        let tagged = encoder.encode(&evaluation(
            ScanMode::Ppg,
            RawMeasurement {
                quality: Some(0.95),
                confidence: Some(Confidence::Low),
                ..Default::default()
            },
        ));
        assert_eq!(tagged.confidence.label, "Low Confidence");

        let untagged = encoder.encode(&evaluation(ScanMode::Ppg, RawMeasurement::default()));
        assert_eq!(untagged.confidence.label, "Medium Confidence");
    }

    #[test]
    fn test_encode_to_json() {
        let json = ReportEncoder::new()
            .encode_to_json(&evaluation(
                ScanMode::Ppg,
                RawMeasurement {
                    bpm: Some(65.0),
                    ..Default::default()
                },
            ))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["mode"], "ppg");
        assert_eq!(value["heart_rate"]["display_value"], 65);
        assert_eq!(value["heart_rate"]["color"], "#34C759");
        assert!(value["completed_at_display"].as_str().unwrap().ends_with('M'));
    }

    #[test]
    fn test_completion_time_follows_sample_timestamp() {
        let sample = RawMeasurement {
            bpm: Some(72.0),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap(),
            ..Default::default()
        };

        let report = ReportEncoder::new().encode(&evaluation(ScanMode::Ppg, sample.clone()));
        assert_eq!(report.completed_at, "2024-01-15T14:30:00+00:00");
        assert_eq!(report.completed_at_display, "02:30 PM");

        let berlin = FixedOffset::east_opt(3600).unwrap();
        let report = ReportEncoder::new()
            .with_display_offset(berlin)
            .encode(&evaluation(ScanMode::Ppg, sample));
        assert_eq!(report.completed_at, "2024-01-15T14:30:00+00:00");
        assert_eq!(report.completed_at_display, "03:30 PM");
    }
}
