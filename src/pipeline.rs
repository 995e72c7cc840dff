//! Pipeline orchestration
//!
//! This module provides the public API for Vitalscan. It runs a raw
//! measurement through validation, insight and recommendation derivation and
//! report encoding.

use chrono::FixedOffset;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::Palette;
use crate::error::ScanError;
use crate::insights::InsightEngine;
use crate::recommendations::RecommendationEngine;
use crate::report::ReportEncoder;
use crate::source::MeasurementSource;
use crate::types::{
    AnalysisResult, CaptureDescriptor, Evaluation, RawMeasurement, ScanMode, ScanReport,
    ValidationResult,
};
use crate::validator::Validator;

/// Run every evaluation stage over one sample.
///
/// The stages are independent of each other; validation failures are
/// reported in the result and never stop the other stages.
pub fn assess(sample: &RawMeasurement, mode: ScanMode) -> Evaluation {
    Evaluation {
        mode,
        measurement: sample.clone(),
        validation: Validator::validate(sample, mode),
        insights: InsightEngine::derive(sample, mode),
        recommendations: RecommendationEngine::derive(sample, mode),
        status_message: None,
    }
}

/// Evaluate a sample into a display report with the default palette
pub fn evaluate(sample: &RawMeasurement, mode: ScanMode) -> ScanReport {
    ReportEncoder::new().encode(&assess(sample, mode))
}

/// Evaluate a raw measurement JSON document into report JSON.
///
/// # Arguments
/// * `raw_json` - A bare measurement object, or an analysis envelope
///   (`{"success": .., "data": {..}, "message": ..}`)
/// * `mode` - Scan mode the sample was captured in
///
/// # Example
/// ```ignore
/// let report = evaluate_json(r#"{"bpm":72,"hrv":45,"quality":0.87}"#.to_string(), ScanMode::Ppg)?;
/// ```
pub fn evaluate_json(raw_json: String, mode: ScanMode) -> Result<String, ScanError> {
    let (sample, message) = parse_measurement(&raw_json)?;
    let mut evaluation = assess(&sample, mode);
    evaluation.status_message = message;
    ReportEncoder::new().encode_to_json(&evaluation)
}

/// Validate a raw measurement JSON document, returning the validation JSON
pub fn validate_json(raw_json: String, mode: ScanMode) -> Result<String, ScanError> {
    let (sample, _) = parse_measurement(&raw_json)?;
    let validation: ValidationResult = Validator::validate(&sample, mode);
    serde_json::to_string_pretty(&validation).map_err(|e| ScanError::EncodingError(e.to_string()))
}

/// Parse either a bare measurement or an analysis envelope
pub fn parse_measurement(raw_json: &str) -> Result<(RawMeasurement, Option<String>), ScanError> {
    let value: Value = serde_json::from_str(raw_json)?;

    if value.get("data").is_some_and(Value::is_object) {
        let envelope: AnalysisResult = serde_json::from_value(value)?;
        let message = Some(envelope.message).filter(|m| !m.is_empty());
        return Ok((envelope.data, message));
    }

    Ok((serde_json::from_value(value)?, None))
}

/// Processor running complete scans against a measurement source.
///
/// Holds the source and the report encoder so repeated scans share one
/// encoder instance.
pub struct ScanProcessor<S> {
    source: S,
    encoder: ReportEncoder,
}

impl<S: MeasurementSource> ScanProcessor<S> {
    /// Create a processor with the default palette
    pub fn new(source: S) -> Self {
        Self {
            source,
            encoder: ReportEncoder::new(),
        }
    }

    /// Create a processor with a specific palette
    pub fn with_palette(source: S, palette: Palette) -> Self {
        Self {
            source,
            encoder: ReportEncoder::with_palette(palette),
        }
    }

    /// Show completion times shifted from UTC by `offset`
    pub fn with_display_offset(mut self, offset: FixedOffset) -> Self {
        self.encoder = self.encoder.with_display_offset(offset);
        self
    }

    /// Measure and evaluate one capture.
    ///
    /// Source failures (transport, rejection, cancellation) are returned as
    /// errors. An implausible sample still produces a report; its validation
    /// carries the reasons.
    pub async fn scan(
        &self,
        descriptor: &CaptureDescriptor,
        cancel: &CancellationToken,
    ) -> Result<ScanReport, ScanError> {
        tracing::debug!(source = self.source.name(), mode = %descriptor.mode, "starting scan");

        let result = self.source.measure(descriptor, cancel).await?;

        let mut evaluation = assess(&result.data, descriptor.mode);
        evaluation.status_message = Some(result.message).filter(|m| !m.is_empty());

        if !evaluation.validation.is_valid {
            tracing::warn!(
                errors = ?evaluation.validation.errors,
                "sample failed validation; reporting anyway"
            );
        }

        let report = self.encoder.encode(&evaluation);
        tracing::info!(
            report_id = %report.report_id,
            mode = %descriptor.mode,
            valid = report.validation.is_valid,
            "scan complete"
        );

        Ok(report)
    }
}
