//! Core types for the Vitalscan pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: capture descriptors, raw measurements, validation results,
//! classified metrics, insights, recommendations and the display report.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ScanError;

/// Default recording length for a finger scan (seconds)
pub const DEFAULT_PPG_DURATION_SECS: f64 = 30.0;

/// Default recording length for a face scan (seconds)
pub const DEFAULT_FACE_DURATION_SECS: f64 = 45.0;

/// Scan mode: fingertip photoplethysmography or remote (face) PPG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Ppg,
    Face,
}

impl ScanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Ppg => "ppg",
            ScanMode::Face => "face",
        }
    }

    /// Conventional recording length for this mode
    pub fn default_duration_seconds(&self) -> f64 {
        match self {
            ScanMode::Ppg => DEFAULT_PPG_DURATION_SECS,
            ScanMode::Face => DEFAULT_FACE_DURATION_SECS,
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanMode {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ppg" | "finger" => Ok(ScanMode::Ppg),
            "face" | "rppg" => Ok(ScanMode::Face),
            other => Err(ScanError::UnsupportedMode(other.to_string())),
        }
    }
}

/// Description of one capture session, handed over by the capture subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureDescriptor {
    pub mode: ScanMode,
    pub duration_seconds: f64,
    /// Location of the recorded video, when the capture subsystem kept one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_uri: Option<String>,
}

impl CaptureDescriptor {
    /// Descriptor with the conventional duration for `mode`
    pub fn new(mode: ScanMode) -> Self {
        Self {
            mode,
            duration_seconds: mode.default_duration_seconds(),
            video_uri: None,
        }
    }

    /// 30 second finger scan
    pub fn ppg() -> Self {
        Self::new(ScanMode::Ppg)
    }

    /// 45 second face scan
    pub fn face() -> Self {
        Self::new(ScanMode::Face)
    }

    pub fn with_duration(mut self, duration_seconds: f64) -> Self {
        self.duration_seconds = duration_seconds;
        self
    }

    pub fn with_video_uri(mut self, uri: impl Into<String>) -> Self {
        self.video_uri = Some(uri.into());
        self
    }

    /// Reject descriptors no capture session could have produced
    pub fn validate(&self) -> Result<(), ScanError> {
        if !self.duration_seconds.is_finite() || self.duration_seconds <= 0.0 {
            return Err(ScanError::InvalidDescriptor(format!(
                "duration must be a positive number of seconds, got {}",
                self.duration_seconds
            )));
        }
        Ok(())
    }
}

/// Coarse confidence tag attached to a measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Parse a tag; unrecognized tags yield `None`
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Confidence::High),
            "medium" => Some(Confidence::Medium),
            "low" => Some(Confidence::Low),
            _ => None,
        }
    }
}

fn lenient_confidence<'de, D>(deserializer: D) -> Result<Option<Confidence>, D::Error>
where
    D: Deserializer<'de>,
{
    let tag: Option<String> = Option::deserialize(deserializer)?;
    Ok(tag.as_deref().and_then(Confidence::parse))
}

/// Accept integral or fractional milliseconds; negative or non-finite values are dropped
fn lenient_processing_time<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis: Option<f64> = Option::deserialize(deserializer)?;
    Ok(millis
        .filter(|ms| ms.is_finite() && *ms >= 0.0)
        .map(|ms| ms.round() as u64))
}

/// Parse an RFC 3339 or offset-less ISO-8601 timestamp (taken as UTC)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Null or unparseable timestamps fall back to the time of decoding
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now))
}

/// Skin tone consistency reported alongside face scans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinToneAnalysis {
    pub detected: bool,
    pub consistency: String,
}

/// One raw physiological sample, as produced by a measurement source.
///
/// Every metric is optional: a remote backend may omit fields, and the
/// validator reports what is missing instead of rejecting the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMeasurement {
    /// Heart rate (beats per minute)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<f64>,
    /// Heart rate variability (ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrv: Option<f64>,
    /// Signal quality (0-1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
    /// Stress indicator (0-1), face scans only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_score: Option<f64>,
    /// Fatigue indicator (0-1), face scans only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatigue_score: Option<f64>,
    /// Face wellness score (0-100), face scans only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_wellness: Option<f64>,
    /// Breaths per minute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_detection_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting_quality: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin_tone_analysis: Option<SkinToneAnalysis>,
    /// Time the producer spent on analysis (ms)
    #[serde(
        rename = "processing_time",
        default,
        deserialize_with = "lenient_processing_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub processing_time_ms: Option<u64>,
    /// When the sample was produced
    #[serde(default = "Utc::now", deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "lenient_confidence",
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence: Option<Confidence>,
}

impl Default for RawMeasurement {
    fn default() -> Self {
        Self {
            bpm: None,
            hrv: None,
            quality: None,
            stress_score: None,
            fatigue_score: None,
            face_wellness: None,
            respiratory_rate: None,
            face_detection_confidence: None,
            lighting_quality: None,
            signal_strength: None,
            skin_tone_analysis: None,
            processing_time_ms: None,
            timestamp: Utc::now(),
            confidence: None,
        }
    }
}

/// Envelope returned by every measurement source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub success: bool,
    pub data: RawMeasurement,
    #[serde(default)]
    pub message: String,
}

/// Outcome of plausibility checks on one sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Metric a classification refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    HeartRate,
    HeartRateVariability,
    SignalQuality,
    Stress,
    Fatigue,
    FaceWellness,
}

/// Display band for a classified metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Low,
    Normal,
    High,
    Excellent,
    Good,
    Caution,
    Bad,
}

/// Severity of a band, resolved to a color through the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Good,
    Info,
    Caution,
    Bad,
}

/// One metric mapped to its display band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedMetric {
    pub metric: MetricKind,
    /// Rounded value ready for display
    pub display_value: i64,
    pub unit: String,
    pub band: Band,
    pub severity: Severity,
    pub color: String,
}

/// Four-tier descriptive signal quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityTier {
    pub fn description(&self) -> &'static str {
        match self {
            QualityTier::Excellent => "Excellent signal quality",
            QualityTier::Good => "Good signal quality",
            QualityTier::Fair => "Fair signal quality",
            QualityTier::Poor => "Poor signal quality - consider retaking",
        }
    }
}

/// Tone of an insight card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Info,
    Warning,
    Success,
}

/// Human-readable observation derived from a sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
}

impl Insight {
    pub fn new(kind: InsightKind, title: &str, message: &str) -> Self {
        Self {
            kind,
            title: title.to_string(),
            message: message.to_string(),
        }
    }
}

/// Area a recommendation addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    HeartRate,
    HeartRateVariability,
    SignalQuality,
    Stress,
    Fatigue,
}

/// Actionable suggestion derived from a sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub text: String,
}

impl Recommendation {
    pub fn new(category: RecommendationCategory, text: &str) -> Self {
        Self {
            category,
            text: text.to_string(),
        }
    }
}

/// Display metadata for a confidence tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceBadge {
    pub label: String,
    pub text_color: String,
    pub background_color: String,
}

/// A sample together with everything derived from it, before display encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub mode: ScanMode,
    pub measurement: RawMeasurement,
    pub validation: ValidationResult,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
    /// Message supplied by the measurement source, if any
    pub status_message: Option<String>,
}

/// Report producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    /// Identifies the encoder instance that produced the report
    pub instance_id: String,
}

/// Flat display payload consumed by the results surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub report_id: String,
    pub producer: ReportProducer,
    pub mode: ScanMode,
    /// RFC 3339 completion time
    pub completed_at: String,
    /// Completion time formatted for display (`hh:mm AM`)
    pub completed_at_display: String,
    pub status_message: Option<String>,
    pub validation: ValidationResult,
    pub heart_rate: Option<ClassifiedMetric>,
    pub heart_rate_variability: Option<ClassifiedMetric>,
    pub signal_quality: Option<ClassifiedMetric>,
    pub quality_description: Option<String>,
    pub stress: Option<ClassifiedMetric>,
    pub fatigue: Option<ClassifiedMetric>,
    pub face_wellness: Option<ClassifiedMetric>,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
    pub confidence: ConfidenceBadge,
    /// The sample the report was built from
    pub measurement: RawMeasurement,
}
