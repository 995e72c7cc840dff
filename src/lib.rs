//! Vitalscan - Scan-result evaluation engine for camera-based wellness scans
//!
//! Vitalscan turns a raw measurement from a finger (PPG) or face scan into a
//! display-ready report through a one-directional pipeline: measurement
//! source → validation → {insights, recommendations, confidence} → report
//! encoding.
//!
//! ## Modules
//!
//! - **Evaluation**: `validator`, `classifier`, `insights`, `recommendations`, `confidence`
//! - **Sources**: synthetic generator and remote analysis API behind `MeasurementSource`
//! - **Capture**: stepped countdown/recording/processing timeline

pub mod capture;
pub mod classifier;
pub mod confidence;
pub mod config;
pub mod error;
pub mod insights;
pub mod pipeline;
pub mod recommendations;
pub mod report;
pub mod source;
pub mod types;
pub mod validator;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::EngineConfig;
pub use error::ScanError;
pub use pipeline::{assess, evaluate, evaluate_json, validate_json, ScanProcessor};
pub use source::{ConfiguredSource, MeasurementSource, RemoteAnalysisSource, SyntheticSource};
pub use types::{CaptureDescriptor, RawMeasurement, ScanMode, ScanReport};

/// Vitalscan version embedded in every report
pub const VITALSCAN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "vitalscan";
