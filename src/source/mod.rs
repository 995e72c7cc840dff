//! Measurement sources
//!
//! A measurement source turns a capture descriptor into an
//! [`AnalysisResult`]. Two sources produce the same shape: the synthetic
//! generator used for demos and tests, and the remote analysis API. The
//! evaluation pipeline accepts either without change.

mod remote;
mod synthetic;

pub use remote::{RawSample, RemoteAnalysisSource, FACE_ANALYZE_PATH, PPG_ANALYZE_PATH};
pub use synthetic::{derive_face_wellness, SyntheticSource};

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::config::{EngineConfig, SourceKind};
use crate::error::ScanError;
use crate::types::{AnalysisResult, CaptureDescriptor};

/// Capability that produces a raw measurement for one capture session
pub trait MeasurementSource {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Produce a measurement for `descriptor`.
    ///
    /// Resolves with [`ScanError::Cancelled`] once `cancel` fires; any pending
    /// timer or request is dropped.
    fn measure(
        &self,
        descriptor: &CaptureDescriptor,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<AnalysisResult, ScanError>> + Send;
}

/// Source selected at runtime from configuration
pub enum ConfiguredSource {
    Synthetic(SyntheticSource),
    Remote(RemoteAnalysisSource),
}

impl ConfiguredSource {
    /// Build the source named by `config.source.kind`
    pub fn from_config(config: &EngineConfig) -> Result<Self, ScanError> {
        match config.source.kind {
            SourceKind::Synthetic => Ok(ConfiguredSource::Synthetic(SyntheticSource::new(
                config.synthetic.clone(),
            ))),
            SourceKind::Remote => Ok(ConfiguredSource::Remote(RemoteAnalysisSource::new(
                &config.remote,
            )?)),
        }
    }
}

impl MeasurementSource for ConfiguredSource {
    fn name(&self) -> &'static str {
        match self {
            ConfiguredSource::Synthetic(source) => source.name(),
            ConfiguredSource::Remote(source) => source.name(),
        }
    }

    async fn measure(
        &self,
        descriptor: &CaptureDescriptor,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, ScanError> {
        match self {
            ConfiguredSource::Synthetic(source) => source.measure(descriptor, cancel).await,
            ConfiguredSource::Remote(source) => source.measure(descriptor, cancel).await,
        }
    }
}
