//! Engine configuration
//!
//! All tunables are carried in explicit configuration objects that callers
//! pass into sources, the classifier and the processor. Nothing here is
//! global. Configuration can be loaded from TOML:
//!
//! ```toml
//! [source]
//! kind = "remote"
//!
//! [remote]
//! base_url = "https://analysis.example.com/api/v1"
//! timeout_secs = 30
//!
//! [synthetic]
//! seed = 7
//! ppg_latency = { min_ms = 2000, max_ms = 4000 }
//!
//! [display]
//! utc_offset_minutes = 60
//! ```

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ScanError;
use crate::types::{ScanMode, Severity};

/// Default remote analysis endpoint
pub const DEFAULT_REMOTE_BASE_URL: &str = "http://localhost:3000/api/v1";

/// Default remote request timeout in seconds
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub source: SourceConfig,
    pub synthetic: SyntheticConfig,
    pub remote: RemoteConfig,
    pub palette: Palette,
    pub display: DisplayConfig,
}

impl EngineConfig {
    /// Parse configuration from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ScanError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScanError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), ScanError> {
        if self.remote.timeout_secs == 0 {
            return Err(ScanError::Config(
                "remote.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.remote.base_url.trim().is_empty() {
            return Err(ScanError::Config("remote.base_url is empty".to_string()));
        }
        for (name, window) in [
            ("synthetic.ppg_latency", &self.synthetic.ppg_latency),
            ("synthetic.face_latency", &self.synthetic.face_latency),
        ] {
            if window.min_ms > window.max_ms {
                return Err(ScanError::Config(format!(
                    "{name}: min_ms ({}) exceeds max_ms ({})",
                    window.min_ms, window.max_ms
                )));
            }
        }
        self.display.offset()?;
        Ok(())
    }
}

/// Which measurement source drives a scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Synthetic,
    Remote,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
}

/// Inclusive window for simulated processing latency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyWindow {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl LatencyWindow {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// No simulated latency at all
    pub const fn instant() -> Self {
        Self::new(0, 0)
    }

    pub fn is_instant(&self) -> bool {
        self.max_ms == 0
    }

    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }
}

/// Settings for the synthetic (demo) measurement source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Fixed RNG seed; `None` seeds from the operating system
    pub seed: Option<u64>,
    pub ppg_latency: LatencyWindow,
    pub face_latency: LatencyWindow,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: None,
            ppg_latency: LatencyWindow::new(2000, 4000),
            face_latency: LatencyWindow::new(3000, 5000),
        }
    }
}

impl SyntheticConfig {
    /// Seeded configuration without simulated latency
    pub fn deterministic(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ppg_latency: LatencyWindow::instant(),
            face_latency: LatencyWindow::instant(),
        }
    }

    pub fn latency(&self, mode: ScanMode) -> LatencyWindow {
        match mode {
            ScanMode::Ppg => self.ppg_latency,
            ScanMode::Face => self.face_latency,
        }
    }
}

/// Settings for the remote analysis API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REMOTE_BASE_URL.to_string(),
            timeout_secs: DEFAULT_REMOTE_TIMEOUT_SECS,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Color tokens for each severity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub good: String,
    pub info: String,
    pub caution: String,
    pub bad: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            good: "#34C759".to_string(),
            info: "#007AFF".to_string(),
            caution: "#FF9500".to_string(),
            bad: "#FF3B30".to_string(),
        }
    }
}

impl Palette {
    pub fn color(&self, severity: Severity) -> &str {
        match severity {
            Severity::Good => &self.good,
            Severity::Info => &self.info,
            Severity::Caution => &self.caution,
            Severity::Bad => &self.bad,
        }
    }
}

/// How report times are shown to the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Offset from UTC applied to clock readings; zero shows UTC
    pub utc_offset_minutes: i32,
}

impl DisplayConfig {
    pub fn offset(&self) -> Result<FixedOffset, ScanError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ScanError::Config(format!(
                    "display.utc_offset_minutes out of range: {}",
                    self.utc_offset_minutes
                ))
            })
    }
}
