//! Capture timeline
//!
//! Countdown, recording and processing progress as an explicit state machine.
//! The caller steps it once per tick (one second while counting down or
//! recording, one progress update while processing); the timeline never
//! schedules itself.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::CaptureDescriptor;

/// Seconds counted down before recording starts
pub const COUNTDOWN_SECONDS: u32 = 3;

/// Upper bound (exclusive) of one processing progress step, in percent
pub const MAX_PROGRESS_STEP: f64 = 20.0;

/// Phase of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum CapturePhase {
    Idle,
    Countdown { remaining: u32 },
    Recording { elapsed: u32, total: u32 },
    Processing { percent: f64 },
    Complete,
}

/// Stepped capture session for one descriptor
#[derive(Debug, Clone)]
pub struct CaptureTimeline {
    phase: CapturePhase,
    recording_seconds: u32,
}

impl CaptureTimeline {
    pub fn new(descriptor: &CaptureDescriptor) -> Self {
        Self {
            phase: CapturePhase::Idle,
            recording_seconds: descriptor.duration_seconds.ceil().max(1.0) as u32,
        }
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == CapturePhase::Complete
    }

    /// Begin the countdown; no effect unless idle
    pub fn start(&mut self) -> CapturePhase {
        if self.phase == CapturePhase::Idle {
            self.phase = CapturePhase::Countdown {
                remaining: COUNTDOWN_SECONDS,
            };
        }
        self.phase
    }

    /// Advance one second of countdown or recording.
    ///
    /// Other phases are left unchanged; processing is driven by
    /// [`advance_processing`](Self::advance_processing).
    pub fn tick(&mut self) -> CapturePhase {
        self.phase = match self.phase {
            CapturePhase::Countdown { remaining } if remaining > 1 => CapturePhase::Countdown {
                remaining: remaining - 1,
            },
            CapturePhase::Countdown { .. } => CapturePhase::Recording {
                elapsed: 0,
                total: self.recording_seconds,
            },
            CapturePhase::Recording { elapsed, total } if elapsed + 1 < total => {
                CapturePhase::Recording {
                    elapsed: elapsed + 1,
                    total,
                }
            }
            CapturePhase::Recording { .. } => CapturePhase::Processing { percent: 0.0 },
            other => other,
        };
        self.phase
    }

    /// Add `increment` percent of processing progress.
    ///
    /// The increment is clamped to `[0, MAX_PROGRESS_STEP)`; reaching 100
    /// completes the session.
    pub fn advance_processing(&mut self, increment: f64) -> CapturePhase {
        if let CapturePhase::Processing { percent } = self.phase {
            let step = if increment.is_finite() {
                increment.clamp(0.0, MAX_PROGRESS_STEP)
            } else {
                0.0
            };
            let next = (percent + step).min(100.0);
            self.phase = if next >= 100.0 {
                CapturePhase::Complete
            } else {
                CapturePhase::Processing { percent: next }
            };
        }
        self.phase
    }

    /// Advance processing by a random step drawn from `rng`
    pub fn advance_processing_with<R: Rng>(&mut self, rng: &mut R) -> CapturePhase {
        let increment = rng.random::<f64>() * MAX_PROGRESS_STEP;
        self.advance_processing(increment)
    }
}
