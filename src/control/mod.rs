//! Adaptive pacing policy: mode selection and output synthesis.
//!
//! ```text
//!   confirmed state ─┐
//!   rhythm / HSI ────┼─▶ mode::select ─▶ rate::synthesize ──────▶ target rate
//!   trend ───────────┘         │               ▲
//!                              │        PacingPolicyMemory
//!                              └─────▶ amplitude::synthesize ─▶ amplitude
//! ```
//!
//! Everything here is a pure function of its arguments.  The only state,
//! [`PacingPolicyMemory`], is owned by the controller and passed in.

pub mod amplitude;
pub mod mode;
pub mod rate;

use core::fmt;

use serde::{Deserialize, Serialize};

/// Intervention tier, from no pacing to the emergency override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingMode {
    MonitorOnly,
    Minimal,
    Moderate,
    Aggressive,
    Emergency,
}

impl PacingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MonitorOnly => "monitor_only",
            Self::Minimal => "minimal",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
            Self::Emergency => "emergency",
        }
    }

    /// Whether the device should actually deliver pulses in this mode.
    pub fn paces(self) -> bool {
        self != Self::MonitorOnly
    }
}

impl fmt::Display for PacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last emitted outputs.  Bounds the next cycle's rate of change.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PacingPolicyMemory {
    last_rate_bpm: Option<f64>,
    last_amplitude_ma: Option<f64>,
}

impl PacingPolicyMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, rate_bpm: f64, amplitude_ma: f64) {
        self.last_rate_bpm = Some(rate_bpm);
        self.last_amplitude_ma = Some(amplitude_ma);
    }

    /// `None` until the first successful cycle.
    pub fn last_rate_bpm(&self) -> Option<f64> {
        self.last_rate_bpm
    }

    pub fn last_amplitude_ma(&self) -> Option<f64> {
        self.last_amplitude_ma
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
