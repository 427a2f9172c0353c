//! Controller configuration parameters
//!
//! All tunable thresholds and limits for the pacing controller.
//! Values can be overridden through a [`ConfigPort`](crate::app::ports::ConfigPort)
//! or hot-reloaded with [`ControllerCommand::UpdateConfig`](crate::app::commands::ControllerCommand).
//! A config may tighten the hard physiological limits below, never widen them.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lowest pacing rate any command may carry (BPM).
pub const ABSOLUTE_MIN_RATE_BPM: f64 = 40.0;
/// Highest pacing rate any command may carry (BPM).
pub const ABSOLUTE_MAX_RATE_BPM: f64 = 180.0;
/// Lowest non-zero pacing amplitude (mA).
pub const ABSOLUTE_MIN_AMPLITUDE_MA: f64 = 0.5;
/// Highest pacing amplitude (mA).
pub const ABSOLUTE_MAX_AMPLITUDE_MA: f64 = 10.0;

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    // --- Output bounds ---
    /// Minimum commanded pacing rate (BPM)
    pub min_rate_bpm: f64,
    /// Maximum commanded pacing rate (BPM)
    pub max_rate_bpm: f64,
    /// Minimum amplitude while pacing (mA)
    pub min_amplitude_ma: f64,
    /// Maximum amplitude (mA)
    pub max_amplitude_ma: f64,

    // --- Emergency override ---
    /// Fixed rate commanded in emergency mode (BPM)
    pub emergency_rate_bpm: f64,
    /// Fixed amplitude commanded in emergency mode (mA)
    pub emergency_amplitude_ma: f64,

    // --- Rate of change ---
    /// Largest rate increase between consecutive cycles (BPM)
    pub max_rate_increase_per_cycle: f64,
    /// Largest rate decrease between consecutive cycles (BPM)
    pub max_rate_decrease_per_cycle: f64,
    /// Use the measured heart rate as the prior rate on the first cycle
    pub anchor_first_cycle_to_heart_rate: bool,

    // --- Classifier confidence ---
    /// At or above this, the rhythm classification is fully trusted
    pub confidence_high: f64,
    /// Below this, the classification is unreliable (safe mode)
    pub confidence_medium: f64,

    // --- HSI thresholds ---
    /// Below this HSI the patient is in emergency
    pub hsi_emergency: f64,
    /// Below this HSI operation is degraded and pacing is conservative
    pub hsi_critical_low: f64,
    /// Below this HSI pacing is moderate
    pub hsi_low: f64,
    /// At or above this HSI intervention is minimal
    pub hsi_good: f64,

    // --- Hysteresis ---
    /// Consecutive less-severe cycles required before the safety state improves
    pub recovery_cycles: u8,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Output bounds
            min_rate_bpm: ABSOLUTE_MIN_RATE_BPM,
            max_rate_bpm: ABSOLUTE_MAX_RATE_BPM,
            min_amplitude_ma: ABSOLUTE_MIN_AMPLITUDE_MA,
            max_amplitude_ma: ABSOLUTE_MAX_AMPLITUDE_MA,

            // Emergency override
            emergency_rate_bpm: 70.0,
            emergency_amplitude_ma: ABSOLUTE_MAX_AMPLITUDE_MA,

            // Rate of change
            max_rate_increase_per_cycle: 10.0,
            max_rate_decrease_per_cycle: 10.0,
            anchor_first_cycle_to_heart_rate: true,

            // Confidence
            confidence_high: 0.80,
            confidence_medium: 0.60,

            // HSI
            hsi_emergency: 10.0,
            hsi_critical_low: 30.0,
            hsi_low: 50.0,
            hsi_good: 70.0,

            // Hysteresis
            recovery_cycles: 3,
        }
    }
}

impl ControllerConfig {
    /// Range-check every field.  Rejects, never clamps: a bad config must
    /// not silently become a different bad config.
    pub fn validate(&self) -> Result<()> {
        let all_finite = [
            self.min_rate_bpm,
            self.max_rate_bpm,
            self.min_amplitude_ma,
            self.max_amplitude_ma,
            self.emergency_rate_bpm,
            self.emergency_amplitude_ma,
            self.max_rate_increase_per_cycle,
            self.max_rate_decrease_per_cycle,
            self.confidence_high,
            self.confidence_medium,
            self.hsi_emergency,
            self.hsi_critical_low,
            self.hsi_low,
            self.hsi_good,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            return Err(Error::Config("all numeric fields must be finite"));
        }

        if self.min_rate_bpm < ABSOLUTE_MIN_RATE_BPM || self.max_rate_bpm > ABSOLUTE_MAX_RATE_BPM {
            return Err(Error::Config("rate bounds must stay within 40–180 BPM"));
        }
        if self.min_rate_bpm >= self.max_rate_bpm {
            return Err(Error::Config("min_rate_bpm must be < max_rate_bpm"));
        }
        if self.min_amplitude_ma < ABSOLUTE_MIN_AMPLITUDE_MA
            || self.max_amplitude_ma > ABSOLUTE_MAX_AMPLITUDE_MA
        {
            return Err(Error::Config("amplitude bounds must stay within 0.5–10 mA"));
        }
        if self.min_amplitude_ma >= self.max_amplitude_ma {
            return Err(Error::Config("min_amplitude_ma must be < max_amplitude_ma"));
        }
        if !(self.min_rate_bpm..=self.max_rate_bpm).contains(&self.emergency_rate_bpm) {
            return Err(Error::Config("emergency_rate_bpm must lie within the rate bounds"));
        }
        if !(self.min_amplitude_ma..=self.max_amplitude_ma).contains(&self.emergency_amplitude_ma) {
            return Err(Error::Config(
                "emergency_amplitude_ma must lie within the amplitude bounds",
            ));
        }
        if self.max_rate_increase_per_cycle <= 0.0 || self.max_rate_decrease_per_cycle <= 0.0 {
            return Err(Error::Config("per-cycle rate limits must be > 0"));
        }
        if !(0.0 < self.confidence_medium
            && self.confidence_medium < self.confidence_high
            && self.confidence_high <= 1.0)
        {
            return Err(Error::Config(
                "confidence thresholds must satisfy 0 < medium < high <= 1",
            ));
        }
        if !(0.0 < self.hsi_emergency
            && self.hsi_emergency < self.hsi_critical_low
            && self.hsi_critical_low < self.hsi_low
            && self.hsi_low < self.hsi_good
            && self.hsi_good <= 100.0)
        {
            return Err(Error::Config(
                "HSI thresholds must satisfy 0 < emergency < critical_low < low < good <= 100",
            ));
        }
        if self.recovery_cycles == 0 {
            return Err(Error::Config("recovery_cycles must be >= 1"));
        }
        Ok(())
    }

    /// Encode for persistence.
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        postcard::to_allocvec(self).ok()
    }

    /// Decode a persisted config.  Does not validate.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        postcard::from_bytes(bytes).ok()
    }
}
