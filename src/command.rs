//! Pacing command and decision result: the controller's output surface.
//!
//! Both types serialize to the JSON shape downstream consumers expect,
//! with snake_case enum labels and an RFC 3339 timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::control::PacingMode;
use crate::control::rate::RateAdjustment;
use crate::error::Error;
use crate::fsm::SafetyState;
use crate::input::{DecisionInput, HsiTrend, InputSummary, RhythmClass};

/// Rate reported by the canonical fallback.
pub const FALLBACK_RATE_BPM: f64 = 70.0;

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Post-hoc checks reported alongside every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyChecks {
    pub rate_within_bounds: bool,
    pub amplitude_within_bounds: bool,
    pub confidence_acceptable: bool,
    pub hsi_acceptable: bool,
}

impl SafetyChecks {
    pub fn all_passed(&self) -> bool {
        self.rate_within_bounds
            && self.amplitude_within_bounds
            && self.confidence_acceptable
            && self.hsi_acceptable
    }
}

/// One cycle's pacing instruction.  Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingCommand {
    pub pacing_enabled: bool,
    /// Rounded to 0.1 BPM.
    pub target_rate_bpm: f64,
    /// Rounded to 0.01 mA.
    pub pacing_amplitude_ma: f64,
    pub pacing_mode: PacingMode,
    pub safety_state: SafetyState,
    pub safety_checks: SafetyChecks,
    pub rationale: String,
}

impl PacingCommand {
    /// The canonical do-no-harm command: no pacing, emergency state.
    pub fn fallback(reason: &str) -> Self {
        Self {
            pacing_enabled: false,
            target_rate_bpm: FALLBACK_RATE_BPM,
            pacing_amplitude_ma: 0.0,
            pacing_mode: PacingMode::MonitorOnly,
            safety_state: SafetyState::Emergency,
            safety_checks: SafetyChecks {
                rate_within_bounds: true,
                amplitude_within_bounds: true,
                confidence_acceptable: false,
                hsi_acceptable: false,
            },
            rationale: format!("Error occurred: {reason} - using safe fallback (no pacing)"),
        }
    }

    /// Inter-pulse interval a device would schedule, in milliseconds.
    ///
    /// `None` when pacing is disabled.
    pub fn pace_interval_ms(&self) -> Option<u32> {
        if !self.pacing_enabled || self.target_rate_bpm <= 0.0 {
            return None;
        }
        Some((60_000.0 / self.target_rate_bpm).round() as u32)
    }
}

// ---------------------------------------------------------------------------
// Result envelope
// ---------------------------------------------------------------------------

/// What the entry point returns for every call, success or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub success: bool,
    pub pacing_command: PacingCommand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_summary: Option<InputSummary>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DecisionResult {
    pub fn succeeded(command: PacingCommand, summary: InputSummary, timestamp: DateTime<Utc>) -> Self {
        Self {
            success: true,
            pacing_command: command,
            input_summary: Some(summary),
            timestamp,
            error: None,
        }
    }

    pub fn fallback(error: Error, timestamp: DateTime<Utc>) -> Self {
        let reason = error.to_string();
        Self {
            success: false,
            pacing_command: PacingCommand::fallback(&reason),
            input_summary: None,
            timestamp,
            error: Some(reason),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Rationale
// ---------------------------------------------------------------------------

/// Human-readable explanation of one decision.
///
/// Notes appear in a fixed order (safety state, rhythm, HSI band, trend,
/// mode, rate adjustments) and are joined with `"; "`.
pub fn rationale(
    input: &DecisionInput,
    state: SafetyState,
    mode: PacingMode,
    rate_adjustments: &[RateAdjustment],
    config: &ControllerConfig,
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(7);

    match state {
        SafetyState::Emergency => {
            parts.push("EMERGENCY safety state - using conservative defaults".into());
        }
        SafetyState::SafeMode => {
            parts.push("Safe mode active - unreliable data, minimal intervention".into());
        }
        SafetyState::Degraded => parts.push("Degraded operation - proceeding with caution".into()),
        SafetyState::Normal => {}
    }

    match input.rhythm_class {
        RhythmClass::NormalSinus => parts.push("Normal sinus rhythm detected".into()),
        RhythmClass::Bradycardia => {
            parts.push("Bradycardia detected - increasing pacing rate".into());
        }
        RhythmClass::Tachycardia => parts.push("Tachycardia detected - stabilizing rhythm".into()),
        RhythmClass::Irregular => parts.push("Irregular rhythm - stabilization needed".into()),
        RhythmClass::Artifact => parts.push("Signal artifact - using safe defaults".into()),
        RhythmClass::Unknown => {}
    }

    let hsi = input.hsi_score;
    if hsi >= config.hsi_good {
        parts.push(format!("Good cardiovascular status (HSI={hsi:.1})"));
    } else if hsi >= config.hsi_low {
        parts.push(format!("Fair cardiovascular status (HSI={hsi:.1})"));
    } else {
        parts.push(format!(
            "Poor cardiovascular status (HSI={hsi:.1}) - conservative approach"
        ));
    }

    match input.hsi_trend {
        HsiTrend::Improving => parts.push("HSI improving".into()),
        HsiTrend::Declining => parts.push("HSI declining - increased monitoring".into()),
        HsiTrend::Stable => {}
    }

    parts.push(format!("Pacing mode: {mode}"));

    for adjustment in rate_adjustments {
        match *adjustment {
            RateAdjustment::Limited { requested, applied } => parts.push(format!(
                "Rate change limited ({requested:.1} -> {applied:.1} BPM)"
            )),
            RateAdjustment::Clamped { requested, applied } => parts.push(format!(
                "Rate clamped to safe bounds ({requested:.1} -> {applied:.1} BPM)"
            )),
        }
    }

    parts.join("; ")
}

/// Round to one decimal place.
pub(crate) fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to two decimal places.
pub(crate) fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
