//! Safety evaluator.
//!
//! Runs **every cycle before mode selection** and classifies the sanitized
//! input into an instantaneous [`SafetyState`].  The result is only a
//! proposal; [`SafetyStateTracker`](crate::fsm::SafetyStateTracker)
//! decides whether the confirmed state follows it.
//!
//! ## Precedence
//!
//! Checks run from most to least severe and the first hit wins:
//!
//! 1. **Emergency**: heart rate outside the hard 40–180 BPM window, or
//!    HSI below `hsi_emergency`.
//! 2. **SafeMode**: confidence below `confidence_medium`, or artifact.
//! 3. **Degraded**: HSI below `hsi_critical_low`, confidence below
//!    `confidence_high`, or an arrhythmia.
//! 4. **Normal**: everything else.

use core::fmt;

use crate::config::{ABSOLUTE_MAX_RATE_BPM, ABSOLUTE_MIN_RATE_BPM, ControllerConfig};
use crate::fsm::SafetyState;
use crate::input::{DecisionInput, RhythmClass};

/// Condition that decided an evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    HeartRateOutOfBounds(f64),
    HsiCritical(f64),
    LowConfidence(f64),
    Artifact,
    HsiLow(f64),
    MediumConfidence(f64),
    Arrhythmia(RhythmClass),
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeartRateOutOfBounds(hr) => write!(f, "heart rate {hr:.1} BPM outside safe bounds"),
            Self::HsiCritical(hsi) => write!(f, "critically low HSI {hsi:.1}"),
            Self::LowConfidence(c) => write!(f, "low classifier confidence {c:.2}"),
            Self::Artifact => write!(f, "artifact in rhythm signal"),
            Self::HsiLow(hsi) => write!(f, "low HSI {hsi:.1}"),
            Self::MediumConfidence(c) => write!(f, "medium classifier confidence {c:.2}"),
            Self::Arrhythmia(class) => write!(f, "abnormal rhythm {}", class.as_str()),
        }
    }
}

/// Instantaneous classification plus the condition behind it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub state: SafetyState,
    /// `None` when the state is `Normal`.
    pub trigger: Option<Trigger>,
}

/// Classify one cycle's input.  Pure: no counters, no logging.
pub fn assess(input: &DecisionInput, config: &ControllerConfig) -> Assessment {
    let hr = input.heart_rate_bpm;
    let hsi = input.hsi_score;
    let confidence = input.rhythm_confidence;

    let hit = |state, trigger| Assessment {
        state,
        trigger: Some(trigger),
    };

    // ── Emergency ─────────────────────────────────────────────
    if !(ABSOLUTE_MIN_RATE_BPM..=ABSOLUTE_MAX_RATE_BPM).contains(&hr) {
        return hit(SafetyState::Emergency, Trigger::HeartRateOutOfBounds(hr));
    }
    if hsi < config.hsi_emergency {
        return hit(SafetyState::Emergency, Trigger::HsiCritical(hsi));
    }

    // ── Safe mode: data cannot be trusted ─────────────────────
    if confidence < config.confidence_medium {
        return hit(SafetyState::SafeMode, Trigger::LowConfidence(confidence));
    }
    if input.rhythm_class == RhythmClass::Artifact {
        return hit(SafetyState::SafeMode, Trigger::Artifact);
    }

    // ── Degraded: concerning but usable ───────────────────────
    if hsi < config.hsi_critical_low {
        return hit(SafetyState::Degraded, Trigger::HsiLow(hsi));
    }
    if confidence < config.confidence_high {
        return hit(SafetyState::Degraded, Trigger::MediumConfidence(confidence));
    }
    if input.rhythm_class.is_arrhythmia() {
        return hit(SafetyState::Degraded, Trigger::Arrhythmia(input.rhythm_class));
    }

    Assessment {
        state: SafetyState::Normal,
        trigger: None,
    }
}

/// Instantaneous safety state for one cycle's input.
pub fn evaluate(input: &DecisionInput, config: &ControllerConfig) -> SafetyState {
    assess(input, config).state
}
