//! Target pacing rate synthesis.
//!
//! Three stages, each bounded by the next:
//!
//! 1. **Blend**: move from the measured heart rate toward a rhythm-specific
//!    base target by a fraction set by the pacing mode.
//! 2. **Slew limit**: keep the change versus the previous emitted rate
//!    within the configured per-cycle increase/decrease.  Skipped for the
//!    emergency override.
//! 3. **Clamp**: hard rate bounds.
//!
//! Limits and clamps that actually change the value are reported back as
//! [`RateAdjustment`]s so the orchestrator can surface them.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::input::{DecisionInput, RhythmClass};

use super::PacingMode;

/// Fraction of the gap to the base target covered in one cycle.
const MINIMAL_BLEND: f64 = 0.25;
const MODERATE_BLEND: f64 = 0.50;
const AGGRESSIVE_BLEND: f64 = 0.75;

const BRADY_TARGET_BPM: f64 = 70.0;
/// Bradycardia target when HSI is below the critical threshold.
const BRADY_CONSERVATIVE_TARGET_BPM: f64 = 65.0;
const TACHY_CEILING_BPM: f64 = 100.0;
const IRREGULAR_TARGET_BPM: f64 = 70.0;
const SINUS_BAND_BPM: (f64, f64) = (60.0, 80.0);

/// A bound that changed the requested rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateAdjustment {
    /// Per-cycle rate-of-change limit.
    Limited { requested: f64, applied: f64 },
    /// Hard rate bound.
    Clamped { requested: f64, applied: f64 },
}

/// Result of one rate synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct RateDecision {
    /// Final target, within the hard bounds.
    pub target_bpm: f64,
    /// Blended target before limiting and clamping.
    pub requested_bpm: f64,
    pub adjustments: heapless::Vec<RateAdjustment, 2>,
}

/// Rhythm-specific rate the policy steers toward.
pub fn base_target(input: &DecisionInput, config: &ControllerConfig) -> f64 {
    let hr = input.heart_rate_bpm;
    match input.rhythm_class {
        RhythmClass::Bradycardia if input.hsi_score < config.hsi_critical_low => {
            BRADY_CONSERVATIVE_TARGET_BPM
        }
        RhythmClass::Bradycardia => BRADY_TARGET_BPM,
        // Pacing cannot slow the heart; hold a ceiling instead.
        RhythmClass::Tachycardia => hr.min(TACHY_CEILING_BPM),
        RhythmClass::Irregular => IRREGULAR_TARGET_BPM,
        RhythmClass::NormalSinus | RhythmClass::Artifact | RhythmClass::Unknown => {
            hr.clamp(SINUS_BAND_BPM.0, SINUS_BAND_BPM.1)
        }
    }
}

/// Compute this cycle's target rate.
///
/// `prior_bpm` is the previous cycle's emitted rate, `None` on the first
/// cycle.  With `anchor_first_cycle_to_heart_rate` set, the measured heart
/// rate stands in for the missing prior.
pub fn synthesize(
    input: &DecisionInput,
    mode: PacingMode,
    prior_bpm: Option<f64>,
    config: &ControllerConfig,
) -> RateDecision {
    let hr = input.heart_rate_bpm;

    let requested = match mode {
        PacingMode::Emergency => config.emergency_rate_bpm,
        PacingMode::MonitorOnly => hr,
        PacingMode::Minimal => blend(hr, base_target(input, config), MINIMAL_BLEND),
        PacingMode::Moderate => blend(hr, base_target(input, config), MODERATE_BLEND),
        PacingMode::Aggressive => blend(hr, base_target(input, config), AGGRESSIVE_BLEND),
    };

    let mut adjustments = heapless::Vec::new();
    let mut target = requested;

    if mode != PacingMode::Emergency {
        let anchor = prior_bpm.or(config.anchor_first_cycle_to_heart_rate.then_some(hr));
        if let Some(anchor) = anchor {
            let limited = target.clamp(
                anchor - config.max_rate_decrease_per_cycle,
                anchor + config.max_rate_increase_per_cycle,
            );
            if limited != target {
                debug!("Rate slew-limited: {target:.1} -> {limited:.1} BPM (prior {anchor:.1})");
                let _ = adjustments.push(RateAdjustment::Limited {
                    requested: target,
                    applied: limited,
                });
                target = limited;
            }
        }
    }

    let clamped = target.clamp(config.min_rate_bpm, config.max_rate_bpm);
    if clamped != target {
        warn!("Rate clamped: {target:.1} -> {clamped:.1} BPM");
        let _ = adjustments.push(RateAdjustment::Clamped {
            requested: target,
            applied: clamped,
        });
    }

    debug!(
        "Target rate {clamped:.1} BPM (hr {hr:.1}, mode {mode}, requested {requested:.1})"
    );

    RateDecision {
        target_bpm: clamped,
        requested_bpm: requested,
        adjustments,
    }
}

fn blend(current: f64, base: f64, fraction: f64) -> f64 {
    current + fraction * (base - current)
}
