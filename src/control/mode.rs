//! Pacing mode selection.
//!
//! First matching rule wins:
//!
//! | # | Condition                                              | Mode         |
//! |---|--------------------------------------------------------|--------------|
//! | 1 | confirmed state Emergency                              | emergency    |
//! | 2 | confirmed state SafeMode                               | minimal      |
//! | 3 | normal sinus and HSI ≥ `hsi_good`                      | monitor_only |
//! | 4 | HSI declining and arrhythmia                           | aggressive   |
//! | 5 | bradycardia or HSI < `hsi_low`                         | moderate     |
//! | 6 | tachycardia                                            | moderate     |
//! | 7 | otherwise                                              | minimal      |

use crate::config::ControllerConfig;
use crate::fsm::SafetyState;
use crate::input::{DecisionInput, HsiTrend, RhythmClass};

use super::PacingMode;

/// Pick the intervention tier for this cycle.
pub fn select(input: &DecisionInput, confirmed: SafetyState, config: &ControllerConfig) -> PacingMode {
    match confirmed {
        SafetyState::Emergency => return PacingMode::Emergency,
        // Inputs are not trusted; intervene as little as possible.
        SafetyState::SafeMode => return PacingMode::Minimal,
        SafetyState::Normal | SafetyState::Degraded => {}
    }

    let class = input.rhythm_class;

    if class == RhythmClass::NormalSinus && input.hsi_score >= config.hsi_good {
        return PacingMode::MonitorOnly;
    }
    if input.hsi_trend == HsiTrend::Declining && class.is_arrhythmia() {
        return PacingMode::Aggressive;
    }
    if class == RhythmClass::Bradycardia || input.hsi_score < config.hsi_low {
        return PacingMode::Moderate;
    }
    if class == RhythmClass::Tachycardia {
        return PacingMode::Moderate;
    }
    PacingMode::Minimal
}
