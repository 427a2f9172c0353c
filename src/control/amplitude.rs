//! Pacing amplitude synthesis.
//!
//! Lower HSI means a higher amplitude to make capture more likely; the mode
//! then scales it.  Emergency pins the maximum, monitor-only is zero.

use log::debug;

use crate::config::ControllerConfig;

use super::PacingMode;

/// Base amplitude for each HSI band (mA).
const GOOD_HSI_MA: f64 = 1.5;
const FAIR_HSI_MA: f64 = 2.0;
const POOR_HSI_MA: f64 = 3.0;
const CRITICAL_HSI_MA: f64 = 4.0;

pub fn synthesize(mode: PacingMode, hsi_score: f64, config: &ControllerConfig) -> f64 {
    let scale = match mode {
        PacingMode::Emergency => return config.emergency_amplitude_ma,
        PacingMode::MonitorOnly => return 0.0,
        PacingMode::Minimal => 0.8,
        PacingMode::Moderate => 1.0,
        PacingMode::Aggressive => 1.2,
    };

    let base = if hsi_score >= config.hsi_good {
        GOOD_HSI_MA
    } else if hsi_score >= config.hsi_low {
        FAIR_HSI_MA
    } else if hsi_score >= config.hsi_critical_low {
        POOR_HSI_MA
    } else {
        CRITICAL_HSI_MA
    };

    let amplitude = (base * scale).clamp(config.min_amplitude_ma, config.max_amplitude_ma);
    debug!("Amplitude {amplitude:.2} mA (HSI {hsi_score:.1}, mode {mode})");
    amplitude
}
