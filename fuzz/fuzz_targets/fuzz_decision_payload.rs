//! Fuzz target: decision entry point
//!
//! Splits the input at the first `0x00` byte into a rhythm payload and an
//! HSI payload, parses each as JSON (anything unparsable becomes "absent")
//! and drives several cycles through one controller, verifying:
//! - No panics escape `decide`
//! - Every command stays within the hard rate and amplitude bounds
//! - Failed cycles always return the canonical fallback
//!
//! cargo fuzz run fuzz_decision_payload

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulsemind::app::ports::NullSink;
use pulsemind::{PacingController, PacingMode, SafetyState};
use serde_json::Value;

fn parse(bytes: &[u8]) -> Option<Value> {
    serde_json::from_slice(bytes).ok()
}

fuzz_target!(|data: &[u8]| {
    let split = data.iter().position(|b| *b == 0).unwrap_or(data.len());
    let rhythm = parse(&data[..split]);
    let hsi = parse(data.get(split + 1..).unwrap_or_default());

    let mut controller = PacingController::default();
    let now = chrono::DateTime::<chrono::Utc>::UNIX_EPOCH;

    for _ in 0..4 {
        let result = controller.decide(rhythm.as_ref(), hsi.as_ref(), now, &mut NullSink);
        let cmd = &result.pacing_command;

        assert!((40.0..=180.0).contains(&cmd.target_rate_bpm));
        assert!(
            cmd.pacing_amplitude_ma == 0.0 || (0.5..=10.0).contains(&cmd.pacing_amplitude_ma),
            "amplitude {} out of bounds",
            cmd.pacing_amplitude_ma
        );

        if !result.success {
            assert_eq!(cmd.pacing_mode, PacingMode::MonitorOnly);
            assert_eq!(cmd.safety_state, SafetyState::Emergency);
            assert!(!cmd.pacing_enabled);
            assert!(result.error.is_some());
        }
    }
});
