//! Integration tests for the decision pipeline through `PacingController`.
//!
//! Payloads go in as JSON exactly as the upstream services send them; the
//! assertions are on the returned result and the emitted events.

use crate::mock_sink::{RecordingSink, epoch, hsi, rhythm};

use pulsemind::app::events::ControllerEvent;
use pulsemind::app::service::PacingController;
use pulsemind::command::DecisionResult;
use pulsemind::control::PacingMode;
use pulsemind::error::{Error, InputError, Payload};
use pulsemind::fsm::SafetyState;
use pulsemind::input::{HsiTrend, RhythmClass};
use serde_json::{Value, json};

fn run(c: &mut PacingController, sink: &mut RecordingSink, r: &Value, h: &Value) -> DecisionResult {
    c.decide(Some(r), Some(h), epoch(), sink)
}

fn good_cycle(c: &mut PacingController, sink: &mut RecordingSink) -> DecisionResult {
    run(c, sink, &rhythm("normal_sinus", 0.95), &hsi(75.0, "stable", 72.0))
}

fn emergency_cycle(c: &mut PacingController, sink: &mut RecordingSink) -> DecisionResult {
    run(c, sink, &rhythm("normal_sinus", 0.95), &hsi(75.0, "stable", 35.0))
}

fn assert_canonical_fallback(result: &DecisionResult) {
    let cmd = &result.pacing_command;
    assert!(!result.success);
    assert!(!cmd.pacing_enabled);
    assert_eq!(cmd.target_rate_bpm, 70.0);
    assert_eq!(cmd.pacing_amplitude_ma, 0.0);
    assert_eq!(cmd.pacing_mode, PacingMode::MonitorOnly);
    assert_eq!(cmd.safety_state, SafetyState::Emergency);
    assert!(cmd.safety_checks.rate_within_bounds);
    assert!(cmd.safety_checks.amplitude_within_bounds);
    assert!(!cmd.safety_checks.confidence_acceptable);
    assert!(!cmd.safety_checks.hsi_acceptable);
    assert!(result.error.is_some());
    assert!(result.input_summary.is_none());
}

// ── Reference scenarios ───────────────────────────────────────

#[test]
fn healthy_sinus_rhythm_is_monitor_only() {
    let mut c = PacingController::default();
    let mut sink = RecordingSink::new();

    let result = good_cycle(&mut c, &mut sink);
    let cmd = &result.pacing_command;

    assert!(result.success);
    assert_eq!(cmd.pacing_mode, PacingMode::MonitorOnly);
    assert!(!cmd.pacing_enabled);
    assert_eq!(cmd.safety_state, SafetyState::Normal);
    assert_eq!(cmd.target_rate_bpm, 72.0);
    assert_eq!(cmd.pacing_amplitude_ma, 0.0);
    assert!(cmd.safety_checks.rate_within_bounds);
    assert!(!cmd.safety_checks.amplitude_within_bounds);
    assert!(cmd.safety_checks.confidence_acceptable);
    assert!(cmd.safety_checks.hsi_acceptable);
    assert!(!cmd.safety_checks.all_passed());
    assert_eq!(cmd.pace_interval_ms(), None);
    assert_eq!(
        cmd.rationale,
        "Normal sinus rhythm detected; Good cardiovascular status (HSI=75.0); Pacing mode: monitor_only"
    );
    assert!(sink.events.is_empty());
}

#[test]
fn declining_bradycardia_paces_aggressively_within_first_cycle_limit() {
    let mut c = PacingController::default();
    let mut sink = RecordingSink::new();

    let result = run(
        &mut c,
        &mut sink,
        &rhythm("bradycardia", 0.9),
        &hsi(40.0, "declining", 45.0),
    );
    let cmd = &result.pacing_command;

    assert!(result.success);
    assert_eq!(cmd.pacing_mode, PacingMode::Aggressive);
    assert!(cmd.pacing_enabled);
    assert_eq!(cmd.safety_state, SafetyState::Degraded);
    assert!(cmd.target_rate_bpm > 45.0 && cmd.target_rate_bpm <= 55.0);
    assert_eq!(cmd.target_rate_bpm, 55.0);
    assert_eq!(cmd.pacing_amplitude_ma, 3.6);
    assert_eq!(cmd.pace_interval_ms(), Some(1091));
    assert!(cmd.rationale.contains("Bradycardia detected"));
    assert!(cmd.rationale.contains("Rate change limited"));

    assert_eq!(
        sink.events,
        vec![
            ControllerEvent::SafetyStateChanged {
                from: SafetyState::Normal,
                to: SafetyState::Degraded,
            },
            ControllerEvent::RateLimited {
                requested_bpm: 63.75,
                applied_bpm: 55.0,
            },
        ]
    );
}

#[test]
fn heart_rate_below_floor_is_emergency_regardless_of_rhythm() {
    for class in ["normal_sinus", "bradycardia", "artifact", "unknown"] {
        let mut c = PacingController::default();
        let mut sink = RecordingSink::new();
        let result = run(&mut c, &mut sink, &rhythm(class, 0.99), &hsi(90.0, "improving", 35.0));
        let cmd = &result.pacing_command;

        assert!(result.success, "{class}");
        assert_eq!(cmd.safety_state, SafetyState::Emergency, "{class}");
        assert_eq!(cmd.pacing_mode, PacingMode::Emergency, "{class}");
        assert_eq!(cmd.target_rate_bpm, 70.0);
        assert_eq!(cmd.pacing_amplitude_ma, 10.0);
        assert!(cmd.pacing_enabled);
        assert!(cmd.rationale.starts_with("EMERGENCY safety state"));
    }
}

// ── Hysteresis ────────────────────────────────────────────────

#[test]
fn recovery_needs_three_consecutive_good_cycles() {
    let mut c = PacingController::default();
    let mut sink = RecordingSink::new();

    emergency_cycle(&mut c, &mut sink);
    assert_eq!(c.status().safety_state, SafetyState::Emergency);
    sink.clear();

    for n in 1..=2u8 {
        let r = good_cycle(&mut c, &mut sink);
        assert_eq!(r.pacing_command.safety_state, SafetyState::Emergency);
        assert_eq!(r.pacing_command.pacing_mode, PacingMode::Emergency);
        assert_eq!(c.status().improvement_cycles, n);
    }

    let r = good_cycle(&mut c, &mut sink);
    assert_eq!(r.pacing_command.safety_state, SafetyState::Normal);
    assert_eq!(r.pacing_command.pacing_mode, PacingMode::MonitorOnly);
    assert_eq!(c.status().improvement_cycles, 0);

    assert_eq!(
        sink.events,
        vec![
            ControllerEvent::RecoveryProgress {
                toward: SafetyState::Normal,
                cycles: 1,
                required: 3,
            },
            ControllerEvent::RecoveryProgress {
                toward: SafetyState::Normal,
                cycles: 2,
                required: 3,
            },
            ControllerEvent::SafetyStateChanged {
                from: SafetyState::Emergency,
                to: SafetyState::Normal,
            },
        ]
    );
}

#[test]
fn regression_resets_recovery_progress() {
    let mut c = PacingController::default();
    let mut sink = RecordingSink::new();

    emergency_cycle(&mut c, &mut sink);
    good_cycle(&mut c, &mut sink);
    good_cycle(&mut c, &mut sink);
    emergency_cycle(&mut c, &mut sink);
    assert_eq!(c.status().improvement_cycles, 0);

    good_cycle(&mut c, &mut sink);
    let r = good_cycle(&mut c, &mut sink);
    assert_eq!(r.pacing_command.safety_state, SafetyState::Emergency);

    let r = good_cycle(&mut c, &mut sink);
    assert_eq!(r.pacing_command.safety_state, SafetyState::Normal);

    let status = c.status();
    assert_eq!(status.safety_violations, 2);
    assert_eq!(status.fallback_activations, 1);
}

#[test]
fn single_bad_cycle_degrades_immediately() {
    let mut c = PacingController::default();
    let mut sink = RecordingSink::new();

    good_cycle(&mut c, &mut sink);
    let r = run(&mut c, &mut sink, &rhythm("normal_sinus", 0.4), &hsi(75.0, "stable", 72.0));
    assert_eq!(r.pacing_command.safety_state, SafetyState::SafeMode);
    assert_eq!(r.pacing_command.pacing_mode, PacingMode::Minimal);
    assert!(!r.pacing_command.safety_checks.confidence_acceptable);
    assert_eq!(sink.state_changes(), vec![(SafetyState::Normal, SafetyState::SafeMode)]);
}

// ── Rate limiting ─────────────────────────────────────────────

#[test]
fn rate_change_is_limited_between_cycles() {
    let mut c = PacingController::default();
    let mut sink = RecordingSink::new();

    good_cycle(&mut c, &mut sink);
    let r = run(&mut c, &mut sink, &rhythm("normal_sinus", 0.95), &hsi(75.0, "stable", 110.0));
    assert_eq!(r.pacing_command.target_rate_bpm, 82.0);
    let r = run(&mut c, &mut sink, &rhythm("normal_sinus", 0.95), &hsi(75.0, "stable", 110.0));
    assert_eq!(r.pacing_command.target_rate_bpm, 92.0);
}

#[test]
fn emergency_override_ignores_rate_limit() {
    let mut c = PacingController::default();
    let mut sink = RecordingSink::new();

    let r = run(&mut c, &mut sink, &rhythm("normal_sinus", 0.95), &hsi(75.0, "stable", 150.0));
    assert_eq!(r.pacing_command.target_rate_bpm, 150.0);

    let r = emergency_cycle(&mut c, &mut sink);
    assert_eq!(r.pacing_command.target_rate_bpm, 70.0);
    assert!(!sink.events.iter().any(|e| matches!(e, ControllerEvent::RateLimited { .. })));
}

#[test]
fn converged_controller_is_a_fixed_point() {
    let mut c = PacingController::default();
    let mut sink = RecordingSink::new();
    let r_in = rhythm("bradycardia", 0.9);
    let h_in = hsi(40.0, "declining", 45.0);

    let rates: Vec<f64> = (0..4)
        .map(|_| run(&mut c, &mut sink, &r_in, &h_in).pacing_command.target_rate_bpm)
        .collect();
    assert_eq!(rates, vec![55.0, 63.8, 63.8, 63.8]);

    let before = c.status();
    let a = run(&mut c, &mut sink, &r_in, &h_in);
    let b = run(&mut c, &mut sink, &r_in, &h_in);
    assert_eq!(a.pacing_command, b.pacing_command);
    assert_eq!(c.status().safety_state, before.safety_state);
}

// ── Input handling ────────────────────────────────────────────

#[test]
fn out_of_range_inputs_are_clamped_and_reported() {
    let mut c = PacingController::default();
    let mut sink = RecordingSink::new();

    let r = run(
        &mut c,
        &mut sink,
        &json!({"rhythm_class": "NORMAL_SINUS", "confidence": 1.7}),
        &json!({"hsi_score": 150, "trend": "improving", "input_features": {"heart_rate_bpm": 400}}),
    );
    assert!(r.success);
    let summary = r.input_summary.as_ref().map(|s| (s.rhythm_class, s.rhythm_confidence, s.hsi_score, s.heart_rate_bpm));
    assert_eq!(summary, Some((RhythmClass::NormalSinus, 1.0, 100.0, 250.0)));
    assert_eq!(r.pacing_command.safety_state, SafetyState::Emergency);
    assert_eq!(r.pacing_command.target_rate_bpm, 70.0);

    let json = r.to_json();
    assert_eq!(json["input_summary"]["adjustments"].as_array().map(Vec::len), Some(3));
}

#[test]
fn single_empty_payload_uses_defaults() {
    let mut c = PacingController::default();
    let mut sink = RecordingSink::new();

    let r = run(&mut c, &mut sink, &json!({}), &hsi(75.0, "stable", 72.0));
    assert!(r.success);
    let summary = r.input_summary.as_ref().map(|s| (s.rhythm_class, s.rhythm_confidence, s.hsi_trend));
    assert_eq!(summary, Some((RhythmClass::Artifact, 0.0, HsiTrend::Stable)));
    assert_eq!(r.pacing_command.safety_state, SafetyState::SafeMode);
    assert_eq!(r.pacing_command.pacing_mode, PacingMode::Minimal);
    assert!(r.pacing_command.rationale.contains("Signal artifact"));
}

#[test]
fn numeric_strings_and_bare_trend_are_accepted() {
    let mut c = PacingController::default();
    let mut sink = RecordingSink::new();

    let r = run(
        &mut c,
        &mut sink,
        &json!({"rhythm_class": "bradycardia", "confidence": "0.9"}),
        &json!({"hsi_score": "40", "trend": "declining", "heart_rate_bpm": "45"}),
    );
    assert!(r.success);
    assert_eq!(r.pacing_command.pacing_mode, PacingMode::Aggressive);
    assert_eq!(r.pacing_command.target_rate_bpm, 55.0);
}

#[test]
fn overflowing_numeric_strings_clamp_instead_of_falling_back() {
    let mut c = PacingController::default();
    let mut sink = RecordingSink::new();

    let r = run(
        &mut c,
        &mut sink,
        &json!({"rhythm_class": "normal_sinus", "confidence": "1e999"}),
        &json!({"hsi_score": 75}),
    );
    assert!(r.success);
    assert!(r.error.is_none());
    assert!(r.pacing_command.safety_checks.confidence_acceptable);
    assert_eq!(r.pacing_command.safety_state, SafetyState::Normal);
    assert_eq!(r.pacing_command.pacing_mode, PacingMode::MonitorOnly);
}

// ── Fallback ──────────────────────────────────────────────────

#[test]
fn missing_or_empty_payloads_fall_back() {
    let mut c = PacingController::default();
    let mut sink = RecordingSink::new();

    let cases: [(Option<Value>, Option<Value>, Error); 4] = [
        (None, None, InputError::MissingPayload(Payload::Rhythm).into()),
        (Some(Value::Null), Some(json!({})), InputError::MissingPayload(Payload::Rhythm).into()),
        (Some(json!({})), Some(json!({})), InputError::EmptyPayloads.into()),
        (Some(json!({})), Some(json!([1, 2])), InputError::NotAnObject(Payload::Hsi).into()),
    ];

    for (r_in, h_in, expected) in &cases {
        let result = c.decide(r_in.as_ref(), h_in.as_ref(), epoch(), &mut sink);
        assert_canonical_fallback(&result);
        assert_eq!(result.error, Some(expected.to_string()));
    }

    let status = c.status();
    assert_eq!(status.internal_failures, 4);
    assert_eq!(status.safety_state, SafetyState::Normal);
    assert!(status.last_rate_bpm.is_none());
    assert_eq!(sink.fallbacks(), 4);
}

#[test]
fn malformed_values_fall_back_without_touching_state() {
    let mut c = PacingController::default();
    let mut sink = RecordingSink::new();

    good_cycle(&mut c, &mut sink);
    let before = c.status();

    for (r_in, h_in) in [
        (json!({"rhythm_class": 3, "confidence": 0.9}), hsi(75.0, "stable", 72.0)),
        (rhythm("normal_sinus", 0.9), json!({"hsi_score": "abc"})),
        (rhythm("normal_sinus", 0.9), json!({"hsi_score": 70, "input_features": 5})),
    ] {
        let result = run(&mut c, &mut sink, &r_in, &h_in);
        assert_canonical_fallback(&result);
    }

    let after = c.status();
    assert_eq!(after.safety_state, before.safety_state);
    assert_eq!(after.last_rate_bpm, before.last_rate_bpm);
    assert_eq!(after.internal_failures, 3);
}

// ── History ───────────────────────────────────────────────────

#[test]
fn history_records_successes_and_fallbacks() {
    let mut c = PacingController::default();
    let mut sink = RecordingSink::new();

    good_cycle(&mut c, &mut sink);
    c.decide(None, None, epoch(), &mut sink);

    let records: Vec<_> = c.recent_decisions().collect();
    assert_eq!(records.len(), 2);
    assert!(records[0].success);
    assert_eq!(records[0].rhythm_class, Some(RhythmClass::NormalSinus));
    assert!(!records[1].success);
    assert_eq!(records[1].safety_state, SafetyState::Emergency);

    for _ in 0..30 {
        good_cycle(&mut c, &mut sink);
    }
    assert_eq!(c.recent_decisions().count(), 16);
}

#[test]
fn result_serializes_to_the_documented_shape() {
    let mut c = PacingController::default();
    let mut sink = RecordingSink::new();

    let json = run(&mut c, &mut sink, &rhythm("bradycardia", 0.9), &hsi(40.0, "declining", 45.0)).to_json();
    assert_eq!(json["success"], true);
    assert_eq!(json["pacing_command"]["pacing_mode"], "aggressive");
    assert_eq!(json["pacing_command"]["safety_state"], "degraded");
    assert_eq!(json["pacing_command"]["target_rate_bpm"], 55.0);
    assert_eq!(json["input_summary"]["rhythm_class"], "bradycardia");
    assert_eq!(json["input_summary"]["hsi_trend"], "declining");
    assert!(json.get("error").is_none());
    assert!(json["timestamp"].is_string());
}
