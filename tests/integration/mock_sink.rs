//! Recording event sink and payload builders for integration tests.
//!
//! Captures every emitted event so tests can assert on the full event
//! history of a session.

use chrono::{DateTime, Utc};
use pulsemind::app::events::ControllerEvent;
use pulsemind::app::ports::EventSink;
use pulsemind::fsm::SafetyState;
use serde_json::{Value, json};

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<ControllerEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn state_changes(&self) -> Vec<(SafetyState, SafetyState)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ControllerEvent::SafetyStateChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn fallbacks(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ControllerEvent::FallbackEngaged(_)))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &ControllerEvent) {
        self.events.push(event.clone());
    }
}

// ── Payload builders ──────────────────────────────────────────

pub fn rhythm(class: &str, confidence: f64) -> Value {
    json!({ "rhythm_class": class, "confidence": confidence })
}

pub fn hsi(score: f64, trend: &str, heart_rate_bpm: f64) -> Value {
    json!({
        "hsi_score": score,
        "trend": { "trend_direction": trend },
        "input_features": { "heart_rate_bpm": heart_rate_bpm },
    })
}

pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}
