//! In-memory decision history.
//!
//! Keeps the last [`HISTORY_CAPACITY`] decisions per controller in a
//! fixed-size ring so a session can be inspected after the fact without
//! any I/O.  Durable audit storage lives outside this crate.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::command::DecisionResult;
use crate::control::PacingMode;
use crate::fsm::SafetyState;
use crate::input::RhythmClass;

pub const HISTORY_CAPACITY: usize = 16;
const RATIONALE_CAPACITY: usize = 192;

/// Condensed record of one decision cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    /// `None` when the input never sanitized.
    pub rhythm_class: Option<RhythmClass>,
    pub hsi_score: Option<f64>,
    pub pacing_mode: PacingMode,
    pub target_rate_bpm: f64,
    pub pacing_amplitude_ma: f64,
    pub safety_state: SafetyState,
    /// Truncated to 192 bytes.
    pub rationale: heapless::String<RATIONALE_CAPACITY>,
}

impl DecisionRecord {
    pub fn from_result(result: &DecisionResult) -> Self {
        let command = &result.pacing_command;
        let summary = result.input_summary.as_ref();
        Self {
            timestamp: result.timestamp,
            success: result.success,
            rhythm_class: summary.map(|s| s.rhythm_class),
            hsi_score: summary.map(|s| s.hsi_score),
            pacing_mode: command.pacing_mode,
            target_rate_bpm: command.target_rate_bpm,
            pacing_amplitude_ma: command.pacing_amplitude_ma,
            safety_state: command.safety_state,
            rationale: truncated(&command.rationale),
        }
    }
}

fn truncated<const N: usize>(text: &str) -> heapless::String<N> {
    let mut end = text.len().min(N);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let mut s = heapless::String::new();
    let _ = s.push_str(&text[..end]);
    s
}

/// Ring of the most recent decision records.
pub struct DecisionHistory {
    records: heapless::HistoryBuffer<DecisionRecord, HISTORY_CAPACITY>,
}

impl DecisionHistory {
    pub fn new() -> Self {
        Self {
            records: heapless::HistoryBuffer::new(),
        }
    }

    /// Append, overwriting the oldest record when full.
    pub fn record(&mut self, result: &DecisionResult) {
        self.records.write(DecisionRecord::from_result(result));
    }

    /// Records oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &DecisionRecord> {
        self.records.oldest_ordered()
    }

    pub fn latest(&self) -> Option<&DecisionRecord> {
        self.records.recent()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.len() == 0
    }

    pub fn clear(&mut self) {
        self.records = heapless::HistoryBuffer::new();
    }

    /// Copy out oldest first, for serialization or hand-off.
    pub fn to_vec(&self) -> Vec<DecisionRecord> {
        self.iter().cloned().collect()
    }
}

impl Default for DecisionHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DecisionHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionHistory")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
