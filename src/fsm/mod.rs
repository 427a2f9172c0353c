//! Confirmed safety state and its hysteresis tracker.
//!
//! The [`SafetyStateTracker`] owns the one piece of long-lived safety
//! state in a session.  Each cycle the instantaneous evaluation from
//! [`crate::safety`] is *proposed*; the tracker decides whether the
//! confirmed state moves:
//!
//! ```text
//!   NORMAL ──▶ DEGRADED ──▶ SAFE_MODE ──▶ EMERGENCY     degrade: 1 cycle
//!   NORMAL ◀── DEGRADED ◀── SAFE_MODE ◀── EMERGENCY     improve: N cycles
//! ```
//!
//! A more severe proposal is applied on the spot.  A less severe proposal
//! must repeat for `recovery_cycles` consecutive cycles before the
//! confirmed state advances, straight to the proposed level.  Any cycle
//! that proposes the current state, or something more severe, zeroes the
//! improvement counter.

use core::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// How far the controller currently trusts its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyState {
    Normal,
    Degraded,
    SafeMode,
    Emergency,
}

impl SafetyState {
    /// Explicit severity rank.  Higher is more severe.  Transition logic
    /// compares these numbers, never the declaration order.
    pub const fn severity(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Degraded => 1,
            Self::SafeMode => 2,
            Self::Emergency => 3,
        }
    }

    pub const fn is_more_severe_than(self, other: Self) -> bool {
        self.severity() > other.severity()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Degraded => "degraded",
            Self::SafeMode => "safe_mode",
            Self::Emergency => "emergency",
        }
    }
}

impl fmt::Display for SafetyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Transition outcome
// ---------------------------------------------------------------------------

/// What a single [`SafetyStateTracker::update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Proposal matched the confirmed state.
    Unchanged,
    /// Confirmed state moved to a more severe level immediately.
    Degraded { from: SafetyState, to: SafetyState },
    /// Less severe proposal counted, not yet confirmed.
    Improving {
        toward: SafetyState,
        cycles: u8,
        required: u8,
    },
    /// Enough consecutive less severe proposals; confirmed state advanced.
    Improved { from: SafetyState, to: SafetyState },
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Hysteresis wrapper around the instantaneous safety evaluation.
///
/// Created once per session in [`SafetyState::Normal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyStateTracker {
    current: SafetyState,
    /// Consecutive less severe proposals seen so far.
    improvement_cycles: u8,
    /// Cycles needed to confirm an improvement.
    recovery_cycles: u8,
    /// Proposals of `Emergency` (observability only).
    safety_violations: u64,
    /// Immediate degradations applied (observability only).
    fallback_activations: u64,
}

impl SafetyStateTracker {
    pub fn new(recovery_cycles: u8) -> Self {
        Self {
            current: SafetyState::Normal,
            improvement_cycles: 0,
            recovery_cycles: recovery_cycles.max(1),
            safety_violations: 0,
            fallback_activations: 0,
        }
    }

    /// Feed one proposed state through the transition rule.
    pub fn update(&mut self, proposed: SafetyState) -> Transition {
        if proposed == SafetyState::Emergency {
            self.safety_violations = self.safety_violations.saturating_add(1);
        }

        if proposed == self.current {
            self.improvement_cycles = 0;
            return Transition::Unchanged;
        }

        if proposed.is_more_severe_than(self.current) {
            let from = self.current;
            warn!("Safety state degrading: {from} -> {proposed}");
            self.current = proposed;
            self.improvement_cycles = 0;
            self.fallback_activations = self.fallback_activations.saturating_add(1);
            return Transition::Degraded { from, to: proposed };
        }

        self.improvement_cycles = self.improvement_cycles.saturating_add(1);
        if self.improvement_cycles >= self.recovery_cycles {
            let from = self.current;
            info!("Safety state improving: {from} -> {proposed}");
            self.current = proposed;
            self.improvement_cycles = 0;
            Transition::Improved { from, to: proposed }
        } else {
            debug!(
                "Recovery cycle {}/{} toward {proposed}",
                self.improvement_cycles, self.recovery_cycles
            );
            Transition::Improving {
                toward: proposed,
                cycles: self.improvement_cycles,
                required: self.recovery_cycles,
            }
        }
    }

    /// The confirmed safety state.
    pub fn current(&self) -> SafetyState {
        self.current
    }

    pub fn improvement_cycles(&self) -> u8 {
        self.improvement_cycles
    }

    pub fn recovery_cycles(&self) -> u8 {
        self.recovery_cycles
    }

    /// Change the confirmation window.  Progress already made carries over.
    pub fn set_recovery_cycles(&mut self, recovery_cycles: u8) {
        self.recovery_cycles = recovery_cycles.max(1);
    }

    pub fn safety_violations(&self) -> u64 {
        self.safety_violations
    }

    pub fn fallback_activations(&self) -> u64 {
        self.fallback_activations
    }
}
