//! Outbound controller events and the status snapshot.
//!
//! The [`PacingController`](super::service::PacingController) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them: log, forward to an audit
//! service, raise a clinician alert.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::fsm::SafetyState;

/// Structured events emitted by the controller core.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// The confirmed safety state moved.
    SafetyStateChanged { from: SafetyState, to: SafetyState },

    /// A less severe state was proposed but is not yet confirmed.
    RecoveryProgress {
        toward: SafetyState,
        cycles: u8,
        required: u8,
    },

    /// The per-cycle rate-of-change limit changed the target.
    RateLimited { requested_bpm: f64, applied_bpm: f64 },

    /// A hard rate bound changed the target.
    RateClamped { requested_bpm: f64, applied_bpm: f64 },

    /// A cycle failed and the canonical fallback was returned.
    FallbackEngaged(Error),

    /// A new configuration was accepted.
    ConfigUpdated,

    /// Tracker, policy memory and history were reset.
    Reset,
}

/// Point-in-time view of one controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerStatus {
    pub safety_state: SafetyState,
    pub improvement_cycles: u8,
    pub recovery_cycles: u8,
    pub safety_violations: u64,
    pub fallback_activations: u64,
    pub internal_failures: u64,
    pub cycles: u64,
    pub last_rate_bpm: Option<f64>,
    pub last_amplitude_ma: Option<f64>,
}
