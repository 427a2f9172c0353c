//! Unified error types for the PulseMind controller.
//!
//! A single `Error` enum that every stage of the decision pipeline can
//! convert into, keeping the orchestrator's fallback handling uniform.
//! All variants are `Copy` so they can be passed into events and the
//! fallback rationale without allocation.
//!
//! Defaulted and clamped input fields are *not* errors; they are recorded
//! as [`InputAdjustment`](crate::input::InputAdjustment)s on the input
//! summary.  Only faults that make a cycle unusable end up here.

use core::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Upstream payloads could not be turned into a decision input.
    Input(InputError),
    /// Configuration is invalid.
    Config(&'static str),
    /// Fault raised while computing a decision from sanitized input.
    Internal(InternalFault),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(e) => write!(f, "input: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Internal(e) => write!(f, "internal: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Input errors
// ---------------------------------------------------------------------------

/// Which upstream payload a fault refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    Rhythm,
    Hsi,
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rhythm => write!(f, "rhythm_data"),
            Self::Hsi => write!(f, "hsi_data"),
        }
    }
}

/// Individual decision-input fields, used to tag defaults, clamps and
/// malformed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    RhythmClass,
    RhythmConfidence,
    HsiScore,
    HsiTrend,
    HeartRate,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RhythmClass => write!(f, "rhythm_class"),
            Self::RhythmConfidence => write!(f, "confidence"),
            Self::HsiScore => write!(f, "hsi_score"),
            Self::HsiTrend => write!(f, "trend_direction"),
            Self::HeartRate => write!(f, "heart_rate_bpm"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    /// Payload was absent or JSON `null`.
    MissingPayload(Payload),
    /// Payload was present but not a JSON object.
    NotAnObject(Payload),
    /// Both payloads were empty objects; nothing to decide on.
    EmptyPayloads,
    /// Field present with a value of the wrong type, or NaN.
    Malformed(Field),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPayload(p) => write!(f, "{p} missing"),
            Self::NotAnObject(p) => write!(f, "{p} is not an object"),
            Self::EmptyPayloads => write!(f, "rhythm_data and hsi_data are both empty"),
            Self::Malformed(field) => write!(f, "malformed value for {field}"),
        }
    }
}

impl From<InputError> for Error {
    fn from(e: InputError) -> Self {
        Self::Input(e)
    }
}

// ---------------------------------------------------------------------------
// Internal faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalFault {
    /// A synthesizer produced NaN or infinity.
    NonFiniteOutput,
    /// The assembled command broke a hard output bound.
    OutputOutOfBounds,
    /// The pipeline panicked; caught at the orchestrator boundary.
    Panicked,
}

impl fmt::Display for InternalFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteOutput => write!(f, "non-finite synthesizer output"),
            Self::OutputOutOfBounds => write!(f, "command outside hard bounds"),
            Self::Panicked => write!(f, "decision pipeline panicked"),
        }
    }
}

impl From<InternalFault> for Error {
    fn from(e: InternalFault) -> Self {
        Self::Internal(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
