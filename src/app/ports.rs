//! Port traits: the hexagonal boundary between the controller and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PacingController (domain)
//! ```
//!
//! Event sinks and configuration stores implement these traits.  The
//! [`PacingController`](super::service::PacingController) consumes them via
//! generics, so the decision core never performs I/O itself.

use crate::config::ControllerConfig;

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / audit)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured
/// [`ControllerEvent`](super::events::ControllerEvent)s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::ControllerEvent);
}

/// Sink that drops everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &super::events::ControllerEvent) {}
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists controller configuration.
///
/// # Safety
///
/// Implementations MUST validate before persisting.  Invalid values are
/// rejected with [`ConfigError::ValidationFailed`], never clamped, so a
/// bad provisioning request cannot widen the physiological bounds.
pub trait ConfigPort {
    /// Load the stored configuration.
    fn load(&self) -> Result<ControllerConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &ControllerConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Nothing stored yet.
    NotFound,
    /// Stored bytes failed to decode or no longer validate.
    Corrupted,
    /// A field failed range validation.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<crate::error::Error> for ConfigError {
    fn from(err: crate::error::Error) -> Self {
        match err {
            crate::error::Error::Config(msg) => Self::ValidationFailed(msg),
            _ => Self::Corrupted,
        }
    }
}
