//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured controller events through
//! the `log` facade.  An audit-service or alerting adapter would implement
//! the same trait.

use log::{debug, error, info, warn};

use crate::app::events::ControllerEvent;
use crate::app::ports::EventSink;
use crate::fsm::SafetyState;

/// Adapter that logs every [`ControllerEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ControllerEvent) {
        match event {
            ControllerEvent::SafetyStateChanged { from, to } => {
                if to.is_more_severe_than(*from) {
                    warn!("STATE | {} -> {}", from, to);
                } else {
                    info!("STATE | {} -> {}", from, to);
                }
                if *to == SafetyState::Emergency {
                    error!("STATE | emergency confirmed, override pacing active");
                }
            }
            ControllerEvent::RecoveryProgress {
                toward,
                cycles,
                required,
            } => {
                debug!("RECOVERY | toward={} {}/{}", toward, cycles, required);
            }
            ControllerEvent::RateLimited {
                requested_bpm,
                applied_bpm,
            } => {
                info!("RATE | limited {:.1} -> {:.1} BPM", requested_bpm, applied_bpm);
            }
            ControllerEvent::RateClamped {
                requested_bpm,
                applied_bpm,
            } => {
                warn!("RATE | clamped {:.1} -> {:.1} BPM", requested_bpm, applied_bpm);
            }
            ControllerEvent::FallbackEngaged(err) => {
                error!("FALLBACK | {}", err);
            }
            ControllerEvent::ConfigUpdated => {
                info!("CONFIG | updated");
            }
            ControllerEvent::Reset => {
                info!("RESET | controller state cleared");
            }
        }
    }
}
